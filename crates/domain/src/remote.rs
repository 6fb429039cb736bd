//! Virtual remote devices and their learned commands.
//!
//! A [`VirtualRemote`] is a named, user-defined device bound to a physical
//! IR transceiver (`blaster`). It owns its [`Command`]s by composition —
//! deleting the remote deletes all of them. Command names are unique within
//! their remote under the normalized key, not globally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::code::IrCode;
use crate::error::{IrHubError, ValidationError};
use crate::id::DeviceId;
use crate::time::{Timestamp, now};

/// Normalize a name for uniqueness comparison: trim surrounding whitespace
/// and fold case. Display names keep their original casing.
#[must_use]
pub fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A named IR command with its captured code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Display name, original casing preserved, surrounding whitespace trimmed.
    pub name: String,
    /// The opaque captured payload.
    pub code: IrCode,
    /// When this code was learned or added.
    pub learned_at: Timestamp,
}

impl Command {
    /// Create a command, trimming the name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the trimmed name is empty.
    pub fn new(name: &str, code: IrCode) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            code,
            learned_at: now(),
        })
    }

    /// The key under which this command is stored in its remote.
    #[must_use]
    pub fn key(&self) -> String {
        normalized_name(&self.name)
    }
}

/// A user-defined virtual remote bound to an IR transceiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualRemote {
    pub id: DeviceId,
    /// Display name, unique among remotes (case-insensitive).
    pub name: String,
    /// Opaque reference to the external transceiver that serves this remote.
    pub blaster: String,
    /// Commands keyed by normalized name, iteration order deterministic.
    pub commands: BTreeMap<String, Command>,
    pub created_at: Timestamp,
}

impl VirtualRemote {
    /// Create a remote with a fresh id, trimming the name.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] when the trimmed name is empty.
    pub fn new(name: &str, blaster: impl Into<String>) -> Result<Self, IrHubError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Self {
            id: DeviceId::new(),
            name: name.to_string(),
            blaster: blaster.into(),
            commands: BTreeMap::new(),
            created_at: now(),
        })
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] when the name is empty or a
    /// command is stored under a key that does not match its name.
    pub fn validate(&self) -> Result<(), IrHubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        for (key, command) in &self.commands {
            if *key != command.key() {
                return Err(ValidationError::MismatchedCommandKey {
                    key: key.clone(),
                    name: command.name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Insert or atomically replace a command, returning the previous one.
    pub fn put_command(&mut self, command: Command) -> Option<Command> {
        self.commands.insert(command.key(), command)
    }

    /// Remove a command by (normalized) name.
    pub fn remove_command(&mut self, name: &str) -> Option<Command> {
        self.commands.remove(&normalized_name(name))
    }

    /// Look up a command by (normalized) name.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(&normalized_name(name))
    }

    /// Display names of all commands, ordered by normalized key.
    #[must_use]
    pub fn command_names(&self) -> Vec<String> {
        self.commands.values().map(|c| c.name.clone()).collect()
    }
}
