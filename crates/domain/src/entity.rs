//! Exposed entities — the externally visible projection of the registry.
//!
//! Every virtual remote is exposed as one remote-style entity whose
//! activities are its command names, plus one button-style entity per
//! command. Entity identifiers derive deterministically from the device id
//! and the normalized command name so they stay stable across restarts.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::remote::{VirtualRemote, normalized_name};

/// Reduce a name to `[a-z0-9_]` for use inside an entity id.
///
/// ASCII alphanumerics pass through lowered; every other character is
/// escaped as `_` plus two hex digits per UTF-8 byte. Escapes are
/// fixed-width and `_` itself is escaped, so distinct names always
/// produce distinct slugs.
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).as_bytes() {
                let _ = write!(out, "_{byte:02x}");
            }
        }
    }
    out
}

/// Deterministic id of the remote entity for a device.
#[must_use]
pub fn remote_entity_id(device_id: DeviceId) -> String {
    format!("remote.{}", device_id.as_uuid().simple())
}

/// Deterministic id of the button entity for one command of a device.
#[must_use]
pub fn button_entity_id(device_id: DeviceId, command_name: &str) -> String {
    format!(
        "button.{}_{}",
        device_id.as_uuid().simple(),
        slug(&normalized_name(command_name))
    )
}

/// An externally exposed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExposedEntity {
    /// One per device: a remote whose activities are the command names.
    Remote {
        entity_id: String,
        device_id: DeviceId,
        /// Device display name.
        name: String,
        /// Command display names, deterministic order.
        activities: Vec<String>,
    },
    /// One per command: a pressable button.
    Button {
        entity_id: String,
        device_id: DeviceId,
        /// Command display name.
        name: String,
    },
}

impl ExposedEntity {
    /// The stable entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::Remote { entity_id, .. } | Self::Button { entity_id, .. } => entity_id,
        }
    }

    /// The device this entity belongs to.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        match self {
            Self::Remote { device_id, .. } | Self::Button { device_id, .. } => *device_id,
        }
    }
}

/// Compute the desired entity set for one remote: the remote entity first,
/// then one button per command in deterministic order.
#[must_use]
pub fn desired_entities(remote: &VirtualRemote) -> Vec<ExposedEntity> {
    let mut out = Vec::with_capacity(remote.commands.len() + 1);
    out.push(ExposedEntity::Remote {
        entity_id: remote_entity_id(remote.id),
        device_id: remote.id,
        name: remote.name.clone(),
        activities: remote.command_names(),
    });
    for command in remote.commands.values() {
        out.push(ExposedEntity::Button {
            entity_id: button_entity_id(remote.id, &command.name),
            device_id: remote.id,
            name: command.name.clone(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::IrCode;
    use crate::remote::Command;

    fn remote_with_commands(names: &[&str]) -> VirtualRemote {
        let mut remote = VirtualRemote::new("Toilet", "remote.blaster_x").unwrap();
        for (i, name) in names.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let code = IrCode::new(vec![i as u8 + 1]).unwrap();
            remote.put_command(Command::new(name, code).unwrap());
        }
        remote
    }

    #[test]
    fn should_slugify_names() {
        assert_eq!(slug("power"), "power");
        assert_eq!(slug("volume up"), "volume_20up");
        assert_eq!(slug("power!"), "power_21");
        assert_eq!(slug("a_b"), "a_5fb");
    }

    #[test]
    fn should_derive_distinct_button_ids_for_punctuated_names() {
        let id = DeviceId::new();
        assert_ne!(button_entity_id(id, "Power"), button_entity_id(id, "Power!"));
        assert_ne!(button_entity_id(id, "a b"), button_entity_id(id, "a_b"));
        // an all-symbol name still yields a non-empty slug
        assert_ne!(button_entity_id(id, "!!"), button_entity_id(id, "??"));
    }

    #[test]
    fn should_expose_a_button_per_command_when_names_differ_only_in_punctuation() {
        let remote = remote_with_commands(&["Power", "Power!"]);
        let entities = desired_entities(&remote);

        assert_eq!(entities.len(), 3);
        let ids: std::collections::BTreeSet<_> =
            entities.iter().map(ExposedEntity::entity_id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn should_derive_same_entity_ids_for_same_inputs() {
        let id = DeviceId::new();
        assert_eq!(remote_entity_id(id), remote_entity_id(id));
        assert_eq!(
            button_entity_id(id, "Power"),
            button_entity_id(id, "  POWER ")
        );
    }

    #[test]
    fn should_expose_one_remote_and_one_button_per_command() {
        let remote = remote_with_commands(&["Power", "Flush"]);
        let entities = desired_entities(&remote);

        assert_eq!(entities.len(), 3);
        assert!(matches!(
            &entities[0],
            ExposedEntity::Remote { activities, .. } if activities == &["Flush", "Power"]
        ));
        let buttons = entities
            .iter()
            .filter(|e| matches!(e, ExposedEntity::Button { .. }))
            .count();
        assert_eq!(buttons, 2);
    }

    #[test]
    fn should_expose_only_remote_entity_when_no_commands() {
        let remote = remote_with_commands(&[]);
        let entities = desired_entities(&remote);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_id(), remote_entity_id(remote.id));
    }

    #[test]
    fn should_keep_entity_ids_stable_across_reserialization() {
        let remote = remote_with_commands(&["Power"]);
        let json = serde_json::to_string(&remote).unwrap();
        let reloaded: VirtualRemote = serde_json::from_str(&json).unwrap();

        let a: Vec<String> = desired_entities(&remote)
            .iter()
            .map(|e| e.entity_id().to_string())
            .collect();
        let b: Vec<String> = desired_entities(&reloaded)
            .iter()
            .map(|e| e.entity_id().to_string())
            .collect();
        assert_eq!(a, b);
    }
}
