//! The versioned snapshot document persisted by the registry.
//!
//! A snapshot always contains the complete device/command graph. Readers
//! must check [`RegistrySnapshot::version`] and refuse to load documents
//! written by a newer schema instead of silently misreading them.

use serde::{Deserialize, Serialize};

use crate::remote::VirtualRemote;

/// Current snapshot schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete persisted state: every device with all its commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Schema version, [`SCHEMA_VERSION`] when written by this build.
    pub version: u32,
    /// All devices, deterministic order.
    pub devices: Vec<VirtualRemote>,
}

impl RegistrySnapshot {
    /// Build a current-version snapshot from a device list.
    #[must_use]
    pub fn new(devices: Vec<VirtualRemote>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            devices,
        }
    }

    /// Whether a loader built against [`SCHEMA_VERSION`] can read this.
    ///
    /// Older versions are migratable (none exist yet); newer ones are not.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.version <= SCHEMA_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::IrCode;
    use crate::remote::Command;

    #[test]
    fn should_roundtrip_full_graph_through_serde_json() {
        let mut remote = VirtualRemote::new("Toilet", "remote.blaster_x").unwrap();
        remote.put_command(
            Command::new("Power", IrCode::new(vec![0xAA, 0xBB, 0xCC]).unwrap()).unwrap(),
        );
        let snapshot = RegistrySnapshot::new(vec![remote]);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: RegistrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn should_write_current_schema_version() {
        let snapshot = RegistrySnapshot::new(Vec::new());
        assert_eq!(snapshot.version, SCHEMA_VERSION);
        assert!(snapshot.is_readable());
    }

    #[test]
    fn should_refuse_snapshot_from_newer_schema() {
        let snapshot = RegistrySnapshot {
            version: SCHEMA_VERSION + 1,
            devices: Vec::new(),
        };
        assert!(!snapshot.is_readable());
    }
}
