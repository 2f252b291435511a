//! Engine state persistence
//!
//! Snapshots are plain pretty-printed JSON, written atomically enough for
//! a single-writer engine: serialize, then write the whole file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use gov_core::{Address, Amount};

use crate::config::EngineConfig;
use crate::proposal::Proposal;

/// Full serializable engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub config: EngineConfig,
    pub account: Address,
    pub proposals: Vec<Proposal>,
    pub num_boosted: u64,
    pub fee_pool: Amount,
}

/// Write a snapshot as pretty JSON.
pub fn save(path: &Path, snapshot: &EngineSnapshot) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}

/// Read a snapshot back.
pub fn load(path: &Path) -> std::io::Result<EngineSnapshot> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let snapshot = EngineSnapshot {
            config: EngineConfig::default(),
            account: "engine".to_string(),
            proposals: vec![Proposal::new(
                0,
                "creator".to_string(),
                b"script".to_vec(),
                "metadata".to_string(),
                7,
                1000,
                500,
                3600,
            )],
            num_boosted: 0,
            fee_pool: 42,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        save(&path, &snapshot).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.config, snapshot.config);
        assert_eq!(loaded.account, "engine");
        assert_eq!(loaded.proposals.len(), 1);
        assert_eq!(loaded.proposals[0].voting_power_snapshot, 500);
        assert_eq!(loaded.fee_pool, 42);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(load(Path::new("/nonexistent/state.json")).is_err());
    }
}
