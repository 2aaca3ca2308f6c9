use serde::{Deserialize, Serialize};
use std::fmt;

use super::candidate::Candidate;

/// Deterministic configuration hash (BLAKE3 of the canonical config JSON)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic dataset hash over every candidate's ticker, dates and closes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for candidate in candidates {
            hasher.update(candidate.ticker.as_bytes());
            hasher.update(&(candidate.bars.len() as u64).to_le_bytes());
            for bar in &candidate.bars {
                hasher.update(bar.date.to_string().as_bytes());
                hasher.update(&bar.close.to_le_bytes());
            }
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic run ID (config + dataset + as-of time)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub as_of: chrono::DateTime<chrono::Utc>,
}

impl RunId {
    pub fn new(
        config_hash: ConfigHash,
        dataset_hash: DatasetHash,
        as_of: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            config_hash,
            dataset_hash,
            as_of,
        }
    }

    /// Generate deterministic run hash
    pub fn hash(&self) -> String {
        use serde_json::json;

        let canonical = json!({
            "config_hash": &self.config_hash.0,
            "dataset_hash": &self.dataset_hash.0,
            "as_of": self.as_of.to_rfc3339(),
        });

        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.config_hash, self.dataset_hash, self.as_of
        )
    }
}
