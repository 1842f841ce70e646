/*!
Machine-readable summary of a completed write
*/

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteReport {
    pub target: PathBuf,
    pub bytes: u64,
    /// Hex blake3 digest of the written contents
    pub blake3: String,
    pub written_at: DateTime<Utc>,
}

impl WriteReport {
    pub fn new(target: PathBuf, contents: &[u8]) -> Self {
        Self {
            target,
            bytes: contents.len() as u64,
            blake3: blake3::hash(contents).to_hex().to_string(),
            written_at: Utc::now(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_describes_contents() {
        let report = WriteReport::new(PathBuf::from("out.txt"), b"hello");

        assert_eq!(report.bytes, 5);
        assert_eq!(report.blake3, blake3::hash(b"hello").to_hex().to_string());

        let json: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
        assert_eq!(json["target"], "out.txt");
        assert_eq!(json["bytes"], 5);
    }
}
