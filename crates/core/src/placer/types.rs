//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a planned file is transferred into the organized tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Source is retained.
    #[default]
    Copy,
    /// Source is removed on success.
    Move,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            other => Err(format!("unknown transfer mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_mode_parse() {
        assert_eq!("copy".parse::<TransferMode>().unwrap(), TransferMode::Copy);
        assert_eq!("MOVE".parse::<TransferMode>().unwrap(), TransferMode::Move);
        assert!("link".parse::<TransferMode>().is_err());
        assert_eq!(TransferMode::default(), TransferMode::Copy);
    }

    #[test]
    fn test_transfer_mode_serde() {
        let json = serde_json::to_string(&TransferMode::Move).unwrap();
        assert_eq!(json, "\"move\"");
        let mode: TransferMode = serde_json::from_str("\"copy\"").unwrap();
        assert_eq!(mode, TransferMode::Copy);
    }
}
