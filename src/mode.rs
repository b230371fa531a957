//! Storage modes - versioned on-disk formats for the file store
//!
//! Every mode owns a magic/version sequence that is written as the very
//! first bytes of a file:
//! - `Txt`: `# 1`
//! - `Bin`: `# 2`
//! - `TimeTxt`: `# 3`
//! - `PrefixTxt`: `# 4`

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// File store serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One `url hash` line per record
    #[default]
    Txt,
    /// Text with a shared URL prefix table
    PrefixTxt,
    /// Length-prefixed binary records
    Bin,
    /// Text with a save timestamp
    TimeTxt,
}

impl Mode {
    /// Configuration name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Txt => "txt",
            Mode::PrefixTxt => "prefix_txt",
            Mode::Bin => "bin",
            Mode::TimeTxt => "time_txt",
        }
    }

    /// Magic/version sequence written before any payload
    pub fn magic(&self) -> &'static str {
        match self {
            Mode::Txt => "# 1",
            Mode::Bin => "# 2",
            Mode::TimeTxt => "# 3",
            Mode::PrefixTxt => "# 4",
        }
    }

    pub fn all() -> &'static [Mode] {
        &[Mode::Txt, Mode::PrefixTxt, Mode::Bin, Mode::TimeTxt]
    }

    /// Mode named in configuration. Never fails: a missing or unknown name
    /// falls back to [`Mode::Txt`].
    pub fn from_config(text: Option<&str>) -> Mode {
        text.and_then(|t| t.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Mode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::all()
            .iter()
            .copied()
            .find(|mode| s.trim().eq_ignore_ascii_case(mode.as_str()))
            .ok_or_else(|| crate::Error::UnknownMode(s.to_string()))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_roundtrip() {
        for mode in Mode::all() {
            let parsed: Mode = mode.as_str().parse().unwrap();
            assert_eq!(*mode, parsed);
        }
    }

    #[test]
    fn test_magic_sequences() {
        assert_eq!(Mode::Txt.magic(), "# 1");
        assert_eq!(Mode::Bin.magic(), "# 2");
        assert_eq!(Mode::TimeTxt.magic(), "# 3");
        assert_eq!(Mode::PrefixTxt.magic(), "# 4");
    }

    #[test]
    fn test_config_name_is_case_insensitive() {
        assert_eq!(Mode::from_config(Some("PREFIX_TXT")), Mode::PrefixTxt);
        assert_eq!(Mode::from_config(Some("Bin")), Mode::Bin);
    }

    #[test]
    fn test_unknown_mode_falls_back_to_txt() {
        assert_eq!(Mode::from_config(Some("xml")), Mode::Txt);
        assert_eq!(Mode::from_config(Some("")), Mode::Txt);
        assert_eq!(Mode::from_config(None), Mode::Txt);
        assert!("xml".parse::<Mode>().is_err());
    }
}
