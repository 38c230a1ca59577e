use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The single irreversible decision recorded at the end of the journey.
///
/// Older blobs spelled the options `yes` and `not_yet`; both spellings are
/// still accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalChoice {
    #[serde(rename = "accept", alias = "yes")]
    Accept,
    #[serde(rename = "also-accept", alias = "not_yet")]
    AlsoAccept,
}

impl FinalChoice {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::AlsoAccept => "also-accept",
        }
    }
}

impl fmt::Display for FinalChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a choice from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChoiceError {
    pub got: String,
}

impl fmt::Display for ParseChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid final choice: '{}'", self.got)
    }
}

impl std::error::Error for ParseChoiceError {}

impl FromStr for FinalChoice {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "yes" => Ok(Self::Accept),
            "also-accept" | "also_accept" | "not_yet" | "not-yet" => Ok(Self::AlsoAccept),
            _ => Err(ParseChoiceError { got: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_legacy_spellings() {
        assert_eq!("accept".parse::<FinalChoice>(), Ok(FinalChoice::Accept));
        assert_eq!("YES".parse::<FinalChoice>(), Ok(FinalChoice::Accept));
        assert_eq!("also-accept".parse::<FinalChoice>(), Ok(FinalChoice::AlsoAccept));
        assert_eq!("not_yet".parse::<FinalChoice>(), Ok(FinalChoice::AlsoAccept));
        assert!("maybe".parse::<FinalChoice>().is_err());
    }

    #[test]
    fn serializes_canonical_spelling() {
        let json = serde_json::to_string(&FinalChoice::AlsoAccept).unwrap();
        assert_eq!(json, "\"also-accept\"");
    }

    #[test]
    fn deserializes_legacy_spelling() {
        let choice: FinalChoice = serde_json::from_str("\"not_yet\"").unwrap();
        assert_eq!(choice, FinalChoice::AlsoAccept);
        let choice: FinalChoice = serde_json::from_str("\"yes\"").unwrap();
        assert_eq!(choice, FinalChoice::Accept);
    }
}
