//! Skill and handedness types.
//!
//! A skill is a badminton technique category under which a user's portfolio
//! and storage folders are organized. The set is closed: every lookup keyed
//! by [`Skill`] is total, and parsing an unknown name is an explicit error.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::PortfolioError;

/// A technique category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Lift,
    Drop,
    Netplay,
    Clear,
    Footwork,
}

impl Skill {
    /// Every skill, in menu order.
    pub const ALL: [Skill; 5] = [
        Skill::Lift,
        Skill::Drop,
        Skill::Netplay,
        Skill::Clear,
        Skill::Footwork,
    ];

    /// Wire name used in postback data, query parameters, and storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Lift => "lift",
            Skill::Drop => "drop",
            Skill::Netplay => "netplay",
            Skill::Clear => "clear",
            Skill::Footwork => "footwork",
        }
    }

    /// Human-readable label for replies.
    pub fn label(&self) -> &'static str {
        match self {
            Skill::Lift => "Lift",
            Skill::Drop => "Drop shot",
            Skill::Netplay => "Net play",
            Skill::Clear => "Clear",
            Skill::Footwork => "Footwork",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skill {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lift" => Ok(Skill::Lift),
            "drop" => Ok(Skill::Drop),
            "netplay" => Ok(Skill::Netplay),
            "clear" => Ok(Skill::Clear),
            "footwork" => Ok(Skill::Footwork),
            other => Err(PortfolioError::UnknownSkill(other.to_string())),
        }
    }
}

/// Which hand the player swings with. Sent to the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left-handed",
            Handedness::Right => "Right-handed",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Handedness::Left),
            "right" => Ok(Handedness::Right),
            other => Err(format!("invalid handedness: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_roundtrip() {
        for skill in Skill::ALL {
            let parsed: Skill = skill.to_string().parse().unwrap();
            assert_eq!(parsed, skill);
        }
    }

    #[test]
    fn test_unknown_skill_is_explicit_error() {
        let err = "smash".parse::<Skill>().unwrap_err();
        assert!(matches!(err, PortfolioError::UnknownSkill(ref s) if s == "smash"));
    }

    #[test]
    fn test_skill_serde_lowercase() {
        let json = serde_json::to_string(&Skill::Netplay).unwrap();
        assert_eq!(json, "\"netplay\"");
    }

    #[test]
    fn test_handedness_default_and_parse() {
        assert_eq!(Handedness::default(), Handedness::Right);
        assert_eq!("LEFT".parse::<Handedness>().unwrap(), Handedness::Left);
        assert!("both".parse::<Handedness>().is_err());
    }
}
