//! Inbound conversation events and postback payloads.
//!
//! Platform adapters translate their webhook payloads into [`InboundEvent`];
//! everything downstream is platform-agnostic.

use chrono::{DateTime, Utc};

use std::fmt;
use std::str::FromStr;

use crate::portfolio::DateKey;
use crate::skill::{Handedness, Skill};

/// One inbound event from a user.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user_id: String,
    pub reply_token: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Follow,
    Message(MessageContent),
    Postback { data: String },
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Video { message_id: String },
    Other(String),
}

/// A video message accepted for ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSubmission {
    pub user_id: String,
    pub reply_token: String,
    pub message_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Menu action a user can pick for a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAction {
    AnalyzeVideo,
    AddReflection,
    AddPreviewNote,
    ViewPortfolio,
    ViewExpertVideo,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::AnalyzeVideo => "analyze_video",
            UserAction::AddReflection => "add_reflection",
            UserAction::AddPreviewNote => "add_preview_note",
            UserAction::ViewPortfolio => "view_portfolio",
            UserAction::ViewExpertVideo => "view_expert_video",
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analyze_video" => Ok(UserAction::AnalyzeVideo),
            "add_reflection" => Ok(UserAction::AddReflection),
            "add_preview_note" => Ok(UserAction::AddPreviewNote),
            "view_portfolio" => Ok(UserAction::ViewPortfolio),
            "view_expert_video" => Ok(UserAction::ViewExpertVideo),
            other => Err(format!("unknown action: '{other}'")),
        }
    }
}

/// Parsed postback data.
///
/// Encoded as a `&`-separated `key=value` list:
/// - `handedness=left&next=analyze_video`
/// - `type=add_reflection&skill=lift`
/// - `type=select_date&date=2024-03-09-14-05`
/// - `type=view_video&skill=lift&date=2024-03-09-14-05`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postback {
    Handedness {
        handedness: Handedness,
        next: UserAction,
    },
    Action {
        action: UserAction,
        skill: Skill,
    },
    SelectDate(DateKey),
    /// Play back the stored video of one portfolio entry.
    ViewVideo {
        skill: Skill,
        date: DateKey,
    },
}

impl Postback {
    /// Encode for use as quick-reply postback data.
    pub fn encode(&self) -> String {
        match self {
            Postback::Handedness { handedness, next } => {
                format!("handedness={handedness}&next={next}")
            }
            Postback::Action { action, skill } => format!("type={action}&skill={skill}"),
            Postback::SelectDate(date) => format!("type=select_date&date={date}"),
            Postback::ViewVideo { skill, date } => {
                format!("type=view_video&skill={skill}&date={date}")
            }
        }
    }

    pub fn parse(data: &str) -> Result<Self, String> {
        let pairs: Vec<(&str, &str)> = data
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| p.split_once('=').unwrap_or((p, "")))
            .collect();
        let get = |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        if let Some(h) = get("handedness") {
            let handedness = h.parse()?;
            let next = get("next")
                .unwrap_or(UserAction::AnalyzeVideo.as_str())
                .parse()?;
            return Ok(Postback::Handedness { handedness, next });
        }

        let skill = || -> Result<Skill, String> {
            get("skill")
                .ok_or("missing skill")?
                .parse()
                .map_err(|e: crate::error::PortfolioError| e.to_string())
        };
        let date = || -> Result<DateKey, String> { DateKey::parse(get("date").ok_or("missing date")?) };

        match get("type") {
            Some("select_date") => Ok(Postback::SelectDate(date()?)),
            Some("view_video") => Ok(Postback::ViewVideo {
                skill: skill()?,
                date: date()?,
            }),
            Some(action) => {
                let action: UserAction = action.parse()?;
                Ok(Postback::Action {
                    action,
                    skill: skill()?,
                })
            }
            None => Err(format!("unrecognized postback data: '{data}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        let pb = Postback::parse("type=add_preview_note&skill=clear").unwrap();
        assert_eq!(
            pb,
            Postback::Action {
                action: UserAction::AddPreviewNote,
                skill: Skill::Clear
            }
        );
    }

    #[test]
    fn test_parse_handedness_defaults_next_to_analyze() {
        let pb = Postback::parse("handedness=left").unwrap();
        assert_eq!(
            pb,
            Postback::Handedness {
                handedness: Handedness::Left,
                next: UserAction::AnalyzeVideo
            }
        );
    }

    #[test]
    fn test_parse_select_date() {
        let pb = Postback::parse("type=select_date&date=2024-03-09-14-05").unwrap();
        assert_eq!(pb, Postback::SelectDate(DateKey::parse("2024-03-09-14-05").unwrap()));
    }

    #[test]
    fn test_parse_rejects_unknown_skill_and_garbage() {
        assert!(Postback::parse("type=analyze_video&skill=smash").is_err());
        assert!(Postback::parse("type=dance&skill=lift").is_err());
        assert!(Postback::parse("hello").is_err());
        assert!(Postback::parse("type=select_date&date=soon").is_err());
    }

    #[test]
    fn test_encode_parse_agree() {
        let pb = Postback::Handedness {
            handedness: Handedness::Right,
            next: UserAction::ViewExpertVideo,
        };
        assert_eq!(Postback::parse(&pb.encode()).unwrap(), pb);
    }

    #[test]
    fn test_view_video_round_trip() {
        let pb = Postback::ViewVideo {
            skill: Skill::Netplay,
            date: DateKey::parse("2024-03-09-14-05").unwrap(),
        };
        assert_eq!(pb.encode(), "type=view_video&skill=netplay&date=2024-03-09-14-05");
        assert_eq!(Postback::parse(&pb.encode()).unwrap(), pb);
        assert!(Postback::parse("type=view_video&skill=lift").is_err());
    }
}
