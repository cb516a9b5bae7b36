//! User profile and portfolio types.
//!
//! A user's portfolio is organized per [`Skill`], each bucket mapping a
//! [`DateKey`] to the [`WorkEntry`] submitted at that minute.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

use crate::error::PortfolioError;
use crate::skill::{Handedness, Skill};

/// Placeholder for reflection and preview note fields nobody has written yet.
pub const NOT_YET_FILLED: &str = "Not yet filled";

/// Format of a [`DateKey`]: minute resolution.
const DATE_KEY_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Deterministic identity of a work entry inside its skill bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(String);

impl DateKey {
    /// Derive the key from a submission time.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(DATE_KEY_FORMAT).to_string())
    }

    /// Validate an externally supplied key (e.g. postback data).
    pub fn parse(s: &str) -> Result<Self, String> {
        NaiveDateTime::parse_from_str(s, DATE_KEY_FORMAT)
            .map(|_| Self(s.to_string()))
            .map_err(|e| format!("invalid date key '{s}': {e}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DateKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DateKey::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.0
    }
}

/// One dated submission within a skill bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub date_key: DateKey,
    pub video_ref: String,
    #[serde(default)]
    pub thumbnail_ref: String,
    pub rating: f32,
    #[serde(default)]
    pub ai_note: String,
    pub preview_note: String,
    pub reflection: String,
}

impl WorkEntry {
    /// A freshly analyzed entry with placeholder notes.
    pub fn new(
        date_key: DateKey,
        video_ref: String,
        thumbnail_ref: String,
        rating: f32,
        ai_note: String,
    ) -> Self {
        Self {
            date_key,
            video_ref,
            thumbnail_ref,
            rating,
            ai_note,
            preview_note: NOT_YET_FILLED.to_string(),
            reflection: NOT_YET_FILLED.to_string(),
        }
    }

    /// Entries are shown in the portfolio only once they carry a video.
    pub fn is_complete(&self) -> bool {
        !self.video_ref.is_empty()
    }
}

/// A single free-text field update for an existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkField {
    Reflection(String),
    PreviewNote(String),
}

impl WorkField {
    /// Overwrite only the targeted field.
    pub fn apply(&self, entry: &mut WorkEntry) {
        match self {
            WorkField::Reflection(text) => entry.reflection = text.clone(),
            WorkField::PreviewNote(text) => entry.preview_note = text.clone(),
        }
    }
}

/// All entries of one user, bucketed by skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    buckets: BTreeMap<Skill, BTreeMap<DateKey, WorkEntry>>,
}

impl Portfolio {
    /// Entries for a skill, oldest first. An empty bucket is an empty map.
    pub fn entries(&self, skill: Skill) -> impl Iterator<Item = &WorkEntry> {
        self.buckets.get(&skill).into_iter().flat_map(|b| b.values())
    }

    pub fn get(&self, skill: Skill, date_key: &DateKey) -> Option<&WorkEntry> {
        self.buckets.get(&skill).and_then(|b| b.get(date_key))
    }

    /// Insert (or replace, for a same-minute resubmission) an entry.
    pub fn insert(&mut self, skill: Skill, entry: WorkEntry) {
        self.buckets
            .entry(skill)
            .or_default()
            .insert(entry.date_key.clone(), entry);
    }

    pub fn update(
        &mut self,
        skill: Skill,
        date_key: &DateKey,
        field: &WorkField,
    ) -> Result<&WorkEntry, PortfolioError> {
        let entry = self
            .buckets
            .get_mut(&skill)
            .and_then(|b| b.get_mut(date_key))
            .ok_or_else(|| PortfolioError::EntryNotFound {
                skill,
                date_key: date_key.to_string(),
            })?;
        field.apply(entry);
        Ok(entry)
    }

    pub fn len(&self, skill: Skill) -> usize {
        self.buckets.get(&skill).map_or(0, BTreeMap::len)
    }
}

/// Object-store folders created for a user at onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFolders {
    pub root: String,
    #[serde(default)]
    pub skills: BTreeMap<Skill, String>,
}

impl UserFolders {
    /// Destination folder for a skill's uploads.
    pub fn folder_for(&self, skill: Skill) -> Result<&str, PortfolioError> {
        self.skills
            .get(&skill)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(PortfolioError::FolderMissing(skill))
    }
}

/// Per-user profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub handedness: Handedness,
    #[serde(default)]
    pub folders: UserFolders,
    #[serde(default)]
    pub portfolio: Portfolio,
    pub created_at: DateTime<Utc>,
}

impl UserData {
    pub fn new(id: impl Into<String>, name: impl Into<String>, folders: UserFolders) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            handedness: Handedness::default(),
            folders,
            portfolio: Portfolio::default(),
            created_at: Utc::now(),
        }
    }
}
