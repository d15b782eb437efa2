//! Episode metadata records and lookup by slug.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Result;

/// One entry of the episode metadata file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeRecord {
    /// Directory name of the episode page (`episodes/<slug>/`).
    pub slug: String,

    #[serde(alias = "episode")]
    pub number: u32,

    /// Identifier of the embedded video, when the episode has one.
    #[serde(default, alias = "youtube_id", skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// All records of a metadata file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeCatalog {
    pub records: Vec<EpisodeRecord>,
}

impl EpisodeCatalog {
    /// Parse a JSON array of [`EpisodeRecord`]s.
    pub fn from_json(text: &str) -> Result<Self> {
        let records: Vec<EpisodeRecord> = serde_json::from_str(text)?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn find(&self, slug: &str) -> Option<&EpisodeRecord> {
        find_record_by_slug(&self.records, slug)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// First record whose slug matches exactly.
pub fn find_record_by_slug<'a>(records: &'a [EpisodeRecord], slug: &str) -> Option<&'a EpisodeRecord> {
    records.iter().find(|r| r.slug == slug)
}
