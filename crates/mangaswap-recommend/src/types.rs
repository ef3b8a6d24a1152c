//! Catalog, profile and recommendation types.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mangaswap_core::{Error, Result};

/// Most recent search queries / viewed ids kept on a profile.
pub const MAX_BEHAVIOR_ITEMS: usize = 50;

/// A catalog item. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub demographic: String,
    #[serde(default)]
    pub themes: Vec<String>,
    /// 0-10.
    pub rating: f64,
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub similar_mangas: Vec<String>,
}

impl Manga {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("manga id is empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation(format!("manga {} has no title", self.id)));
        }
        if !(0.0..=10.0).contains(&self.rating) {
            return Err(Error::Validation(format!(
                "manga {} rating {} outside 0-10",
                self.id, self.rating
            )));
        }
        Ok(())
    }
}

/// Explicit taste declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub genres: Vec<String>,
    pub authors: Vec<String>,
    pub demographics: Vec<String>,
    pub themes: Vec<String>,
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
            && self.authors.is_empty()
            && self.demographics.is_empty()
            && self.themes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingEntry {
    pub manga_id: String,
    /// 0-10.
    pub rating: f64,
    #[serde(default)]
    pub completed: bool,
    pub date_read: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeEntry {
    pub manga_id: String,
    pub partner_id: String,
    /// 0-10.
    pub rating: f64,
    #[serde(default)]
    pub successful: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BehaviorData {
    pub search_queries: Vec<String>,
    pub viewed_mangas: Vec<String>,
    /// Genre -> seconds spent.
    pub time_spent_on_genres: HashMap<String, u64>,
    /// Seconds.
    pub average_session_time: f64,
}

/// Input to the scorer. Updated only through explicit calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub reading_history: Vec<ReadingEntry>,
    #[serde(default)]
    pub exchange_history: Vec<ExchangeEntry>,
    #[serde(default, rename = "behaviorData")]
    pub behavior: BehaviorData,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            preferences: Preferences::default(),
            reading_history: Vec::new(),
            exchange_history: Vec::new(),
            behavior: BehaviorData::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("profile id is empty".into()));
        }
        for entry in &self.reading_history {
            if !(0.0..=10.0).contains(&entry.rating) {
                return Err(Error::Validation(format!(
                    "profile {}: rating {} for {} outside 0-10",
                    self.id, entry.rating, entry.manga_id
                )));
            }
        }
        for entry in &self.exchange_history {
            if !(0.0..=10.0).contains(&entry.rating) {
                return Err(Error::Validation(format!(
                    "profile {}: exchange rating {} for {} outside 0-10",
                    self.id, entry.rating, entry.manga_id
                )));
            }
        }
        Ok(())
    }

    /// Ids of every manga in the reading history.
    pub fn read_ids(&self) -> HashSet<&str> {
        self.reading_history
            .iter()
            .map(|e| e.manga_id.as_str())
            .collect()
    }

    pub fn has_read(&self, manga_id: &str) -> bool {
        self.reading_history.iter().any(|e| e.manga_id == manga_id)
    }

    /// True when there is nothing to personalise on.
    pub fn is_cold(&self) -> bool {
        self.preferences.is_empty()
            && self.reading_history.is_empty()
            && self.exchange_history.is_empty()
    }

    /// Mean reading-history rating, if any.
    pub fn average_rating(&self) -> Option<f64> {
        if self.reading_history.is_empty() {
            return None;
        }
        let total: f64 = self.reading_history.iter().map(|e| e.rating).sum();
        Some(total / self.reading_history.len() as f64)
    }

    /// Add or replace the history entry for `entry.manga_id`.
    pub fn record_reading(&mut self, entry: ReadingEntry) {
        self.reading_history.retain(|e| e.manga_id != entry.manga_id);
        self.reading_history.push(entry);
    }

    pub fn record_exchange(&mut self, entry: ExchangeEntry) {
        self.exchange_history.push(entry);
    }

    pub fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        push_bounded(&mut self.behavior.search_queries, query.to_string());
    }

    /// Most recent view last; repeated views move the id to the end.
    pub fn record_view(&mut self, manga_id: &str) {
        self.behavior.viewed_mangas.retain(|id| id != manga_id);
        push_bounded(&mut self.behavior.viewed_mangas, manga_id.to_string());
    }

    pub fn add_genre_time(&mut self, genre: &str, seconds: u64) {
        *self
            .behavior
            .time_spent_on_genres
            .entry(genre.to_string())
            .or_insert(0) += seconds;
    }

    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }
}

fn push_bounded(items: &mut Vec<String>, item: String) {
    items.push(item);
    if items.len() > MAX_BEHAVIOR_ITEMS {
        let excess = items.len() - MAX_BEHAVIOR_ITEMS;
        items.drain(..excess);
    }
}

/// Why an item was recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trending,
    Similar,
    GenreMatch,
    AuthorMatch,
    Collaborative,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trending => write!(f, "trending"),
            Self::Similar => write!(f, "similar"),
            Self::GenreMatch => write!(f, "genre_match"),
            Self::AuthorMatch => write!(f, "author_match"),
            Self::Collaborative => write!(f, "collaborative"),
        }
    }
}

/// One ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationScore {
    pub manga_id: String,
    pub score: f64,
    pub reasons: Vec<String>,
    /// 0-1.
    pub confidence: f64,
    pub category: Category,
}

/// A partner holding a manga worth swapping for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeMatch {
    pub partner_id: String,
    pub manga_id: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// User interaction events the engine tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    View,
    Like,
    Unlike,
}
