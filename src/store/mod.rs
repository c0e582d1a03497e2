//! Persistence collaborators: the story document store and the
//! adventure-level operations built on top of it.
//!
//! Implementations plug in behind [`StoryStore`] and [`AdventureStore`] so
//! the editor can run against a browser database, files, or the in-memory
//! store used by tests and tools.

pub mod memory;
pub mod story;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::schema::adventure::{Adventure, Introduction};
use crate::schema::passage::{Passage, PassageId};

pub use memory::InMemoryStoryStore;
pub use story::StoryAdventureStore;

/// Newtype wrapper for story document IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub u64);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored story document. `content` holds the adventure as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub content: String,
    pub last_edited: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Errors surfaced by persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("story not found: {0}")]
    StoryNotFound(StoryId),

    #[error("store lock was poisoned")]
    LockPoisoned,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Key-value store of story documents.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Create a story and return its new id.
    async fn create(&self, title: &str, content: &str) -> Result<StoryId>;

    async fn get(&self, id: StoryId) -> Result<Option<Story>>;

    /// All stories, most recently edited first.
    async fn list(&self) -> Result<Vec<Story>>;

    async fn delete(&self, id: StoryId) -> Result<()>;

    /// Replace the content and bump `last_edited`.
    async fn update_content(&self, id: StoryId, content: &str) -> Result<()>;

    /// Replace the title and bump `last_edited`.
    async fn update_title(&self, id: StoryId, title: &str) -> Result<()>;
}

/// Adventure-level persistence used by the editor.
#[async_trait]
pub trait AdventureStore: Send + Sync {
    /// Insert or replace one passage.
    async fn update_passage(&self, id: PassageId, passage: Passage) -> Result<()>;

    /// Re-read the adventure from the backing store.
    async fn reload_adventure(&self) -> Result<()>;

    async fn update_introduction(&self, intro: Introduction) -> Result<()>;

    /// Snapshot of the currently loaded adventure.
    fn adventure(&self) -> Result<Adventure>;
}
