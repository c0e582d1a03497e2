//! Adventure-level persistence on top of a story document.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use super::{AdventureStore, Result, StoreError, StoryId, StoryStore};
use crate::core::session::AdventureError;
use crate::schema::adventure::{Adventure, Introduction};
use crate::schema::passage::{Passage, PassageId};

/// Keeps one adventure loaded from a story's JSON content and writes every
/// change back as a full content update.
///
/// Writes are serialized: each one reads the loaded copy, persists the
/// change, and replaces the copy while holding `write_lock`.
pub struct StoryAdventureStore<S: StoryStore> {
    stories: Arc<S>,
    story_id: StoryId,
    adventure: RwLock<Adventure>,
    write_lock: Mutex<()>,
}

impl<S: StoryStore> StoryAdventureStore<S> {
    /// Load the adventure stored under `story_id`.
    ///
    /// A missing story and unreadable content are distinct structural errors.
    pub async fn open(
        stories: Arc<S>,
        story_id: StoryId,
    ) -> std::result::Result<Self, AdventureError> {
        let adventure = load_adventure(stories.as_ref(), story_id).await?;
        Ok(Self {
            stories,
            story_id,
            adventure: RwLock::new(adventure),
            write_lock: Mutex::new(()),
        })
    }

    pub fn story_id(&self) -> StoryId {
        self.story_id
    }

    /// Apply `change` to a copy of the adventure, persist it, and only then
    /// replace the loaded copy.
    async fn write<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Adventure) + Send,
    {
        let _writing = self.write_lock.lock().await;
        let mut next = self.adventure()?;
        change(&mut next);
        let content = next
            .to_json()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.stories.update_content(self.story_id, &content).await?;
        *self
            .adventure
            .write()
            .map_err(|_| StoreError::LockPoisoned)? = next;
        Ok(())
    }
}

/// Read and decode the adventure stored under `story_id`.
pub async fn load_adventure<S: StoryStore + ?Sized>(
    stories: &S,
    story_id: StoryId,
) -> std::result::Result<Adventure, AdventureError> {
    let story = stories
        .get(story_id)
        .await
        .map_err(|e| AdventureError::LoadFailed(e.to_string()))?
        .ok_or(AdventureError::NotFound(story_id))?;
    Adventure::parse_json(&story.content)
        .map_err(|e| AdventureError::LoadFailed(e.to_string()))
}

#[async_trait]
impl<S: StoryStore> AdventureStore for StoryAdventureStore<S> {
    async fn update_passage(&self, id: PassageId, passage: Passage) -> Result<()> {
        self.write(move |adventure| {
            adventure.passages.insert(id, passage);
        })
        .await?;
        tracing::info!(story = %self.story_id, passage = %id, "passage saved");
        Ok(())
    }

    async fn reload_adventure(&self) -> Result<()> {
        let _writing = self.write_lock.lock().await;
        let adventure = load_adventure(self.stories.as_ref(), self.story_id)
            .await
            .map_err(|e| match e {
                AdventureError::NotFound(id) => StoreError::StoryNotFound(id),
                other => StoreError::Serialization(other.to_string()),
            })?;
        *self
            .adventure
            .write()
            .map_err(|_| StoreError::LockPoisoned)? = adventure;
        Ok(())
    }

    async fn update_introduction(&self, intro: Introduction) -> Result<()> {
        self.write(move |adventure| adventure.intro = intro).await
    }

    fn adventure(&self) -> Result<Adventure> {
        self.adventure
            .read()
            .map(|a| a.clone())
            .map_err(|_| StoreError::LockPoisoned)
    }
}
