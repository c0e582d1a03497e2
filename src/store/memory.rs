//! In-memory StoryStore implementation for tests and local runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{Result, StoreError, Story, StoryId, StoryStore};

/// In-memory implementation of StoryStore.
///
/// Ids are handed out sequentially starting at 1.
pub struct InMemoryStoryStore {
    stories: RwLock<HashMap<StoryId, Story>>,
    next_id: RwLock<u64>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self {
            stories: RwLock::new(HashMap::new()),
            next_id: RwLock::new(1),
        }
    }

    fn touch<F>(&self, id: StoryId, update: F) -> Result<()>
    where
        F: FnOnce(&mut Story),
    {
        let mut stories = self
            .stories
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let story = stories.get_mut(&id).ok_or(StoreError::StoryNotFound(id))?;
        update(story);
        story.last_edited = Utc::now();
        Ok(())
    }
}

impl Default for InMemoryStoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryStore for InMemoryStoryStore {
    async fn create(&self, title: &str, content: &str) -> Result<StoryId> {
        let id = {
            let mut next = self
                .next_id
                .write()
                .map_err(|_| StoreError::LockPoisoned)?;
            let id = StoryId(*next);
            *next += 1;
            id
        };
        let now = Utc::now();
        let story = Story {
            id,
            title: title.to_string(),
            content: content.to_string(),
            last_edited: now,
            created_at: now,
        };
        self.stories
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(id, story);
        tracing::debug!(story = %id, title, "created story");
        Ok(id)
    }

    async fn get(&self, id: StoryId) -> Result<Option<Story>> {
        let stories = self
            .stories
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(stories.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Story>> {
        let stories = self
            .stories
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        let mut all: Vec<Story> = stories.values().cloned().collect();
        all.sort_by(|a, b| b.last_edited.cmp(&a.last_edited).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn delete(&self, id: StoryId) -> Result<()> {
        self.stories
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .remove(&id);
        Ok(())
    }

    async fn update_content(&self, id: StoryId, content: &str) -> Result<()> {
        self.touch(id, |story| story.content = content.to_string())
    }

    async fn update_title(&self, id: StoryId, title: &str) -> Result<()> {
        self.touch(id, |story| story.title = title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get() {
        let store = InMemoryStoryStore::new();
        let id = store.create("Cellar", "{}").await.unwrap();
        let story = store.get(id).await.unwrap().unwrap();
        assert_eq!(story.title, "Cellar");
        assert_eq!(story.content, "{}");
        assert_eq!(story.created_at, story.last_edited);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = InMemoryStoryStore::new();
        assert!(store.get(StoryId(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_orders_by_last_edited_desc() {
        let store = InMemoryStoryStore::new();
        let first = store.create("first", "").await.unwrap();
        let second = store.create("second", "").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.update_title(first, "first, edited").await.unwrap();

        let ids: Vec<StoryId> = store.list().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn update_bumps_last_edited() {
        let store = InMemoryStoryStore::new();
        let id = store.create("t", "a").await.unwrap();
        let before = store.get(id).await.unwrap().unwrap().last_edited;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.update_content(id, "b").await.unwrap();
        let after = store.get(id).await.unwrap().unwrap();
        assert_eq!(after.content, "b");
        assert!(after.last_edited > before);
    }

    #[tokio::test]
    async fn update_missing_story_fails() {
        let store = InMemoryStoryStore::new();
        let err = store.update_title(StoryId(9), "x").await.unwrap_err();
        assert!(matches!(err, StoreError::StoryNotFound(StoryId(9))));
    }

    #[tokio::test]
    async fn delete_removes_story() {
        let store = InMemoryStoryStore::new();
        let id = store.create("t", "").await.unwrap();
        store.delete(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }
}
