use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::passage::{Passage, PassageId};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("passage id 0 is reserved for the introduction")]
    ReservedPassageId,
    #[error("ending passages cannot carry choices or effects")]
    EndingWithChoices,
    #[error("only ending passages can have an ending type")]
    EndingTypeOnRegular,
    #[error("paragraph {0} is empty")]
    EmptyParagraph(usize),
}

/// Descriptive information shown on the story list and title page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub version: String,
}

/// The entry point of an adventure, outside the numbered passage space.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Introduction {
    pub paragraphs: Vec<String>,
    /// Label of the action that starts the adventure.
    pub action: String,
}

/// An item the player can carry. Effects refer to items by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
}

/// A complete branching adventure: introduction, passage graph, and the
/// catalogue of inventory items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adventure {
    pub metadata: Metadata,
    pub intro: Introduction,
    pub passages: BTreeMap<PassageId, Passage>,
    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

impl Adventure {
    /// Load an adventure from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Adventure, SchemaError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse an adventure from a RON string.
    pub fn parse_ron(input: &str) -> Result<Adventure, SchemaError> {
        let adventure: Adventure = ron::from_str(input)?;
        adventure.check()?;
        Ok(adventure)
    }

    /// Parse an adventure from JSON story content.
    pub fn parse_json(input: &str) -> Result<Adventure, SchemaError> {
        let adventure: Adventure = serde_json::from_str(input)?;
        adventure.check()?;
        Ok(adventure)
    }

    /// Serialize to the JSON content stored alongside a story.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string(self)?)
    }

    fn check(&self) -> Result<(), SchemaError> {
        if self.passages.contains_key(&PassageId::RESET) {
            return Err(SchemaError::ReservedPassageId);
        }
        Ok(())
    }

    pub fn passage(&self, id: PassageId) -> Option<&Passage> {
        self.passages.get(&id)
    }

    /// The passage the introduction's action leads to: the lowest id.
    pub fn first_passage_id(&self) -> Option<PassageId> {
        self.passages.keys().next().copied()
    }

    pub fn item(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Display name for an item id, falling back to the id itself.
    pub fn item_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.item(id).map(|item| item.name.as_str()).unwrap_or(id)
    }
}
