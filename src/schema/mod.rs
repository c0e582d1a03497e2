//! Adventure data model: the passage graph, its items, and their wire shape.

pub mod adventure;
pub mod passage;

pub use adventure::{Adventure, InventoryItem, Introduction, Metadata, SchemaError};
pub use passage::{
    Choice, Effect, EffectKind, EndingPassage, EndingType, Passage, PassageId, RegularPassage,
};
