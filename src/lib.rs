//! Adventure Engine: authoring and playtesting for branching adventures.
//!
//! An adventure is a graph of numbered passages joined by choices. Passages
//! can add and remove inventory items as the player arrives. The crate holds
//! the two state engines behind an adventure editor: the navigation engine
//! that derives the player's inventory from the current route, and the
//! passage editor that keeps a validated, change-tracked draft of a passage.

pub mod core;
pub mod schema;
pub mod store;

pub use crate::core::editor::PassageEditor;
pub use crate::core::navigation::NavigationEngine;
pub use crate::core::route::Route;
pub use crate::core::save::{SaveController, SaveError};
pub use crate::core::session::{AdventureError, AdventureErrorKind, PlaySession};
pub use crate::core::validation::ValidationPolicy;
pub use crate::schema::{Adventure, Passage, PassageId};
