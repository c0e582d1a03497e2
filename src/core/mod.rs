//! State engines: playthrough navigation, passage editing, and saving.

pub mod editor;
pub mod lint;
pub mod navigation;
pub mod route;
pub mod save;
pub mod session;
pub mod validation;
