//! Play sessions: routing plus inventory tracking over one loaded adventure.

use thiserror::Error;

use crate::core::navigation::{NavigationEngine, Transition};
use crate::core::route::Route;
use crate::schema::adventure::Adventure;
use crate::schema::passage::{Passage, PassageId};
use crate::store::StoryId;

/// Structural errors. Each is fatal to the current view and is rendered by
/// a recovery boundary according to its [`AdventureErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdventureError {
    #[error("adventure failed to load: {0}")]
    LoadFailed(String),
    #[error("adventure not found: {0}")]
    NotFound(StoryId),
    #[error("invalid passage id: {0:?}")]
    InvalidPassageId(String),
    #[error("passage not found: {0}")]
    PassageNotFound(PassageId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdventureErrorKind {
    LoadFailed,
    NotFound,
    InvalidPassageId,
    PassageNotFound,
}

impl AdventureError {
    pub fn kind(&self) -> AdventureErrorKind {
        match self {
            Self::LoadFailed(_) => AdventureErrorKind::LoadFailed,
            Self::NotFound(_) => AdventureErrorKind::NotFound,
            Self::InvalidPassageId(_) => AdventureErrorKind::InvalidPassageId,
            Self::PassageNotFound(_) => AdventureErrorKind::PassageNotFound,
        }
    }

    /// Headline for the full-page error view.
    pub fn title(&self) -> &'static str {
        match self.kind() {
            AdventureErrorKind::LoadFailed => "The adventure could not be loaded",
            AdventureErrorKind::NotFound => "Adventure not found",
            AdventureErrorKind::InvalidPassageId => "Invalid passage",
            AdventureErrorKind::PassageNotFound => "Passage not found",
        }
    }
}

/// One playthrough of an adventure.
///
/// Owns the current route and keeps the inventory synced with it on every
/// navigation.
#[derive(Debug, Clone)]
pub struct PlaySession {
    adventure: Adventure,
    route: Route,
    navigation: NavigationEngine,
}

impl PlaySession {
    /// Start a session at the introduction.
    pub fn new(adventure: Adventure) -> Self {
        let mut navigation = NavigationEngine::new();
        navigation.sync(Some(Route::Introduction), &adventure);
        Self {
            adventure,
            route: Route::Introduction,
            navigation,
        }
    }

    pub fn adventure(&self) -> &Adventure {
        &self.adventure
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn navigation(&self) -> &NavigationEngine {
        &self.navigation
    }

    /// Move to `route`, resetting or applying effects as needed.
    pub fn navigate(&mut self, route: Route) -> Transition {
        self.route = route;
        self.navigation.sync(Some(route), &self.adventure)
    }

    /// Navigate from a raw passage route parameter.
    pub fn open(&mut self, param: &str) -> Result<Transition, AdventureError> {
        let route = Route::parse(param)?;
        Ok(self.navigate(route))
    }

    /// Follow the introduction's action into the first passage.
    ///
    /// An adventure with no passages cannot be started and reports
    /// [`AdventureError::LoadFailed`].
    pub fn begin(&mut self) -> Result<Transition, AdventureError> {
        let first = self.adventure.first_passage_id().ok_or_else(|| {
            AdventureError::LoadFailed("adventure has no passages".to_string())
        })?;
        Ok(self.navigate(Route::Passage(first)))
    }

    /// Return to the introduction, which empties the inventory.
    pub fn restart(&mut self) -> Transition {
        self.navigate(Route::Introduction)
    }

    /// The passage at the current route, or `None` at the introduction.
    pub fn current_passage(&self) -> Result<Option<&Passage>, AdventureError> {
        match self.route {
            Route::Introduction => Ok(None),
            Route::Passage(id) => self
                .adventure
                .passage(id)
                .map(Some)
                .ok_or(AdventureError::PassageNotFound(id)),
        }
    }

    /// Follow choice `index` of the current passage.
    ///
    /// Returns `Ok(None)` when there is no such choice (introduction, endings,
    /// or an out-of-range index). A dangling target surfaces here as
    /// [`AdventureError::PassageNotFound`].
    pub fn choose(&mut self, index: usize) -> Result<Option<Transition>, AdventureError> {
        let goto = match self.current_passage()?.and_then(|p| p.choices().get(index)) {
            Some(choice) => choice.goto,
            None => return Ok(None),
        };
        let route = Route::to_passage(goto);
        if let Route::Passage(id) = route {
            if self.adventure.passage(id).is_none() {
                return Err(AdventureError::PassageNotFound(id));
            }
        }
        Ok(Some(self.navigate(route)))
    }

    pub fn add_item(&mut self, id: &str) {
        self.navigation.add_item(id);
    }

    pub fn remove_item(&mut self, id: &str) {
        self.navigation.remove_item(id);
    }

    /// Display names of carried items, sorted by id.
    pub fn inventory_names(&self) -> Vec<&str> {
        self.navigation
            .sorted_inventory()
            .into_iter()
            .map(|id| self.adventure.item_name(id))
            .collect()
    }

    /// True when the current passage is an ending.
    pub fn is_finished(&self) -> bool {
        matches!(self.current_passage(), Ok(Some(p)) if p.is_ending())
    }
}
