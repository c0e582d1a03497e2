//! Player-facing routes: the introduction and numbered passages.

use std::fmt;

use crate::core::session::AdventureError;
use crate::schema::passage::PassageId;

/// A location inside one adventure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Introduction,
    Passage(PassageId),
}

impl Route {
    /// Route reached by following a choice. The reserved id `0` leads back
    /// to the introduction.
    pub fn to_passage(id: PassageId) -> Route {
        if id.is_reset() {
            Route::Introduction
        } else {
            Route::Passage(id)
        }
    }

    /// Strictly parse a passage route parameter.
    ///
    /// Anything that is not a non-negative integer is a structural error;
    /// `"0"` resolves to the introduction.
    pub fn parse(param: &str) -> Result<Route, AdventureError> {
        param
            .parse::<u32>()
            .map(|n| Route::to_passage(PassageId(n)))
            .map_err(|_| AdventureError::InvalidPassageId(param.to_string()))
    }

    pub fn passage_id(&self) -> Option<PassageId> {
        match self {
            Route::Introduction => None,
            Route::Passage(id) => Some(*id),
        }
    }

    pub fn is_introduction(&self) -> bool {
        matches!(self, Route::Introduction)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Introduction => write!(f, "intro"),
            Route::Passage(id) => write!(f, "passage/{}", id),
        }
    }
}

/// Lenient form of [`Route::parse`] used where a bad parameter must not
/// become a key: unparseable or reserved ids mean "no current passage".
pub fn normalize_passage_param(param: Option<&str>) -> Option<PassageId> {
    param
        .and_then(|p| p.trim().parse::<u32>().ok())
        .map(PassageId)
        .filter(|id| !id.is_reset())
}
