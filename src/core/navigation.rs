//! Runtime navigation: the player's inventory as a function of route and graph.
//!
//! The inventory is derived, session-scoped state. Every route change goes
//! through [`NavigationEngine::sync`], which compares the new session key
//! against the previous one and performs the reset or the effect replay in the
//! same call, so a fresh introduction is never observed with stale items.

use rustc_hash::FxHashSet;

use crate::core::route::Route;
use crate::schema::adventure::Adventure;
use crate::schema::passage::{EffectKind, Passage, PassageId};

/// Identity of the current play step. A change of key is what triggers
/// a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Intro,
    Passage(PassageId),
    /// A passage route whose id could not be resolved.
    Detached,
}

impl SessionKey {
    pub fn from_route(route: Option<Route>) -> SessionKey {
        match route {
            Some(Route::Introduction) => SessionKey::Intro,
            Some(Route::Passage(id)) if !id.is_reset() => SessionKey::Passage(id),
            Some(Route::Passage(_)) => SessionKey::Intro,
            None => SessionKey::Detached,
        }
    }
}

/// What a call to [`NavigationEngine::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same key as before; nothing was applied.
    Unchanged,
    /// Arrived at the introduction; the inventory was cleared.
    Reset,
    /// Arrived at a passage and applied its effects.
    Arrived {
        passage: PassageId,
        effects_applied: usize,
    },
    /// New key with nothing to apply (ending, missing passage, or no passage).
    Idle,
}

/// Tracks the player's inventory across passage transitions.
#[derive(Debug, Clone, Default)]
pub struct NavigationEngine {
    inventory: FxHashSet<String>,
    session_key: Option<SessionKey>,
}

impl NavigationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The key of the last synced route, if any route was synced yet.
    pub fn session_key(&self) -> Option<SessionKey> {
        self.session_key
    }

    pub fn inventory(&self) -> &FxHashSet<String> {
        &self.inventory
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.inventory.contains(id)
    }

    /// Inventory ids in a stable (sorted) order, for display.
    pub fn sorted_inventory(&self) -> Vec<&str> {
        let mut items: Vec<&str> = self.inventory.iter().map(String::as_str).collect();
        items.sort_unstable();
        items
    }

    /// Bring the inventory in line with `route`.
    ///
    /// `None` is a passage route whose id did not parse. Effects are applied
    /// only when the key differs from the previous call, so re-syncing the
    /// same passage never applies them twice.
    pub fn sync(&mut self, route: Option<Route>, adventure: &Adventure) -> Transition {
        let key = SessionKey::from_route(route);
        if self.session_key == Some(key) {
            return Transition::Unchanged;
        }
        self.session_key = Some(key);

        match key {
            SessionKey::Intro => {
                tracing::debug!(cleared = self.inventory.len(), "entered introduction");
                self.inventory.clear();
                Transition::Reset
            }
            SessionKey::Passage(id) => self.arrive(id, adventure),
            SessionKey::Detached => Transition::Idle,
        }
    }

    fn arrive(&mut self, id: PassageId, adventure: &Adventure) -> Transition {
        let passage = match adventure.passage(id) {
            Some(Passage::Regular(p)) => p,
            Some(Passage::Ending(_)) => return Transition::Idle,
            None => {
                tracing::warn!(passage = %id, "no passage to apply effects from");
                return Transition::Idle;
            }
        };

        for effect in &passage.effects {
            match effect.kind {
                EffectKind::AddItem => self.add_item(&effect.item),
                EffectKind::RemoveItem => self.remove_item(&effect.item),
            }
        }
        tracing::debug!(
            passage = %id,
            effects = passage.effects.len(),
            inventory = self.inventory.len(),
            "arrived at passage"
        );
        Transition::Arrived {
            passage: id,
            effects_applied: passage.effects.len(),
        }
    }

    /// Manual override used by the debug inspector. Idempotent.
    pub fn add_item(&mut self, id: &str) {
        if !self.inventory.contains(id) {
            self.inventory.insert(id.to_string());
        }
    }

    /// Manual override used by the debug inspector. No-op when absent.
    pub fn remove_item(&mut self, id: &str) {
        self.inventory.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::passage::{Choice, Effect, EndingPassage, RegularPassage};

    fn regular(effects: Vec<Effect>, goto: u32) -> Passage {
        Passage::Regular(RegularPassage {
            paragraphs: vec!["text".to_string()],
            notes: None,
            choices: vec![Choice {
                text: "next".to_string(),
                goto: PassageId(goto),
            }],
            effects,
        })
    }

    fn make_adventure() -> Adventure {
        let mut adventure = Adventure::default();
        adventure
            .passages
            .insert(PassageId(1), regular(vec![Effect::add("lamp")], 2));
        adventure.passages.insert(
            PassageId(2),
            regular(vec![Effect::add("key"), Effect::remove("lamp")], 3),
        );
        adventure.passages.insert(
            PassageId(3),
            Passage::Ending(EndingPassage {
                paragraphs: vec!["fin".to_string()],
                ..Default::default()
            }),
        );
        adventure
    }

    #[test]
    fn effects_apply_in_order() {
        let adventure = make_adventure();
        let mut nav = NavigationEngine::new();
        nav.sync(Some(Route::Passage(PassageId(1))), &adventure);
        assert!(nav.has_item("lamp"));

        let t = nav.sync(Some(Route::Passage(PassageId(2))), &adventure);
        assert_eq!(
            t,
            Transition::Arrived {
                passage: PassageId(2),
                effects_applied: 2
            }
        );
        assert_eq!(nav.sorted_inventory(), vec!["key"]);
    }

    #[test]
    fn same_key_is_not_reapplied() {
        let adventure = make_adventure();
        let mut nav = NavigationEngine::new();
        nav.sync(Some(Route::Passage(PassageId(1))), &adventure);
        nav.remove_item("lamp");
        assert_eq!(
            nav.sync(Some(Route::Passage(PassageId(1))), &adventure),
            Transition::Unchanged
        );
        assert!(!nav.has_item("lamp"));
    }

    #[test]
    fn introduction_clears_in_same_call() {
        let adventure = make_adventure();
        let mut nav = NavigationEngine::new();
        nav.sync(Some(Route::Passage(PassageId(1))), &adventure);
        nav.add_item("debug-coin");
        assert_eq!(nav.sync(Some(Route::Introduction), &adventure), Transition::Reset);
        assert!(nav.inventory().is_empty());
        assert_eq!(nav.session_key(), Some(SessionKey::Intro));
    }

    #[test]
    fn ending_and_missing_passages_apply_nothing() {
        let adventure = make_adventure();
        let mut nav = NavigationEngine::new();
        nav.add_item("rope");
        assert_eq!(
            nav.sync(Some(Route::Passage(PassageId(3))), &adventure),
            Transition::Idle
        );
        assert_eq!(
            nav.sync(Some(Route::Passage(PassageId(99))), &adventure),
            Transition::Idle
        );
        assert_eq!(nav.sorted_inventory(), vec!["rope"]);
    }

    #[test]
    fn detached_key_stabilizes() {
        let adventure = make_adventure();
        let mut nav = NavigationEngine::new();
        nav.add_item("rope");
        assert_eq!(nav.sync(None, &adventure), Transition::Idle);
        assert_eq!(nav.sync(None, &adventure), Transition::Unchanged);
        assert!(nav.has_item("rope"));
    }

    #[test]
    fn manual_overrides_are_idempotent() {
        let mut nav = NavigationEngine::new();
        nav.add_item("gem");
        nav.add_item("gem");
        assert_eq!(nav.inventory().len(), 1);
        nav.remove_item("gem");
        nav.remove_item("gem");
        assert!(nav.inventory().is_empty());
    }
}
