//! WASM bindings for adventure-engine: the passage editor and the playtest
//! session, driven from the browser with JSON in and JSON out.

use wasm_bindgen::prelude::*;

use adventure_engine::core::editor::{PassageDraft, PassageEditor};
use adventure_engine::core::lint::lint_adventure;
use adventure_engine::core::navigation::Transition;
use adventure_engine::core::route::Route;
use adventure_engine::core::save::{prepare_passage, SaveError};
use adventure_engine::core::session::PlaySession;
use adventure_engine::core::validation::{PolicyConfig, ValidationPolicy};
use adventure_engine::schema::{Adventure, EffectKind, EndingType, Passage, PassageId};

// ---------------------------------------------------------------------------
// Embedded demo adventure, compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const LIGHTHOUSE: &str = include_str!("../../tests/fixtures/lighthouse.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct EditorState<'a> {
    passage_id: u32,
    draft: &'a PassageDraft,
    has_changes: bool,
}

#[derive(serde::Serialize)]
struct PrepareResult {
    ok: bool,
    passage: Option<Passage>,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct ItemView {
    id: String,
    name: String,
}

#[derive(serde::Serialize)]
struct ChoiceView {
    index: usize,
    text: String,
    goto: u32,
}

#[derive(serde::Serialize)]
struct SceneView {
    /// "intro" or "passage/N".
    route: String,
    title: String,
    paragraphs: Vec<String>,
    action: Option<String>,
    choices: Vec<ChoiceView>,
    is_ending: bool,
    ending_type: Option<EndingType>,
    inventory: Vec<ItemView>,
}

#[derive(serde::Serialize)]
struct ErrorView {
    kind: String,
    title: String,
    message: String,
}

#[derive(serde::Serialize)]
struct LintView {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn serialize<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn parse_adventure(adventure_json: &str) -> Result<Adventure, JsError> {
    Adventure::parse_json(adventure_json)
        .map_err(|e| JsError::new(&format!("Invalid adventure JSON: {e}")))
}

fn transition_label(t: Transition) -> &'static str {
    match t {
        Transition::Unchanged => "unchanged",
        Transition::Reset => "reset",
        Transition::Arrived { .. } => "arrived",
        Transition::Idle => "idle",
    }
}

// ---------------------------------------------------------------------------
// AdventureEditor: one passage draft plus the policy it is checked against
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct AdventureEditor {
    editor: PassageEditor,
    policy: ValidationPolicy,
}

#[wasm_bindgen]
impl AdventureEditor {
    /// Open an editor on a passage given as JSON.
    ///
    /// `policy_json` is optional; when omitted the default policy applies.
    /// ```json
    /// { "require_ending_type": true, "reject_duplicate_effects": true }
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(
        passage_id: u32,
        passage_json: &str,
        policy_json: Option<String>,
    ) -> Result<AdventureEditor, JsError> {
        if passage_id == 0 {
            return Err(JsError::new("Passage id 0 is reserved for the introduction"));
        }
        let passage: Passage = serde_json::from_str(passage_json)
            .map_err(|e| JsError::new(&format!("Invalid passage JSON: {e}")))?;
        let policy = match policy_json {
            Some(json) => {
                let config: PolicyConfig = serde_json::from_str(&json)
                    .map_err(|e| JsError::new(&format!("Invalid policy JSON: {e}")))?;
                ValidationPolicy::from_config(&config)
            }
            None => ValidationPolicy::default(),
        };
        Ok(AdventureEditor {
            editor: PassageEditor::new(PassageId(passage_id), passage),
            policy,
        })
    }

    /// Current draft, its inline errors, and whether it differs from the
    /// original passage.
    pub fn state(&self) -> Result<String, JsError> {
        serialize(&EditorState {
            passage_id: self.editor.passage_id().0,
            draft: self.editor.draft(),
            has_changes: self.editor.has_changes(),
        })
    }

    pub fn has_changes(&self) -> bool {
        self.editor.has_changes()
    }

    pub fn set_text(&mut self, text: &str) {
        self.editor.set_text(text);
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.editor.set_notes(notes);
    }

    pub fn set_ending_type(&mut self, ending_type: &str) {
        self.editor.set_ending_type(ending_type);
    }

    pub fn set_is_ending(&mut self, is_ending: bool) {
        self.editor.set_is_ending(is_ending);
    }

    pub fn add_choice(&mut self) {
        self.editor.add_choice();
    }

    pub fn remove_choice(&mut self, index: usize) {
        self.editor.remove_choice(index);
    }

    pub fn set_choice_text(&mut self, index: usize, text: &str) {
        self.editor.set_choice_text(index, text);
    }

    /// Set a choice target from the raw contents of its number input.
    pub fn set_choice_goto(&mut self, index: usize, input: &str) {
        self.editor.set_choice_goto_input(index, input);
    }

    /// Index of the choice row that should receive focus, once.
    pub fn take_pending_focus(&mut self) -> Option<usize> {
        self.editor.take_pending_focus()
    }

    pub fn add_effect(&mut self) {
        self.editor.add_effect();
    }

    pub fn remove_effect(&mut self, index: usize) {
        self.editor.remove_effect(index);
    }

    pub fn set_effect_kind(&mut self, index: usize, kind: &str) {
        self.editor.set_effect_kind_input(index, kind);
    }

    pub fn set_effect_item(&mut self, index: usize, item: &str) {
        self.editor.set_effect_item(index, item);
    }

    pub fn reset(&mut self) {
        self.editor.reset_state();
    }

    /// Validate the draft and, when valid, return the passage to persist.
    /// Errors are written back into the draft either way.
    pub fn prepare(&mut self) -> Result<String, JsError> {
        let result = match prepare_passage(&mut self.editor, &self.policy) {
            Ok(passage) => PrepareResult {
                ok: true,
                passage: Some(passage),
                error: None,
            },
            Err(e @ SaveError::Invalid) => PrepareResult {
                ok: false,
                passage: None,
                error: Some(e.to_string()),
            },
            Err(e) => return Err(JsError::new(&e.to_string())),
        };
        serialize(&result)
    }

    /// Accept a passage the host has persisted as the new original.
    pub fn rebase(&mut self, passage_json: &str) -> Result<(), JsError> {
        let passage: Passage = serde_json::from_str(passage_json)
            .map_err(|e| JsError::new(&format!("Invalid passage JSON: {e}")))?;
        self.editor.rebase(passage);
        Ok(())
    }

    /// Return JSON array of ending type names.
    pub fn ending_types() -> String {
        let names: Vec<&str> = EndingType::ALL.iter().map(|t| t.as_str()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of effect type names.
    pub fn effect_types() -> String {
        serde_json::to_string(&[EffectKind::AddItem.as_str(), EffectKind::RemoveItem.as_str()])
            .unwrap_or_else(|_| "[]".to_string())
    }
}

// ---------------------------------------------------------------------------
// Playtest: a play session over an adventure document
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct Playtest {
    session: PlaySession,
}

#[wasm_bindgen]
impl Playtest {
    #[wasm_bindgen(constructor)]
    pub fn new(adventure_json: &str) -> Result<Playtest, JsError> {
        Ok(Playtest {
            session: PlaySession::new(parse_adventure(adventure_json)?),
        })
    }

    /// A session over the bundled demo adventure.
    pub fn demo() -> Result<Playtest, JsError> {
        let adventure = Adventure::parse_ron(data::LIGHTHOUSE)
            .map_err(|e| JsError::new(&format!("Demo adventure error: {e}")))?;
        Ok(Playtest {
            session: PlaySession::new(adventure),
        })
    }

    /// The adventure document as JSON, for handing to an editor.
    pub fn adventure_json(&self) -> Result<String, JsError> {
        self.session
            .adventure()
            .to_json()
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Navigate to a raw route parameter. `"0"` returns to the introduction.
    /// Returns the transition name.
    pub fn open(&mut self, param: &str) -> Result<String, JsError> {
        match self.session.open(param) {
            Ok(t) => Ok(transition_label(t).to_string()),
            Err(e) => Err(JsError::new(&e.to_string())),
        }
    }

    pub fn begin(&mut self) -> Result<String, JsError> {
        match self.session.begin() {
            Ok(t) => Ok(transition_label(t).to_string()),
            Err(e) => Err(JsError::new(&e.to_string())),
        }
    }

    pub fn restart(&mut self) -> String {
        transition_label(self.session.restart()).to_string()
    }

    /// Follow a choice of the current passage. Returns `"none"` when there is
    /// no such choice.
    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        match self.session.choose(index) {
            Ok(Some(t)) => Ok(transition_label(t).to_string()),
            Ok(None) => Ok("none".to_string()),
            Err(e) => Err(JsError::new(&e.to_string())),
        }
    }

    pub fn add_item(&mut self, id: &str) {
        self.session.add_item(id);
    }

    pub fn remove_item(&mut self, id: &str) {
        self.session.remove_item(id);
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Everything needed to render the current step, or an error view when
    /// the route does not resolve.
    pub fn scene(&self) -> Result<String, JsError> {
        let adventure = self.session.adventure();
        let route = self.session.route();
        let passage = match self.session.current_passage() {
            Ok(p) => p,
            Err(e) => {
                return serialize(&ErrorView {
                    kind: format!("{:?}", e.kind()),
                    title: e.title().to_string(),
                    message: e.to_string(),
                });
            }
        };

        let inventory = self
            .session
            .navigation()
            .sorted_inventory()
            .into_iter()
            .map(|id| ItemView {
                id: id.to_string(),
                name: adventure.item_name(id).to_string(),
            })
            .collect();

        let view = match passage {
            None => SceneView {
                route: Route::Introduction.to_string(),
                title: adventure.metadata.title.clone(),
                paragraphs: adventure.intro.paragraphs.clone(),
                action: Some(adventure.intro.action.clone()),
                choices: Vec::new(),
                is_ending: false,
                ending_type: None,
                inventory,
            },
            Some(p) => SceneView {
                route: route.to_string(),
                title: adventure.metadata.title.clone(),
                paragraphs: p.paragraphs().to_vec(),
                action: None,
                choices: p
                    .choices()
                    .iter()
                    .enumerate()
                    .map(|(index, c)| ChoiceView {
                        index,
                        text: c.text.clone(),
                        goto: c.goto.0,
                    })
                    .collect(),
                is_ending: p.is_ending(),
                ending_type: p.ending_type(),
                inventory,
            },
        };
        serialize(&view)
    }

    /// Structural report for the whole adventure.
    pub fn lint(&self) -> Result<String, JsError> {
        let report = lint_adventure(self.session.adventure());
        serialize(&LintView {
            errors: report.errors,
            warnings: report.warnings,
        })
    }
}
