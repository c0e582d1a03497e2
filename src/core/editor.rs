//! Passage editor: an editable draft of one passage.
//!
//! The draft can flip between regular and ending shape. Whatever the
//! inactive shape held is parked in [`ShadowBuffers`] for the rest of the
//! session, so toggling back restores it. `has_changes` is always computed
//! fresh against the original passage.

use serde::Serialize;

use crate::schema::passage::{Choice, Effect, EffectKind, Passage, PassageId};

/// Separator between paragraphs when a passage is edited as free text.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";

/// One editable choice row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChoiceDraft {
    pub text: String,
    pub goto: Option<PassageId>,
    pub text_error: Option<String>,
    pub goto_error: Option<String>,
}

impl ChoiceDraft {
    fn from_choice(choice: &Choice) -> Self {
        Self {
            text: choice.text.clone(),
            goto: Some(choice.goto),
            ..Default::default()
        }
    }

    fn matches(&self, choice: &Choice) -> bool {
        self.text == choice.text && self.goto == Some(choice.goto)
    }
}

/// One editable effect row. `kind` is `None` while no type is selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EffectDraft {
    pub kind: Option<EffectKind>,
    pub item: String,
    pub error: Option<String>,
}

impl EffectDraft {
    fn from_effect(effect: &Effect) -> Self {
        Self {
            kind: Some(effect.kind),
            item: effect.item.clone(),
            error: None,
        }
    }

    fn matches(&self, effect: &Effect) -> bool {
        self.kind == Some(effect.kind) && self.item == effect.item
    }

    /// The effect this row describes, if both fields are filled in.
    pub fn to_effect(&self) -> Option<Effect> {
        match self.kind {
            Some(kind) if !self.item.is_empty() => Some(Effect {
                kind,
                item: self.item.clone(),
            }),
            _ => None,
        }
    }
}

/// Group-level error slots, independent of the per-row errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DraftErrors {
    pub text: Option<String>,
    pub choices: Option<String>,
    pub effects: Option<String>,
    pub ending_type: Option<String>,
}

impl DraftErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.choices.is_none()
            && self.effects.is_none()
            && self.ending_type.is_none()
    }
}

/// The editable fields of a passage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PassageDraft {
    pub text: String,
    pub notes: String,
    pub choices: Vec<ChoiceDraft>,
    pub effects: Vec<EffectDraft>,
    pub ending_type: String,
    pub is_ending: bool,
    pub errors: DraftErrors,
}

impl PassageDraft {
    pub fn from_passage(passage: &Passage) -> Self {
        let text = passage.paragraphs().join(PARAGRAPH_DELIMITER);
        let notes = passage.notes().unwrap_or_default().to_string();
        match passage {
            Passage::Regular(p) => Self {
                text,
                notes,
                choices: p.choices.iter().map(ChoiceDraft::from_choice).collect(),
                effects: p.effects.iter().map(EffectDraft::from_effect).collect(),
                ending_type: String::new(),
                is_ending: false,
                errors: DraftErrors::default(),
            },
            Passage::Ending(p) => Self {
                text,
                notes,
                choices: Vec::new(),
                effects: Vec::new(),
                ending_type: p
                    .ending_type
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
                is_ending: true,
                errors: DraftErrors::default(),
            },
        }
    }
}

/// Two-slot cache of whatever the inactive shape held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowBuffers {
    pub saved_choices_and_effects: Option<(Vec<ChoiceDraft>, Vec<EffectDraft>)>,
    pub saved_ending_type: Option<String>,
}

/// Editing session for exactly one passage.
#[derive(Debug, Clone)]
pub struct PassageEditor {
    passage_id: PassageId,
    original: Passage,
    draft: PassageDraft,
    shadow: ShadowBuffers,
    pending_focus: Option<usize>,
}

impl PassageEditor {
    pub fn new(passage_id: PassageId, original: Passage) -> Self {
        let draft = PassageDraft::from_passage(&original);
        Self {
            passage_id,
            original,
            draft,
            shadow: ShadowBuffers::default(),
            pending_focus: None,
        }
    }

    pub fn passage_id(&self) -> PassageId {
        self.passage_id
    }

    pub fn original(&self) -> &Passage {
        &self.original
    }

    pub fn draft(&self) -> &PassageDraft {
        &self.draft
    }

    pub fn errors(&self) -> &DraftErrors {
        &self.draft.errors
    }

    pub fn shadow(&self) -> &ShadowBuffers {
        &self.shadow
    }

    // ------------------------------------------------------------------
    // Text fields
    // ------------------------------------------------------------------

    pub fn set_text(&mut self, text: &str) {
        self.draft.text = text.to_string();
        self.draft.errors.text = None;
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.draft.notes = notes.to_string();
    }

    pub fn set_ending_type(&mut self, ending_type: &str) {
        self.draft.ending_type = ending_type.to_string();
        self.draft.errors.ending_type = None;
    }

    // ------------------------------------------------------------------
    // Choices
    // ------------------------------------------------------------------

    /// Append an empty choice and request focus for it.
    pub fn add_choice(&mut self) {
        self.draft.choices.push(ChoiceDraft::default());
        self.draft.errors.choices = None;
        self.pending_focus = Some(self.draft.choices.len() - 1);
    }

    pub fn remove_choice(&mut self, index: usize) {
        if index < self.draft.choices.len() {
            self.draft.choices.remove(index);
        }
    }

    pub fn set_choice_text(&mut self, index: usize, text: &str) {
        if let Some(choice) = self.draft.choices.get_mut(index) {
            choice.text = text.to_string();
            choice.text_error = None;
        }
    }

    pub fn set_choice_goto(&mut self, index: usize, goto: Option<PassageId>) {
        if let Some(choice) = self.draft.choices.get_mut(index) {
            choice.goto = goto;
            choice.goto_error = None;
        }
    }

    /// Set a choice target from select-box input. Empty or non-numeric
    /// input clears the target rather than pointing it at id 0.
    pub fn set_choice_goto_input(&mut self, index: usize, input: &str) {
        let goto = input.trim().parse::<u32>().ok().map(PassageId);
        self.set_choice_goto(index, goto);
    }

    /// Index of a freshly added choice that should take input focus.
    /// Reading it consumes the request.
    pub fn take_pending_focus(&mut self) -> Option<usize> {
        self.pending_focus.take()
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    pub fn add_effect(&mut self) {
        self.draft.effects.push(EffectDraft::default());
        self.draft.errors.effects = None;
    }

    pub fn remove_effect(&mut self, index: usize) {
        if index < self.draft.effects.len() {
            self.draft.effects.remove(index);
            self.draft.errors.effects = None;
        }
    }

    pub fn set_effect_kind(&mut self, index: usize, kind: Option<EffectKind>) {
        if let Some(effect) = self.draft.effects.get_mut(index) {
            effect.kind = kind;
            effect.error = None;
            self.draft.errors.effects = None;
        }
    }

    /// Set an effect type from its wire name; `""` clears it.
    pub fn set_effect_kind_input(&mut self, index: usize, input: &str) {
        self.set_effect_kind(index, EffectKind::parse(input));
    }

    pub fn set_effect_item(&mut self, index: usize, item: &str) {
        if let Some(effect) = self.draft.effects.get_mut(index) {
            effect.item = item.to_string();
            effect.error = None;
            self.draft.errors.effects = None;
        }
    }

    // ------------------------------------------------------------------
    // Mode toggle
    // ------------------------------------------------------------------

    /// Switch between regular and ending shape, parking the data of the
    /// shape being left.
    pub fn set_is_ending(&mut self, next: bool) {
        if next == self.draft.is_ending {
            return;
        }

        if next {
            let choices = std::mem::take(&mut self.draft.choices);
            let effects = std::mem::take(&mut self.draft.effects);
            self.shadow.saved_choices_and_effects = Some((choices, effects));
            if let Some(saved) = &self.shadow.saved_ending_type {
                self.draft.ending_type = saved.clone();
            }
        } else {
            self.shadow.saved_ending_type = Some(std::mem::take(&mut self.draft.ending_type));
            if let Some((choices, effects)) = &self.shadow.saved_choices_and_effects {
                if !choices.is_empty() {
                    self.draft.choices = choices.clone();
                }
                if !effects.is_empty() {
                    self.draft.effects = effects.clone();
                }
            }
        }
        self.draft.is_ending = next;
        tracing::debug!(passage = %self.passage_id, is_ending = next, "toggled passage mode");
    }

    // ------------------------------------------------------------------
    // Change tracking
    // ------------------------------------------------------------------

    /// Whether the draft differs from the original passage.
    ///
    /// Choices and effects are compared position by position; error
    /// annotations are ignored.
    pub fn has_changes(&self) -> bool {
        let draft = &self.draft;
        let original = &self.original;

        if draft.text != original.paragraphs().join(PARAGRAPH_DELIMITER) {
            return true;
        }
        if draft.notes != original.notes().unwrap_or_default() {
            return true;
        }
        if draft.is_ending != original.is_ending() {
            return true;
        }

        match original {
            Passage::Ending(p) => {
                let original_type = p.ending_type.map(|t| t.as_str()).unwrap_or_default();
                draft.ending_type != original_type
            }
            Passage::Regular(p) => {
                draft.choices.len() != p.choices.len()
                    || draft.effects.len() != p.effects.len()
                    || draft.choices.iter().zip(&p.choices).any(|(d, o)| !d.matches(o))
                    || draft.effects.iter().zip(&p.effects).any(|(d, o)| !d.matches(o))
            }
        }
    }

    /// Throw the draft away and start over from the original passage.
    pub fn reset_state(&mut self) {
        self.draft = PassageDraft::from_passage(&self.original);
        self.shadow = ShadowBuffers::default();
        self.pending_focus = None;
    }

    /// Adopt `passage` as the new original after it was persisted, which
    /// starts a fresh session with no unsaved changes.
    pub fn rebase(&mut self, passage: Passage) {
        self.original = passage;
        self.reset_state();
    }

    /// Replace rows and error slots with the result of a validation pass.
    pub(crate) fn annotate(
        &mut self,
        choices: Vec<ChoiceDraft>,
        effects: Vec<EffectDraft>,
        errors: DraftErrors,
    ) {
        self.draft.choices = choices;
        self.draft.effects = effects;
        self.draft.errors = errors;
    }
}
