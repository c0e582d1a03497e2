//! Save controller: validate a draft, build the canonical passage, then persist it.
//!
//! At most one save per controller is in flight; a second request while one
//! is pending is rejected before it reaches the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::core::editor::{PassageDraft, PassageEditor};
use crate::core::validation::{DraftReport, ValidationPolicy};
use crate::schema::passage::{
    Choice, EndingPassage, EndingType, Passage, PassageId, RegularPassage,
};
use crate::store::{AdventureStore, StoreError};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("a save is already in progress")]
    InFlight,
    #[error("the passage has validation errors")]
    Invalid,
    #[error("failed to save passage: {0}")]
    Persistence(#[from] StoreError),
}

impl SaveError {
    /// Whether the user can simply try the same save again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::InFlight)
    }
}

/// Split free text into paragraphs on blank lines, trimming each one and
/// dropping the empty ones.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);
    paragraphs
}

fn flush_paragraph(lines: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    let paragraph = lines.join("\n");
    let trimmed = paragraph.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed.to_string());
    }
    lines.clear();
}

/// Build the persisted passage from a draft that passed validation.
pub fn build_passage(draft: &PassageDraft, report: &DraftReport) -> Passage {
    let paragraphs = split_paragraphs(&draft.text);
    let notes = if draft.notes.is_empty() {
        None
    } else {
        Some(draft.notes.clone())
    };

    if draft.is_ending {
        Passage::Ending(EndingPassage {
            paragraphs,
            notes,
            ending_type: EndingType::parse(&draft.ending_type),
        })
    } else {
        Passage::Regular(RegularPassage {
            paragraphs,
            notes,
            choices: report
                .choices
                .iter()
                .filter_map(|c| {
                    c.goto.map(|goto| Choice {
                        text: c.text.clone(),
                        goto,
                    })
                })
                .collect(),
            effects: report.well_formed_effects.clone(),
        })
    }
}

/// Validate the editor's draft and produce the passage to persist.
///
/// Field-level errors are written back onto the editor either way; on any
/// error the result is [`SaveError::Invalid`].
pub fn prepare_passage(
    editor: &mut PassageEditor,
    policy: &ValidationPolicy,
) -> Result<Passage, SaveError> {
    let report = policy.validate(editor.draft());
    let valid = report.is_valid();
    let passage = valid.then(|| build_passage(editor.draft(), &report));
    editor.annotate(report.choices, report.effects, report.errors);

    match passage {
        Some(passage) => Ok(passage),
        None => {
            tracing::warn!(passage = %editor.passage_id(), "save blocked by validation errors");
            Err(SaveError::Invalid)
        }
    }
}

/// Clears the in-flight flag when a save finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Saves drafts of passages through an [`AdventureStore`].
pub struct SaveController<S: AdventureStore> {
    store: Arc<S>,
    policy: ValidationPolicy,
    in_flight: AtomicBool,
}

impl<S: AdventureStore> SaveController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, ValidationPolicy::default())
    }

    pub fn with_policy(store: Arc<S>, policy: ValidationPolicy) -> Self {
        Self {
            store,
            policy,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate without persisting.
    pub fn prepare(&self, editor: &mut PassageEditor) -> Result<Passage, SaveError> {
        prepare_passage(editor, &self.policy)
    }

    /// Validate the draft and persist it.
    ///
    /// Returns the passage that was written. Clearing the dirty state is up
    /// to the caller, typically via [`PassageEditor::rebase`].
    pub async fn save(&self, editor: &mut PassageEditor) -> Result<Passage, SaveError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(passage = %editor.passage_id(), "save rejected: already in flight");
            return Err(SaveError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let passage = self.prepare(editor)?;
        let id: PassageId = editor.passage_id();
        self.store.update_passage(id, passage.clone()).await?;
        tracing::debug!(passage = %id, "draft persisted");
        Ok(passage)
    }

    /// Discard the draft.
    pub fn handle_reset(&self, editor: &mut PassageEditor) {
        editor.reset_state();
    }
}
