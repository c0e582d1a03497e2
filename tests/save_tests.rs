/// Save integration tests: editor drafts through validation into a store.

use adventure_engine::core::editor::PassageEditor;
use adventure_engine::core::save::{SaveController, SaveError};
use adventure_engine::core::validation::{
    ValidationPolicy, EFFECT_INCOMPLETE, ENDING_TYPE_REQUIRED, NO_CHOICES,
};
use adventure_engine::schema::{
    Adventure, Choice, Effect, EffectKind, EndingPassage, Introduction, Passage, PassageId,
    RegularPassage,
};
use adventure_engine::store::{
    AdventureStore, InMemoryStoryStore, StoreError, StoryAdventureStore, StoryStore,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Records every write; optionally fails them or yields once before finishing.
#[derive(Default)]
struct RecordingStore {
    writes: Mutex<Vec<(PassageId, Passage)>>,
    fail: bool,
    yield_once: bool,
}

impl RecordingStore {
    fn writes(&self) -> Vec<(PassageId, Passage)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdventureStore for RecordingStore {
    async fn update_passage(&self, id: PassageId, passage: Passage) -> Result<(), StoreError> {
        if self.yield_once {
            tokio::task::yield_now().await;
        }
        if self.fail {
            return Err(StoreError::Backend("database unavailable".to_string()));
        }
        self.writes.lock().unwrap().push((id, passage));
        Ok(())
    }

    async fn reload_adventure(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn update_introduction(&self, _intro: Introduction) -> Result<(), StoreError> {
        Ok(())
    }

    fn adventure(&self) -> Result<Adventure, StoreError> {
        Ok(Adventure::default())
    }
}

fn go_to_two() -> Passage {
    Passage::Regular(RegularPassage {
        paragraphs: vec!["A".to_string(), "B".to_string()],
        notes: None,
        choices: vec![Choice {
            text: "Go".to_string(),
            goto: PassageId(2),
        }],
        effects: Vec::new(),
    })
}

fn bare_ending() -> Passage {
    Passage::Ending(EndingPassage {
        paragraphs: vec!["End".to_string()],
        notes: None,
        ending_type: None,
    })
}

#[tokio::test]
async fn unmodified_regular_passage_round_trips_exactly() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    assert_eq!(editor.draft().text, "A\n\nB");
    assert!(!editor.has_changes());

    let saved = controller.save(&mut editor).await.unwrap();
    assert_eq!(saved, go_to_two());
    assert_eq!(
        serde_json::to_string(&saved).unwrap(),
        r#"{"paragraphs":["A","B"],"choices":[{"text":"Go","goto":2}]}"#
    );
    assert_eq!(store.writes(), vec![(PassageId(1), go_to_two())]);
}

#[tokio::test]
async fn zero_choices_never_persists() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.remove_choice(0);

    let err = controller.save(&mut editor).await.unwrap_err();
    assert!(matches!(err, SaveError::Invalid));
    assert_eq!(editor.errors().choices.as_deref(), Some(NO_CHOICES));
    assert!(store.writes().is_empty());
    assert!(!controller.is_saving());
}

#[tokio::test]
async fn malformed_effect_blocks_until_removed() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.add_effect();
    editor.set_effect_kind(0, Some(EffectKind::AddItem));
    editor.set_effect_item(0, "key");
    editor.add_effect();

    assert!(controller.save(&mut editor).await.is_err());
    assert!(editor.draft().effects[0].error.is_none());
    assert_eq!(editor.draft().effects[1].error.as_deref(), Some(EFFECT_INCOMPLETE));
    assert!(store.writes().is_empty());

    editor.remove_effect(1);
    let saved = controller.save(&mut editor).await.unwrap();
    assert_eq!(saved.effects(), &[Effect::add("key")]);
    assert_eq!(store.writes().len(), 1);
}

#[tokio::test]
async fn blank_line_runs_collapse_on_save() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.set_text("First\n\n\n\nSecond\n\n");

    let saved = controller.save(&mut editor).await.unwrap();
    assert_eq!(saved.paragraphs(), &["First".to_string(), "Second".to_string()]);
}

#[tokio::test]
async fn typeless_ending_with_optional_rule_persists_without_type() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(4), bare_ending());
    assert_eq!(editor.draft().ending_type, "");

    let saved = controller.save(&mut editor).await.unwrap();
    assert_eq!(
        serde_json::to_string(&saved).unwrap(),
        r#"{"paragraphs":["End"],"ending":true}"#
    );
}

#[tokio::test]
async fn typeless_ending_with_required_rule_is_blocked() {
    let store = Arc::new(RecordingStore::default());
    let policy =
        ValidationPolicy::load_from_ron(Path::new("tests/fixtures/strict_policy.ron")).unwrap();
    let controller = SaveController::with_policy(store.clone(), policy);
    let mut editor = PassageEditor::new(PassageId(4), bare_ending());

    assert!(matches!(
        controller.save(&mut editor).await,
        Err(SaveError::Invalid)
    ));
    assert_eq!(editor.errors().ending_type.as_deref(), Some(ENDING_TYPE_REQUIRED));
    assert!(store.writes().is_empty());

    editor.set_ending_type("defeat");
    assert!(editor.errors().ending_type.is_none());
    controller.save(&mut editor).await.unwrap();
    assert_eq!(store.writes().len(), 1);
}

#[tokio::test]
async fn text_and_choice_errors_reported_together() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.set_text("   ");
    editor.add_choice();

    assert!(controller.save(&mut editor).await.is_err());
    let draft = editor.draft();
    assert!(draft.errors.text.is_some());
    assert!(draft.choices[0].text_error.is_none());
    assert!(draft.choices[1].text_error.is_some());
    assert!(draft.choices[1].goto_error.is_some());
}

#[tokio::test]
async fn notes_only_persisted_when_present() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.set_notes("check pacing");
    let saved = controller.save(&mut editor).await.unwrap();
    assert_eq!(saved.notes(), Some("check pacing"));

    editor.rebase(saved);
    editor.set_notes("");
    let saved = controller.save(&mut editor).await.unwrap();
    assert_eq!(saved.notes(), None);
}

#[tokio::test]
async fn toggled_to_ending_saves_as_ending() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.set_is_ending(true);
    editor.set_ending_type("neutral");

    let saved = controller.save(&mut editor).await.unwrap();
    assert_eq!(
        serde_json::to_string(&saved).unwrap(),
        r#"{"paragraphs":["A","B"],"ending":true,"type":"neutral"}"#
    );
}

#[tokio::test]
async fn rebase_clears_unsaved_changes() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.set_text("First\n\n\n\nSecond");
    assert!(editor.has_changes());

    let saved = controller.save(&mut editor).await.unwrap();
    editor.rebase(saved);
    assert!(!editor.has_changes());
    assert_eq!(editor.draft().text, "First\n\nSecond");
}

#[tokio::test]
async fn persistence_failure_is_surfaced_and_retryable() {
    let store = Arc::new(RecordingStore {
        fail: true,
        ..Default::default()
    });
    let controller = SaveController::new(store.clone());
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.set_text("Changed");

    let err = controller.save(&mut editor).await.unwrap_err();
    assert!(matches!(err, SaveError::Persistence(StoreError::Backend(_))));
    assert!(err.is_retryable());
    assert!(!controller.is_saving());
    assert!(editor.has_changes());
}

#[tokio::test]
async fn second_save_while_pending_is_rejected() {
    let store = Arc::new(RecordingStore {
        yield_once: true,
        ..Default::default()
    });
    let controller = SaveController::new(store.clone());
    let mut first = PassageEditor::new(PassageId(1), go_to_two());
    let mut second = PassageEditor::new(PassageId(1), go_to_two());

    let (a, b) = tokio::join!(controller.save(&mut first), controller.save(&mut second));
    assert!(a.is_ok());
    assert!(matches!(b, Err(SaveError::InFlight)));
    assert_eq!(store.writes().len(), 1);

    // The flag clears once the first save completes.
    controller.save(&mut second).await.unwrap();
    assert_eq!(store.writes().len(), 2);
}

#[tokio::test]
async fn handle_reset_discards_draft() {
    let store = Arc::new(RecordingStore::default());
    let controller = SaveController::new(store);
    let mut editor = PassageEditor::new(PassageId(1), go_to_two());
    editor.set_is_ending(true);
    editor.set_text("Other");
    controller.handle_reset(&mut editor);
    assert!(!editor.has_changes());
    assert!(!editor.draft().is_ending);
}

#[tokio::test]
async fn save_through_story_store_updates_document() {
    let stories = Arc::new(InMemoryStoryStore::new());
    let content = Adventure::load_from_ron(Path::new("tests/fixtures/lighthouse.ron"))
        .unwrap()
        .to_json()
        .unwrap();
    let story_id = stories.create("The Lighthouse Keeper", &content).await.unwrap();
    let adventure_store = Arc::new(
        StoryAdventureStore::open(stories.clone(), story_id)
            .await
            .unwrap(),
    );
    let controller = SaveController::new(adventure_store.clone());

    let original = adventure_store.adventure().unwrap().passages[&PassageId(4)].clone();
    let mut editor = PassageEditor::new(PassageId(4), original);
    editor.set_ending_type("defeat");
    let saved = controller.save(&mut editor).await.unwrap();

    let content = stories.get(story_id).await.unwrap().unwrap().content;
    let stored = Adventure::parse_json(&content).unwrap();
    assert_eq!(stored.passage(PassageId(4)), Some(&saved));
    assert_eq!(stored.passages.len(), 5);
}

#[tokio::test]
async fn unknown_ending_type_is_never_dropped_on_save() {
    let store = Arc::new(RecordingStore::default());
    let policy = ValidationPolicy::builder()
        .ending_type_rule(|_: &str| None)
        .build();
    let controller = SaveController::with_policy(store.clone(), policy);
    let mut editor = PassageEditor::new(PassageId(4), bare_ending());
    editor.set_ending_type("triumph");

    assert!(matches!(
        controller.save(&mut editor).await,
        Err(SaveError::Invalid)
    ));
    assert!(editor.errors().ending_type.is_some());
    assert!(store.writes().is_empty());
}
