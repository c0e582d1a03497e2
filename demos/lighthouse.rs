/// Lighthouse example: author a passage, save it into a story, then play it.
///
/// Loads the bundled adventure into an in-memory story store, edits the
/// untyped ending so it becomes a defeat, saves it through the controller,
/// and plays the reloaded story to that ending.
///
/// Run with: cargo run --example lighthouse

use adventure_engine::core::editor::PassageEditor;
use adventure_engine::core::lint::lint_adventure;
use adventure_engine::core::save::SaveController;
use adventure_engine::core::session::PlaySession;
use adventure_engine::schema::{Adventure, PassageId};
use adventure_engine::store::story::load_adventure;
use adventure_engine::store::{AdventureStore, InMemoryStoryStore, StoryAdventureStore, StoryStore};
use std::path::Path;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // --- Store the bundled adventure as a story ---
    let adventure = Adventure::load_from_ron(Path::new("tests/fixtures/lighthouse.ron"))
        .expect("Failed to load lighthouse adventure");
    let stories = Arc::new(InMemoryStoryStore::new());
    let story_id = stories
        .create(
            &adventure.metadata.title,
            &adventure.to_json().expect("Failed to encode adventure"),
        )
        .await
        .expect("Failed to create story");

    let lint = lint_adventure(&adventure);
    println!("=== Lint ===");
    for warning in &lint.warnings {
        println!("  WARNING: {}", warning);
    }

    // --- Edit passage 4 and connect it to the desk ---
    let store = Arc::new(
        StoryAdventureStore::open(stories.clone(), story_id)
            .await
            .expect("Failed to open story"),
    );
    let controller = SaveController::new(store.clone());

    let ending = store.adventure().expect("adventure").passages[&PassageId(4)].clone();
    let mut editor = PassageEditor::new(PassageId(4), ending);
    editor.set_text("The sea takes the tower.\n\nNo one rings the bell again.");
    editor.set_ending_type("defeat");
    println!("\nPassage 4 changed: {}", editor.has_changes());

    let saved = controller
        .save(&mut editor)
        .await
        .expect("Failed to save passage 4");
    editor.rebase(saved);
    println!("Passage 4 saved; changed now: {}", editor.has_changes());

    let desk = store.adventure().expect("adventure").passages[&PassageId(5)].clone();
    let mut editor = PassageEditor::new(PassageId(5), desk);
    editor.add_choice();
    if let Some(row) = editor.take_pending_focus() {
        editor.set_choice_text(row, "Wait for the storm to pass");
        editor.set_choice_goto_input(row, "4");
    }
    controller
        .save(&mut editor)
        .await
        .expect("Failed to save passage 5");

    // --- Play the reloaded story ---
    let reloaded = load_adventure(stories.as_ref(), story_id)
        .await
        .expect("Failed to reload story");
    let mut session = PlaySession::new(reloaded);

    println!("\n=== {} ===\n", session.adventure().metadata.title);
    for paragraph in &session.adventure().intro.paragraphs {
        println!("{}", paragraph);
    }

    session.begin().expect("adventure has passages");
    for choice in [1, 2] {
        println!("\n> {}", session.route());
        println!("  inventory: {:?}", session.inventory_names());
        session.choose(choice).expect("choice resolves");
    }

    if let Ok(Some(passage)) = session.current_passage() {
        println!("\n> {}", session.route());
        for paragraph in passage.paragraphs() {
            println!("{}", paragraph);
        }
        if let Some(kind) = passage.ending_type() {
            println!("\n*** THE END ({}) ***", kind.as_str());
        }
    }
}
