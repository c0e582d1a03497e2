/// Adventure Linter: checks adventure documents for broken links, unreachable
/// passages, and passages the editor would refuse to save.
///
/// Usage: adventure_linter <file_or_dir> [--policy <policy.ron>] [--strict]

use adventure_engine::core::editor::PassageEditor;
use adventure_engine::core::lint::{lint_adventure, LintReport};
use adventure_engine::core::save::prepare_passage;
use adventure_engine::core::validation::ValidationPolicy;
use adventure_engine::schema::Adventure;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: adventure_linter <file_or_dir> [--policy <policy.ron>] [--strict]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let mut policy_path = None;
    let mut strict = false;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--policy" && i + 1 < args.len() {
            i += 1;
            policy_path = Some(args[i].clone());
        } else if args[i] == "--strict" {
            strict = true;
        }
        i += 1;
    }

    let policy = match policy_path {
        Some(ref path) => match ValidationPolicy::load_from_ron(Path::new(path)) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("ERROR: Failed to load policy file: {}", e);
                process::exit(1);
            }
        },
        None => ValidationPolicy::default(),
    };

    let mut files = Vec::new();
    if target.is_file() {
        files.push(target.to_path_buf());
    } else if target.is_dir() {
        collect_adventure_files(target, &mut files);
        files.sort();
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    }

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for path in &files {
        let adventure = match load_adventure(path) {
            Ok(a) => a,
            Err(e) => {
                println!("ERROR: {}: {}", path.display(), e);
                total_errors += 1;
                continue;
            }
        };

        let mut report = lint_adventure(&adventure);
        check_drafts(&adventure, &policy, &mut report);

        println!("\n=== {} ({}) ===\n", adventure.metadata.title, path.display());
        if report.is_clean() {
            println!("All checks passed!");
        }
        for warning in &report.warnings {
            println!("WARNING: {}", warning);
        }
        for error in &report.errors {
            println!("ERROR: {}", error);
        }

        total_errors += report.errors.len();
        total_warnings += report.warnings.len();
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        total_errors,
        total_warnings
    );

    if total_errors > 0 || (strict && total_warnings > 0) {
        process::exit(1);
    }
}

fn load_adventure(path: &Path) -> Result<Adventure, String> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| Adventure::parse_json(&s).map_err(|e| e.to_string())),
        _ => Adventure::load_from_ron(path).map_err(|e| e.to_string()),
    }
}

fn collect_adventure_files(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_adventure_files(&path, files);
            } else if matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("ron") | Some("json")
            ) {
                files.push(path);
            }
        }
    }
}

/// Run every stored passage back through the editor so passages that could
/// not be saved again under `policy` are flagged.
fn check_drafts(adventure: &Adventure, policy: &ValidationPolicy, report: &mut LintReport) {
    for (id, passage) in &adventure.passages {
        let mut editor = PassageEditor::new(*id, passage.clone());
        if prepare_passage(&mut editor, policy).is_ok() {
            continue;
        }
        let errors = editor.errors();
        let messages = errors
            .text
            .iter()
            .chain(errors.choices.iter())
            .chain(errors.effects.iter())
            .chain(errors.ending_type.iter());
        for message in messages {
            report
                .errors
                .push(format!("Passage {} would not save: {}", id, message));
        }
        for (index, choice) in editor.draft().choices.iter().enumerate() {
            for message in choice.text_error.iter().chain(choice.goto_error.iter()) {
                report
                    .errors
                    .push(format!("Passage {} choice {}: {}", id, index + 1, message));
            }
        }
        for (index, effect) in editor.draft().effects.iter().enumerate() {
            if let Some(message) = &effect.error {
                report
                    .errors
                    .push(format!("Passage {} effect {}: {}", id, index + 1, message));
            }
        }
    }
}
