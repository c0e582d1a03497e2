/// Playtest: interactive shell for walking through an adventure.
///
/// Usage: playtest <adventure.ron|adventure.json> [--walk <n>] [--seed <n>]
///
/// Commands:
///   <n>              follow choice n of the current passage
///   begin            start the adventure from the introduction
///   go <id>          jump to a passage (0 returns to the introduction)
///   inv              show the inventory
///   add <item>       put an item in the inventory
///   drop <item>      take an item out of the inventory
///   restart          back to the introduction, emptying the inventory
///   look             show the current passage again
///   help             list commands
///   quit             exit
///
/// With `--walk`, instead of the shell, play `n` random walks and report
/// how they ended.

use adventure_engine::core::navigation::Transition;
use adventure_engine::core::session::{AdventureError, PlaySession};
use adventure_engine::schema::Adventure;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Upper bound on steps for one random walk; adventures may loop forever.
const MAX_WALK_STEPS: usize = 200;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let adventure_path = args[1].clone();
    let mut walks: Option<usize> = None;
    let mut seed: u64 = 42;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--walk" if i + 1 < args.len() => {
                i += 1;
                walks = Some(args[i].parse().unwrap_or(1));
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let adventure = match load_adventure(Path::new(&adventure_path)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ERROR: Failed to load adventure: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Loaded '{}' by {} ({} passages, {} items)",
        adventure.metadata.title,
        adventure.metadata.author,
        adventure.passages.len(),
        adventure.items.len()
    );

    match walks {
        Some(n) => random_walks(adventure, n, seed),
        None => shell(adventure),
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

fn shell(adventure: Adventure) {
    let mut session = PlaySession::new(adventure);
    println!("Type 'help' for commands.\n");
    show(&session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("playtest> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        if let Ok(n) = cmd.parse::<usize>() {
            if n == 0 {
                println!("Choices are numbered from 1.");
                continue;
            }
            match session.choose(n - 1) {
                Ok(Some(t)) => {
                    print_transition(t);
                    show(&session);
                }
                Ok(None) => println!("No choice {} here.", n),
                Err(e) => print_error(&e),
            }
            continue;
        }

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "begin" => match session.begin() {
                Ok(t) => {
                    print_transition(t);
                    show(&session);
                }
                Err(e) => print_error(&e),
            },
            "go" => {
                if parts.len() < 2 {
                    println!("Usage: go <passage id>");
                    continue;
                }
                match session.open(parts[1]) {
                    Ok(t) => {
                        print_transition(t);
                        show(&session);
                    }
                    Err(e) => print_error(&e),
                }
            }
            "inv" | "inventory" => print_inventory(&session),
            "add" => {
                if parts.len() < 2 {
                    println!("Usage: add <item id>");
                    continue;
                }
                if session.adventure().item(parts[1]).is_none() {
                    println!("(note: '{}' is not in the item list)", parts[1]);
                }
                session.add_item(parts[1]);
                print_inventory(&session);
            }
            "drop" | "remove" => {
                if parts.len() < 2 {
                    println!("Usage: drop <item id>");
                    continue;
                }
                session.remove_item(parts[1]);
                print_inventory(&session);
            }
            "restart" => {
                print_transition(session.restart());
                show(&session);
            }
            "look" | "l" => show(&session),
            _ => println!("Unknown command: {}. Type 'help' for commands.", cmd),
        }
    }
}

fn show(session: &PlaySession) {
    let adventure = session.adventure();
    match session.current_passage() {
        Ok(None) => {
            println!("=== {} ===\n", adventure.metadata.title);
            for paragraph in &adventure.intro.paragraphs {
                println!("{}\n", paragraph);
            }
            println!("[begin] {}\n", adventure.intro.action);
        }
        Ok(Some(passage)) => {
            println!("--- {} ---\n", session.route());
            for paragraph in passage.paragraphs() {
                println!("{}\n", paragraph);
            }
            if let Some(notes) = passage.notes() {
                println!("(notes: {})\n", notes);
            }
            if passage.is_ending() {
                match passage.ending_type() {
                    Some(t) => println!("*** THE END ({}) ***\n", t.as_str()),
                    None => println!("*** THE END ***\n"),
                }
            }
            for (index, choice) in passage.choices().iter().enumerate() {
                println!("  [{}] {}", index + 1, choice.text);
            }
            if !passage.choices().is_empty() {
                println!();
            }
        }
        Err(e) => print_error(&e),
    }
}

fn print_transition(t: Transition) {
    match t {
        Transition::Reset => println!("(inventory cleared)"),
        Transition::Arrived {
            effects_applied, ..
        } if effects_applied > 0 => println!("({} effects applied)", effects_applied),
        _ => {}
    }
}

fn print_inventory(session: &PlaySession) {
    let names = session.inventory_names();
    if names.is_empty() {
        println!("Inventory: (empty)");
    } else {
        println!("Inventory: {}", names.join(", "));
    }
}

fn print_error(e: &AdventureError) {
    println!("!! {}: {}", e.title(), e);
}

/// How one random walk finished.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum WalkOutcome {
    Ending(String),
    Restarted,
    Broken(String),
    StepLimit,
}

fn random_walks(adventure: Adventure, count: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut outcomes: BTreeMap<WalkOutcome, usize> = BTreeMap::new();
    let mut total_steps = 0;

    let mut session = PlaySession::new(adventure);
    for _ in 0..count {
        session.restart();
        let (outcome, steps) = walk(&mut session, &mut rng);
        total_steps += steps;
        *outcomes.entry(outcome).or_insert(0) += 1;
    }

    println!("\n=== Random Walks (seed {}) ===\n", seed);
    for (outcome, n) in &outcomes {
        let label = match outcome {
            WalkOutcome::Ending(kind) => format!("ending ({})", kind),
            WalkOutcome::Restarted => "restarted".to_string(),
            WalkOutcome::Broken(reason) => format!("broken: {}", reason),
            WalkOutcome::StepLimit => format!("no ending within {} steps", MAX_WALK_STEPS),
        };
        println!("  {:>5}  {}", n, label);
    }
    if count > 0 {
        println!(
            "\nAverage walk length: {:.1} steps",
            total_steps as f64 / count as f64
        );
    }

    if outcomes.keys().any(|o| matches!(o, WalkOutcome::Broken(_))) {
        std::process::exit(1);
    }
}

fn walk(session: &mut PlaySession, rng: &mut StdRng) -> (WalkOutcome, usize) {
    if let Err(e) = session.begin() {
        return (WalkOutcome::Broken(e.to_string()), 0);
    }

    for step in 1..=MAX_WALK_STEPS {
        let passage = match session.current_passage() {
            Ok(Some(p)) => p,
            Ok(None) => return (WalkOutcome::Restarted, step),
            Err(e) => return (WalkOutcome::Broken(e.to_string()), step),
        };
        if passage.is_ending() {
            let kind = passage
                .ending_type()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| "untyped".to_string());
            return (WalkOutcome::Ending(kind), step);
        }
        let count = passage.choices().len();
        if count == 0 {
            return (
                WalkOutcome::Broken(format!("passage {} has no way out", session.route())),
                step,
            );
        }
        let index = rng.gen_range(0..count);
        if let Err(e) = session.choose(index) {
            return (WalkOutcome::Broken(e.to_string()), step);
        }
    }
    (WalkOutcome::StepLimit, MAX_WALK_STEPS)
}

fn print_usage() {
    println!("Usage: playtest <adventure.ron|adventure.json> [--walk <n>] [--seed <n>]");
    println!();
    println!("Without --walk, starts an interactive shell. Type 'help' inside it.");
}

fn print_help() {
    println!("Commands:");
    println!("  <n>            Follow choice n of the current passage");
    println!("  begin          Start from the introduction's action");
    println!("  go <id>        Jump to a passage (0 returns to the introduction)");
    println!("  inv            Show the inventory");
    println!("  add <item>     Put an item in the inventory");
    println!("  drop <item>    Take an item out of the inventory");
    println!("  restart        Back to the introduction (empties the inventory)");
    println!("  look           Show the current passage again");
    println!("  help           Show this help");
    println!("  quit           Exit");
}
