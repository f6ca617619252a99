/// Adventure player — loads a story, analyzes its graph, and plays it.
///
/// Usage: play <start-file>
use adventure_graph::core::classifier::{GraphClassifier, Verdict};
use adventure_graph::core::loader::{load_story, FsSource, LoadError};
use adventure_graph::core::play;
use std::io;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: play <start-file>");
        process::exit(1);
    }

    // Chapter references inside story files are resolved relative to the
    // directory the start file lives in.
    let start_path = Path::new(&args[1]);
    let base = start_path.parent().unwrap_or_else(|| Path::new("."));
    let start = match start_path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name,
        None => {
            eprintln!("ERROR: '{}' is not a story file", args[1]);
            process::exit(1);
        }
    };

    let source = FsSource::new(base);
    let (store, root) = match load_story(&source, start) {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("ERROR: {error}");
            process::exit(exit_code(&error));
        }
    };

    // Advisory only: a degraded verdict describes story quality, the
    // adventure is still playable.
    match GraphClassifier::analyze(&store, root) {
        Verdict::Possible => {}
        Verdict::NoReachableEnd => {
            println!("[INFO] The loaded adventure has no reachable end!");
        }
        Verdict::InescapableMaze => {
            println!(
                "[INFO] The loaded adventure contains a path that leads to a maze \
                 that cannot be exited anymore!"
            );
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if let Err(error) = play::run(&store, root, stdin.lock(), &mut stdout) {
        eprintln!("ERROR: {error}");
        process::exit(3);
    }
}

fn exit_code(error: &LoadError) -> i32 {
    match error {
        LoadError::Store(_) => 2,
        _ => 3,
    }
}
