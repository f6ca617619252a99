/// Story Linter — loads a story graph without playing it and reports
/// structural statistics plus the reachability verdict.
///
/// Usage: story_linter <start-file> [--report <path>]
use adventure_graph::core::classifier::{GraphClassifier, Verdict};
use adventure_graph::core::loader::{load_story, FsSource};
use adventure_graph::core::store::ChapterStore;
use serde::Serialize;
use std::path::Path;
use std::process;

/// Summary written by `--report`, serialized as RON.
#[derive(Debug, Serialize)]
struct StoryReport {
    start: String,
    files: usize,
    chapters: usize,
    deduplicated: usize,
    endings: usize,
    verdict: Verdict,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_linter <start-file> [--report <path>]");
        process::exit(0);
    }

    let mut report_path = None;
    let mut i = 2;
    while i < args.len() {
        if args[i] == "--report" && i + 1 < args.len() {
            i += 1;
            report_path = Some(args[i].clone());
        }
        i += 1;
    }

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
            eprintln!("ERROR: Failed to load story: {error}");
            process::exit(1);
        }
    };

    let verdict = GraphClassifier::analyze(&store, root);
    let report = StoryReport {
        start: start.to_string(),
        files: store.len(),
        chapters: store.chapter_count(),
        deduplicated: store.len() - store.chapter_count(),
        endings: ending_count(&store),
        verdict,
    };

    println!("Loaded {} chapters from {} files", report.chapters, report.files);
    if report.deduplicated > 0 {
        println!(
            "{} file(s) collapsed into existing chapters by deduplication",
            report.deduplicated
        );
    }
    println!("{} ending chapter(s)", report.endings);
    match verdict {
        Verdict::Possible => println!("Verdict: every chapter can still reach an ending"),
        Verdict::NoReachableEnd => println!("Verdict: no ending is reachable from the start"),
        Verdict::InescapableMaze => {
            println!("Verdict: the story contains an inescapable maze")
        }
    }

    if let Some(path) = report_path {
        let pretty = ron::ser::PrettyConfig::default();
        match ron::ser::to_string_pretty(&report, pretty) {
            Ok(serialized) => {
                if let Err(error) = std::fs::write(&path, serialized) {
                    eprintln!("ERROR: Failed to write report to '{path}': {error}");
                    process::exit(1);
                }
                println!("Report written to {path}");
            }
            Err(error) => {
                eprintln!("ERROR: Failed to serialize report: {error}");
                process::exit(1);
            }
        }
    }

    if verdict == Verdict::NoReachableEnd {
        process::exit(1);
    }
}

fn ending_count(store: &ChapterStore) -> usize {
    store
        .ids()
        .filter(|&id| store.chapter(id).is_ending())
        .count()
}
