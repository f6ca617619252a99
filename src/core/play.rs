/// Interactive play — presents chapters and reads two-way choices until
/// an ending chapter or end of input.
use std::io::{self, BufRead, Write};

use crate::core::store::ChapterStore;
use crate::schema::chapter::ChapterId;

const SEPARATOR: &str = "------------------------------";
const PROMPT: &str = "Your choice (A/B)? ";
const INVALID_CHOICE: &str = "[ERR] Please enter A or B.";
const END_BANNER: &str = "THE END";

/// How a play session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// An ending chapter was reached.
    Finished,
    /// Input ran out mid-story.
    Quit,
}

/// Run a story from `root` over the given reader and writer.
///
/// Each chapter prints a separator, its title and its body. Ending
/// chapters close the session with the end banner; everywhere else a
/// single `A` or `B` line picks the next chapter, anything else reprints
/// an error and keeps reading. End of input quits silently.
pub fn run<R: BufRead, W: Write>(
    store: &ChapterStore,
    root: ChapterId,
    input: R,
    output: &mut W,
) -> io::Result<PlayOutcome> {
    let mut lines = input.lines();
    let mut current = root;
    loop {
        let chapter = store.chapter(current);
        writeln!(output, "{SEPARATOR}")?;
        writeln!(output, "{}\n\n{}\n", chapter.title, chapter.body)?;
        if chapter.is_ending() {
            writeln!(output, "{END_BANNER}")?;
            return Ok(PlayOutcome::Finished);
        }

        write!(output, "{PROMPT}")?;
        output.flush()?;
        let next = loop {
            let line = match lines.next() {
                Some(line) => line?,
                None => return Ok(PlayOutcome::Quit),
            };
            match parse_choice(&line) {
                Some(slot) => break chapter.choices[slot],
                None => writeln!(output, "{INVALID_CHOICE}")?,
            }
        };
        match next {
            Some(child) => current = child,
            // Unreachable for well-formed chapters; treat a bare slot as
            // an ending rather than panicking mid-game.
            None => {
                writeln!(output, "{END_BANNER}")?;
                return Ok(PlayOutcome::Finished);
            }
        }
    }
}

/// A line consisting of exactly `A` or `B` selects a slot.
fn parse_choice(line: &str) -> Option<usize> {
    match line.trim_end_matches('\r') {
        "A" => Some(0),
        "B" => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::chapter::Chapter;
    use std::io::Cursor;

    fn two_chapter_story() -> (ChapterStore, ChapterId) {
        let mut store = ChapterStore::new().unwrap();
        let root = store
            .insert("fork.txt".to_string(), Chapter::new("Fork", "Pick a path."))
            .unwrap()
            .id();
        let left = store
            .insert("left.txt".to_string(), Chapter::new("Left", "A quiet end."))
            .unwrap()
            .id();
        let right = store
            .insert(
                "right.txt".to_string(),
                Chapter::new("Right", "A loud end."),
            )
            .unwrap()
            .id();
        store.chapter_mut(root).choices = [Some(left), Some(right)];
        (store, root)
    }

    #[test]
    fn choosing_a_walks_the_first_slot() {
        let (store, root) = two_chapter_story();
        let mut output = Vec::new();
        let outcome = run(&store, root, Cursor::new("A\n"), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(outcome, PlayOutcome::Finished);
        assert!(text.contains("Fork"));
        assert!(text.contains("A quiet end."));
        assert!(!text.contains("A loud end."));
        assert!(text.contains(END_BANNER));
    }

    #[test]
    fn choosing_b_walks_the_second_slot() {
        let (store, root) = two_chapter_story();
        let mut output = Vec::new();
        run(&store, root, Cursor::new("B\n"), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("A loud end."));
        assert!(!text.contains("A quiet end."));
    }

    #[test]
    fn invalid_input_reprompts_until_valid() {
        let (store, root) = two_chapter_story();
        let mut output = Vec::new();
        let outcome = run(&store, root, Cursor::new("C\nAB\n\nA\n"), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(outcome, PlayOutcome::Finished);
        assert_eq!(text.matches(INVALID_CHOICE).count(), 3);
        assert!(text.contains("A quiet end."));
    }

    #[test]
    fn end_of_input_quits_without_banner() {
        let (store, root) = two_chapter_story();
        let mut output = Vec::new();
        let outcome = run(&store, root, Cursor::new(""), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(outcome, PlayOutcome::Quit);
        assert!(!text.contains(END_BANNER));
    }

    #[test]
    fn ending_chapter_alone_plays_without_input() {
        let mut store = ChapterStore::new().unwrap();
        let root = store
            .insert("end.txt".to_string(), Chapter::new("End", "Done."))
            .unwrap()
            .id();
        let mut output = Vec::new();
        let outcome = run(&store, root, Cursor::new(""), &mut output).unwrap();

        assert_eq!(outcome, PlayOutcome::Finished);
        assert!(String::from_utf8(output).unwrap().contains(END_BANNER));
    }

    #[test]
    fn crlf_input_is_accepted() {
        let (store, root) = two_chapter_story();
        let mut output = Vec::new();
        let outcome = run(&store, root, Cursor::new("B\r\n"), &mut output).unwrap();
        assert_eq!(outcome, PlayOutcome::Finished);
    }
}
