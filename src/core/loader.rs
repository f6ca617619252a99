/// Chapter loading — the source abstraction, the chapter text format, and
/// recursive story graph construction.
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::store::{ChapterStore, Insertion, StoreError};
use crate::schema::chapter::{Chapter, ChapterId, CHOICE_COUNT};

/// Reserved choice reference marking "the story ends here".
pub const END_TOKEN: &str = "-";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read chapter {identifier}: {source}")]
    Io {
        identifier: String,
        source: std::io::Error,
    },
    #[error("malformed chapter {identifier}: expected a title line, two choice lines and a body")]
    Malformed { identifier: String },
    #[error("chapter {identifier} has an empty choice reference")]
    EmptyChoice { identifier: String },
    #[error("chapter {identifier} mixes an ending choice with a real one")]
    MixedChoices { identifier: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where chapter text comes from. The loader asks each source for a given
/// identifier at most once; afterwards the store answers.
pub trait StorySource {
    fn load(&self, identifier: &str) -> Result<String, LoadError>;
}

/// Loads chapter files from a story directory; identifiers are file names
/// resolved relative to it.
pub struct FsSource {
    base: PathBuf,
}

impl FsSource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl StorySource for FsSource {
    fn load(&self, identifier: &str) -> Result<String, LoadError> {
        fs::read_to_string(self.base.join(identifier)).map_err(|source| LoadError::Io {
            identifier: identifier.to_string(),
            source,
        })
    }
}

/// In-memory source, for tests and tools that assemble stories on the fly.
#[derive(Debug, Default)]
pub struct MemorySource {
    chapters: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chapter(mut self, identifier: impl Into<String>, text: impl Into<String>) -> Self {
        self.chapters.insert(identifier.into(), text.into());
        self
    }
}

impl StorySource for MemorySource {
    fn load(&self, identifier: &str) -> Result<String, LoadError> {
        self.chapters
            .get(identifier)
            .cloned()
            .ok_or_else(|| LoadError::Io {
                identifier: identifier.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

/// A parsed but not yet linked chapter: the title, the body, and the raw
/// choice references as they appeared in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChapter {
    pub title: String,
    pub body: String,
    pub choices: [String; CHOICE_COUNT],
}

impl RawChapter {
    /// Parse the chapter text format: first line title, then one line per
    /// choice reference, everything after the last choice line is the
    /// body. Fewer lines than that is a malformed chapter.
    pub fn parse(identifier: &str, text: &str) -> Result<RawChapter, LoadError> {
        let mut fields = text.splitn(CHOICE_COUNT + 2, '\n');
        let malformed = || LoadError::Malformed {
            identifier: identifier.to_string(),
        };

        let title = fields.next().ok_or_else(malformed)?;
        let first = fields.next().ok_or_else(malformed)?;
        let second = fields.next().ok_or_else(malformed)?;
        let body = fields.next().ok_or_else(malformed)?;

        Ok(RawChapter {
            title: title.to_string(),
            body: body.to_string(),
            choices: [first.to_string(), second.to_string()],
        })
    }

    /// Reject empty references and chapters that mix an ending choice
    /// with a real one. Content problems, not I/O problems, but fatal for
    /// the load attempt all the same.
    pub fn validate(&self, identifier: &str) -> Result<(), LoadError> {
        if self.choices.iter().any(|choice| choice.is_empty()) {
            return Err(LoadError::EmptyChoice {
                identifier: identifier.to_string(),
            });
        }
        let ending = self.is_ending();
        if self
            .choices
            .iter()
            .any(|choice| (choice.as_str() == END_TOKEN) != ending)
        {
            return Err(LoadError::MixedChoices {
                identifier: identifier.to_string(),
            });
        }
        Ok(())
    }

    pub fn is_ending(&self) -> bool {
        self.choices[0] == END_TOKEN
    }
}

/// Load the story reachable from `start` into a fresh store.
///
/// Returns the store and the root chapter. Loading is all-or-nothing: any
/// failure aborts the load and no partial graph escapes.
pub fn load_story<S: StorySource>(
    source: &S,
    start: &str,
) -> Result<(ChapterStore, ChapterId), LoadError> {
    let mut store = ChapterStore::new()?;
    let root = load_chapter(source, &mut store, start)?;
    debug!(
        "loaded {} chapters from {} files",
        store.chapter_count(),
        store.len()
    );
    Ok((store, root))
}

/// Load one chapter and, depth-first, everything it references.
///
/// The chapter is registered in the store before its references are
/// resolved; a reference cycling back to a chapter that is still being
/// loaded is answered by `lookup` instead of recursing forever. When the
/// insert deduplicates, the surviving record already has its choices
/// assigned (or is mid-assignment higher up the call stack), so the
/// references are not resolved a second time.
fn load_chapter<S: StorySource>(
    source: &S,
    store: &mut ChapterStore,
    identifier: &str,
) -> Result<ChapterId, LoadError> {
    let text = source.load(identifier)?;
    let raw = RawChapter::parse(identifier, &text)?;
    raw.validate(identifier)?;

    let RawChapter {
        title,
        body,
        choices,
    } = raw;
    let ending = choices[0] == END_TOKEN;

    let id = match store.insert(identifier.to_string(), Chapter::new(title, body))? {
        Insertion::Deduplicated(existing) => {
            debug!("chapter {identifier} deduplicated");
            return Ok(existing);
        }
        Insertion::Fresh(id) => id,
    };

    if !ending {
        for (slot, reference) in choices.iter().enumerate() {
            let child = match store.lookup(reference) {
                Some(existing) => existing,
                None => load_chapter(source, store, reference)?,
            };
            store.chapter_mut(id).choices[slot] = Some(child);
        }
    }
    Ok(id)
}
