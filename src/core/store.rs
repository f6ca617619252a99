/// Chapter store — an insertion-ordered identifier table over an arena of
/// deduplicated chapter records.
use log::debug;
use thiserror::Error;

use crate::schema::chapter::{Chapter, ChapterId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("out of memory")]
    OutOfMemory,
}

/// Capacity increment, in slots, used whenever the store grows.
const GROWTH_STEP: usize = 64;

/// Binds a source identifier to a chapter in the arena. After
/// deduplication several entries may point at the same chapter.
#[derive(Debug, Clone)]
struct Entry {
    identifier: String,
    chapter: ChapterId,
}

/// Outcome of an insert: a fresh record, or an alias of an existing
/// content-equal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Fresh(ChapterId),
    Deduplicated(ChapterId),
}

impl Insertion {
    /// The chapter now associated with the inserted identifier.
    pub fn id(&self) -> ChapterId {
        match *self {
            Insertion::Fresh(id) | Insertion::Deduplicated(id) => id,
        }
    }
}

/// Owns every chapter of a loaded story.
///
/// Identifiers live in an insertion-ordered table searched by linear scan;
/// no hashing. Chapters live in an arena holding each distinct record
/// exactly once, so dropping the store releases each record exactly once
/// even when deduplication aliased several identifiers to one chapter.
#[derive(Debug)]
pub struct ChapterStore {
    entries: Vec<Entry>,
    chapters: Vec<Chapter>,
}

impl ChapterStore {
    /// Create an empty store with an initial capacity of one growth step
    /// (less under memory pressure).
    pub fn new() -> Result<Self, StoreError> {
        let mut entries = Vec::new();
        let mut chapters = Vec::new();
        reserve_step(&mut entries)?;
        reserve_step(&mut chapters)?;
        Ok(Self { entries, chapters })
    }

    /// Find the chapter previously registered under `identifier`, first
    /// match in insertion order. Identifiers are unique by construction of
    /// the loader, so "first" is also "only".
    pub fn lookup(&self, identifier: &str) -> Option<ChapterId> {
        self.entries
            .iter()
            .find(|entry| entry.identifier == identifier)
            .map(|entry| entry.chapter)
    }

    /// Register `candidate` under `identifier`, growing the backing
    /// storage on demand.
    ///
    /// This is the single deduplication point: if a stored chapter is
    /// content-equal to `candidate`, the candidate is discarded and the
    /// identifier aliases the existing chapter. A failed growth reports
    /// `OutOfMemory` and leaves existing contents untouched.
    pub fn insert(&mut self, identifier: String, candidate: Chapter) -> Result<Insertion, StoreError> {
        if self.entries.len() == self.entries.capacity() {
            debug!(
                "growing chapter store past {} entries",
                self.entries.capacity()
            );
            reserve_step(&mut self.entries)?;
        }

        let insertion = match self.find_equal(&candidate) {
            Some(existing) => Insertion::Deduplicated(existing),
            None => {
                if self.chapters.len() == self.chapters.capacity() {
                    reserve_step(&mut self.chapters)?;
                }
                let id = ChapterId(self.chapters.len());
                self.chapters.push(candidate);
                Insertion::Fresh(id)
            }
        };
        self.entries.push(Entry {
            identifier,
            chapter: insertion.id(),
        });
        Ok(insertion)
    }

    /// Scan the arena for a chapter content-equal to `candidate`.
    fn find_equal(&self, candidate: &Chapter) -> Option<ChapterId> {
        self.chapters
            .iter()
            .position(|chapter| chapter.content_eq(candidate))
            .map(ChapterId)
    }

    pub fn chapter(&self, id: ChapterId) -> &Chapter {
        &self.chapters[id.0]
    }

    pub fn chapter_mut(&mut self, id: ChapterId) -> &mut Chapter {
        &mut self.chapters[id.0]
    }

    /// The chapter the story starts from: the first one ever registered.
    pub fn root(&self) -> Option<ChapterId> {
        self.entries.first().map(|entry| entry.chapter)
    }

    /// Number of registered identifiers, aliases included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct chapter records after deduplication.
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Distinct chapter handles in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ChapterId> {
        (0..self.chapters.len()).map(ChapterId)
    }

    /// Registered `(identifier, chapter)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, ChapterId)> {
        self.entries
            .iter()
            .map(|entry| (entry.identifier.as_str(), entry.chapter))
    }
}

/// Grow `vec` by one step, retrying at half the requested increment down
/// to a single slot before giving up. A failed reservation leaves the
/// vector unchanged.
fn reserve_step<T>(vec: &mut Vec<T>) -> Result<(), StoreError> {
    let mut step = GROWTH_STEP;
    loop {
        match vec.try_reserve_exact(step) {
            Ok(()) => return Ok(()),
            Err(_) if step > 1 => step /= 2,
            Err(_) => return Err(StoreError::OutOfMemory),
        }
    }
}
