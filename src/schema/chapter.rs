use serde::{Deserialize, Serialize};

/// Number of outgoing choices on a non-ending chapter.
pub const CHOICE_COUNT: usize = 2;

/// Newtype wrapper for chapter handles: an index into the store's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterId(pub usize);

/// A story unit: a title, a body, and two outgoing choice slots.
///
/// A slot holding `None` is terminal ("the story ends here"). Either both
/// slots are terminal or both reference another chapter; the loader rejects
/// chapters that mix the two. Slots hold arena handles into the owning
/// `ChapterStore`, never ownership, so several chapters may share a child
/// after deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub body: String,
    pub choices: [Option<ChapterId>; CHOICE_COUNT],
}

impl Chapter {
    /// Create a chapter with both choice slots terminal. The loader fills
    /// in real slots after the chapter is registered in the store.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            choices: [None; CHOICE_COUNT],
        }
    }

    /// Returns true if this chapter ends the story.
    pub fn is_ending(&self) -> bool {
        self.choices[0].is_none()
    }

    /// Content equality, the store's deduplication predicate: identical
    /// title and body bytes. Choice slots are ignored; two copies of the
    /// same chapter text collapse to one node no matter where they were
    /// loaded from.
    pub fn content_eq(&self, other: &Chapter) -> bool {
        self.title == other.title && self.body == other.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chapter_is_ending() {
        let chapter = Chapter::new("The Gate", "The road ends at a gate.");
        assert!(chapter.is_ending());
        assert_eq!(chapter.choices, [None, None]);
    }

    #[test]
    fn content_eq_ignores_choices() {
        let mut a = Chapter::new("Fork", "Two paths diverge.");
        let b = Chapter::new("Fork", "Two paths diverge.");
        a.choices = [Some(ChapterId(3)), Some(ChapterId(7))];
        assert!(a.content_eq(&b));
        assert!(b.content_eq(&a));
    }

    #[test]
    fn content_eq_compares_both_fields() {
        let a = Chapter::new("Fork", "Two paths diverge.");
        let b = Chapter::new("Fork", "Three paths diverge.");
        let c = Chapter::new("Crossing", "Two paths diverge.");
        assert!(!a.content_eq(&b));
        assert!(!a.content_eq(&c));
    }
}
