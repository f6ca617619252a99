/// Story graph analysis — does the story have a reachable ending, and can
/// any cycle trap the player forever?
use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::store::ChapterStore;
use crate::schema::chapter::{ChapterId, CHOICE_COUNT};

/// Per-node traversal status.
///
/// `DeadEnd` is revisable: it is assigned while a cycle is still being
/// explored and may be overwritten with `ReachesEnd` later in the same
/// pass, once a sibling branch shows a way out. Only the statuses left
/// after the full pass are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Not processed yet.
    Unvisited,
    /// On the current traversal path; seeing it again means a cycle.
    InProgress,
    /// No known route to an ending, possibly stale.
    DeadEnd,
    /// At least one route from here reaches an ending.
    ReachesEnd,
}

/// Whole-graph verdict. Advisory for play: a degraded verdict describes
/// story quality, not a fatal defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Every chapter can still reach an ending.
    Possible,
    /// No ending is reachable from the start chapter.
    NoReachableEnd,
    /// An ending is reachable, but some cycle, once entered, never is.
    InescapableMaze,
}

/// One full analysis pass over a loaded story graph.
///
/// Statuses live in a side table indexed by chapter handle, so the store
/// itself stays read-only during analysis. The classifier never fails:
/// every well-formed graph gets a verdict.
pub struct GraphClassifier<'a> {
    store: &'a ChapterStore,
    status: Vec<NodeStatus>,
}

impl<'a> GraphClassifier<'a> {
    /// Classify the graph reachable from `root`.
    ///
    /// Traversal is depth-first and cycle-safe: re-entering a chapter that
    /// is still `InProgress` switches to the alternate-route scan instead
    /// of recursing down the cycle edge again. The verdict is derived from
    /// the final status of every stored chapter, not just the root, since
    /// a `DeadEnd` assigned mid-pass may be stale by the time the pass
    /// ends.
    pub fn analyze(store: &'a ChapterStore, root: ChapterId) -> Verdict {
        let mut classifier = Self {
            store,
            status: vec![NodeStatus::Unvisited; store.chapter_count()],
        };
        classifier.traverse(root);
        let verdict = classifier.classify(root);
        debug!(
            "classified {} chapters: {verdict:?}",
            store.chapter_count()
        );
        verdict
    }

    fn traverse(&mut self, id: ChapterId) {
        match self.status[id.0] {
            // Already resolved, no re-exploration.
            NodeStatus::ReachesEnd | NodeStatus::DeadEnd => {}
            // An ancestor on the current path: a cycle closed here.
            NodeStatus::InProgress => self.visit_alternate(id),
            NodeStatus::Unvisited => {
                self.status[id.0] = NodeStatus::InProgress;
                self.visit_children(id);
            }
        }
    }

    /// First entry into a chapter: visit both choice slots in order. A
    /// terminal slot resolves the chapter immediately; an ending chapter
    /// has both slots terminal, so checking slot order costs nothing.
    fn visit_children(&mut self, id: ChapterId) {
        for slot in 0..CHOICE_COUNT {
            match self.store.chapter(id).choices[slot] {
                Some(child) => self.traverse(child),
                None => {
                    self.status[id.0] = NodeStatus::ReachesEnd;
                    return;
                }
            }
        }
        self.status[id.0] = self.evaluate(id);
    }

    /// Re-entry into an `InProgress` chapter. Slot 0 is the edge assumed
    /// to close the cycle and is deliberately not inspected; only the
    /// later slots are walked, in reverse. This asymmetry matches the
    /// first-entry visit, which explores slot 0 first, and is what lets
    /// the pass terminate on cycles.
    fn visit_alternate(&mut self, id: ChapterId) {
        for slot in (1..CHOICE_COUNT).rev() {
            match self.store.chapter(id).choices[slot] {
                None => {
                    self.status[id.0] = NodeStatus::ReachesEnd;
                    return;
                }
                Some(child) if self.status[child.0] == NodeStatus::ReachesEnd => {
                    self.status[id.0] = NodeStatus::ReachesEnd;
                    return;
                }
                Some(child) if self.status[child.0] == NodeStatus::Unvisited => {
                    self.traverse(child);
                }
                Some(_) => {}
            }
        }
        self.status[id.0] = self.evaluate(id);
    }

    /// A chapter reaches an end if either child currently does. A child
    /// still `InProgress` counts as not-yet-known; if it later resolves to
    /// `ReachesEnd`, the whole-store scan in `classify` is what keeps the
    /// verdict honest.
    fn evaluate(&self, id: ChapterId) -> NodeStatus {
        for slot in 0..CHOICE_COUNT {
            if let Some(child) = self.store.chapter(id).choices[slot] {
                if self.status[child.0] == NodeStatus::ReachesEnd {
                    return NodeStatus::ReachesEnd;
                }
            }
        }
        NodeStatus::DeadEnd
    }

    fn classify(&self, root: ChapterId) -> Verdict {
        if self.status[root.0] != NodeStatus::ReachesEnd {
            return Verdict::NoReachableEnd;
        }
        // The root escapes, but a chapter that never resolved to
        // ReachesEnd marks a maze: entered, it cannot reach an ending.
        if self
            .status
            .iter()
            .any(|status| *status != NodeStatus::ReachesEnd)
        {
            return Verdict::InescapableMaze;
        }
        Verdict::Possible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::chapter::Chapter;

    /// Build a store from `(identifier, title, [choice identifiers])`
    /// triples; an empty choice list marks an ending chapter.
    fn build(graph: &[(&str, &str, &[&str])]) -> (ChapterStore, ChapterId) {
        let mut store = ChapterStore::new().unwrap();
        for (identifier, title, _) in graph {
            store
                .insert(
                    identifier.to_string(),
                    Chapter::new(*title, format!("Body of {title}.")),
                )
                .unwrap();
        }
        for (identifier, _, choices) in graph {
            if choices.is_empty() {
                continue;
            }
            let id = store.lookup(identifier).unwrap();
            for (slot, child) in choices.iter().enumerate() {
                let child = store.lookup(child).unwrap();
                store.chapter_mut(id).choices[slot] = Some(child);
            }
        }
        let root = store.root().unwrap();
        (store, root)
    }

    #[test]
    fn single_ending_chapter_is_possible() {
        let (store, root) = build(&[("end", "The End", &[])]);
        assert_eq!(GraphClassifier::analyze(&store, root), Verdict::Possible);
    }

    #[test]
    fn acyclic_graph_where_every_path_ends() {
        let (store, root) = build(&[
            ("start", "Start", &["left", "right"]),
            ("left", "Left", &["end", "end"]),
            ("right", "Right", &["end", "end"]),
            ("end", "End", &[]),
        ]);
        assert_eq!(GraphClassifier::analyze(&store, root), Verdict::Possible);
    }

    #[test]
    fn two_node_cycle_without_ending() {
        let (store, root) = build(&[
            ("a", "A", &["b", "b"]),
            ("b", "B", &["a", "a"]),
        ]);
        assert_eq!(
            GraphClassifier::analyze(&store, root),
            Verdict::NoReachableEnd
        );
    }

    #[test]
    fn cycle_with_an_exit_is_possible() {
        // A -> {B, C}, B -> {A, A}, C ends: the cycle A-B can always be
        // left through C.
        let (store, root) = build(&[
            ("a", "A", &["b", "c"]),
            ("b", "B", &["a", "a"]),
            ("c", "C", &[]),
        ]);
        assert_eq!(GraphClassifier::analyze(&store, root), Verdict::Possible);
    }

    #[test]
    fn unreachable_pocket_cycle_is_a_maze() {
        // The root reaches an ending, but once the player enters the
        // trap-loop pair there is no way back out.
        let (store, root) = build(&[
            ("start", "Start", &["end", "trap"]),
            ("trap", "Trap", &["loop", "loop"]),
            ("loop", "Loop", &["trap", "trap"]),
            ("end", "End", &[]),
        ]);
        assert_eq!(
            GraphClassifier::analyze(&store, root),
            Verdict::InescapableMaze
        );
    }

    #[test]
    fn ending_on_second_slot_behind_a_cycle() {
        // The cycle closes through slot 0; the escape sits on slot 1 of
        // the re-entered chapter, exactly what the alternate scan checks.
        let (store, root) = build(&[
            ("a", "A", &["b", "end"]),
            ("b", "B", &["a", "a"]),
            ("end", "End", &[]),
        ]);
        assert_eq!(GraphClassifier::analyze(&store, root), Verdict::Possible);
    }

    #[test]
    fn self_loop_without_ending() {
        let (store, root) = build(&[("a", "A", &["a", "a"])]);
        assert_eq!(
            GraphClassifier::analyze(&store, root),
            Verdict::NoReachableEnd
        );
    }

    #[test]
    fn chapter_never_loaded_into_the_path_counts_as_maze() {
        // A disconnected chapter stays Unvisited after the pass; since
        // the root still reaches an end, the verdict is a maze.
        let (mut store, root) = build(&[
            ("start", "Start", &["end", "end"]),
            ("end", "End", &[]),
        ]);
        store
            .insert("orphan".to_string(), Chapter::new("Orphan", "Unreached."))
            .unwrap();
        assert_eq!(
            GraphClassifier::analyze(&store, root),
            Verdict::InescapableMaze
        );
    }

    #[test]
    fn analyze_is_idempotent() {
        let (store, root) = build(&[
            ("a", "A", &["b", "c"]),
            ("b", "B", &["a", "a"]),
            ("c", "C", &[]),
        ]);
        let first = GraphClassifier::analyze(&store, root);
        let second = GraphClassifier::analyze(&store, root);
        assert_eq!(first, second);
    }

    #[test]
    fn no_reachable_end_when_all_paths_loop() {
        // Deep graph with no terminal anywhere.
        let (store, root) = build(&[
            ("a", "A", &["b", "c"]),
            ("b", "B", &["c", "a"]),
            ("c", "C", &["a", "b"]),
        ]);
        assert_eq!(
            GraphClassifier::analyze(&store, root),
            Verdict::NoReachableEnd
        );
    }
}
