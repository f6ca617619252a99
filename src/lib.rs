//! Adventure Graph — a branching-narrative engine for text adventures.
//!
//! Loads chapter files into a deduplicated story graph, classifies the
//! graph before play (is an ending reachable? does the story contain an
//! inescapable maze?), and runs the interactive two-choice play loop.

pub mod core;
pub mod schema;
