//! This module contains the incremental reducer algebra.
//!
//! A [Folder] is a reusable value describing one reduction: an initial state,
//! a step function, an extraction from state to result, and an optional
//! escape predicate for early termination. Folders compose on both ends
//! (input combinators reshape what the folder is fed, [Folder::map_result]
//! reshapes what it returns) and fan out over one input pass via [combine].

mod folder;
pub use folder::Folder;

mod input;
pub use input::PatchCursor;

mod combine;
pub use combine::{combine, combine_with};

pub mod catalog;
