//! # File Selection
//!
//! Picks one name out of a listing. Injectable so tests can be deterministic.

use rand::seq::SliceRandom;

/// Chooses one entry of a non-empty listing
pub trait FileSelector: Send + Sync + std::fmt::Debug {
    /// Return one element of `files`, or `None` when `files` is empty
    fn select<'a>(&self, files: &'a [String]) -> Option<&'a String>;
}

/// Uniformly random choice
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl FileSelector for RandomSelector {
    fn select<'a>(&self, files: &'a [String]) -> Option<&'a String> {
        files.choose(&mut rand::thread_rng())
    }
}

/// Always the first entry in listing order
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSelector;

impl FileSelector for FirstSelector {
    fn select<'a>(&self, files: &'a [String]) -> Option<&'a String> {
        files.first()
    }
}
