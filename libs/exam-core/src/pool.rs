//! Question pooling for exam assembly.
//!
//! The backend sources questions from storage and, when storage runs
//! short, tops the pool up with generated ones. This module holds the
//! pure merge rules so they can be tested without a database.

use std::collections::HashSet;

use crate::types::Question;

/// Stored questions below this count trigger generation.
pub const MIN_POOL_SIZE: usize = 10;

/// Number of questions in a full exam.
pub const EXAM_SIZE: usize = 25;

/// True when the stored pool is too small to fill an exam on its own.
pub fn needs_generation(existing: usize) -> bool {
    existing < MIN_POOL_SIZE
}

/// Merge stored and generated questions into one exam pool.
///
/// Stored questions keep their order and come first; duplicate ids keep
/// the first occurrence; the pool is cut off at `target`.
pub fn assemble_pool(
    existing: Vec<Question>,
    generated: Vec<Question>,
    target: usize,
) -> Vec<Question> {
    let mut seen = HashSet::new();
    let mut pool = Vec::with_capacity(target.min(existing.len() + generated.len()));
    for question in existing.into_iter().chain(generated) {
        if pool.len() == target {
            break;
        }
        if seen.insert(question.id.clone()) {
            pool.push(question);
        }
    }
    pool
}
