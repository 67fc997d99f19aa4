//! Per-field merge rules applied when a node's update lands on the state.
//!
//! Every rule treats `None` as "no new value" and leaves the field alone.

/// Append new turns to the history.
pub fn append<T: Clone>(current: &[T], update: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(current.len() + update.len());
    out.extend_from_slice(current);
    out.extend(update);
    out
}

/// A new value replaces the old one; no value keeps the old one.
pub fn replace_if_some<T>(current: Option<T>, update: Option<T>) -> Option<T> {
    update.or(current)
}

/// Once a value is set it never changes.
pub fn keep_first<T>(current: Option<T>, update: Option<T>) -> Option<T> {
    current.or(update)
}
