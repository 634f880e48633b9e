//! Structural edits on nested JSON mappings of unknown depth.
//!
//! Older layouts put the same key at different nesting levels, so these
//! primitives search the whole tree instead of addressing a fixed path.
//! Only objects are descended into; arrays and scalars are leaves.
//! Traversal follows the iteration order of each mapping, which is the
//! sorted key order.

use serde_json::{Map, Value};

/// Relocates the first occurrence of `target_key` found in `root`.
///
/// The search is depth-first: a mapping's own keys are checked before any of
/// its children, and the search stops at the first hit, so a single call moves
/// at most one occurrence. With `keep` the original stays in place and a copy
/// is installed; otherwise it is removed.
///
/// The value is installed at `root[target_key]` when `destination` is empty,
/// or at `root[destination][target_key]` otherwise. A missing destination
/// mapping is created; a destination that is not a mapping is replaced by one.
///
/// Returns `false`, leaving `root` untouched, when the key does not occur.
pub fn find_and_move(
    root: &mut Map<String, Value>,
    target_key: &str,
    destination: &str,
    keep: bool,
) -> bool {
    let Some(value) = take_first(root, target_key, keep) else {
        return false;
    };

    if destination.is_empty() {
        root.insert(target_key.to_string(), value);
        return true;
    }

    let slot = root
        .entry(destination)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(profile) = slot {
        profile.insert(target_key.to_string(), value);
    }
    true
}

fn take_first(map: &mut Map<String, Value>, key: &str, keep: bool) -> Option<Value> {
    if keep {
        if let Some(value) = map.get(key) {
            return Some(value.clone());
        }
    } else if let Some(value) = map.remove(key) {
        return Some(value);
    }

    map.values_mut().find_map(|child| match child {
        Value::Object(inner) => take_first(inner, key, keep),
        _ => None,
    })
}

/// Deletes every occurrence of `target_key`, at every depth.
///
/// Returns how many entries were removed.
pub fn remove_all(root: &mut Map<String, Value>, target_key: &str) -> usize {
    let mut removed = usize::from(root.remove(target_key).is_some());
    for child in root.values_mut() {
        if let Value::Object(inner) = child {
            removed += remove_all(inner, target_key);
        }
    }
    removed
}
