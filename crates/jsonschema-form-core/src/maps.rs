//! Pointer-keyed maps shared by every compiler stage.
//!
//! All maps are created empty at the start of a compile pass, filled during
//! the walk, and replaced wholesale by the next compile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pointer::{self, Pointer};

// ---------------------------------------------------------------------------
// ArityMap
// ---------------------------------------------------------------------------

/// Generic pointer of an array node → number of fixed (tuple) positions.
///
/// Index `i` below a recorded array is a list position (and generalizes to
/// the wildcard) iff `i >= arity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArityMap(BTreeMap<Pointer, usize>);

impl ArityMap {
    pub fn insert(&mut self, array: Pointer, tuple_items: usize) {
        self.0.insert(array, tuple_items);
    }

    pub fn get(&self, array: &Pointer) -> Option<usize> {
        self.0.get(array).copied()
    }

    pub fn contains(&self, array: &Pointer) -> bool {
        self.0.contains_key(array)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pointer, usize)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RecursiveRefMap
// ---------------------------------------------------------------------------

/// Location inside a cycle → shallowest equivalent location.
///
/// Every entry maps a pointer to a strictly shorter one, so repeated
/// resolution always terminates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecursiveRefMap(BTreeMap<Pointer, Pointer>);

impl RecursiveRefMap {
    /// Record `from → to`. Entries that would not shorten the pointer are
    /// refused and `false` is returned.
    pub fn insert(&mut self, from: Pointer, to: Pointer) -> bool {
        if to.len() >= from.len() {
            return false;
        }
        self.0.insert(from, to);
        true
    }

    pub fn get(&self, from: &Pointer) -> Option<&Pointer> {
        self.0.get(from)
    }

    pub fn contains_target(&self, to: &Pointer) -> bool {
        self.0.values().any(|t| t == to)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pointer, &Pointer)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One resolution hop: rebase `pointer` through the longest recorded
    /// ancestor-or-self key.
    pub fn step(&self, pointer: &Pointer) -> Option<Pointer> {
        (0..=pointer.len()).rev().find_map(|len| {
            let prefix = pointer.prefix(len);
            let to = self.0.get(&prefix)?;
            pointer.rebase(&prefix, to)
        })
    }

    /// Every intermediate pointer visited while resolving `pointer`, ending
    /// with the fully shortened form. Each hop is strictly shorter.
    pub fn hops(&self, pointer: &Pointer) -> Vec<Pointer> {
        let mut hops = Vec::new();
        let mut current = pointer.clone();
        while let Some(next) = self.step(&current) {
            if next.len() >= current.len() {
                break;
            }
            hops.push(next.clone());
            current = next;
        }
        hops
    }

    /// Shorten `pointer` until no recorded key applies.
    pub fn resolve(&self, pointer: &Pointer) -> Pointer {
        self.hops(pointer)
            .pop()
            .unwrap_or_else(|| pointer.clone())
    }

    /// Rewrite every target through the other entries until nothing shortens.
    pub fn shorten(&mut self) {
        loop {
            let mut changed = false;
            let updates: Vec<(Pointer, Pointer)> = self
                .0
                .iter()
                .filter_map(|(from, to)| {
                    let shorter = self.resolve(to);
                    (shorter.len() < to.len()).then(|| (from.clone(), shorter))
                })
                .collect();
            for (from, to) in updates {
                self.0.insert(from, to);
                changed = true;
            }
            if !changed {
                break;
            }
        }
    }
}

/// Generalize `pointer`, then fold it through the recursive map until it
/// reaches a location with a record of its own, alternating the two steps.
pub fn canonical_data_pointer(
    pointer: &Pointer,
    arity: &ArityMap,
    recursive: &RecursiveRefMap,
) -> Pointer {
    let mut current = pointer::to_generic(pointer, arity);
    while let Some(next) = recursive.step(&current) {
        if next.len() >= current.len() {
            break;
        }
        current = pointer::to_generic(&next, arity);
    }
    current
}

// ---------------------------------------------------------------------------
// RefLibrary
// ---------------------------------------------------------------------------

/// A library slot: either still being built, or complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum LibraryEntry<T> {
    Pending,
    Ready(T),
}

/// Memo table of fragments keyed by generic pointer.
///
/// [`begin`](RefLibrary::begin) stores a pending placeholder before the
/// fragment's children are built, so a self-referential walk that reaches
/// the same key again observes "in progress" instead of recursing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefLibrary<T>(BTreeMap<Pointer, LibraryEntry<T>>);

impl<T> Default for RefLibrary<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T> RefLibrary<T> {
    /// Reserve `key`. Returns `false` if it is already pending or ready.
    pub fn begin(&mut self, key: &Pointer) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.clone(), LibraryEntry::Pending);
        true
    }

    pub fn finish(&mut self, key: Pointer, value: T) {
        self.0.insert(key, LibraryEntry::Ready(value));
    }

    /// The completed fragment, if construction has finished.
    pub fn get(&self, key: &Pointer) -> Option<&T> {
        match self.0.get(key) {
            Some(LibraryEntry::Ready(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_pending(&self, key: &Pointer) -> bool {
        matches!(self.0.get(key), Some(LibraryEntry::Pending))
    }

    pub fn contains(&self, key: &Pointer) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Pointer> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DataMap
// ---------------------------------------------------------------------------

/// Metadata for one generic data location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMapEntry {
    pub schema_pointer: Pointer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_type: Option<String>,
    pub required: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuple_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_items: Option<usize>,
}

/// One [`DataMapEntry`] per distinct generic data location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataMap(BTreeMap<Pointer, DataMapEntry>);

impl DataMap {
    pub fn get(&self, pointer: &Pointer) -> Option<&DataMapEntry> {
        self.0.get(pointer)
    }

    pub fn get_mut(&mut self, pointer: &Pointer) -> Option<&mut DataMapEntry> {
        self.0.get_mut(pointer)
    }

    pub fn contains(&self, pointer: &Pointer) -> bool {
        self.0.contains_key(pointer)
    }

    /// The key whose record describes `pointer`: its generic form if that
    /// has a record, otherwise the generic form folded through `recursive`.
    pub fn key_for(&self, pointer: &Pointer, arity: &ArityMap, recursive: &RecursiveRefMap) -> Pointer {
        let generic = pointer::to_generic(pointer, arity);
        if self.contains(&generic) {
            generic
        } else {
            canonical_data_pointer(&generic, arity, recursive)
        }
    }

    /// The record for `pointer`, created empty if absent.
    pub fn entry(&mut self, pointer: Pointer) -> &mut DataMapEntry {
        self.0.entry(pointer).or_default()
    }

    /// Direct children of `parent`, by key.
    pub fn children<'a>(
        &'a self,
        parent: &'a Pointer,
    ) -> impl Iterator<Item = (&'a str, &'a DataMapEntry)> + 'a {
        self.0
            .range(parent.clone()..)
            .take_while(move |(ptr, _)| ptr.starts_with(parent))
            .filter(move |(ptr, _)| ptr.len() == parent.len() + 1)
            .filter_map(|(ptr, entry)| ptr.last().map(|key| (key, entry)))
    }

    /// Direct children of `parent` that are marked required.
    pub fn required_children<'a>(
        &'a self,
        parent: &'a Pointer,
    ) -> impl Iterator<Item = (&'a str, &'a DataMapEntry)> + 'a {
        self.children(parent).filter(|(_, entry)| entry.required)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pointer, &DataMapEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    #[test]
    fn test_recursive_map_refuses_non_shortening_entries() {
        let mut map = RecursiveRefMap::default();
        assert!(!map.insert(p("/a"), p("/a")));
        assert!(!map.insert(p("/a"), p("/b/c")));
        assert!(map.insert(p("/a/b"), p("")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_recursive_map_resolve_uses_longest_prefix() {
        let mut map = RecursiveRefMap::default();
        map.insert(p("/children/-"), p(""));
        assert_eq!(map.resolve(&p("/children/-/name")), p("/name"));
        assert_eq!(
            map.resolve(&p("/children/-/children/-/name")),
            p("/name")
        );
        assert_eq!(map.resolve(&p("/other")), p("/other"));
    }

    #[test]
    fn test_recursive_map_hops_strictly_shorten() {
        let mut map = RecursiveRefMap::default();
        map.insert(p("/a/b/c"), p("/a"));
        map.insert(p("/a/c"), p(""));
        let hops = map.hops(&p("/a/b/c/c/x"));
        assert_eq!(hops, vec![p("/a/c/x"), p("/x")]);
    }

    #[test]
    fn test_recursive_map_shorten_rewrites_targets() {
        let mut map = RecursiveRefMap::default();
        map.insert(p("/x/y/z/w"), p("/x/y/z"));
        map.insert(p("/x/y"), p("/x"));
        map.shorten();
        assert_eq!(map.get(&p("/x/y/z/w")), Some(&p("/x/z")));
    }

    #[test]
    fn test_canonical_data_pointer_alternates_generalize_and_fold() {
        let mut arity = ArityMap::default();
        arity.insert(p("/children"), 0);
        let mut recursive = RecursiveRefMap::default();
        recursive.insert(p("/children/-"), p(""));
        assert_eq!(
            canonical_data_pointer(&p("/children/0/children/3/name"), &arity, &recursive),
            p("/name")
        );
    }

    #[test]
    fn test_ref_library_placeholder_guards_reentry() {
        let mut library: RefLibrary<String> = RefLibrary::default();
        assert!(library.begin(&p("")));
        assert!(library.is_pending(&p("")));
        assert!(!library.begin(&p("")));
        assert_eq!(library.get(&p("")), None);
        library.finish(p(""), "done".to_string());
        assert_eq!(library.get(&p("")), Some(&"done".to_string()));
        assert!(!library.begin(&p("")));
    }

    #[test]
    fn test_data_map_required_children() {
        let mut map = DataMap::default();
        map.entry(p("")).schema_type = Some("object".into());
        map.entry(p("/a")).required = true;
        map.entry(p("/a/deep")).required = true;
        map.entry(p("/b"));
        let root = p("");
        let required: Vec<&str> = map.required_children(&root).map(|(k, _)| k).collect();
        assert_eq!(required, vec!["a"]);
    }

    #[test]
    fn test_data_map_serializes_with_pointer_keys() {
        let mut map = DataMap::default();
        let entry = map.entry(p("/name"));
        entry.schema_pointer = p("/properties/name");
        entry.schema_type = Some("string".into());
        entry.required = true;
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            json!({
                "/name": {
                    "schemaPointer": "/properties/name",
                    "schemaType": "string",
                    "required": true,
                    "disabled": false
                }
            })
        );
    }
}
