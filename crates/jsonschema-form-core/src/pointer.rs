//! JSON Pointer algebra (RFC 6901).
//!
//! A [`Pointer`] is an ordered sequence of unescaped keys. Its two surface
//! forms, the `/`-delimited escaped string and the key array, convert
//! losslessly through [`parse`] and [`compile`].
//!
//! Besides plain get/set/insert/remove this module converts between
//! *indexed* pointers (concrete array positions) and *generic* pointers
//! (variable-length positions written as [`WILDCARD`]) using an
//! [`ArityMap`], so that every live instance of a list item shares one
//! metadata key.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::maps::ArityMap;

/// Key written in place of a variable-length array position.
pub const WILDCARD: &str = "-";

/// Errors produced while parsing or applying a pointer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("pointer {pointer:?} must be empty or start with '/'")]
    MissingLeadingSlash { pointer: String },

    #[error("pointer {pointer:?} contains '~' not followed by '0' or '1'")]
    InvalidEscape { pointer: String },

    #[error("object path {pointer:?} is malformed")]
    InvalidObjectPath { pointer: String },

    #[error("value at {pointer} is not an object or array")]
    NotAContainer { pointer: String },

    #[error("key {key:?} is not a valid index for the array at {pointer}")]
    InvalidIndex { pointer: String, key: String },
}

impl PointerError {
    /// The pointer (or path) the error refers to.
    pub fn pointer(&self) -> &str {
        match self {
            PointerError::MissingLeadingSlash { pointer }
            | PointerError::InvalidEscape { pointer }
            | PointerError::InvalidObjectPath { pointer }
            | PointerError::NotAContainer { pointer }
            | PointerError::InvalidIndex { pointer, .. } => pointer,
        }
    }
}

// ---------------------------------------------------------------------------
// Pointer
// ---------------------------------------------------------------------------

/// A parsed JSON Pointer.
///
/// Serializes as its compiled string form, so pointers can be used as JSON
/// object keys in serialized maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Pointer(Vec<String>);

impl Pointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Pointer(Vec::new())
    }

    /// Parse either surface form (`/a/b`, or the URI fragment form `#/a/b`).
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        parse(pointer).map(Pointer)
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Pointer(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(key.into());
    }

    /// A new pointer one level deeper.
    pub fn child(&self, key: impl Into<String>) -> Pointer {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Pointer(keys)
    }

    /// A new pointer with every key of `suffix` appended.
    pub fn join<S: AsRef<str>>(&self, suffix: &[S]) -> Pointer {
        let mut keys = self.0.clone();
        keys.extend(suffix.iter().map(|k| k.as_ref().to_string()));
        Pointer(keys)
    }

    pub fn parent(&self) -> Option<Pointer> {
        if self.0.is_empty() {
            None
        } else {
            Some(Pointer(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The first `len` keys.
    pub fn prefix(&self, len: usize) -> Pointer {
        Pointer(self.0[..len.min(self.0.len())].to_vec())
    }

    pub fn starts_with(&self, prefix: &Pointer) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The keys remaining after `prefix`, if `prefix` is an ancestor-or-self.
    pub fn strip_prefix(&self, prefix: &Pointer) -> Option<&[String]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    /// Replace the leading `from` with `to`.
    pub fn rebase(&self, from: &Pointer, to: &Pointer) -> Option<Pointer> {
        self.strip_prefix(from).map(|rest| to.join(rest))
    }

    /// True if any key is the [`WILDCARD`].
    pub fn is_generic(&self) -> bool {
        self.0.iter().any(|k| k == WILDCARD)
    }

    /// The `#`-prefixed URI fragment form used in `$ref` values.
    pub fn to_fragment(&self) -> String {
        format!("#{}", compile(&self.0))
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&compile(&self.0))
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

impl From<Pointer> for String {
    fn from(pointer: Pointer) -> Self {
        pointer.to_string()
    }
}

impl TryFrom<String> for Pointer {
    type Error = PointerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pointer::parse(&value)
    }
}

// ---------------------------------------------------------------------------
// Escaping, parse and compile
// ---------------------------------------------------------------------------

/// Escape a single key per RFC 6901 (`~` → `~0`, `/` → `~1`).
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_key(key: &str) -> Cow<'_, str> {
    if key.contains('~') || key.contains('/') {
        Cow::Owned(key.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(key)
    }
}

/// Unescape a single key, rejecting `~` sequences other than `~0` and `~1`.
///
/// `pointer` is only used for the error context.
pub fn unescape_key<'k>(key: &'k str, pointer: &str) -> Result<Cow<'k, str>, PointerError> {
    if !key.contains('~') {
        return Ok(Cow::Borrowed(key));
    }
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => {
                return Err(PointerError::InvalidEscape {
                    pointer: pointer.to_string(),
                })
            }
        }
    }
    Ok(Cow::Owned(out))
}

/// Split a pointer string into unescaped keys.
///
/// Accepts `""`/`"#"` for the root, `/a/b`, and the fragment form `#/a/b`.
pub fn parse(pointer: &str) -> Result<Vec<String>, PointerError> {
    let stripped = pointer.strip_prefix('#').unwrap_or(pointer);
    if stripped.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = stripped.strip_prefix('/') else {
        return Err(PointerError::MissingLeadingSlash {
            pointer: pointer.to_string(),
        });
    };
    body.split('/')
        .map(|key| unescape_key(key, pointer).map(Cow::into_owned))
        .collect()
}

/// Join keys into the `/`-delimited escaped string form.
pub fn compile<S: AsRef<str>>(keys: &[S]) -> String {
    let mut out = String::new();
    for key in keys {
        out.push('/');
        out.push_str(&escape_key(key.as_ref()));
    }
    out
}

/// Parse a dotted object path (`a.b[0].c`, `a.b[].c`, `a["x.y"]`) into a pointer.
///
/// Empty brackets denote a variable-length array position and become the
/// [`WILDCARD`]. Strings that already look like JSON Pointers are parsed as
/// such.
pub fn parse_object_path(path: &str) -> Result<Pointer, PointerError> {
    if path.is_empty() || path.starts_with('/') || path.starts_with('#') {
        return Pointer::parse(path);
    }
    let malformed = || PointerError::InvalidObjectPath {
        pointer: path.to_string(),
    };
    let mut keys = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    keys.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                if !current.is_empty() {
                    keys.push(std::mem::take(&mut current));
                }
                let mut segment = String::new();
                let quote = match chars.peek() {
                    Some(&q) if q == '"' || q == '\'' => {
                        chars.next();
                        Some(q)
                    }
                    _ => None,
                };
                loop {
                    match chars.next() {
                        Some(q) if Some(q) == quote => {
                            if chars.next() != Some(']') {
                                return Err(malformed());
                            }
                            break;
                        }
                        Some(']') if quote.is_none() => break,
                        Some(other) => segment.push(other),
                        None => return Err(malformed()),
                    }
                }
                if segment.is_empty() && quote.is_none() {
                    keys.push(WILDCARD.to_string());
                } else {
                    keys.push(segment);
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        keys.push(current);
    }
    Ok(Pointer(keys))
}

/// Parse an array index key (`0`, or digits without a leading zero).
pub fn index_of(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

// ---------------------------------------------------------------------------
// Value access
// ---------------------------------------------------------------------------

/// Look up the value at `pointer`.
///
/// `None` means "not found", which is distinct from `Some(&Value::Null)`.
pub fn get<'v>(root: &'v Value, pointer: &Pointer) -> Option<&'v Value> {
    let mut node = root;
    for key in pointer.keys() {
        node = match node {
            Value::Object(map) => map.get(key)?,
            Value::Array(arr) => arr.get(index_of(key)?)?,
            _ => return None,
        };
    }
    Some(node)
}

pub fn get_mut<'v>(root: &'v mut Value, pointer: &Pointer) -> Option<&'v mut Value> {
    let mut node = root;
    for key in pointer.keys() {
        node = match node {
            Value::Object(map) => map.get_mut(key)?,
            Value::Array(arr) => arr.get_mut(index_of(key)?)?,
            _ => return None,
        };
    }
    Some(node)
}

pub fn has(root: &Value, pointer: &Pointer) -> bool {
    get(root, pointer).is_some()
}

/// Set the value at `pointer`, creating missing containers along the way.
///
/// A missing container becomes an array when the key that follows it is an
/// index or the wildcard, otherwise an object. `-` on an array appends.
pub fn set(root: &mut Value, pointer: &Pointer, value: Value) -> Result<(), PointerError> {
    write(root, pointer, value, false)
}

/// Like [`set`], but array positions shift existing items right instead of
/// overwriting them.
pub fn insert(root: &mut Value, pointer: &Pointer, value: Value) -> Result<(), PointerError> {
    write(root, pointer, value, true)
}

fn write(
    root: &mut Value,
    pointer: &Pointer,
    value: Value,
    shift: bool,
) -> Result<(), PointerError> {
    let Some((last, parents)) = pointer.keys().split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for (depth, key) in parents.iter().enumerate() {
        let next_key = &pointer.keys()[depth + 1];
        let here = pointer.prefix(depth);
        node = descend_or_create(node, key, next_key, &here)?;
    }

    let here = pointer.prefix(parents.len());
    match node {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if last == WILDCARD {
                arr.push(value);
                return Ok(());
            }
            let index = index_of(last).ok_or_else(|| PointerError::InvalidIndex {
                pointer: here.to_string(),
                key: last.clone(),
            })?;
            if index >= arr.len() {
                arr.resize(index, Value::Null);
                arr.push(value);
            } else if shift {
                arr.insert(index, value);
            } else {
                arr[index] = value;
            }
            Ok(())
        }
        _ => Err(PointerError::NotAContainer {
            pointer: here.to_string(),
        }),
    }
}

fn descend_or_create<'v>(
    node: &'v mut Value,
    key: &str,
    next_key: &str,
    here: &Pointer,
) -> Result<&'v mut Value, PointerError> {
    let empty_container = || {
        if next_key == WILDCARD || index_of(next_key).is_some() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        }
    };
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => {
            let child = map.entry(key.to_string()).or_insert_with(empty_container);
            if child.is_null() {
                *child = empty_container();
            }
            Ok(child)
        }
        Value::Array(arr) => {
            let index = if key == WILDCARD {
                arr.len()
            } else {
                index_of(key).ok_or_else(|| PointerError::InvalidIndex {
                    pointer: here.to_string(),
                    key: key.to_string(),
                })?
            };
            if index >= arr.len() {
                arr.resize(index, Value::Null);
                arr.push(empty_container());
            }
            let child = &mut arr[index];
            if child.is_null() {
                *child = empty_container();
            }
            Ok(child)
        }
        _ => Err(PointerError::NotAContainer {
            pointer: here.to_string(),
        }),
    }
}

/// Remove and return the value at `pointer`; array items after it shift left.
///
/// Removing the root leaves `null` behind.
pub fn remove(root: &mut Value, pointer: &Pointer) -> Option<Value> {
    let Some((last, _)) = pointer.keys().split_last() else {
        return Some(std::mem::take(root));
    };
    let parent = get_mut(root, &pointer.prefix(pointer.len() - 1))?;
    match parent {
        Value::Object(map) => map.shift_remove(last),
        Value::Array(arr) => {
            let index = index_of(last)?;
            (index < arr.len()).then(|| arr.remove(index))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Pointer relationships and generalization
// ---------------------------------------------------------------------------

/// True if `short` is a strict ancestor of `long` (or equal, when
/// `include_equal` is set).
pub fn is_sub_pointer(short: &Pointer, long: &Pointer, include_equal: bool) -> bool {
    if short.len() == long.len() {
        include_equal && short == long
    } else {
        short.len() < long.len() && long.starts_with(short)
    }
}

/// Replace every variable-length array index with the [`WILDCARD`].
///
/// Index `i` is generalized iff the arity map records the (already
/// generalized) prefix before it as an array whose tuple arity is `<= i`.
pub fn to_generic(pointer: &Pointer, arity: &ArityMap) -> Pointer {
    let mut keys = pointer.keys().to_vec();
    for i in 0..keys.len() {
        let Some(index) = index_of(&keys[i]) else {
            continue;
        };
        let prefix = Pointer(keys[..i].to_vec());
        if arity.get(&prefix).is_some_and(|tuple| tuple <= index) {
            keys[i] = WILDCARD.to_string();
        }
    }
    Pointer(keys)
}

/// Replace wildcards with concrete indices, outermost first.
///
/// Only wildcards whose generic prefix is a known array are replaced; once
/// `indices` is exhausted the remaining wildcards are left in place.
pub fn to_indexed(pointer: &Pointer, indices: &[usize], arity: &ArityMap) -> Pointer {
    let generic = pointer.keys();
    let mut keys = generic.to_vec();
    let mut next = indices.iter();
    for (i, key) in generic.iter().enumerate() {
        if key != WILDCARD || !arity.contains(&Pointer(generic[..i].to_vec())) {
            continue;
        }
        match next.next() {
            Some(index) => keys[i] = index.to_string(),
            None => break,
        }
    }
    Pointer(keys)
}

// ---------------------------------------------------------------------------
// Deep traversal
// ---------------------------------------------------------------------------

/// Visiting order for [`for_each_deep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Parents before their children.
    TopDown,
    /// Children before their parents.
    BottomUp,
}

/// Call `visitor` for every value in `root` (the root included) with its pointer.
pub fn for_each_deep<F>(root: &Value, order: TraversalOrder, mut visitor: F)
where
    F: FnMut(&Value, &Pointer),
{
    let mut pointer = Pointer::root();
    visit_deep(root, &mut pointer, order, &mut visitor);
}

fn visit_deep<F>(node: &Value, pointer: &mut Pointer, order: TraversalOrder, visitor: &mut F)
where
    F: FnMut(&Value, &Pointer),
{
    if order == TraversalOrder::TopDown {
        visitor(node, pointer);
    }
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                pointer.0.push(key.clone());
                visit_deep(child, pointer, order, visitor);
                pointer.0.pop();
            }
        }
        Value::Array(arr) => {
            for (i, child) in arr.iter().enumerate() {
                pointer.0.push(i.to_string());
                visit_deep(child, pointer, order, visitor);
                pointer.0.pop();
            }
        }
        _ => {}
    }
    if order == TraversalOrder::BottomUp {
        visitor(node, pointer);
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

    // --- Escaping ---

    #[test]
    fn test_escape_no_special() {
        let result = escape_key("foo");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "foo");
    }

    #[test]
    fn test_escape_both() {
        assert_eq!(escape_key("a/b~c"), "a~1b~0c");
    }

    #[test]
    fn test_unescape_order() {
        // "~01" is an escaped "~" followed by a literal "1", never "/"
        assert_eq!(unescape_key("~01", "").unwrap(), "~1");
    }

    #[test]
    fn test_unescape_rejects_bad_escape() {
        let err = unescape_key("a~2", "/a~2").unwrap_err();
        assert_eq!(
            err,
            PointerError::InvalidEscape {
                pointer: "/a~2".to_string()
            }
        );
    }

    // --- parse / compile ---

    #[test]
    fn test_parse_forms() {
        assert_eq!(parse("").unwrap(), Vec::<String>::new());
        assert_eq!(parse("#").unwrap(), Vec::<String>::new());
        assert_eq!(parse("/a/b").unwrap(), vec!["a", "b"]);
        assert_eq!(parse("#/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert_eq!(parse("/").unwrap(), vec![""]);
    }

    #[test]
    fn test_parse_rejects_trailing_tilde() {
        assert!(matches!(
            parse("/a/~"),
            Err(PointerError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        assert!(matches!(
            parse("a/b"),
            Err(PointerError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn test_compile_round_trip() {
        let keys = vec!["a/b", "~", "", "0"];
        assert_eq!(parse(&compile(&keys)).unwrap(), keys);
    }

    #[test]
    fn test_pointer_serializes_as_string() {
        let json = serde_json::to_value(p("/a/0")).unwrap();
        assert_eq!(json, json!("/a/0"));
        let back: Pointer = serde_json::from_value(json).unwrap();
        assert_eq!(back, p("/a/0"));
    }

    #[test]
    fn test_parse_object_path() {
        assert_eq!(parse_object_path("a.b[0].c").unwrap(), p("/a/b/0/c"));
        assert_eq!(parse_object_path("list[].name").unwrap(), p("/list/-/name"));
        assert_eq!(parse_object_path("a[\"x.y\"]").unwrap(), p("/a/x.y"));
        assert_eq!(parse_object_path("/already/pointer").unwrap(), p("/already/pointer"));
        assert!(parse_object_path("a[0").is_err());
    }

    // --- get / set / insert / remove ---

    #[test]
    fn test_get_distinguishes_null_from_missing() {
        let doc = json!({"a": null, "b": [1, 2]});
        assert_eq!(get(&doc, &p("/a")), Some(&Value::Null));
        assert_eq!(get(&doc, &p("/c")), None);
        assert_eq!(get(&doc, &p("/b/1")), Some(&json!(2)));
        assert_eq!(get(&doc, &p("/b/01")), None);
        assert_eq!(get(&doc, &p("/b/-")), None);
        assert!(has(&doc, &p("")));
    }

    #[test]
    fn test_set_creates_containers() {
        let mut doc = json!({});
        set(&mut doc, &p("/a/0/b"), json!(1)).unwrap();
        set(&mut doc, &p("/c/d"), json!("x")).unwrap();
        assert_eq!(doc, json!({"a": [{"b": 1}], "c": {"d": "x"}}));
    }

    #[test]
    fn test_set_wildcard_appends() {
        let mut doc = json!({"list": [1]});
        set(&mut doc, &p("/list/-"), json!(2)).unwrap();
        assert_eq!(doc, json!({"list": [1, 2]}));
    }

    #[test]
    fn test_set_pads_arrays() {
        let mut doc = json!([]);
        set(&mut doc, &p("/2"), json!("z")).unwrap();
        assert_eq!(doc, json!([null, null, "z"]));
    }

    #[test]
    fn test_set_into_scalar_fails() {
        let mut doc = json!({"a": 5});
        let err = set(&mut doc, &p("/a/b"), json!(1)).unwrap_err();
        assert!(matches!(err, PointerError::NotAContainer { .. }));
    }

    #[test]
    fn test_insert_shifts_array_items() {
        let mut doc = json!(["a", "c"]);
        insert(&mut doc, &p("/1"), json!("b")).unwrap();
        assert_eq!(doc, json!(["a", "b", "c"]));
    }

    #[test]
    fn test_remove() {
        let mut doc = json!({"a": [1, 2, 3], "b": true});
        assert_eq!(remove(&mut doc, &p("/a/0")), Some(json!(1)));
        assert_eq!(remove(&mut doc, &p("/b")), Some(json!(true)));
        assert_eq!(remove(&mut doc, &p("/missing")), None);
        assert_eq!(doc, json!({"a": [2, 3]}));
    }

    // --- Relationships ---

    #[test]
    fn test_is_sub_pointer() {
        assert!(is_sub_pointer(&p(""), &p("/a"), false));
        assert!(is_sub_pointer(&p("/a"), &p("/a/b"), false));
        assert!(!is_sub_pointer(&p("/a"), &p("/a"), false));
        assert!(is_sub_pointer(&p("/a"), &p("/a"), true));
        assert!(!is_sub_pointer(&p("/a"), &p("/ab"), true));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(
            p("/a/b/c").rebase(&p("/a"), &p("/x/y")),
            Some(p("/x/y/b/c"))
        );
        assert_eq!(p("/a").rebase(&p("/b"), &p("")), None);
    }

    // --- Generalization ---

    #[test]
    fn test_to_generic_tuple_and_list_positions() {
        let mut arity = ArityMap::default();
        arity.insert(Pointer::root(), 1);
        assert_eq!(to_generic(&p("/0"), &arity), p("/0"));
        assert_eq!(to_generic(&p("/1"), &arity), p("/-"));
        assert_eq!(to_generic(&p("/7/name"), &arity), p("/-/name"));
    }

    #[test]
    fn test_to_generic_nested_arrays_use_generic_prefix() {
        let mut arity = ArityMap::default();
        arity.insert(p("/rows"), 0);
        arity.insert(p("/rows/-"), 0);
        assert_eq!(to_generic(&p("/rows/3/2"), &arity), p("/rows/-/-"));
    }

    #[test]
    fn test_to_generic_ignores_unknown_arrays() {
        let arity = ArityMap::default();
        assert_eq!(to_generic(&p("/a/3"), &arity), p("/a/3"));
    }

    #[test]
    fn test_to_indexed() {
        let mut arity = ArityMap::default();
        arity.insert(p("/rows"), 0);
        arity.insert(p("/rows/-/cells"), 0);
        assert_eq!(
            to_indexed(&p("/rows/-/cells/-"), &[2, 5], &arity),
            p("/rows/2/cells/5")
        );
        assert_eq!(
            to_indexed(&p("/rows/-/cells/-"), &[2], &arity),
            p("/rows/2/cells/-")
        );
    }

    // --- Deep traversal ---

    #[test]
    fn test_for_each_deep_orders() {
        let doc = json!({"a": [1]});
        let mut top_down = Vec::new();
        for_each_deep(&doc, TraversalOrder::TopDown, |_, ptr| {
            top_down.push(ptr.to_string())
        });
        assert_eq!(top_down, vec!["", "/a", "/a/0"]);

        let mut bottom_up = Vec::new();
        for_each_deep(&doc, TraversalOrder::BottomUp, |_, ptr| {
            bottom_up.push(ptr.to_string())
        });
        assert_eq!(bottom_up, vec!["/a/0", "/a", ""]);
    }
}
