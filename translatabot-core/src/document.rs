//! Localization documents and their flattened form.
//!
//! A document is an ordered tree whose inner nodes are objects and arrays and
//! whose leaves are strings. [`flatten`] walks it depth-first in document
//! order and yields one `(FlatPath, String)` entry per leaf; [`unflatten`]
//! rebuilds the tree from such entries.
//!
//! Empty objects and empty arrays carry no leaf, so they do not survive a
//! flatten / unflatten round trip.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::CodecError;
use crate::path::{FlatPath, Segment};

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

/// One node of a localization document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    List(Vec<Node>),
    Map(IndexMap<String, Node>),
}

/// A parsed localization file. Immutable; edits produce a new document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalizationDocument {
    root: IndexMap<String, Node>,
}

impl LocalizationDocument {
    pub fn new(root: IndexMap<String, Node>) -> Self {
        Self { root }
    }

    /// Parse JSON text. Numbers, booleans and nulls are rejected with
    /// [`CodecError::UnsupportedLeafType`].
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Object(map) => {
                let mut root = IndexMap::with_capacity(map.len());
                let mut path = Vec::new();
                for (key, child) in map {
                    path.push(Segment::Key(key.clone()));
                    let node = node_from_value(child, &mut path)?;
                    path.pop();
                    root.insert(key, node);
                }
                Ok(Self { root })
            }
            other => Err(CodecError::RootNotObject {
                kind: value_kind(&other),
            }),
        }
    }

    pub fn root(&self) -> &IndexMap<String, Node> {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.root
                .iter()
                .map(|(k, v)| (k.clone(), node_to_value(v)))
                .collect(),
        )
    }

    /// Pretty JSON with two-space indentation and a trailing newline. This is
    /// the committed form of every translated file.
    pub fn render(&self) -> Result<String, CodecError> {
        let mut text = serde_json::to_string_pretty(&self.to_value())?;
        text.push('\n');
        Ok(text)
    }
}

fn node_from_value(value: Value, path: &mut Vec<Segment>) -> Result<Node, CodecError> {
    match value {
        Value::String(s) => Ok(Node::Text(s)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                path.push(Segment::Index(index));
                out.push(node_from_value(item, path)?);
                path.pop();
            }
            Ok(Node::List(out))
        }
        Value::Object(map) => {
            let mut out = IndexMap::with_capacity(map.len());
            for (key, child) in map {
                path.push(Segment::Key(key.clone()));
                let node = node_from_value(child, path)?;
                path.pop();
                out.insert(key, node);
            }
            Ok(Node::Map(out))
        }
        other => Err(CodecError::UnsupportedLeafType {
            path: FlatPath::new(path.clone()).to_string(),
            kind: value_kind(&other),
        }),
    }
}

fn node_to_value(node: &Node) -> Value {
    match node {
        Node::Text(s) => Value::String(s.clone()),
        Node::List(items) => Value::Array(items.iter().map(node_to_value).collect()),
        Node::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), node_to_value(v)))
                .collect(),
        ),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Flattened mapping
// ---------------------------------------------------------------------------

/// Ordered `path → value` mapping. Iteration order is insertion order, which
/// for [`flatten`] output is the depth-first document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlatMap {
    entries: IndexMap<FlatPath, String>,
}

impl FlatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An overwritten path keeps its original position.
    pub fn insert(&mut self, path: FlatPath, value: String) -> Option<String> {
        self.entries.insert(path, value)
    }

    pub fn get(&self, path: &FlatPath) -> Option<&String> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &FlatPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Remove `path`, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, path: &FlatPath) -> Option<String> {
        self.entries.shift_remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlatPath, &String)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &FlatPath> {
        self.entries.keys()
    }
}

impl FromIterator<(FlatPath, String)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (FlatPath, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FlatMap {
    type Item = (FlatPath, String);
    type IntoIter = indexmap::map::IntoIter<FlatPath, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlatMap {
    type Item = (&'a FlatPath, &'a String);
    type IntoIter = indexmap::map::Iter<'a, FlatPath, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// flatten / unflatten
// ---------------------------------------------------------------------------

/// Flatten a document into its ordered leaf mapping.
pub fn flatten(document: &LocalizationDocument) -> FlatMap {
    let mut out = FlatMap::new();
    let mut path = Vec::new();
    for (key, node) in &document.root {
        path.push(Segment::Key(key.clone()));
        walk(node, &mut path, &mut out);
        path.pop();
    }
    out
}

fn walk(node: &Node, path: &mut Vec<Segment>, out: &mut FlatMap) {
    match node {
        Node::Text(s) => {
            out.insert(FlatPath::new(path.clone()), s.clone());
        }
        Node::List(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                walk(item, path, out);
                path.pop();
            }
        }
        Node::Map(map) => {
            for (key, child) in map {
                path.push(Segment::Key(key.clone()));
                walk(child, path, out);
                path.pop();
            }
        }
    }
}

/// Rebuild a document from flattened entries.
///
/// Containers are created on first use: an array when the next segment is an
/// index, an object otherwise. Array elements are laid out in the order their
/// indices first appear, so gaps left by removed elements are closed up and
/// every entry of one original element lands in the same compacted slot.
/// Entries whose shapes disagree (a leaf and a container at one address) fail
/// with [`CodecError::InvalidPath`].
pub fn unflatten<'a, I>(entries: I) -> Result<LocalizationDocument, CodecError>
where
    I: IntoIterator<Item = (&'a FlatPath, &'a String)>,
{
    let mut root = Node::Map(IndexMap::new());
    let mut slots = Slots::new();
    for (path, value) in entries {
        if !matches!(path.segments().first(), Some(Segment::Key(_))) {
            return Err(CodecError::InvalidPath {
                path: path.to_string(),
                reason: "path must start with an object key".to_string(),
            });
        }
        place(&mut root, 0, path, value, &mut slots)?;
    }
    match root {
        Node::Map(root) => Ok(LocalizationDocument { root }),
        _ => Err(CodecError::RootNotObject { kind: "array" }),
    }
}

/// Compacted array slot for each original path prefix ending in an index.
type Slots = HashMap<Vec<Segment>, usize>;

fn place(
    node: &mut Node,
    depth: usize,
    full: &FlatPath,
    value: &str,
    slots: &mut Slots,
) -> Result<(), CodecError> {
    let conflict = || CodecError::InvalidPath {
        path: full.to_string(),
        reason: "conflicts with another entry's shape".to_string(),
    };
    let segments = full.segments();
    let Some(head) = segments.get(depth) else {
        return Err(conflict());
    };
    let next = segments.get(depth + 1);

    let child = match (node, head) {
        (Node::Map(map), Segment::Key(key)) => match next {
            None => {
                if map.contains_key(key) {
                    return Err(conflict());
                }
                map.insert(key.clone(), Node::Text(value.to_string()));
                return Ok(());
            }
            Some(next) => map.entry(key.clone()).or_insert_with(|| empty_container(next)),
        },
        (Node::List(items), Segment::Index(_)) => {
            let prefix = segments[..=depth].to_vec();
            match (next, slots.get(&prefix).copied()) {
                (None, Some(_)) => return Err(conflict()),
                (None, None) => {
                    slots.insert(prefix, items.len());
                    items.push(Node::Text(value.to_string()));
                    return Ok(());
                }
                (Some(_), Some(slot)) => &mut items[slot],
                (Some(next), None) => {
                    slots.insert(prefix, items.len());
                    items.push(empty_container(next));
                    let last = items.len() - 1;
                    &mut items[last]
                }
            }
        }
        _ => return Err(conflict()),
    };
    place(child, depth + 1, full, value, slots)
}

fn empty_container(next: &Segment) -> Node {
    match next {
        Segment::Index(_) => Node::List(Vec::new()),
        Segment::Key(_) => Node::Map(IndexMap::new()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
