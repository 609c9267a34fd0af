//! Schema-shaped trees
//!
//! IdSchema, PathSchema and ErrorSchema share one shape: every node carries
//! a leaf payload and named children that mirror a schema's properties or
//! an array's element indices. The leaf decides which reserved keys it
//! occupies in the JSON form; every other key is a child.

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Payload carried by every node of a [`MirrorTree`]
pub trait MirrorLeaf: Clone + Default {
    /// Keys reserved for the leaf in the JSON form
    const KEYS: &'static [&'static str];

    /// Writes the leaf's reserved entries
    fn write_entries(&self, map: &mut Map<String, Value>);

    /// Reads the leaf back from a node's entries
    fn read_entries(map: &Map<String, Value>) -> Self;
}

/// A tree mirroring the shape of a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorTree<L> {
    leaf: L,
    children: IndexMap<String, MirrorTree<L>>,
}

impl<L: MirrorLeaf> MirrorTree<L> {
    /// Creates a childless node
    pub fn new(leaf: L) -> Self {
        Self {
            leaf,
            children: IndexMap::new(),
        }
    }

    pub fn leaf(&self) -> &L {
        &self.leaf
    }

    pub fn leaf_mut(&mut self) -> &mut L {
        &mut self.leaf
    }

    /// Iterates direct children in insertion order
    pub fn children(&self) -> impl Iterator<Item = (&str, &MirrorTree<L>)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn child(&self, key: &str) -> Option<&MirrorTree<L>> {
        self.children.get(key)
    }

    /// Adds or replaces a child
    pub fn insert_child(&mut self, key: impl Into<String>, child: MirrorTree<L>) {
        self.children.insert(key.into(), child);
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the node at `path`, if present
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&MirrorTree<L>> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(segment.as_ref()))
    }

    /// Returns the node at `path`, creating empty nodes along the way
    pub fn node_mut<S: AsRef<str>>(&mut self, path: &[S]) -> &mut MirrorTree<L> {
        path.iter().fold(self, |node, segment| {
            node.children
                .entry(segment.as_ref().to_string())
                .or_default()
        })
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(MirrorTree::node_count).sum::<usize>()
    }

    /// Paths of every node below the root, depth first
    pub fn paths(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        for (key, child) in &self.children {
            prefix.push(key.clone());
            out.push(prefix.clone());
            child.collect_paths(prefix, out);
            prefix.pop();
        }
    }

    /// Visits every node with its path, root first
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&[String], &MirrorTree<L>),
    {
        self.walk_from(&mut Vec::new(), visit);
    }

    fn walk_from<F>(&self, prefix: &mut Vec<String>, visit: &mut F)
    where
        F: FnMut(&[String], &MirrorTree<L>),
    {
        visit(prefix, self);
        for (key, child) in &self.children {
            prefix.push(key.clone());
            child.walk_from(prefix, visit);
            prefix.pop();
        }
    }

    /// Renders the tree as JSON
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        self.leaf.write_entries(&mut map);
        for (key, child) in &self.children {
            map.insert(key.clone(), child.to_value());
        }
        Value::Object(map)
    }

    /// Reads a tree from JSON. Non-object values under non-reserved keys
    /// are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let children = map
            .iter()
            .filter(|(key, _)| !L::KEYS.contains(&key.as_str()))
            .filter_map(|(key, child)| Some((key.clone(), Self::from_value(child)?)))
            .collect();
        Some(Self {
            leaf: L::read_entries(map),
            children,
        })
    }
}

impl<L: MirrorLeaf> Serialize for MirrorTree<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de, L: MirrorLeaf> Deserialize<'de> for MirrorTree<L> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| de::Error::custom("expected a JSON object"))
    }
}
