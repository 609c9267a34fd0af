//! IdSchema and PathSchema
//!
//! Both trees mirror the resolved schema: every declared property becomes a
//! child node. They differ only in the leaf each node carries and in how
//! arrays are treated, so a single traversal builds both, parameterised by a
//! [`MirrorPolicy`].

use serde_json::{Map, Value};

use super::defaults::DEFAULT_MAX_DEPTH;
use crate::schema::utils::get_schema_type;
use crate::schema::{Definitions, Items, Schema, SchemaError, SchemaResolver, SchemaResult, SchemaType};
use crate::tree::{MirrorLeaf, MirrorTree};

const ID_KEY: &str = "$id";
const NAME_KEY: &str = "$name";
const ADDITIONAL_PROPERTIES_KEY: &str = "__additional_properties";

/// Default root identifier
pub const DEFAULT_ID_PREFIX: &str = "root";

/// Generated field identifier, e.g. `root_address_city`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldId(pub String);

impl FieldId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl MirrorLeaf for FieldId {
    const KEYS: &'static [&'static str] = &[ID_KEY];

    fn write_entries(&self, map: &mut Map<String, Value>) {
        map.insert(ID_KEY.into(), Value::String(self.0.clone()));
    }

    fn read_entries(map: &Map<String, Value>) -> Self {
        FieldId(map.get(ID_KEY).and_then(Value::as_str).unwrap_or_default().to_string())
    }
}

/// Dotted data path of a field, e.g. `address.city` or `tags.0`.
///
/// `name` does not escape dots, so a property named `a.b` renders the same
/// as `a` then `b`. Paths built by a [`MirrorBuilder`] keep the real keys in
/// [`FieldPath::segments`]; paths read back from JSON only have the dotted
/// name and split it on every dot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    pub name: String,
    /// Set on objects that declare `additionalProperties`
    pub additional_properties: bool,
    keys: Vec<String>,
}

impl FieldPath {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let keys = split_dotted(&name);
        Self {
            name,
            additional_properties: false,
            keys,
        }
    }

    /// Path of the child keyed by `segment`
    pub fn join(&self, segment: &str) -> Self {
        let name = if self.name.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{}", self.name, segment)
        };
        let mut keys = self.keys.clone();
        keys.push(segment.to_string());
        Self {
            name,
            additional_properties: false,
            keys,
        }
    }

    /// Path segments; the root path has none
    pub fn segments(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }
}

fn split_dotted(name: &str) -> Vec<String> {
    if name.is_empty() {
        Vec::new()
    } else {
        name.split('.').map(str::to_string).collect()
    }
}

impl MirrorLeaf for FieldPath {
    const KEYS: &'static [&'static str] = &[NAME_KEY, ADDITIONAL_PROPERTIES_KEY];

    fn write_entries(&self, map: &mut Map<String, Value>) {
        map.insert(NAME_KEY.into(), Value::String(self.name.clone()));
        if self.additional_properties {
            map.insert(ADDITIONAL_PROPERTIES_KEY.into(), Value::Bool(true));
        }
    }

    fn read_entries(map: &Map<String, Value>) -> Self {
        let mut path = FieldPath::new(map.get(NAME_KEY).and_then(Value::as_str).unwrap_or_default());
        path.additional_properties = map.get(ADDITIONAL_PROPERTIES_KEY) == Some(&Value::Bool(true));
        path
    }
}

/// Field identifiers by property
pub type IdSchema = MirrorTree<FieldId>;

/// Data paths by property and element
pub type PathSchema = MirrorTree<FieldPath>;

/// How array nodes are mirrored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsPolicy {
    /// The item schema is mirrored onto the array node itself
    Collapse,
    /// One child per data element, keyed by index
    PerElement,
}

/// Leaf construction for one kind of mirror tree
pub trait MirrorPolicy {
    type Leaf: MirrorLeaf;

    /// Leaf of the child reached from `parent` through `segment`
    fn child(&self, parent: &Self::Leaf, segment: &str) -> Self::Leaf;

    fn items(&self) -> ItemsPolicy;

    /// Adjusts a leaf once its node's schema is resolved
    fn annotate(&self, _leaf: &mut Self::Leaf, _schema: &Schema) {}
}

struct IdPolicy;

impl MirrorPolicy for IdPolicy {
    type Leaf = FieldId;

    fn child(&self, parent: &FieldId, segment: &str) -> FieldId {
        FieldId(format!("{}_{}", parent.0, segment))
    }

    fn items(&self) -> ItemsPolicy {
        ItemsPolicy::Collapse
    }
}

struct PathPolicy;

impl MirrorPolicy for PathPolicy {
    type Leaf = FieldPath;

    fn child(&self, parent: &FieldPath, segment: &str) -> FieldPath {
        parent.join(segment)
    }

    fn items(&self) -> ItemsPolicy {
        ItemsPolicy::PerElement
    }

    fn annotate(&self, leaf: &mut FieldPath, schema: &Schema) {
        leaf.additional_properties = schema.additional_properties.is_some();
    }
}

/// Builds mirror trees over a definitions table
pub struct MirrorBuilder<'a> {
    resolver: SchemaResolver<'a>,
    max_depth: usize,
}

impl<'a> MirrorBuilder<'a> {
    pub fn new(definitions: &'a Definitions) -> Self {
        Self {
            resolver: SchemaResolver::new(definitions),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builds the IdSchema rooted at `id`, or `id_prefix` when absent
    pub fn id_schema(&self, schema: &Schema, id: Option<&str>, data: &Value, id_prefix: &str) -> SchemaResult<IdSchema> {
        let root = FieldId(id.unwrap_or(id_prefix).to_string());
        self.mirror(&IdPolicy, schema, root, data)
    }

    /// Builds the PathSchema rooted at `name`
    pub fn path_schema(&self, schema: &Schema, name: &str, data: &Value) -> SchemaResult<PathSchema> {
        let root = FieldPath::new(name.strip_prefix('.').unwrap_or(name));
        self.mirror(&PathPolicy, schema, root, data)
    }

    /// Mirrors `schema` with the leaf and array handling of `policy`
    pub fn mirror<P: MirrorPolicy>(
        &self,
        policy: &P,
        schema: &Schema,
        root: P::Leaf,
        data: &Value,
    ) -> SchemaResult<MirrorTree<P::Leaf>> {
        let mut expanding = Vec::new();
        self.node(policy, schema, root, data, 0, &mut expanding)
    }

    fn node<P: MirrorPolicy>(
        &self,
        policy: &P,
        schema: &Schema,
        leaf: P::Leaf,
        data: &Value,
        depth: usize,
        expanding: &mut Vec<String>,
    ) -> SchemaResult<MirrorTree<P::Leaf>> {
        if depth > self.max_depth {
            return Err(SchemaError::depth_exceeded(self.max_depth));
        }
        if let Some(reference) = &schema.reference {
            if data.is_null() && expanding.contains(reference) {
                return Ok(MirrorTree::new(leaf));
            }
        }

        let resolved = self.resolver.resolve(schema, data)?;
        let pushed = schema.reference.clone();
        if let Some(reference) = &pushed {
            expanding.push(reference.clone());
        }
        let tree = self.expand(policy, &resolved, leaf, data, depth, expanding);
        if pushed.is_some() {
            expanding.pop();
        }
        tree
    }

    fn expand<P: MirrorPolicy>(
        &self,
        policy: &P,
        schema: &Schema,
        mut leaf: P::Leaf,
        data: &Value,
        depth: usize,
        expanding: &mut Vec<String>,
    ) -> SchemaResult<MirrorTree<P::Leaf>> {
        policy.annotate(&mut leaf, schema);

        if let Some(items) = &schema.items {
            return match policy.items() {
                ItemsPolicy::Collapse => match items {
                    Items::Single(item) => self.node(policy, item, leaf, &Value::Null, depth + 1, expanding),
                    Items::Tuple(_) => Ok(MirrorTree::new(leaf)),
                },
                ItemsPolicy::PerElement => {
                    let mut tree = MirrorTree::new(leaf);
                    for (index, element) in data.as_array().into_iter().flatten().enumerate() {
                        let segment = index.to_string();
                        let child_leaf = policy.child(tree.leaf(), &segment);
                        let child = match schema.item_schema(index) {
                            Some(item) => self.node(policy, item, child_leaf, element, depth + 1, expanding)?,
                            None => MirrorTree::new(child_leaf),
                        };
                        tree.insert_child(segment, child);
                    }
                    Ok(tree)
                }
            };
        }

        let mut tree = MirrorTree::new(leaf);
        if schema.properties.is_some() || get_schema_type(schema) == Some(SchemaType::Object) {
            for (name, property) in schema.properties.iter().flatten() {
                let child_leaf = policy.child(tree.leaf(), name);
                let child_data = data.get(name).unwrap_or(&Value::Null);
                let child = self.node(policy, property, child_leaf, child_data, depth + 1, expanding)?;
                tree.insert_child(name.clone(), child);
            }
        }
        Ok(tree)
    }
}

/// Builds the IdSchema of `schema`: the root is `id` (or `id_prefix`),
/// properties append `_<name>` and array items share the array's id.
pub fn to_id_schema(
    schema: &Schema,
    id: Option<&str>,
    definitions: &Definitions,
    data: &Value,
    id_prefix: &str,
) -> SchemaResult<IdSchema> {
    MirrorBuilder::new(definitions).id_schema(schema, id, data, id_prefix)
}

/// Builds the PathSchema of `schema` for `data`: properties append
/// `.<name>` and every array element gets its own `.<index>` node.
pub fn to_path_schema(schema: &Schema, name: &str, definitions: &Definitions, data: &Value) -> SchemaResult<PathSchema> {
    MirrorBuilder::new(definitions).path_schema(schema, name, data)
}
