//! Provenance-annotated parameter tree.
//!
//! Every position in a tree is a [`Node`]: a raw scalar, a raw container, or an
//! annotated [`Parameter`] carrying the value together with its origin and
//! classification flags. Consumers pattern-match on the variant instead of
//! probing types at runtime.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// Mapping of keys to raw-or-annotated nodes, in insertion order.
pub type Tree = IndexMap<String, Node>;

/// Mapping of keys to parameters. Input and output shape of the partitioner.
pub type ParameterMap = IndexMap<String, Parameter>;

/// Leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl Scalar {
    /// Borrow the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for strings containing an embedded line break.
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::String(s) if s.contains('\n'))
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        match self {
            Self::String(s) => s.zeroize(),
            Self::Int(i) => i.zeroize(),
            Self::Float(f) => f.zeroize(),
            Self::Bool(b) => *b = false,
            Self::Null => {}
        }
    }
}

/// A position in the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw leaf.
    Scalar(Scalar),
    /// Ordered sequence of raw-or-annotated items.
    Sequence(Vec<Node>),
    /// Mapping of string keys to raw-or-annotated values.
    Mapping(Tree),
    /// Annotated value.
    Parameter(Box<Parameter>),
}

impl Node {
    /// Null node.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// The payload with every directly nested [`Parameter`] peeled away.
    #[must_use]
    pub fn unwrapped(&self) -> &Node {
        let mut node = self;
        while let Self::Parameter(param) = node {
            node = &param.value;
        }
        node
    }

    /// Borrow the parameter, if this node is annotated.
    #[must_use]
    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            Self::Parameter(p) => Some(p),
            _ => None,
        }
    }

    /// Deep copy with every [`Parameter`] replaced by its raw value.
    #[must_use]
    pub fn strip_annotations(&self) -> Node {
        match self.unwrapped() {
            Self::Scalar(s) => Self::Scalar(s.clone()),
            Self::Sequence(items) => {
                Self::Sequence(items.iter().map(Node::strip_annotations).collect())
            }
            Self::Mapping(map) => Self::Mapping(strip_tree(map)),
            Self::Parameter(_) => unreachable!("unwrapped() never yields a parameter"),
        }
    }

    /// True for an empty sequence or mapping.
    #[must_use]
    pub fn is_empty_container(&self) -> bool {
        match self {
            Self::Sequence(items) => items.is_empty(),
            Self::Mapping(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Deep copy of a tree with annotations removed.
#[must_use]
pub fn strip_tree(tree: &Tree) -> Tree {
    tree.iter()
        .map(|(k, v)| (k.clone(), v.strip_annotations()))
        .collect()
}

/// Lift a parameter map into a generic tree for rendering.
#[must_use]
pub fn to_tree(params: &ParameterMap) -> Tree {
    params
        .iter()
        .map(|(k, p)| (k.clone(), Node::from(p.clone())))
        .collect()
}

impl Zeroize for Node {
    fn zeroize(&mut self) {
        match self {
            Self::Scalar(s) => s.zeroize(),
            Self::Sequence(items) => {
                for item in items.iter_mut() {
                    item.zeroize();
                }
                items.clear();
            }
            Self::Mapping(map) => {
                for (mut key, mut value) in map.drain(..) {
                    key.zeroize();
                    value.zeroize();
                }
            }
            Self::Parameter(param) => param.zeroize(),
        }
    }
}

/// A value plus its provenance and classification flags.
///
/// Parameters are immutable once built. Restructuring code derives new ones
/// through [`Parameter::with_value`], which keeps every flag and the origin.
#[derive(Clone, PartialEq)]
pub struct Parameter {
    value: Node,
    origin: Option<String>,
    parsed: bool,
    valid: bool,
    processed: bool,
    secured: bool,
    translated: Option<Box<Node>>,
}

impl Parameter {
    /// Wrap a value with no origin and every flag cleared.
    pub fn new(value: impl Into<Node>) -> Self {
        Self {
            value: value.into(),
            origin: None,
            parsed: false,
            valid: false,
            processed: false,
            secured: false,
            translated: None,
        }
    }

    /// Set the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set the secured flag.
    #[must_use]
    pub fn secured(mut self, secured: bool) -> Self {
        self.secured = secured;
        self
    }

    /// Set the parsed flag.
    #[must_use]
    pub fn parsed(mut self, parsed: bool) -> Self {
        self.parsed = parsed;
        self
    }

    /// Set the valid flag.
    #[must_use]
    pub fn valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    /// Set the processed flag.
    #[must_use]
    pub fn processed(mut self, processed: bool) -> Self {
        self.processed = processed;
        self
    }

    /// Attach the secondary representation.
    #[must_use]
    pub fn with_translated(mut self, translated: impl Into<Node>) -> Self {
        self.translated = Some(Box::new(translated.into()));
        self
    }

    /// Copy origin, flags and translation onto a new value.
    #[must_use]
    pub fn with_value(&self, value: impl Into<Node>) -> Self {
        Self {
            value: value.into(),
            origin: self.origin.clone(),
            parsed: self.parsed,
            valid: self.valid,
            processed: self.processed,
            secured: self.secured,
            translated: self.translated.clone(),
        }
    }

    /// The wrapped value.
    #[must_use]
    pub fn value(&self) -> &Node {
        &self.value
    }

    /// Origin exactly as recorded.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Origin worth rendering: present and not blank.
    #[must_use]
    pub fn provenance(&self) -> Option<&str> {
        self.origin.as_deref().filter(|o| !o.trim().is_empty())
    }

    /// Whether the value belongs to the secure partition.
    #[must_use]
    pub fn is_secured(&self) -> bool {
        self.secured
    }

    /// Whether an upstream stage parsed the value.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Whether an upstream stage validated the value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether an upstream stage finished processing the value.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Opaque secondary representation.
    #[must_use]
    pub fn translated(&self) -> Option<&Node> {
        self.translated.as_deref()
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Parameter");
        if self.secured {
            dbg.field("value", &"[REDACTED]");
        } else {
            dbg.field("value", &self.value);
        }
        dbg.field("origin", &self.origin)
            .field("secured", &self.secured)
            .field("parsed", &self.parsed)
            .field("valid", &self.valid)
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}

impl Zeroize for Parameter {
    fn zeroize(&mut self) {
        self.value.zeroize();
        if let Some(translated) = self.translated.as_mut() {
            translated.zeroize();
        }
        if let Some(origin) = self.origin.as_mut() {
            origin.zeroize();
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_owned()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Self::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Self::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<u32> for Node {
    fn from(i: u32) -> Self {
        Self::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Self::Scalar(Scalar::Float(f))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Tree> for Node {
    fn from(map: Tree) -> Self {
        Self::Mapping(map)
    }
}

impl From<ParameterMap> for Node {
    fn from(params: ParameterMap) -> Self {
        Self::Mapping(to_tree(&params))
    }
}

impl From<Parameter> for Node {
    fn from(p: Parameter) -> Self {
        Self::Parameter(Box::new(p))
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::null(), Into::into)
    }
}

impl From<serde_yaml::Value> for Node {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => Self::null(),
            Value::Bool(b) => b.into(),
            Value::Number(n) => match n.as_i64() {
                Some(i) => i.into(),
                None => n.as_f64().map_or(Self::null(), Into::into),
            },
            Value::String(s) => s.into(),
            Value::Sequence(items) => Self::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Mapping(map) => Self::Mapping(
                map.into_iter()
                    .map(|(k, v)| (key_text(k), Node::from(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}

fn key_text(key: serde_yaml::Value) -> String {
    use serde_yaml::Value;
    match key {
        Value::String(s) => s,
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

// ============================================================================
// SERDE
// ============================================================================

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

/// Serializes the unwrapped value; metadata never reaches the output.
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(s) => s.serialize(serializer),
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::Mapping(map) => serializer.collect_map(map),
            Self::Parameter(p) => p.value.serialize(serializer),
        }
    }
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// Deserializes into raw nodes; documents on disk carry no annotations.
impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        if let serde_yaml::Value::Mapping(map) = &value {
            if map.keys().any(|k| k.is_sequence() || k.is_mapping()) {
                return Err(de::Error::custom("mapping keys must be scalars"));
            }
        }
        Ok(Node::from(value))
    }
}
