//! Payloads returned by the remote service
//!
//! A listing and a precinct record arrive on the same kind of endpoint and are
//! told apart only by their shape: a JSON object with a `regions` key lists
//! children, any other JSON object is a terminal record. The decision is made
//! once, in [`Document::from_slice`], and carried as a tagged union from then
//! on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key whose presence marks a branch payload
pub const CHILDREN_KEY: &str = "regions";

/// One entity at any level of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaNode {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub category_code: Option<String>,
    #[serde(default)]
    pub master_code: Option<String>,
}

impl AreaNode {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category_code: None,
            master_code: None,
        }
    }
}

/// Branch payload: a node that has children
///
/// Top-level fields other than `regions` are kept so the mirrored listing is
/// a faithful copy of what the service returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDocument {
    pub regions: Vec<AreaNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AreaDocument {
    pub fn new(regions: Vec<AreaNode>) -> Self {
        Self {
            regions,
            extra: Map::new(),
        }
    }
}

/// Leaf payload: an election-return record, kept opaque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordDocument(pub Map<String, Value>);

impl RecordDocument {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Classified payload for one node
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Listing with children to recurse into
    Area(AreaDocument),
    /// Terminal record
    Record(RecordDocument),
    /// The service confirmed this resource does not exist
    Absent,
}

/// Shape of a classified document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Branch,
    Leaf,
    Absent,
}

/// Why a payload could not be classified
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("body is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("`regions` is present but not a list of areas: {0}")]
    InvalidChildren(#[source] serde_json::Error),
}

impl Document {
    /// Parses and classifies a response body
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ClassifyError> {
        let value: Value = serde_json::from_slice(bytes).map_err(ClassifyError::Json)?;
        Self::classify(value)
    }

    /// Classifies an already-parsed JSON value by shape
    ///
    /// A payload carrying `regions` is always a branch, even when it also has
    /// record-looking fields; those land in [`AreaDocument::extra`].
    pub fn classify(value: Value) -> Result<Self, ClassifyError> {
        let object = match value {
            Value::Object(object) => object,
            other => return Err(ClassifyError::NotAnObject(json_type_name(&other))),
        };

        if object.contains_key(CHILDREN_KEY) {
            let area = serde_json::from_value(Value::Object(object))
                .map_err(ClassifyError::InvalidChildren)?;
            Ok(Self::Area(area))
        } else {
            Ok(Self::Record(RecordDocument(object)))
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Area(_) => DocumentKind::Branch,
            Self::Record(_) => DocumentKind::Leaf,
            Self::Absent => DocumentKind::Absent,
        }
    }

    /// Child nodes of a branch; empty for leaves and absent nodes
    pub fn children(&self) -> &[AreaNode] {
        match self {
            Self::Area(area) => &area.regions,
            Self::Record(_) | Self::Absent => &[],
        }
    }

    /// Serialized form written to the mirror
    ///
    /// The missing sentinel is the empty object `{}`.
    pub fn to_json_vec(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Self::Area(area) => serde_json::to_vec(area),
            Self::Record(record) => serde_json::to_vec(record),
            Self::Absent => serde_json::to_vec(&Map::new()),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
