//! Form layout grammar: the typed layout document tree and its JSON shape.
//!
//! A layout document is an ordered sequence of [`LayoutNode`]s describing a
//! form's visual arrangement. The types here are produced exclusively by the
//! normalizer's repairing parse (raw JSON never becomes a tree any other
//! way) and by the builder, and serialize back to the exact field names the
//! external form store expects.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Grammar tag constants
// ---------------------------------------------------------------------------

/// Layout tags recognised by the nesting grammar.
pub mod tags {
    /// Container node tags (legal at the top level of a document).
    pub const ROW: &str = "ROW";
    pub const GROUP: &str = "GROUP";
    pub const SUBTABLE: &str = "SUBTABLE";

    /// Decorative / structural field element tags.
    pub const LABEL: &str = "LABEL";
    pub const SPACER: &str = "SPACER";
    pub const HR: &str = "HR";
    pub const REFERENCE_TABLE: &str = "REFERENCE_TABLE";

    /// Baseline input field type assumed when a field leaf carries no type.
    pub const DEFAULT_FIELD_TYPE: &str = "SINGLE_LINE_TEXT";

    /// All tags legal for a top-level layout node.
    pub const NODE_TAGS: &[&str] = &[ROW, GROUP, SUBTABLE];

    /// All tags with dedicated field element shapes. Any other tag on a row
    /// member is treated as a concrete input field type.
    pub const ELEMENT_TAGS: &[&str] = &[LABEL, SPACER, HR, REFERENCE_TABLE, GROUP];
}

// ---------------------------------------------------------------------------
// Document tree
// ---------------------------------------------------------------------------

/// A full layout document: ordered top-level nodes, order = display order.
pub type Document = Vec<LayoutNode>;

/// A top-level (or group-internal) layout node.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    Row(Row),
    Group(Group),
    Subtable(Subtable),
}

/// A horizontal strip of field elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub fields: Vec<FieldElement>,
}

/// A titled, collapsible container. Its `layout` may hold only rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub code: String,
    pub label: String,
    pub open_group: bool,
    pub layout: Vec<Row>,
}

/// A tabular data region. Its `fields` map, when present, enumerates the
/// table's own field definitions and is otherwise opaque to this engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtable {
    pub code: String,
    pub fields: Option<serde_json::Map<String, Value>>,
}

/// A member of a row's `fields` sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldElement {
    Label { value: String },
    Spacer { element_id: String },
    Hr { element_id: String },
    ReferenceTable { code: String },
    /// A group freshly authored into a row; the normalizer hoists it out.
    Group(Group),
    Field(Field),
}

/// An actual input field reference. `field_type` is the store's concrete
/// field type string (e.g. `"NUMBER"`), not a layout-category tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub field_type: String,
    pub code: String,
    pub size: FieldSize,
}

/// Display size hints for a field. All members optional; an empty size
/// serializes as `{}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(
        rename = "innerHeight",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inner_height: Option<String>,
}

/// An element handed to the editor for insertion: either a full layout node
/// or a single field element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(LayoutNode),
    Field(FieldElement),
}

// ---------------------------------------------------------------------------
// Serialization
//
// The unions are tagged by a "type" key whose value, for a concrete input
// field, is the open-ended field type string. serde's derive cannot express
// that, so the tagged shapes are written by hand.
// ---------------------------------------------------------------------------

impl Serialize for LayoutNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LayoutNode::Row(row) => row.serialize(serializer),
            LayoutNode::Group(group) => group.serialize(serializer),
            LayoutNode::Subtable(subtable) => subtable.serialize(serializer),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", tags::ROW)?;
        map.serialize_entry("fields", &self.fields)?;
        map.end()
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("type", tags::GROUP)?;
        map.serialize_entry("code", &self.code)?;
        map.serialize_entry("label", &self.label)?;
        map.serialize_entry("openGroup", &self.open_group)?;
        map.serialize_entry("layout", &self.layout)?;
        map.end()
    }
}

impl Serialize for Subtable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.fields.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("type", tags::SUBTABLE)?;
        map.serialize_entry("code", &self.code)?;
        if let Some(fields) = &self.fields {
            map.serialize_entry("fields", fields)?;
        }
        map.end()
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldElement::Label { value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", tags::LABEL)?;
                map.serialize_entry("value", value)?;
                map.end()
            }
            FieldElement::Spacer { element_id } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", tags::SPACER)?;
                map.serialize_entry("elementId", element_id)?;
                map.end()
            }
            FieldElement::Hr { element_id } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", tags::HR)?;
                map.serialize_entry("elementId", element_id)?;
                map.end()
            }
            FieldElement::ReferenceTable { code } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", tags::REFERENCE_TABLE)?;
                map.serialize_entry("code", code)?;
                map.end()
            }
            FieldElement::Group(group) => group.serialize(serializer),
            FieldElement::Field(field) => field.serialize(serializer),
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", &self.field_type)?;
        map.serialize_entry("code", &self.code)?;
        map.serialize_entry("size", &self.size)?;
        map.end()
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Element::Node(node) => node.serialize(serializer),
            Element::Field(element) => element.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
