//! Layout normalizer: the total, repairing parse from raw JSON to the
//! typed layout tree.
//!
//! Hand-written and LLM-produced layouts are frequently malformed, so this
//! pass never rejects a structural defect. It fills in missing required
//! attributes with deterministic defaults, coerces wrong-shaped values into
//! the expected shape, and enforces the nesting grammar (no group inside a
//! group or subtable, groups never share a row), emitting one warning per
//! repair. The raw JSON it receives is never mutated.
//!
//! This is the only path from raw JSON to [`Document`]; the builder
//! produces trees that already satisfy the grammar and skips this pass.

use serde_json::Value;

use crate::error::CoreError;
use crate::idgen::{IdProvider, UuidIds};
use crate::types::{
    tags, Document, Element, Field, FieldElement, FieldSize, Group, LayoutNode, Row, Subtable,
};

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// A repaired document plus one human-readable warning per repair made.
#[derive(Debug)]
pub struct Normalized {
    pub document: Document,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Repairing parser for layout documents.
///
/// Owns the [`IdProvider`] used to synthesize missing codes and element ids;
/// inject [`crate::idgen::SequentialIds`] for deterministic output in tests.
pub struct Normalizer<I: IdProvider = UuidIds> {
    ids: I,
}

impl Normalizer<UuidIds> {
    pub fn new() -> Self {
        Self { ids: UuidIds }
    }
}

impl Default for Normalizer<UuidIds> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: IdProvider> Normalizer<I> {
    pub fn with_ids(ids: I) -> Self {
        Self { ids }
    }

    /// Repair an arbitrary JSON value into a valid layout document.
    ///
    /// Total: a completely nonsensical input is coerced into the closest
    /// legal shape rather than rejected.
    pub fn validate_and_fix(&mut self, value: &Value) -> Normalized {
        let mut warnings = Vec::new();
        let document = self.fix_document(value, &mut warnings);
        Normalized { document, warnings }
    }

    /// Strict variant: fail instead of repairing.
    ///
    /// Returns the parsed document only if the permissive pass would have
    /// made no repairs; otherwise fails with every repair listed.
    pub fn validate_strict(&mut self, value: &Value) -> Result<Document, CoreError> {
        let normalized = self.validate_and_fix(value);
        if normalized.warnings.is_empty() {
            Ok(normalized.document)
        } else {
            Err(CoreError::Validation(format!(
                "Layout has structural defects: {}",
                normalized.warnings.join("; ")
            )))
        }
    }

    /// Repair a single element handed to the editor for insertion.
    ///
    /// `ROW`/`GROUP`/`SUBTABLE` tags parse as layout nodes; anything else
    /// parses as a field element, with the same leniency as the document
    /// pass.
    pub fn coerce_element(&mut self, value: &Value) -> (Element, Vec<String>) {
        let mut warnings = Vec::new();
        let element = match value.get("type").and_then(Value::as_str) {
            Some(tags::ROW) => {
                Element::Node(LayoutNode::Row(self.fix_row(value, "inserted row", &mut warnings)))
            }
            Some(tags::GROUP) => {
                Element::Node(LayoutNode::Group(self.fix_group(value, &mut warnings)))
            }
            Some(tags::SUBTABLE) => {
                Element::Node(LayoutNode::Subtable(self.fix_subtable(value, &mut warnings)))
            }
            _ => Element::Field(self.fix_field_element(value, "inserted element", &mut warnings)),
        };
        (element, warnings)
    }

    // -----------------------------------------------------------------------
    // Document / node level
    // -----------------------------------------------------------------------

    fn fix_document(&mut self, value: &Value, warnings: &mut Vec<String>) -> Document {
        let entries: Vec<Value> = match value {
            Value::Array(items) => items.clone(),
            other => {
                warn(
                    warnings,
                    "Layout is not an array; wrapping it in a single-entry layout".to_string(),
                );
                vec![other.clone()]
            }
        };

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.fix_node(entry, index, warnings))
            .collect()
    }

    fn fix_node(&mut self, value: &Value, index: usize, warnings: &mut Vec<String>) -> LayoutNode {
        if !value.is_object() {
            warn(
                warnings,
                format!("Layout entry {index} is not an object; replacing it with an empty row"),
            );
            return LayoutNode::Row(Row::default());
        }

        let name = format!("row {index}");
        match value.get("type").and_then(Value::as_str) {
            Some(tags::ROW) => LayoutNode::Row(self.fix_row(value, &name, warnings)),
            Some(tags::GROUP) => LayoutNode::Group(self.fix_group(value, warnings)),
            Some(tags::SUBTABLE) => LayoutNode::Subtable(self.fix_subtable(value, warnings)),
            Some(other) => {
                // Only rows, groups, and subtables may sit at the top level;
                // the closest legal shape is a single-field row around it.
                warn(
                    warnings,
                    format!(
                        "Layout entry {index} has non-container type '{other}'; wrapping it in a row"
                    ),
                );
                let element =
                    self.fix_field_element(value, &format!("layout entry {index}"), warnings);
                LayoutNode::Row(Row {
                    fields: vec![element],
                })
            }
            None => {
                warn(
                    warnings,
                    format!("Layout entry {index} is missing its type; defaulting to ROW"),
                );
                LayoutNode::Row(self.fix_row(value, &name, warnings))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Row
    // -----------------------------------------------------------------------

    fn fix_row(&mut self, value: &Value, name: &str, warnings: &mut Vec<String>) -> Row {
        let raw_fields: Vec<Value> = match value.get("fields") {
            None => {
                warn(
                    warnings,
                    format!("{name} is missing its fields; defaulting to an empty list"),
                );
                Vec::new()
            }
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                warn(
                    warnings,
                    format!("{name} has a non-array fields value; wrapping it in a list"),
                );
                vec![other.clone()]
            }
        };

        // A group never shares a row. When groups are mixed with other
        // elements the groups win and the siblings are dropped.
        let group_entries: Vec<Value> = raw_fields
            .iter()
            .filter(|entry| entry.get("type").and_then(Value::as_str) == Some(tags::GROUP))
            .cloned()
            .collect();
        let selected = if !group_entries.is_empty() && group_entries.len() < raw_fields.len() {
            warn(
                warnings,
                format!("{name} mixes GROUP elements with other elements; keeping only the groups"),
            );
            group_entries
        } else {
            raw_fields
        };

        let fields = selected
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                self.fix_field_element(entry, &format!("{name} field {index}"), warnings)
            })
            .collect();

        Row { fields }
    }

    // -----------------------------------------------------------------------
    // Field elements
    // -----------------------------------------------------------------------

    fn fix_field_element(
        &mut self,
        value: &Value,
        name: &str,
        warnings: &mut Vec<String>,
    ) -> FieldElement {
        if !value.is_object() {
            let element_id = self.ids.next_id("spacer");
            warn(
                warnings,
                format!("{name} is not an object; replacing it with a spacer"),
            );
            return FieldElement::Spacer { element_id };
        }

        match value.get("type").and_then(Value::as_str) {
            Some(tags::LABEL) => {
                let value = match value.get("value").and_then(Value::as_str) {
                    Some(text) => text.to_string(),
                    None => {
                        warn(
                            warnings,
                            format!("{name} is a label without a value; defaulting to empty text"),
                        );
                        String::new()
                    }
                };
                FieldElement::Label { value }
            }
            Some(tags::SPACER) => FieldElement::Spacer {
                element_id: self.element_id(value, name, "spacer", warnings),
            },
            Some(tags::HR) => FieldElement::Hr {
                element_id: self.element_id(value, name, "hr", warnings),
            },
            Some(tags::REFERENCE_TABLE) => FieldElement::ReferenceTable {
                code: self.code(value, name, "reference_table", warnings),
            },
            Some(tags::GROUP) => FieldElement::Group(self.fix_group(value, warnings)),
            Some(field_type) => FieldElement::Field(Field {
                field_type: field_type.to_string(),
                code: self.code(value, name, "field", warnings),
                size: self.size(value, name, warnings),
            }),
            None => {
                warn(
                    warnings,
                    format!(
                        "{name} is missing its type; defaulting to {}",
                        tags::DEFAULT_FIELD_TYPE
                    ),
                );
                FieldElement::Field(Field {
                    field_type: tags::DEFAULT_FIELD_TYPE.to_string(),
                    code: self.code(value, name, "field", warnings),
                    size: self.size(value, name, warnings),
                })
            }
        }
    }

    fn element_id(
        &mut self,
        value: &Value,
        name: &str,
        prefix: &str,
        warnings: &mut Vec<String>,
    ) -> String {
        match value.get("elementId").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = self.ids.next_id(prefix);
                warn(
                    warnings,
                    format!("{name} is missing an elementId; generated '{id}'"),
                );
                id
            }
        }
    }

    fn code(
        &mut self,
        value: &Value,
        name: &str,
        prefix: &str,
        warnings: &mut Vec<String>,
    ) -> String {
        match value.get("code").and_then(Value::as_str) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => {
                let code = self.ids.next_id(prefix);
                warn(
                    warnings,
                    format!("{name} is missing a code; generated '{code}'"),
                );
                code
            }
        }
    }

    fn size(&mut self, value: &Value, name: &str, warnings: &mut Vec<String>) -> FieldSize {
        match value.get("size") {
            None => FieldSize::default(),
            Some(Value::Object(map)) => FieldSize {
                width: size_member(map, "width"),
                height: size_member(map, "height"),
                inner_height: size_member(map, "innerHeight"),
            },
            Some(_) => {
                warn(
                    warnings,
                    format!("{name} has a non-object size; resetting it"),
                );
                FieldSize::default()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Group
    // -----------------------------------------------------------------------

    fn fix_group(&mut self, value: &Value, warnings: &mut Vec<String>) -> Group {
        let code = match value.get("code").and_then(Value::as_str) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => {
                let code = self.ids.next_id("group");
                warn(warnings, format!("Group is missing a code; generated '{code}'"));
                code
            }
        };

        let label = match value.get("label").and_then(Value::as_str) {
            Some(label) => label.to_string(),
            None => {
                warn(
                    warnings,
                    format!("Group '{code}' is missing a label; using its code"),
                );
                code.clone()
            }
        };

        // Intentionally true, not the store's own default of false: freshly
        // repaired groups render expanded.
        let open_group = match value.get("openGroup").and_then(Value::as_bool) {
            Some(open) => open,
            None => {
                warn(
                    warnings,
                    format!("Group '{code}' is missing openGroup; defaulting to true"),
                );
                true
            }
        };

        let raw_layout: Vec<Value> = match value.get("layout") {
            None => {
                warn(
                    warnings,
                    format!("Group '{code}' is missing its layout; defaulting to an empty list"),
                );
                Vec::new()
            }
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                warn(
                    warnings,
                    format!("Group '{code}' has a non-array layout; wrapping it in a list"),
                );
                vec![other.clone()]
            }
        };

        // A group's layout holds only rows. Nested groups and subtables
        // are removed; anything else is coerced into a row.
        let mut layout = Vec::new();
        for (index, child) in raw_layout.iter().enumerate() {
            let child_name = format!("group '{code}' row {index}");
            match child.get("type").and_then(Value::as_str) {
                Some(tags::GROUP) => {
                    warn(
                        warnings,
                        format!("Group '{code}' contains a nested group; removing it"),
                    );
                }
                Some(tags::SUBTABLE) => {
                    warn(
                        warnings,
                        format!("Group '{code}' contains a subtable; removing it"),
                    );
                }
                Some(tags::ROW) | None => {
                    layout.push(self.fix_row(child, &child_name, warnings));
                }
                Some(other) => {
                    warn(
                        warnings,
                        format!(
                            "Group '{code}' contains a non-row element of type '{other}'; wrapping it in a row"
                        ),
                    );
                    let element = self.fix_field_element(child, &child_name, warnings);
                    layout.push(Row {
                        fields: vec![element],
                    });
                }
            }
        }

        Group {
            code,
            label,
            open_group,
            layout,
        }
    }

    // -----------------------------------------------------------------------
    // Subtable
    // -----------------------------------------------------------------------

    fn fix_subtable(&mut self, value: &Value, warnings: &mut Vec<String>) -> Subtable {
        let code = match value.get("code").and_then(Value::as_str) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => {
                let code = self.ids.next_id("subtable");
                warn(
                    warnings,
                    format!("Subtable is missing a code; generated '{code}'"),
                );
                code
            }
        };

        // Tables cannot hold group fields. The fields map is otherwise
        // a collaborator's concern and passes through untouched.
        let fields = match value.get("fields") {
            None => None,
            Some(Value::Object(map)) => {
                let mut kept = serde_json::Map::new();
                for (key, definition) in map {
                    if definition.get("type").and_then(Value::as_str) == Some(tags::GROUP) {
                        warn(
                            warnings,
                            format!(
                                "Subtable '{code}' field '{key}' is a group field; removing it"
                            ),
                        );
                    } else {
                        kept.insert(key.clone(), definition.clone());
                    }
                }
                Some(kept)
            }
            Some(_) => {
                warn(
                    warnings,
                    format!("Subtable '{code}' has a non-object fields value; dropping it"),
                );
                None
            }
        };

        Subtable { code, fields }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Record a repair: collected for the caller and mirrored to the log.
fn warn(warnings: &mut Vec<String>, message: String) {
    tracing::warn!("{message}");
    warnings.push(message);
}

fn size_member(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(text)) => Some(text.clone()),
        // The store serializes sizes as strings; bare numbers are accepted.
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
