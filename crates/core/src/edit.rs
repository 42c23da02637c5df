//! Layout editor: inserts an element into an existing validated document.
//!
//! The input document is never mutated; every call returns a fresh deep
//! copy with the element placed at an absolute position, adjacent to an
//! existing field (by code), or appended at the end. The adjacency search
//! is single-pass and short-circuiting: once the element is inserted, no
//! further branch of the tree is visited, even if the same code appears
//! again deeper in the document.

use serde::Deserialize;

use crate::types::{tags, Document, Element, FieldElement, LayoutNode, Row};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Where to place an inserted element. The three modes are mutually
/// exclusive and tried in order: absolute `index` (optionally targeting a
/// group's internal layout via `target_type == "GROUP"` + `group_code`),
/// relative `after`/`before` a field code, else append.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InsertPosition {
    pub index: Option<usize>,
    #[serde(rename = "type")]
    pub target_type: Option<String>,
    #[serde(rename = "groupCode")]
    pub group_code: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

/// Return a new document with `element` inserted at `position`.
pub fn add_element_to_layout(
    document: &[LayoutNode],
    element: &Element,
    position: Option<&InsertPosition>,
) -> Document {
    let mut out = document.to_vec();

    if let Some(position) = position {
        if let Some(index) = position.index {
            if position.target_type.as_deref() == Some(tags::GROUP) {
                if let Some(group_code) = position.group_code.as_deref() {
                    insert_into_group(&mut out, group_code, index, element);
                    return out;
                }
            }
            let at = index.min(out.len());
            out.insert(at, top_level_node(element));
            return out;
        }

        let target = position
            .after
            .as_deref()
            .map(|code| (code, true))
            .or_else(|| position.before.as_deref().map(|code| (code, false)));
        if let Some((code, after)) = target {
            if let Some(field_element) = as_field_element(element) {
                if insert_adjacent(&mut out, code, after, &field_element) {
                    return out;
                }
            }
            // Code not found anywhere (or the element cannot live in a
            // fields sequence): append at the top level instead.
            out.push(top_level_node(element));
            return out;
        }
    }

    out.push(top_level_node(element));
    out
}

// ---------------------------------------------------------------------------
// Mode 1: absolute index
// ---------------------------------------------------------------------------

fn insert_into_group(document: &mut Document, group_code: &str, index: usize, element: &Element) {
    let Some(group) = document.iter_mut().find_map(|node| match node {
        LayoutNode::Group(group) if group.code == group_code => Some(group),
        _ => None,
    }) else {
        // Unresolvable target: the document is returned unchanged.
        tracing::warn!(group_code, "Insertion target group not found; layout left unchanged");
        return;
    };

    let row = match element {
        Element::Node(LayoutNode::Row(row)) => row.clone(),
        Element::Node(LayoutNode::Group(inner)) => Row {
            fields: vec![FieldElement::Group(inner.clone())],
        },
        Element::Node(LayoutNode::Subtable(subtable)) => {
            // The grammar has no place for a subtable inside a group.
            tracing::warn!(
                group_code,
                subtable_code = %subtable.code,
                "A subtable cannot be placed inside a group; layout left unchanged"
            );
            return;
        }
        Element::Field(field_element) => Row {
            fields: vec![field_element.clone()],
        },
    };
    let at = index.min(group.layout.len());
    group.layout.insert(at, row);
}

fn top_level_node(element: &Element) -> LayoutNode {
    match element {
        Element::Node(node) => node.clone(),
        Element::Field(field_element) => LayoutNode::Row(Row {
            fields: vec![field_element.clone()],
        }),
    }
}

// ---------------------------------------------------------------------------
// Mode 2: adjacent to a field code
// ---------------------------------------------------------------------------

/// The shape an element must take to enter a row's `fields` sequence.
/// Rows and subtables have no such shape and fall back to the append path.
fn as_field_element(element: &Element) -> Option<FieldElement> {
    match element {
        Element::Field(field_element) => Some(field_element.clone()),
        Element::Node(LayoutNode::Group(group)) => Some(FieldElement::Group(group.clone())),
        Element::Node(_) => None,
    }
}

/// Pre-order search over rows (descending into group layouts) for the first
/// field leaf with the given code; splice there and stop.
fn insert_adjacent(
    document: &mut Document,
    code: &str,
    after: bool,
    element: &FieldElement,
) -> bool {
    for node in document.iter_mut() {
        match node {
            LayoutNode::Row(row) => {
                if insert_in_row(row, code, after, element) {
                    return true;
                }
            }
            LayoutNode::Group(group) => {
                for row in group.layout.iter_mut() {
                    if insert_in_row(row, code, after, element) {
                        return true;
                    }
                }
            }
            LayoutNode::Subtable(_) => {}
        }
    }
    false
}

fn insert_in_row(row: &mut Row, code: &str, after: bool, element: &FieldElement) -> bool {
    let position = row.fields.iter().position(
        |member| matches!(member, FieldElement::Field(field) if field.code == code),
    );
    match position {
        Some(index) => {
            let at = if after { index + 1 } else { index };
            row.fields.insert(at, element.clone());
            true
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
