//! Layout builder: synthesizes a layout document from flat field
//! descriptors.
//!
//! Unlike the normalizer, the builder is a construction tool and rejects
//! descriptors it cannot faithfully render; everything it does emit already
//! satisfies the nesting grammar without needing repair.

use serde::Deserialize;

use crate::error::CoreError;
use crate::idgen::IdProvider;
use crate::types::{tags, Document, Field, FieldElement, FieldSize, Group, LayoutNode, Row};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A flat description of one element to place in the layout.
///
/// `field_type` is either a concrete store field type (`"NUMBER"`, ...) or a
/// layout-category tag (`LABEL`, `SPACER`, `HR`, `REFERENCE_TABLE`,
/// `GROUP`). A descriptor with a `code` but no type resolves to the
/// baseline `SINGLE_LINE_TEXT`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub label: Option<String>,
    /// Text for `LABEL` descriptors; falls back to `label`, then `code`.
    pub value: Option<String>,
    /// Section name used by [`build_form_layout`]'s `group_by_section` mode.
    pub section: Option<String>,
    pub size: Option<FieldSize>,
    #[serde(rename = "elementId")]
    pub element_id: Option<String>,
    #[serde(rename = "openGroup")]
    pub open_group: Option<bool>,
}

/// Options for [`build_form_layout`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    #[serde(rename = "fieldsPerRow")]
    pub fields_per_row: usize,
    #[serde(rename = "groupBySection")]
    pub group_by_section: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            fields_per_row: 1,
            group_by_section: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Public builders
// ---------------------------------------------------------------------------

/// Build a full layout document from flat descriptors.
///
/// Descriptors are chunked into rows of `fields_per_row`. `GROUP`
/// descriptors never share a row: they close the pending row and become
/// standalone sibling nodes. With `group_by_section`, descriptors are
/// partitioned by `section` (first-appearance order); each named section
/// becomes one group node and unlabeled descriptors stay inline at the top
/// level.
pub fn build_form_layout<I: IdProvider>(
    fields: &[FieldDescriptor],
    options: &LayoutOptions,
    ids: &mut I,
) -> Result<Document, CoreError> {
    let per_row = options.fields_per_row.max(1);

    if !options.group_by_section {
        let nodes = build_nodes(fields.iter().enumerate(), per_row, ids)?;
        return Ok(nodes.into_iter().map(SectionNode::into_node).collect());
    }

    // Partition by section, preserving first-appearance order.
    let mut partitions: Vec<(Option<&str>, Vec<(usize, &FieldDescriptor)>)> = Vec::new();
    for (index, descriptor) in fields.iter().enumerate() {
        let key = descriptor.section.as_deref();
        match partitions.iter_mut().find(|(section, _)| *section == key) {
            Some((_, entries)) => entries.push((index, descriptor)),
            None => partitions.push((key, vec![(index, descriptor)])),
        }
    }

    let mut document = Vec::new();
    for (section, entries) in partitions {
        let nodes = build_nodes(entries, per_row, ids)?;
        match section {
            // The implicit default section is emitted inline, unwrapped.
            None => document.extend(nodes.into_iter().map(SectionNode::into_node)),
            Some(label) => {
                let mut rows = Vec::new();
                let mut hoisted = Vec::new();
                for node in nodes {
                    match node {
                        SectionNode::Row(row) => rows.push(row),
                        // A group cannot nest inside the section group; it
                        // lands as a sibling right after it.
                        SectionNode::Group(group) => hoisted.push(group),
                    }
                }
                document.push(LayoutNode::Group(Group {
                    code: section_code(label),
                    label: label.to_string(),
                    open_group: true,
                    layout: rows,
                }));
                document.extend(hoisted.into_iter().map(LayoutNode::Group));
            }
        }
    }
    Ok(document)
}

/// Build the rows of one section.
///
/// Used for row-only contexts such as a group's internal layout, so a
/// `GROUP` descriptor here is an error: there is no sibling position that
/// would not break the nesting grammar.
pub fn build_section_layout<I: IdProvider>(
    fields: &[FieldDescriptor],
    fields_per_row: usize,
    ids: &mut I,
) -> Result<Vec<Row>, CoreError> {
    let mut rows = Vec::new();
    for node in build_nodes(fields.iter().enumerate(), fields_per_row.max(1), ids)? {
        match node {
            SectionNode::Row(row) => rows.push(row),
            SectionNode::Group(group) => {
                return Err(CoreError::Validation(format!(
                    "Group field '{}' cannot be nested inside another group",
                    group.code
                )));
            }
        }
    }
    Ok(rows)
}

/// Build a group node with the given descriptors as its internal rows.
pub fn build_group_layout<I: IdProvider>(
    code: &str,
    label: &str,
    fields: &[FieldDescriptor],
    open_group: Option<bool>,
    ids: &mut I,
) -> Result<Group, CoreError> {
    Ok(Group {
        code: code.to_string(),
        label: label.to_string(),
        open_group: open_group.unwrap_or(true),
        layout: build_section_layout(fields, 1, ids)?,
    })
}

/// Render pre-grouped descriptor rows as layout rows, one row per inner
/// list, without re-chunking. Empty rows are omitted.
pub fn build_table_layout<I: IdProvider>(
    rows: &[Vec<FieldDescriptor>],
    ids: &mut I,
) -> Result<Vec<Row>, CoreError> {
    let mut out = Vec::new();
    for descriptors in rows {
        let mut fields = Vec::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            match dispatch(descriptor, index, ids)? {
                Built::Element(element) => fields.push(element),
                Built::Group(group) => {
                    return Err(CoreError::Validation(format!(
                        "Group field '{}' cannot be placed in a table row",
                        group.code
                    )));
                }
            }
        }
        if !fields.is_empty() {
            out.push(Row { fields });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Dispatch and chunking
// ---------------------------------------------------------------------------

/// What one descriptor renders to: a row member, or a standalone group.
enum Built {
    Element(FieldElement),
    Group(Group),
}

/// A chunked output node before groups and rows are routed to their
/// destination.
enum SectionNode {
    Row(Row),
    Group(Group),
}

impl SectionNode {
    fn into_node(self) -> LayoutNode {
        match self {
            SectionNode::Row(row) => LayoutNode::Row(row),
            SectionNode::Group(group) => LayoutNode::Group(group),
        }
    }
}

/// Chunk descriptors into rows of `per_row`, hoisting `GROUP` descriptors
/// out as standalone nodes. Rows that end up empty are never emitted.
fn build_nodes<'a, I: IdProvider>(
    entries: impl IntoIterator<Item = (usize, &'a FieldDescriptor)>,
    per_row: usize,
    ids: &mut I,
) -> Result<Vec<SectionNode>, CoreError> {
    let mut nodes = Vec::new();
    let mut current: Vec<FieldElement> = Vec::new();

    for (index, descriptor) in entries {
        match dispatch(descriptor, index, ids)? {
            Built::Element(element) => {
                current.push(element);
                if current.len() == per_row {
                    nodes.push(SectionNode::Row(Row {
                        fields: std::mem::take(&mut current),
                    }));
                }
            }
            Built::Group(group) => {
                if !current.is_empty() {
                    nodes.push(SectionNode::Row(Row {
                        fields: std::mem::take(&mut current),
                    }));
                }
                nodes.push(SectionNode::Group(group));
            }
        }
    }
    if !current.is_empty() {
        nodes.push(SectionNode::Row(Row { fields: current }));
    }
    Ok(nodes)
}

fn dispatch<I: IdProvider>(
    descriptor: &FieldDescriptor,
    index: usize,
    ids: &mut I,
) -> Result<Built, CoreError> {
    match descriptor.field_type.as_deref() {
        Some(tags::LABEL) => {
            let value = descriptor
                .value
                .clone()
                .or_else(|| descriptor.label.clone())
                .or_else(|| descriptor.code.clone())
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "LABEL descriptor at index {index} has no value, label, or code to display"
                    ))
                })?;
            Ok(Built::Element(FieldElement::Label { value }))
        }
        Some(tags::SPACER) => Ok(Built::Element(FieldElement::Spacer {
            element_id: descriptor
                .element_id
                .clone()
                .unwrap_or_else(|| ids.next_id("spacer")),
        })),
        Some(tags::HR) => Ok(Built::Element(FieldElement::Hr {
            element_id: descriptor
                .element_id
                .clone()
                .unwrap_or_else(|| ids.next_id("hr")),
        })),
        Some(tags::REFERENCE_TABLE) => {
            let code = required_code(descriptor, index, tags::REFERENCE_TABLE)?;
            Ok(Built::Element(FieldElement::ReferenceTable { code }))
        }
        Some(tags::GROUP) => {
            let code = required_code(descriptor, index, tags::GROUP)?;
            let label = descriptor.label.clone().unwrap_or_else(|| code.clone());
            Ok(Built::Group(Group {
                code,
                label,
                open_group: descriptor.open_group.unwrap_or(true),
                layout: Vec::new(),
            }))
        }
        Some(field_type) => {
            let code = required_code(descriptor, index, field_type)?;
            Ok(Built::Element(FieldElement::Field(Field {
                field_type: field_type.to_string(),
                code,
                size: descriptor.size.clone().unwrap_or_default(),
            })))
        }
        None => match &descriptor.code {
            Some(code) => Ok(Built::Element(FieldElement::Field(Field {
                field_type: tags::DEFAULT_FIELD_TYPE.to_string(),
                code: code.clone(),
                size: descriptor.size.clone().unwrap_or_default(),
            }))),
            None => Err(CoreError::MissingFieldIdentity { index }),
        },
    }
}

fn required_code(
    descriptor: &FieldDescriptor,
    index: usize,
    type_name: &str,
) -> Result<String, CoreError> {
    descriptor.code.clone().ok_or_else(|| {
        CoreError::Validation(format!(
            "{type_name} descriptor at index {index} is missing a code"
        ))
    })
}

/// Deterministic code for a named section: `section_` plus the lowercased
/// label with non-alphanumeric runs collapsed to `_`.
fn section_code(label: &str) -> String {
    let mut code = String::from("section_");
    let mut prev_underscore = true;
    for ch in label.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            code.push(ch);
            prev_underscore = false;
        } else if !prev_underscore {
            code.push('_');
            prev_underscore = true;
        }
    }
    code.trim_end_matches('_').to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idgen::SequentialIds;
    use serde_json::json;

    fn field(code: &str, field_type: &str) -> FieldDescriptor {
        FieldDescriptor {
            code: Some(code.to_string()),
            field_type: Some(field_type.to_string()),
            ..FieldDescriptor::default()
        }
    }

    // -- Row chunking --------------------------------------------------------

    #[test]
    fn two_fields_with_two_per_row_share_one_row() {
        let fields = vec![field("a", "SINGLE_LINE_TEXT"), field("b", "NUMBER")];
        let options = LayoutOptions {
            fields_per_row: 2,
            group_by_section: false,
        };
        let document =
            build_form_layout(&fields, &options, &mut SequentialIds::new()).expect("build");

        assert_eq!(document.len(), 1);
        let LayoutNode::Row(row) = &document[0] else {
            panic!("expected a row");
        };
        assert_eq!(row.fields.len(), 2);
        let codes: Vec<_> = row
            .fields
            .iter()
            .map(|element| match element {
                FieldElement::Field(f) => f.code.as_str(),
                other => panic!("expected fields, got {other:?}"),
            })
            .collect();
        assert_eq!(codes, ["a", "b"]);
    }

    #[test]
    fn default_options_give_one_field_per_row() {
        let fields = vec![field("a", "NUMBER"), field("b", "NUMBER")];
        let document =
            build_form_layout(&fields, &LayoutOptions::default(), &mut SequentialIds::new())
                .expect("build");
        assert_eq!(document.len(), 2);
    }

    #[test]
    fn trailing_partial_row_is_kept() {
        let fields = vec![
            field("a", "NUMBER"),
            field("b", "NUMBER"),
            field("c", "NUMBER"),
        ];
        let options = LayoutOptions {
            fields_per_row: 2,
            group_by_section: false,
        };
        let document =
            build_form_layout(&fields, &options, &mut SequentialIds::new()).expect("build");
        assert_eq!(document.len(), 2);
        let LayoutNode::Row(last) = &document[1] else {
            panic!("expected a row");
        };
        assert_eq!(last.fields.len(), 1);
    }

    // -- Section grouping ----------------------------------------------------

    #[test]
    fn named_section_becomes_a_group_with_slug_code() {
        let fields = vec![FieldDescriptor {
            section: Some("Billing".to_string()),
            ..field("a", "NUMBER")
        }];
        let options = LayoutOptions {
            fields_per_row: 1,
            group_by_section: true,
        };
        let document =
            build_form_layout(&fields, &options, &mut SequentialIds::new()).expect("build");

        assert_eq!(
            serde_json::to_value(&document).expect("serialize"),
            json!([{
                "type": "GROUP",
                "code": "section_billing",
                "label": "Billing",
                "openGroup": true,
                "layout": [{
                    "type": "ROW",
                    "fields": [{ "type": "NUMBER", "code": "a", "size": {} }],
                }],
            }])
        );
    }

    #[test]
    fn unlabeled_descriptors_stay_inline_at_the_top_level() {
        let fields = vec![
            field("plain", "NUMBER"),
            FieldDescriptor {
                section: Some("Billing".to_string()),
                ..field("a", "NUMBER")
            },
        ];
        let options = LayoutOptions {
            fields_per_row: 1,
            group_by_section: true,
        };
        let document =
            build_form_layout(&fields, &options, &mut SequentialIds::new()).expect("build");

        assert_eq!(document.len(), 2);
        assert!(matches!(document[0], LayoutNode::Row(_)));
        assert!(matches!(document[1], LayoutNode::Group(_)));
    }

    #[test]
    fn section_code_collapses_punctuation_and_spaces() {
        assert_eq!(section_code("Billing"), "section_billing");
        assert_eq!(section_code("Shipping Address"), "section_shipping_address");
        assert_eq!(section_code("Misc.  (extra)"), "section_misc_extra");
    }

    // -- Group hoisting ------------------------------------------------------

    #[test]
    fn group_descriptor_closes_the_pending_row() {
        let fields = vec![
            field("a", "NUMBER"),
            FieldDescriptor {
                label: Some("Details".to_string()),
                ..field("g1", "GROUP")
            },
            field("b", "NUMBER"),
        ];
        let options = LayoutOptions {
            fields_per_row: 2,
            group_by_section: false,
        };
        let document =
            build_form_layout(&fields, &options, &mut SequentialIds::new()).expect("build");

        assert_eq!(document.len(), 3);
        assert!(matches!(document[0], LayoutNode::Row(_)));
        assert!(matches!(document[1], LayoutNode::Group(_)));
        assert!(matches!(document[2], LayoutNode::Row(_)));
    }

    #[test]
    fn all_group_descriptors_emit_no_rows_at_all() {
        let fields = vec![field("g1", "GROUP"), field("g2", "GROUP")];
        let document =
            build_form_layout(&fields, &LayoutOptions::default(), &mut SequentialIds::new())
                .expect("build");
        assert_eq!(document.len(), 2);
        assert!(document
            .iter()
            .all(|node| matches!(node, LayoutNode::Group(_))));
    }

    #[test]
    fn sectioned_group_descriptor_hoists_to_a_sibling_after_its_section() {
        let fields = vec![
            FieldDescriptor {
                section: Some("Billing".to_string()),
                ..field("a", "NUMBER")
            },
            FieldDescriptor {
                section: Some("Billing".to_string()),
                ..field("g1", "GROUP")
            },
        ];
        let options = LayoutOptions {
            fields_per_row: 1,
            group_by_section: true,
        };
        let document =
            build_form_layout(&fields, &options, &mut SequentialIds::new()).expect("build");

        assert_eq!(document.len(), 2);
        let LayoutNode::Group(section) = &document[0] else {
            panic!("expected the section group");
        };
        assert_eq!(section.code, "section_billing");
        assert_eq!(section.layout.len(), 1);
        let LayoutNode::Group(hoisted) = &document[1] else {
            panic!("expected the hoisted group");
        };
        assert_eq!(hoisted.code, "g1");
    }

    // -- Dispatch ------------------------------------------------------------

    #[test]
    fn decorative_descriptors_render_their_shapes() {
        let fields = vec![
            FieldDescriptor {
                field_type: Some("LABEL".to_string()),
                value: Some("Heading".to_string()),
                ..FieldDescriptor::default()
            },
            FieldDescriptor {
                field_type: Some("SPACER".to_string()),
                ..FieldDescriptor::default()
            },
            FieldDescriptor {
                field_type: Some("HR".to_string()),
                element_id: Some("hr9".to_string()),
                ..FieldDescriptor::default()
            },
            field("ref1", "REFERENCE_TABLE"),
        ];
        let options = LayoutOptions {
            fields_per_row: 4,
            group_by_section: false,
        };
        let document =
            build_form_layout(&fields, &options, &mut SequentialIds::new()).expect("build");

        let LayoutNode::Row(row) = &document[0] else {
            panic!("expected a row");
        };
        assert_eq!(
            row.fields,
            vec![
                FieldElement::Label {
                    value: "Heading".to_string()
                },
                FieldElement::Spacer {
                    element_id: "spacer_1".to_string()
                },
                FieldElement::Hr {
                    element_id: "hr9".to_string()
                },
                FieldElement::ReferenceTable {
                    code: "ref1".to_string()
                },
            ]
        );
    }

    #[test]
    fn code_without_type_defaults_to_single_line_text() {
        let fields = vec![FieldDescriptor {
            code: Some("memo".to_string()),
            ..FieldDescriptor::default()
        }];
        let document =
            build_form_layout(&fields, &LayoutOptions::default(), &mut SequentialIds::new())
                .expect("build");
        let LayoutNode::Row(row) = &document[0] else {
            panic!("expected a row");
        };
        assert_eq!(
            row.fields[0],
            FieldElement::Field(Field {
                field_type: "SINGLE_LINE_TEXT".to_string(),
                code: "memo".to_string(),
                size: FieldSize::default(),
            })
        );
    }

    #[test]
    fn descriptor_without_code_or_type_is_fatal() {
        let fields = vec![field("a", "NUMBER"), FieldDescriptor::default()];
        let err =
            build_form_layout(&fields, &LayoutOptions::default(), &mut SequentialIds::new())
                .unwrap_err();
        assert!(matches!(err, CoreError::MissingFieldIdentity { index: 1 }));
    }

    #[test]
    fn typed_field_without_code_is_fatal() {
        let fields = vec![FieldDescriptor {
            field_type: Some("NUMBER".to_string()),
            ..FieldDescriptor::default()
        }];
        let err =
            build_form_layout(&fields, &LayoutOptions::default(), &mut SequentialIds::new())
                .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    // -- Group and table specializations -------------------------------------

    #[test]
    fn build_group_layout_nests_rows_and_defaults_open() {
        let group = build_group_layout(
            "g1",
            "Details",
            &[field("a", "NUMBER"), field("b", "DATE")],
            None,
            &mut SequentialIds::new(),
        )
        .expect("build");

        assert_eq!(group.code, "g1");
        assert!(group.open_group);
        assert_eq!(group.layout.len(), 2);
    }

    #[test]
    fn build_group_layout_rejects_nested_group_descriptors() {
        let err = build_group_layout(
            "g1",
            "Details",
            &[field("inner", "GROUP")],
            Some(false),
            &mut SequentialIds::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot be nested"));
    }

    #[test]
    fn build_table_layout_renders_one_row_per_inner_list() {
        let rows = vec![
            vec![field("a", "NUMBER"), field("b", "NUMBER")],
            vec![],
            vec![field("c", "DATE")],
        ];
        let layout = build_table_layout(&rows, &mut SequentialIds::new()).expect("build");

        // The empty inner list is omitted, not rendered as an empty row.
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0].fields.len(), 2);
        assert_eq!(layout[1].fields.len(), 1);
    }

    #[test]
    fn build_table_layout_rejects_group_descriptors() {
        let rows = vec![vec![field("g1", "GROUP")]];
        let err = build_table_layout(&rows, &mut SequentialIds::new()).unwrap_err();
        assert!(err.to_string().contains("table row"));
    }

    // -- Descriptor deserialization ------------------------------------------

    #[test]
    fn descriptor_deserializes_from_store_key_names() {
        let descriptor: FieldDescriptor = serde_json::from_value(json!({
            "code": "a",
            "type": "NUMBER",
            "section": "Billing",
            "elementId": "e1",
            "openGroup": false,
            "size": { "width": "120" },
        }))
        .expect("deserialize");

        assert_eq!(descriptor.field_type.as_deref(), Some("NUMBER"));
        assert_eq!(descriptor.element_id.as_deref(), Some("e1"));
        assert_eq!(descriptor.open_group, Some(false));
        assert_eq!(
            descriptor.size.expect("size").width.as_deref(),
            Some("120")
        );
    }

    #[test]
    fn options_deserialize_from_store_key_names() {
        let options: LayoutOptions =
            serde_json::from_value(json!({ "fieldsPerRow": 3, "groupBySection": true }))
                .expect("deserialize");
        assert_eq!(options.fields_per_row, 3);
        assert!(options.group_by_section);

        let defaults: LayoutOptions = serde_json::from_value(json!({})).expect("deserialize");
        assert_eq!(defaults.fields_per_row, 1);
        assert!(!defaults.group_by_section);
    }
}
