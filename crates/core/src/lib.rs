//! kinform-core: the form layout engine.
//!
//! Describes, repairs, builds, and edits the layout document of a business
//! application's input form — an ordered tree of rows, groups, and
//! subtables obeying a fixed nesting grammar. Three pure, synchronous
//! components operate on in-memory trees with no I/O of their own:
//!
//! - [`normalize::Normalizer`] — the total, repairing parse from raw JSON
//!   to the typed tree, warning on every repair and never failing on a
//!   structural defect.
//! - [`build`] — constructs an already-valid document from flat field
//!   descriptors.
//! - [`edit`] — inserts an element into an existing document by absolute
//!   index, adjacency to a field code, or append, without mutating the
//!   caller's copy.

pub mod build;
pub mod edit;
pub mod error;
pub mod idgen;
pub mod normalize;
pub mod types;

pub use build::{
    build_form_layout, build_group_layout, build_section_layout, build_table_layout,
    FieldDescriptor, LayoutOptions,
};
pub use edit::{add_element_to_layout, InsertPosition};
pub use error::CoreError;
pub use idgen::{IdProvider, SequentialIds, UuidIds};
pub use normalize::{Normalized, Normalizer};
pub use types::{
    tags, Document, Element, Field, FieldElement, FieldSize, Group, LayoutNode, Row, Subtable,
};
