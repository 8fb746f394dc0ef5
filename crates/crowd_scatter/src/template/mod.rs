//! Template graph subsystem: author and validate the placement node graph.
//!
//! This module groups the data model for template nodes ([`node`]), the id-keyed
//! graph container ([`graph`]), the memoized structural validator ([`validate`]),
//! and the ordered node-type registry external loaders instantiate nodes through
//! ([`registry`]). Evaluation of a built graph lives in [`crate::build`].
pub mod graph;
pub mod node;
pub mod registry;
pub mod validate;

pub use graph::{Node, TemplateGraph};
pub use node::{slots, GeoSpec, NodeKind, SlotKind, TemplateSpec};
pub use registry::{NodeRegistry, SettingValue, Settings};
pub use validate::{validate, ValidationCache, Verdict};

/// Node identifier. Doubles as the diagnostic label reported by validation and
/// branch failures, matching what the external editor shows the user.
pub type NodeId = String;
