#![forbid(unsafe_code)]
//! crowd_scatter: template-graph crowd placement.
//!
//! Modules:
//! - template: author and validate the placement node graph (specs, registry, validator)
//! - build: evaluate a validated graph against a host scene (runner, events, draws)
//! - scene: host boundary traits plus an in-memory reference host
//! - request: the position/rotation/scale/tag request passed down the graph
//!
//! A graph is built once (by an editor or loader, usually through
//! [`template::NodeRegistry`]), validated, then driven with one `run` per batch of
//! spawn points. For examples see the `crowd_scatter_examples` crate.
pub mod build;
pub mod error;
pub mod request;
pub mod scene;
pub mod template;

/// Convenient re-exports for common types. Import with `use crowd_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::build::events::{BuildEvent, BuildEventKind, EventSink, FnSink, VecSink};
    pub use crate::build::runner::{
        run_spawns, run_spawns_with_events, AgentRecord, BranchFailure, BuildConfig, BuildResult,
        BuildRunner,
    };
    pub use crate::build::CrowdGroup;
    pub use crate::error::{Error, Result};
    pub use crate::request::{SpatialRequest, TagMap, TagValue};
    pub use crate::scene::{
        AgentRegistrar, GeometryProvider, GroupHandle, MemoryScene, ObjectHandle, ObjectKind,
        RecordingRegistrar, RegisteredAgent, SceneHost, SceneMembership, VertexSpace,
    };
    pub use crate::template::{
        slots, validate, GeoSpec, Node, NodeId, NodeKind, NodeRegistry, SettingValue, Settings,
        SlotKind, TemplateGraph, TemplateSpec, ValidationCache, Verdict,
    };
}
