//! Build pipeline: evaluate a validated template graph against a host scene.
//!
//! One spawn point is one depth-first pass over the graph's root template with an
//! initial [`crate::request::SpatialRequest`]. Evaluation is synchronous and
//! sequential; side-effect order (duplicate naming, registration) is deterministic
//! for a fixed seed.
pub mod draw;
pub mod eval;
pub mod events;
pub mod runner;

pub use events::{BuildEvent, BuildEventKind, EventSink, FnSink, VecSink};
pub use runner::{
    run_spawns, run_spawns_with_events, AgentRecord, BranchFailure, BuildConfig, BuildResult,
    BuildRunner,
};

/// The shared crowd group context a generation run places agents under.
///
/// Each agent's geometry group is named `<group name>/<brain type>`; uniqueness of
/// the resulting names is the registrar's responsibility.
#[derive(Clone, Debug)]
pub struct CrowdGroup {
    pub name: String,
}

impl CrowdGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
