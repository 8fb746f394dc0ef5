//! Host scene boundary consumed by the build pipeline.
//!
//! The core never talks to a concrete scene or renderer. It consumes the traits in
//! this module: [`GeometryProvider`] for duplicating and transforming objects,
//! [`SceneMembership`] for group and scene linking, and [`AgentRegistrar`] for
//! handing a finished placement over to the crowd runtime. Vector types at this
//! boundary are [`mint`] types so hosts are not forced onto this crate's math stack.
use mint::Vector3;

use crate::error::Result;

pub mod memory;

pub use memory::{MemoryScene, RecordingRegistrar, RegisteredAgent};

/// Opaque handle to a scene object owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// Opaque handle to a scene group/collection owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupHandle(pub u64);

/// Host-side classification of an object, as far as the build pipeline cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Armature,
    Other,
}

/// Coordinate space for vertex queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexSpace {
    Local,
    World,
}

/// Object duplication, lookup, and transform access on the host scene.
///
/// Handles passed into methods must have come from this provider; passing a
/// foreign or stale handle is a host contract violation, not a recoverable error.
pub trait GeometryProvider {
    fn object_by_name(&self, name: &str) -> Option<ObjectHandle>;
    fn group_by_name(&self, name: &str) -> Option<GroupHandle>;

    /// Members of a source group, in the host's iteration order.
    fn group_members(&self, group: GroupHandle) -> Vec<ObjectHandle>;

    /// Duplicates one object. The duplicate keeps the source's parent pointer and
    /// data until the caller rewires them; it is not linked anywhere yet.
    fn duplicate(&mut self, source: ObjectHandle) -> ObjectHandle;

    fn object_name(&self, object: ObjectHandle) -> String;
    fn object_kind(&self, object: ObjectHandle) -> ObjectKind;
    fn object_parent(&self, object: ObjectHandle) -> Option<ObjectHandle>;
    fn set_parent(&mut self, child: ObjectHandle, parent: ObjectHandle);

    fn set_transform(
        &mut self,
        object: ObjectHandle,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        scale: f32,
    );
    fn object_position(&self, object: ObjectHandle) -> Vector3<f32>;
    fn object_rotation(&self, object: ObjectHandle) -> Vector3<f32>;

    /// Whether a mesh carries an armature skin-binding modifier.
    fn has_armature_binding(&self, mesh: ObjectHandle) -> bool;

    /// Rebinds a mesh's armature modifier to the given armature.
    fn bind_armature(&mut self, mesh: ObjectHandle, armature: ObjectHandle);

    /// Vertex positions of a mesh object. Empty for objects without mesh data.
    fn vertex_positions(&self, object: ObjectHandle, space: VertexSpace) -> Vec<Vector3<f32>>;
}

/// Group creation and membership on the host scene.
pub trait SceneMembership {
    fn create_group(&mut self, name: &str) -> GroupHandle;
    fn group_name(&self, group: GroupHandle) -> String;
    fn link_to_group(&mut self, object: ObjectHandle, group: GroupHandle);
    fn link_to_scene(&mut self, object: ObjectHandle);
}

/// Both scene-facing traits in one bound; blanket-implemented.
pub trait SceneHost: GeometryProvider + SceneMembership {}

impl<T: GeometryProvider + SceneMembership> SceneHost for T {}

/// Registers a placed geometry instance as a tracked crowd agent.
///
/// Name uniqueness within one generation run is this collaborator's concern.
pub trait AgentRegistrar {
    fn register_agent(
        &mut self,
        name: &str,
        brain_type: &str,
        parent_group: &str,
        geo_group: &str,
    ) -> Result<()>;
}
