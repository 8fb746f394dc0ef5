//! In-memory reference host implementing the scene boundary traits.
//!
//! [`MemoryScene`] models just enough host behavior to exercise the build pipeline
//! end to end: duplicate naming with `.NNN` suffixes, parenting, armature skin
//! bindings, local/world vertex queries, and group membership. It backs the crate's
//! tests, benches, and the demo binaries; production hosts implement the traits in
//! [`crate::scene`] against their own scene graph instead.
use std::collections::HashMap;

use glam::{EulerRot, Quat, Vec3};
use mint::Vector3;

use crate::error::Result;
use crate::scene::{
    AgentRegistrar, GeometryProvider, GroupHandle, ObjectHandle, ObjectKind, SceneMembership,
    VertexSpace,
};

#[derive(Clone, Debug)]
struct ObjectRecord {
    name: String,
    kind: ObjectKind,
    parent: Option<ObjectHandle>,
    position: Vec3,
    rotation: Vec3,
    scale: f32,
    vertices: Vec<Vec3>,
    armature_binding: bool,
    bound_armature: Option<ObjectHandle>,
    in_scene: bool,
}

#[derive(Clone, Debug)]
struct GroupRecord {
    name: String,
    members: Vec<ObjectHandle>,
}

/// An in-memory scene; see the module docs.
#[derive(Default)]
pub struct MemoryScene {
    objects: Vec<ObjectRecord>,
    groups: Vec<GroupRecord>,
    copy_counts: HashMap<String, usize>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source object linked to the scene, returning its handle.
    pub fn add_object(&mut self, name: impl Into<String>, kind: ObjectKind) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u64);
        self.objects.push(ObjectRecord {
            name: name.into(),
            kind,
            parent: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            vertices: Vec::new(),
            armature_binding: false,
            bound_armature: None,
            in_scene: true,
        });
        handle
    }

    /// Adds a named source group over existing objects.
    pub fn add_source_group(
        &mut self,
        name: impl Into<String>,
        members: Vec<ObjectHandle>,
    ) -> GroupHandle {
        let handle = GroupHandle(self.groups.len() as u64);
        self.groups.push(GroupRecord {
            name: name.into(),
            members,
        });
        handle
    }

    /// Sets the local-space mesh vertices of an object.
    pub fn set_local_vertices(
        &mut self,
        object: ObjectHandle,
        vertices: Vec<impl Into<Vector3<f32>>>,
    ) {
        self.record_mut(object).vertices =
            vertices.into_iter().map(|v| Vec3::from(v.into())).collect();
    }

    /// Marks a mesh as carrying an armature skin-binding modifier.
    pub fn set_armature_binding(&mut self, mesh: ObjectHandle, bound: bool) {
        self.record_mut(mesh).armature_binding = bound;
    }

    /// Parents `child` under `parent` during scene setup.
    pub fn set_object_parent(&mut self, child: ObjectHandle, parent: ObjectHandle) {
        self.record_mut(child).parent = Some(parent);
    }

    /// Places a source object during scene setup.
    pub fn place_object(
        &mut self,
        object: ObjectHandle,
        position: impl Into<Vector3<f32>>,
        rotation: impl Into<Vector3<f32>>,
        scale: f32,
    ) {
        let record = self.record_mut(object);
        record.position = Vec3::from(position.into());
        record.rotation = Vec3::from(rotation.into());
        record.scale = scale;
    }

    /// Total number of objects, sources and duplicates alike.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Names of the members of a named group, in membership order.
    pub fn objects_in_group(&self, name: &str) -> Vec<String> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| {
                g.members
                    .iter()
                    .map(|&m| self.record(m).name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Position, rotation, and scale of an object, for assertions.
    pub fn transform_of(&self, object: ObjectHandle) -> (Vector3<f32>, Vector3<f32>, f32) {
        let record = self.record(object);
        (
            record.position.into(),
            record.rotation.into(),
            record.scale,
        )
    }

    /// The armature an object's skin modifier is bound to, if any.
    pub fn bound_armature_of(&self, mesh: ObjectHandle) -> Option<ObjectHandle> {
        self.record(mesh).bound_armature
    }

    /// Whether the object has been linked into the scene.
    pub fn is_linked_to_scene(&self, object: ObjectHandle) -> bool {
        self.record(object).in_scene
    }

    fn record(&self, object: ObjectHandle) -> &ObjectRecord {
        &self.objects[object.0 as usize]
    }

    fn record_mut(&mut self, object: ObjectHandle) -> &mut ObjectRecord {
        &mut self.objects[object.0 as usize]
    }
}

impl GeometryProvider for MemoryScene {
    fn object_by_name(&self, name: &str) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(|i| ObjectHandle(i as u64))
    }

    fn group_by_name(&self, name: &str) -> Option<GroupHandle> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .map(|i| GroupHandle(i as u64))
    }

    fn group_members(&self, group: GroupHandle) -> Vec<ObjectHandle> {
        self.groups[group.0 as usize].members.clone()
    }

    fn duplicate(&mut self, source: ObjectHandle) -> ObjectHandle {
        let mut record = self.record(source).clone();
        let count = self
            .copy_counts
            .entry(record.name.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
        record.name = format!("{}.{:03}", record.name, count);
        record.in_scene = false;

        let handle = ObjectHandle(self.objects.len() as u64);
        self.objects.push(record);
        handle
    }

    fn object_name(&self, object: ObjectHandle) -> String {
        self.record(object).name.clone()
    }

    fn object_kind(&self, object: ObjectHandle) -> ObjectKind {
        self.record(object).kind
    }

    fn object_parent(&self, object: ObjectHandle) -> Option<ObjectHandle> {
        self.record(object).parent
    }

    fn set_parent(&mut self, child: ObjectHandle, parent: ObjectHandle) {
        self.record_mut(child).parent = Some(parent);
    }

    fn set_transform(
        &mut self,
        object: ObjectHandle,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        scale: f32,
    ) {
        let record = self.record_mut(object);
        record.position = Vec3::from(position);
        record.rotation = Vec3::from(rotation);
        record.scale = scale;
    }

    fn object_position(&self, object: ObjectHandle) -> Vector3<f32> {
        self.record(object).position.into()
    }

    fn object_rotation(&self, object: ObjectHandle) -> Vector3<f32> {
        self.record(object).rotation.into()
    }

    fn has_armature_binding(&self, mesh: ObjectHandle) -> bool {
        self.record(mesh).armature_binding
    }

    fn bind_armature(&mut self, mesh: ObjectHandle, armature: ObjectHandle) {
        self.record_mut(mesh).bound_armature = Some(armature);
    }

    fn vertex_positions(&self, object: ObjectHandle, space: VertexSpace) -> Vec<Vector3<f32>> {
        let record = self.record(object);
        match space {
            VertexSpace::Local => record.vertices.iter().map(|&v| v.into()).collect(),
            VertexSpace::World => {
                let orientation = Quat::from_euler(
                    EulerRot::XYZ,
                    record.rotation.x,
                    record.rotation.y,
                    record.rotation.z,
                );
                record
                    .vertices
                    .iter()
                    .map(|&v| (record.position + orientation * (v * record.scale)).into())
                    .collect()
            }
        }
    }
}

impl SceneMembership for MemoryScene {
    fn create_group(&mut self, name: &str) -> GroupHandle {
        let handle = GroupHandle(self.groups.len() as u64);
        self.groups.push(GroupRecord {
            name: name.to_owned(),
            members: Vec::new(),
        });
        handle
    }

    fn group_name(&self, group: GroupHandle) -> String {
        self.groups[group.0 as usize].name.clone()
    }

    fn link_to_group(&mut self, object: ObjectHandle, group: GroupHandle) {
        let members = &mut self.groups[group.0 as usize].members;
        if !members.contains(&object) {
            members.push(object);
        }
    }

    fn link_to_scene(&mut self, object: ObjectHandle) {
        self.record_mut(object).in_scene = true;
    }
}

/// A registered agent as seen by [`RecordingRegistrar`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredAgent {
    pub name: String,
    pub brain_type: String,
    pub parent_group: String,
    pub geo_group: String,
}

/// Registrar that records every registration, for tests and demos.
#[derive(Default)]
pub struct RecordingRegistrar {
    pub agents: Vec<RegisteredAgent>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentRegistrar for RecordingRegistrar {
    fn register_agent(
        &mut self,
        name: &str,
        brain_type: &str,
        parent_group: &str,
        geo_group: &str,
    ) -> Result<()> {
        self.agents.push(RegisteredAgent {
            name: name.to_owned(),
            brain_type: brain_type.to_owned(),
            parent_group: parent_group.to_owned(),
            geo_group: geo_group.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_get_numbered_names() {
        let mut scene = MemoryScene::new();
        let guard = scene.add_object("Guard", ObjectKind::Mesh);

        let first = scene.duplicate(guard);
        let second = scene.duplicate(guard);

        assert_eq!(scene.object_name(first), "Guard.001");
        assert_eq!(scene.object_name(second), "Guard.002");
        assert!(!scene.is_linked_to_scene(first));
    }

    #[test]
    fn duplicate_keeps_source_parent_until_rewired() {
        let mut scene = MemoryScene::new();
        let root = scene.add_object("Root", ObjectKind::Armature);
        let child = scene.add_object("Child", ObjectKind::Mesh);
        scene.set_object_parent(child, root);

        let dup = scene.duplicate(child);
        assert_eq!(scene.object_parent(dup), Some(root));
    }

    #[test]
    fn world_vertices_apply_transform() {
        let mut scene = MemoryScene::new();
        let target = scene.add_object("Target", ObjectKind::Mesh);
        scene.set_local_vertices(target, vec![Vec3::new(1.0, 0.0, 0.0)]);
        scene.place_object(
            target,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            2.0,
        );

        let world = scene.vertex_positions(target, VertexSpace::World);
        let v = Vec3::from(world[0]);
        assert!((v - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn linking_to_group_is_idempotent() {
        let mut scene = MemoryScene::new();
        let obj = scene.add_object("Rock", ObjectKind::Mesh);
        let group = scene.create_group("Rocks");

        scene.link_to_group(obj, group);
        scene.link_to_group(obj, group);

        assert_eq!(scene.objects_in_group("Rocks").len(), 1);
    }
}
