//! Depth-first recursive evaluation of a template graph.
//!
//! [`build_template`] walks placement nodes; [`build_geo`] materializes geometry
//! leaves. Fan-out nodes clone the request per branch so tag writes never leak
//! across siblings, reserve placement budget before expanding, and contain child
//! failures so one bad branch does not abort the whole spawn.
use std::collections::HashMap;
use std::f32::consts::PI;

use glam::{EulerRot, Quat, Vec3};
use rand::RngCore;
use tracing::{debug, warn};

use crate::build::draw::{rand01, uniform};
use crate::build::events::{BuildEvent, BuildEventKind, EventSink};
use crate::build::runner::{AgentRecord, BranchFailure, BuildConfig, BuildResult};
use crate::build::CrowdGroup;
use crate::error::{Error, Result};
use crate::request::SpatialRequest;
use crate::scene::{AgentRegistrar, GroupHandle, ObjectHandle, ObjectKind, SceneHost, VertexSpace};
use crate::template::graph::Node;
use crate::template::node::{slots, GeoSpec, GroupParams, LocationType, NodeKind, TemplateSpec};
use crate::template::{NodeId, TemplateGraph};

/// Mutable evaluation state for one spawn point.
pub(crate) struct EvalCtx<'a> {
    pub graph: &'a TemplateGraph,
    pub config: &'a BuildConfig,
    pub scene: &'a mut (dyn SceneHost + 'a),
    pub registrar: &'a mut (dyn AgentRegistrar + 'a),
    pub rng: &'a mut (dyn RngCore + 'a),
    pub sink: &'a mut (dyn EventSink + 'a),
    pub group: &'a CrowdGroup,
    pub spawn_index: usize,
    /// Template builds issued so far this spawn, charged against the ceiling.
    pub placements: usize,
    pub out: &'a mut BuildResult,
}

impl EvalCtx<'_> {
    fn charge(&mut self, node: &Node, n: usize) -> Result<()> {
        self.ensure_capacity(node, n)?;
        self.placements += n;
        Ok(())
    }

    /// Checks budget without committing it; fan-out nodes call this before
    /// expanding so a pathological count fails up front.
    fn ensure_capacity(&self, node: &Node, n: usize) -> Result<()> {
        if self.placements + n > self.config.max_placements {
            return Err(Error::InvalidConfig(format!(
                "node '{}': placement ceiling of {} exceeded",
                node.id, self.config.max_placements
            )));
        }
        Ok(())
    }

    fn check_depth(&self, node: &Node, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(Error::InvalidConfig(format!(
                "node '{}': recursion depth ceiling of {} exceeded",
                node.id, self.config.max_depth
            )));
        }
        Ok(())
    }

    fn note_build(&mut self, id: &NodeId) {
        *self.out.builds_by_node.entry(id.clone()).or_insert(0) += 1;
    }

    /// Contains a child branch failure: record, warn, emit, continue. Ceiling
    /// errors stay fatal for the spawn.
    fn contain_branch(&mut self, node: &Node, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err @ Error::InvalidConfig(_)) => Err(err),
            Err(err) => {
                warn!("Branch under '{}' failed: {err}.", node.id);
                let message = err.to_string();
                self.out.failures.push(BranchFailure {
                    node: node.id.clone(),
                    spawn_index: self.spawn_index,
                    message: message.clone(),
                });
                if self.sink.wants(BuildEventKind::BranchFailed) {
                    self.sink.send(BuildEvent::BranchFailed {
                        spawn_index: self.spawn_index,
                        node: node.id.clone(),
                        message,
                    });
                }
                Ok(())
            }
        }
    }
}

fn required_input<'n>(node: &'n Node, slot: &str) -> Result<&'n NodeId> {
    node.input(slot).ok_or_else(|| {
        Error::Structural(format!(
            "node '{}': input '{slot}' is not connected",
            node.id
        ))
    })
}

fn euler_vec(orientation: Quat) -> Vec3 {
    let (x, y, z) = orientation.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Builds one placement node, recursing into its children.
pub(crate) fn build_template(
    ctx: &mut EvalCtx<'_>,
    id: &str,
    req: SpatialRequest,
    depth: usize,
) -> Result<()> {
    let node = ctx
        .graph
        .node(id)
        .ok_or_else(|| Error::Structural(format!("unknown node '{id}'")))?;
    ctx.check_depth(node, depth)?;
    ctx.charge(node, 1)?;
    ctx.note_build(&node.id);

    let spec = match &node.kind {
        NodeKind::Template(spec) => spec,
        NodeKind::Geo(_) => {
            return Err(Error::Structural(format!(
                "node '{id}': expected placement template, found geometry"
            )))
        }
    };

    match spec {
        TemplateSpec::Agent(params) => {
            let geo_group_name = format!("{}/{}", ctx.group.name, params.brain_type);
            let geo_group = ctx.scene.create_group(&geo_group_name);
            let geo_id = required_input(node, slots::OBJECTS)?.clone();
            let top = build_geo(
                ctx,
                &geo_id,
                req.position,
                req.rotation,
                req.scale,
                geo_group,
                depth + 1,
            )?
            .ok_or_else(|| {
                Error::Structural(format!(
                    "node '{}': geometry input produced no usable object",
                    node.id
                ))
            })?;
            ctx.scene
                .set_transform(top, req.position.into(), req.rotation.into(), req.scale);

            let agent = AgentRecord {
                name: ctx.scene.object_name(top),
                brain_type: params.brain_type.clone(),
                parent_group: ctx.group.name.clone(),
                geo_group: geo_group_name,
                tags: req.tags,
            };
            ctx.registrar.register_agent(
                &agent.name,
                &agent.brain_type,
                &agent.parent_group,
                &agent.geo_group,
            )?;
            debug!("Registered agent '{}' in '{}'.", agent.name, agent.geo_group);
            if ctx.sink.wants(BuildEventKind::AgentPlaced) {
                ctx.sink.send(BuildEvent::AgentPlaced {
                    spawn_index: ctx.spawn_index,
                    agent: agent.clone(),
                });
            }
            ctx.out.agents.push(agent);
            Ok(())
        }

        TemplateSpec::Switch(params) => {
            // One draw; the unchosen branch is never built.
            let slot = if rand01(ctx.rng) < params.switch_amount {
                slots::TEMPLATE_1
            } else {
                slots::TEMPLATE_2
            };
            let child = required_input(node, slot)?.clone();
            build_template(ctx, &child, req, depth + 1)
        }

        TemplateSpec::Offset(params) => {
            let mut position = Vec3::ZERO;
            let mut rotation = Vec3::ZERO;
            if params.carry_incoming {
                position = req.position;
                rotation = req.rotation;
            }
            if let Some(name) = &params.reference_object {
                match ctx.scene.object_by_name(name) {
                    Some(reference) => {
                        position += Vec3::from(ctx.scene.object_position(reference));
                        rotation += Vec3::from(ctx.scene.object_rotation(reference));
                    }
                    // An unresolvable reference is not an error.
                    None => debug!("Reference object '{name}' not found; skipping."),
                }
            }
            position += params.location_offset;
            rotation += params.rotation_offset;

            let child = required_input(node, slots::TEMPLATE)?.clone();
            build_template(
                ctx,
                &child,
                SpatialRequest {
                    position,
                    rotation,
                    scale: req.scale,
                    tags: req.tags,
                },
                depth + 1,
            )
        }

        TemplateSpec::Random(params) => {
            let rot_diff = uniform(ctx.rng, params.min_rand_rot, params.max_rand_rot).to_radians();
            let rotation = euler_vec(req.orientation() * Quat::from_rotation_z(rot_diff));
            let scale_diff = uniform(ctx.rng, params.min_rand_sz, params.max_rand_sz);

            let child = required_input(node, slots::TEMPLATE)?.clone();
            build_template(
                ctx,
                &child,
                SpatialRequest {
                    position: req.position,
                    rotation,
                    scale: req.scale * scale_diff,
                    tags: req.tags,
                },
                depth + 1,
            )
        }

        TemplateSpec::RandomPositioning(params) => {
            let count = params.count as usize;
            ctx.ensure_capacity(node, count)?;
            let child = required_input(node, slots::TEMPLATE)?.clone();
            let orientation = req.orientation();

            for _ in 0..count {
                match params.location_type {
                    LocationType::Radius => {
                        let angle = uniform(ctx.rng, -PI, PI);
                        let length = rand01(ctx.rng) * params.radius;
                        let local = Vec3::new(angle.sin() * length, angle.cos() * length, 0.0);
                        let branch = SpatialRequest {
                            position: req.position + orientation * local,
                            rotation: req.rotation,
                            scale: req.scale,
                            tags: req.tags.clone(),
                        };
                        let outcome = build_template(ctx, &child, branch, depth + 1);
                        ctx.contain_branch(node, outcome)?;
                    }
                }
            }
            Ok(())
        }

        TemplateSpec::Formation(params) => {
            let orientation = req.orientation();
            let diff_row = orientation * Vec3::new(params.row_margin, 0.0, 0.0) * req.scale;
            let diff_col = orientation * Vec3::new(0.0, params.column_margin, 0.0) * req.scale;
            let count = params.count as usize;
            let rows = params.rows as usize;
            ctx.ensure_capacity(node, count)?;
            let child = required_input(node, slots::TEMPLATE)?.clone();

            for column in 0..count / rows {
                for row in 0..rows {
                    let position =
                        req.position + diff_col * column as f32 + diff_row * row as f32;
                    let branch = SpatialRequest {
                        position,
                        rotation: req.rotation,
                        scale: req.scale,
                        tags: req.tags.clone(),
                    };
                    let outcome = build_template(ctx, &child, branch, depth + 1);
                    ctx.contain_branch(node, outcome)?;
                }
            }
            // Remainder fills a partial final column.
            let full_columns = (count / rows) as f32;
            for row in 0..count % rows {
                let position = req.position + diff_col * full_columns + diff_row * row as f32;
                let branch = SpatialRequest {
                    position,
                    rotation: req.rotation,
                    scale: req.scale,
                    tags: req.tags.clone(),
                };
                let outcome = build_template(ctx, &child, branch, depth + 1);
                ctx.contain_branch(node, outcome)?;
            }
            Ok(())
        }

        TemplateSpec::Target(params) => {
            let target = ctx
                .scene
                .object_by_name(&params.target_object)
                .ok_or_else(|| Error::MissingResource {
                    name: params.target_object.clone(),
                })?;
            let child = required_input(node, slots::TEMPLATE)?.clone();

            if params.overwrite_position {
                let vertices = ctx.scene.vertex_positions(target, VertexSpace::World);
                let rotation = Vec3::from(ctx.scene.object_rotation(target));
                ctx.ensure_capacity(node, vertices.len())?;
                for vertex in vertices {
                    let branch = SpatialRequest {
                        position: Vec3::from(vertex),
                        rotation,
                        scale: req.scale,
                        tags: req.tags.clone(),
                    };
                    let outcome = build_template(ctx, &child, branch, depth + 1);
                    ctx.contain_branch(node, outcome)?;
                }
            } else {
                let vertices = ctx.scene.vertex_positions(target, VertexSpace::Local);
                ctx.ensure_capacity(node, vertices.len())?;
                let orientation = req.orientation();
                for vertex in vertices {
                    let local = orientation * (Vec3::from(vertex) * req.scale);
                    let branch = SpatialRequest {
                        position: req.position + local,
                        rotation: req.rotation,
                        scale: req.scale,
                        tags: req.tags.clone(),
                    };
                    let outcome = build_template(ctx, &child, branch, depth + 1);
                    ctx.contain_branch(node, outcome)?;
                }
            }
            Ok(())
        }

        TemplateSpec::SetTag(params) => {
            let mut req = req;
            req.tags
                .insert(params.tag_name.clone(), params.tag_value.clone());
            let child = required_input(node, slots::TEMPLATE)?.clone();
            build_template(ctx, &child, req, depth + 1)
        }
    }
}

/// Builds one geometry node, returning the representative placed object.
pub(crate) fn build_geo(
    ctx: &mut EvalCtx<'_>,
    id: &str,
    position: Vec3,
    rotation: Vec3,
    scale: f32,
    group: GroupHandle,
    depth: usize,
) -> Result<Option<ObjectHandle>> {
    let node = ctx
        .graph
        .node(id)
        .ok_or_else(|| Error::Structural(format!("unknown node '{id}'")))?;
    ctx.check_depth(node, depth)?;
    ctx.note_build(&node.id);

    let spec = match &node.kind {
        NodeKind::Geo(spec) => spec,
        NodeKind::Template(_) => {
            return Err(Error::Structural(format!(
                "node '{id}': expected geometry, found placement template"
            )))
        }
    };

    match spec {
        GeoSpec::Object(params) => {
            let source = ctx
                .scene
                .object_by_name(&params.source_object)
                .ok_or_else(|| Error::MissingResource {
                    name: params.source_object.clone(),
                })?;
            let duplicate = ctx.scene.duplicate(source);
            ctx.scene.link_to_group(duplicate, group);
            ctx.scene.link_to_scene(duplicate);
            ctx.scene
                .set_transform(duplicate, position.into(), rotation.into(), scale);
            Ok(Some(duplicate))
        }

        GeoSpec::Group(params) => build_geo_group(ctx, node, params, position, rotation, scale, group),

        GeoSpec::Switch(params) => {
            // One draw; exactly one branch's side effects happen.
            let slot = if rand01(ctx.rng) < params.switch_amount {
                slots::OBJECT_1
            } else {
                slots::OBJECT_2
            };
            let child = required_input(node, slot)?.clone();
            build_geo(ctx, &child, position, rotation, scale, group, depth + 1)
        }

        GeoSpec::Parent(params) => {
            let parent_id = required_input(node, slots::PARENT_GROUP)?.clone();
            let child_id = required_input(node, slots::CHILD_OBJECT)?.clone();
            let _parent = build_geo(ctx, &parent_id, position, rotation, scale, group, depth + 1)?;
            let _child = build_geo(ctx, &child_id, position, rotation, scale, group, depth + 1)?;
            // Both subtrees exist in the scene; the attach step has no bone
            // binding contract yet.
            Err(Error::Unsupported(format!(
                "node '{}': attaching the child to bone '{}' is not implemented",
                node.id, params.parent_bone
            )))
        }
    }
}

/// Duplicates a whole source group: children re-parent to their duplicated
/// parents, root members take the placement transform, and skin modifiers rebind
/// to the duplicated armature.
fn build_geo_group(
    ctx: &mut EvalCtx<'_>,
    node: &Node,
    params: &GroupParams,
    position: Vec3,
    rotation: Vec3,
    scale: f32,
    group: GroupHandle,
) -> Result<Option<ObjectHandle>> {
    let source = ctx
        .scene
        .group_by_name(&params.source_group)
        .ok_or_else(|| Error::MissingResource {
            name: params.source_group.clone(),
        })?;
    let members = ctx.scene.group_members(source);

    let mut duplicates = Vec::with_capacity(members.len());
    let mut duplicate_of = HashMap::with_capacity(members.len());
    for &member in &members {
        let duplicate = ctx.scene.duplicate(member);
        duplicate_of.insert(member, duplicate);
        duplicates.push(duplicate);
    }

    let mut armature = None;
    for (index, &duplicate) in duplicates.iter().enumerate() {
        let original = members[index];
        let parent_duplicate = ctx
            .scene
            .object_parent(original)
            .and_then(|parent| duplicate_of.get(&parent).copied());
        match parent_duplicate {
            Some(parent) => ctx.scene.set_parent(duplicate, parent),
            // Parent outside the group (or none): a root member.
            None => ctx
                .scene
                .set_transform(duplicate, position.into(), rotation.into(), scale),
        }
        ctx.scene.link_to_group(duplicate, group);
        ctx.scene.link_to_scene(duplicate);
        if ctx.scene.object_kind(duplicate) == ObjectKind::Armature {
            armature = Some(duplicate);
        }
    }

    for &duplicate in &duplicates {
        if ctx.scene.object_kind(duplicate) == ObjectKind::Mesh
            && ctx.scene.has_armature_binding(duplicate)
        {
            let armature = armature.ok_or_else(|| {
                Error::Structural(format!(
                    "node '{}': mesh '{}' has an armature binding but group '{}' contains no armature",
                    node.id,
                    ctx.scene.object_name(duplicate),
                    params.source_group
                ))
            })?;
            ctx.scene.bind_armature(duplicate, armature);
        }
    }

    Ok(armature)
}
