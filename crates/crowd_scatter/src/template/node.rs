//! Node specifications for the template graph.
//!
//! Each variant of [`TemplateSpec`] and [`GeoSpec`] is a typed operation in the
//! placement DAG, holding its own settings struct. Input slots are named after the
//! editor's sockets (see [`slots`]); each variant declares which slots it requires
//! and what kind of node each slot accepts.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::Vec3;

use crate::request::TagValue;

/// Editor-facing input slot names.
pub mod slots {
    pub const TEMPLATE: &str = "Template";
    pub const TEMPLATE_1: &str = "Template 1";
    pub const TEMPLATE_2: &str = "Template 2";
    pub const OBJECTS: &str = "Objects";
    pub const OBJECT_1: &str = "Object 1";
    pub const OBJECT_2: &str = "Object 2";
    pub const PARENT_GROUP: &str = "Parent Group";
    pub const CHILD_OBJECT: &str = "Child Object";
}

/// Which kind of node an input slot accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    Template,
    Geo,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Template => write!(f, "template"),
            SlotKind::Geo => write!(f, "geometry"),
        }
    }
}

/// Parameters for an agent spawn node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct AgentParams {
    /// Brain type registered with the crowd runtime; also names the geometry group.
    pub brain_type: String,
}

/// Parameters for the random-branch switch nodes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct SwitchParams {
    /// Probability in [0, 1] of taking the first branch.
    pub switch_amount: f32,
}

/// Parameters for a transform offset node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct OffsetParams {
    /// Carry the incoming position/rotation forward; absolute placement when false.
    pub carry_incoming: bool,
    /// Optional reference object whose transform is added when resolvable.
    pub reference_object: Option<String>,
    pub location_offset: Vec3,
    pub rotation_offset: Vec3,
}

/// Parameters for a random rotation/scale perturbation node. Rotation bounds are
/// degrees about the local up axis; scale bounds are multipliers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct RandomParams {
    pub min_rand_rot: f32,
    pub max_rand_rot: f32,
    pub min_rand_sz: f32,
    pub max_rand_sz: f32,
}

/// Spatial distribution used by random positioning.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationType {
    Radius,
}

/// Parameters for a radial random fan-out node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct RandomPositioningParams {
    pub count: u32,
    pub location_type: LocationType,
    pub radius: f32,
}

/// Parameters for a row/column formation fan-out node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct FormationParams {
    pub count: u32,
    pub rows: u32,
    pub row_margin: f32,
    pub column_margin: f32,
}

/// Parameters for a vertex-target fan-out node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct TargetParams {
    pub target_object: String,
    /// Use the target's world-space vertices and own rotation, ignoring the
    /// incoming transform.
    pub overwrite_position: bool,
}

/// Parameters for a tag assignment node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct SetTagParams {
    pub tag_name: String,
    pub tag_value: TagValue,
}

/// Parameters for a source-object duplication leaf.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ObjectParams {
    pub source_object: String,
}

/// Parameters for a source-group duplication leaf.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct GroupParams {
    pub source_group: String,
}

/// Parameters for a bone-attach geometry node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ParentParams {
    /// Bone/socket on the parent armature the child should attach to.
    pub parent_bone: String,
}

/// Specification of a placement-decision node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub enum TemplateSpec {
    Agent(AgentParams),
    Switch(SwitchParams),
    Offset(OffsetParams),
    Random(RandomParams),
    RandomPositioning(RandomPositioningParams),
    Formation(FormationParams),
    Target(TargetParams),
    SetTag(SetTagParams),
}

/// Specification of a geometry-construction node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub enum GeoSpec {
    Object(ObjectParams),
    Group(GroupParams),
    Switch(SwitchParams),
    Parent(ParentParams),
}

/// A node is either a placement template or a geometry template.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub enum NodeKind {
    Template(TemplateSpec),
    Geo(GeoSpec),
}

const SLOT_TEMPLATE: &[(&str, SlotKind)] = &[(slots::TEMPLATE, SlotKind::Template)];
const SLOT_TEMPLATE_PAIR: &[(&str, SlotKind)] = &[
    (slots::TEMPLATE_1, SlotKind::Template),
    (slots::TEMPLATE_2, SlotKind::Template),
];
const SLOT_OBJECTS: &[(&str, SlotKind)] = &[(slots::OBJECTS, SlotKind::Geo)];
const SLOT_OBJECT_PAIR: &[(&str, SlotKind)] = &[
    (slots::OBJECT_1, SlotKind::Geo),
    (slots::OBJECT_2, SlotKind::Geo),
];
const SLOT_PARENT_CHILD: &[(&str, SlotKind)] = &[
    (slots::PARENT_GROUP, SlotKind::Geo),
    (slots::CHILD_OBJECT, SlotKind::Geo),
];

fn check_switch_amount(amount: f32) -> Result<(), String> {
    if !(0.0..=1.0).contains(&amount) {
        return Err(format!("switch amount {amount} must be within [0, 1]"));
    }
    Ok(())
}

impl TemplateSpec {
    /// Creates an agent spawn node specification.
    pub fn agent(brain_type: impl Into<String>) -> Self {
        TemplateSpec::Agent(AgentParams {
            brain_type: brain_type.into(),
        })
    }

    /// Creates a random-branch switch node specification.
    pub fn switch(switch_amount: f32) -> Self {
        TemplateSpec::Switch(SwitchParams { switch_amount })
    }

    /// Creates a transform offset node specification.
    pub fn offset(params: OffsetParams) -> Self {
        TemplateSpec::Offset(params)
    }

    /// Creates a random rotation/scale perturbation node specification.
    pub fn random(min_rand_rot: f32, max_rand_rot: f32, min_rand_sz: f32, max_rand_sz: f32) -> Self {
        TemplateSpec::Random(RandomParams {
            min_rand_rot,
            max_rand_rot,
            min_rand_sz,
            max_rand_sz,
        })
    }

    /// Creates a radial random fan-out node specification.
    pub fn random_positioning(count: u32, radius: f32) -> Self {
        TemplateSpec::RandomPositioning(RandomPositioningParams {
            count,
            location_type: LocationType::Radius,
            radius,
        })
    }

    /// Creates a formation fan-out node specification.
    pub fn formation(count: u32, rows: u32, row_margin: f32, column_margin: f32) -> Self {
        TemplateSpec::Formation(FormationParams {
            count,
            rows,
            row_margin,
            column_margin,
        })
    }

    /// Creates a vertex-target fan-out node specification.
    pub fn target(target_object: impl Into<String>, overwrite_position: bool) -> Self {
        TemplateSpec::Target(TargetParams {
            target_object: target_object.into(),
            overwrite_position,
        })
    }

    /// Creates a tag assignment node specification.
    pub fn set_tag(tag_name: impl Into<String>, tag_value: TagValue) -> Self {
        TemplateSpec::SetTag(SetTagParams {
            tag_name: tag_name.into(),
            tag_value,
        })
    }

    /// Input slots this variant's build logic dereferences.
    pub fn required_slots(&self) -> &'static [(&'static str, SlotKind)] {
        match self {
            TemplateSpec::Agent(_) => SLOT_OBJECTS,
            TemplateSpec::Switch(_) => SLOT_TEMPLATE_PAIR,
            TemplateSpec::Offset(_)
            | TemplateSpec::Random(_)
            | TemplateSpec::RandomPositioning(_)
            | TemplateSpec::Formation(_)
            | TemplateSpec::Target(_)
            | TemplateSpec::SetTag(_) => SLOT_TEMPLATE,
        }
    }

    /// Checks this variant's own settings for range errors.
    pub fn check_settings(&self) -> Result<(), String> {
        match self {
            TemplateSpec::Agent(p) => {
                if p.brain_type.is_empty() {
                    return Err("brain type must not be empty".into());
                }
            }
            TemplateSpec::Switch(p) => check_switch_amount(p.switch_amount)?,
            TemplateSpec::Offset(_) => {}
            TemplateSpec::Random(p) => {
                if p.min_rand_rot > p.max_rand_rot {
                    return Err(format!(
                        "rotation range [{}, {}] is inverted",
                        p.min_rand_rot, p.max_rand_rot
                    ));
                }
                if p.min_rand_sz <= 0.0 || p.min_rand_sz > p.max_rand_sz {
                    return Err(format!(
                        "scale range [{}, {}] must be positive and ordered",
                        p.min_rand_sz, p.max_rand_sz
                    ));
                }
            }
            TemplateSpec::RandomPositioning(p) => {
                if !(p.radius >= 0.0 && p.radius.is_finite()) {
                    return Err(format!("radius {} must be finite and >= 0", p.radius));
                }
            }
            TemplateSpec::Formation(p) => {
                if p.rows == 0 {
                    return Err("formation rows must be >= 1".into());
                }
            }
            TemplateSpec::Target(p) => {
                if p.target_object.is_empty() {
                    return Err("target object name must not be empty".into());
                }
            }
            TemplateSpec::SetTag(p) => {
                if p.tag_name.is_empty() {
                    return Err("tag name must not be empty".into());
                }
            }
        }
        Ok(())
    }

    /// Short variant name used in diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            TemplateSpec::Agent(_) => "Agent",
            TemplateSpec::Switch(_) => "Switch",
            TemplateSpec::Offset(_) => "Offset",
            TemplateSpec::Random(_) => "Random",
            TemplateSpec::RandomPositioning(_) => "RandomPositioning",
            TemplateSpec::Formation(_) => "Formation",
            TemplateSpec::Target(_) => "Target",
            TemplateSpec::SetTag(_) => "SetTag",
        }
    }
}

impl GeoSpec {
    /// Creates a source-object duplication leaf specification.
    pub fn object(source_object: impl Into<String>) -> Self {
        GeoSpec::Object(ObjectParams {
            source_object: source_object.into(),
        })
    }

    /// Creates a source-group duplication leaf specification.
    pub fn group(source_group: impl Into<String>) -> Self {
        GeoSpec::Group(GroupParams {
            source_group: source_group.into(),
        })
    }

    /// Creates a random-branch geometry switch specification.
    pub fn switch(switch_amount: f32) -> Self {
        GeoSpec::Switch(SwitchParams { switch_amount })
    }

    /// Creates a bone-attach geometry node specification.
    pub fn parent(parent_bone: impl Into<String>) -> Self {
        GeoSpec::Parent(ParentParams {
            parent_bone: parent_bone.into(),
        })
    }

    /// Input slots this variant's build logic dereferences.
    pub fn required_slots(&self) -> &'static [(&'static str, SlotKind)] {
        match self {
            GeoSpec::Object(_) | GeoSpec::Group(_) => &[],
            GeoSpec::Switch(_) => SLOT_OBJECT_PAIR,
            GeoSpec::Parent(_) => SLOT_PARENT_CHILD,
        }
    }

    /// Checks this variant's own settings for range errors.
    pub fn check_settings(&self) -> Result<(), String> {
        match self {
            GeoSpec::Object(p) => {
                if p.source_object.is_empty() {
                    return Err("source object name must not be empty".into());
                }
            }
            GeoSpec::Group(p) => {
                if p.source_group.is_empty() {
                    return Err("source group name must not be empty".into());
                }
            }
            GeoSpec::Switch(p) => check_switch_amount(p.switch_amount)?,
            GeoSpec::Parent(_) => {}
        }
        Ok(())
    }

    /// Short variant name used in diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            GeoSpec::Object(_) => "Object",
            GeoSpec::Group(_) => "Group",
            GeoSpec::Switch(_) => "GeoSwitch",
            GeoSpec::Parent(_) => "Parent",
        }
    }
}

impl NodeKind {
    /// The slot kind this node satisfies when plugged into an input.
    pub fn slot_kind(&self) -> SlotKind {
        match self {
            NodeKind::Template(_) => SlotKind::Template,
            NodeKind::Geo(_) => SlotKind::Geo,
        }
    }

    pub fn required_slots(&self) -> &'static [(&'static str, SlotKind)] {
        match self {
            NodeKind::Template(spec) => spec.required_slots(),
            NodeKind::Geo(spec) => spec.required_slots(),
        }
    }

    pub fn check_settings(&self) -> Result<(), String> {
        match self {
            NodeKind::Template(spec) => spec.check_settings(),
            NodeKind::Geo(spec) => spec.check_settings(),
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            NodeKind::Template(spec) => spec.variant_name(),
            NodeKind::Geo(spec) => spec.variant_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_amount_out_of_range_is_rejected() {
        assert!(TemplateSpec::switch(0.5).check_settings().is_ok());
        assert!(TemplateSpec::switch(1.2).check_settings().is_err());
        assert!(GeoSpec::switch(-0.1).check_settings().is_err());
    }

    #[test]
    fn random_scale_range_must_be_positive() {
        let bad = TemplateSpec::random(0.0, 360.0, 0.0, 1.5);
        assert!(bad.check_settings().is_err());

        let inverted = TemplateSpec::random(0.0, 360.0, 1.5, 0.5);
        assert!(inverted.check_settings().is_err());

        let good = TemplateSpec::random(-10.0, 10.0, 0.8, 1.2);
        assert!(good.check_settings().is_ok());
    }

    #[test]
    fn formation_needs_at_least_one_row() {
        assert!(TemplateSpec::formation(7, 0, 1.0, 1.0)
            .check_settings()
            .is_err());
        assert!(TemplateSpec::formation(7, 3, 1.0, 1.0)
            .check_settings()
            .is_ok());
    }

    #[test]
    fn fan_out_slots_match_variant() {
        let spec = TemplateSpec::switch(0.5);
        assert_eq!(
            spec.required_slots(),
            &[
                (slots::TEMPLATE_1, SlotKind::Template),
                (slots::TEMPLATE_2, SlotKind::Template)
            ]
        );

        let leaf = GeoSpec::object("Guard");
        assert!(leaf.required_slots().is_empty());
    }
}
