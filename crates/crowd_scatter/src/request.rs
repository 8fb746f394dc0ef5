//! The spatial request passed down the template graph.
//!
//! A [`SpatialRequest`] bundles the position, rotation, scale, and tag mapping a
//! parent node hands to its children. Nodes never mutate a request in place across
//! branches: fan-out nodes clone the request per branch so tag writes in one branch
//! stay invisible to siblings.
use std::collections::HashMap;

use glam::{EulerRot, Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value of a single agent tag. The graph editor feeds heterogeneous values,
/// so this is a small closed set rather than a bare float.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
}

/// Tag mapping carried by a [`SpatialRequest`].
pub type TagMap = HashMap<String, TagValue>;

/// Position, rotation, scale, and tags requested for a placement.
///
/// Rotation is an XYZ euler vector in radians. Scale is a strictly positive
/// uniform factor; the build entry point rejects non-positive values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialRequest {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub tags: TagMap,
}

impl Default for SpatialRequest {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            tags: TagMap::new(),
        }
    }
}

impl SpatialRequest {
    /// Creates a request with the given transform and no tags.
    pub fn new(position: Vec3, rotation: Vec3, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
            tags: TagMap::new(),
        }
    }

    /// Creates a request at `position` with identity rotation and unit scale.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Sets the rotation (XYZ euler, radians).
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the uniform scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Sets a tag, consuming and returning the request.
    pub fn with_tag(mut self, name: impl Into<String>, value: TagValue) -> Self {
        self.tags.insert(name.into(), value);
        self
    }

    /// The orientation of this request as a quaternion.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }
}
