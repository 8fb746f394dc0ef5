//! Ordered node-type registry used by external graph loaders.
//!
//! The editor saves nodes as a type-identifier string plus a loose settings map.
//! [`NodeRegistry`] maps each identifier to a constructor that parses a
//! [`Settings`] map into a typed [`NodeKind`]. Registration order is preserved and
//! observable through [`NodeRegistry::type_names`] for UI listing only; it has no
//! effect on evaluation.
use std::collections::HashMap;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::TagValue;
use crate::template::node::{GeoSpec, NodeKind, OffsetParams, TemplateSpec};

/// A loosely typed setting value as fed by the editor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Vec3(Vec3),
    Str(String),
}

/// Settings map for one node, keyed by the editor's documented setting names.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    values: HashMap<String, SettingValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, builder style.
    pub fn set(mut self, key: impl Into<String>, value: SettingValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    fn require(&self, key: &str) -> Result<&SettingValue> {
        self.values
            .get(key)
            .ok_or_else(|| Error::InvalidConfig(format!("setting '{key}' is missing")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            SettingValue::Bool(b) => Ok(*b),
            other => Err(expected(key, "bool", other)),
        }
    }

    /// Floats accept integer values, since editors routinely feed whole numbers.
    pub fn get_f32(&self, key: &str) -> Result<f32> {
        match self.require(key)? {
            SettingValue::Float(f) => Ok(*f),
            SettingValue::Int(i) => Ok(*i as f32),
            other => Err(expected(key, "float", other)),
        }
    }

    pub fn get_u32(&self, key: &str) -> Result<u32> {
        match self.require(key)? {
            SettingValue::Int(i) if *i >= 0 => Ok(*i as u32),
            SettingValue::Int(i) => Err(Error::InvalidConfig(format!(
                "setting '{key}' must be >= 0, got {i}"
            ))),
            other => Err(expected(key, "int", other)),
        }
    }

    pub fn get_vec3(&self, key: &str) -> Result<Vec3> {
        match self.require(key)? {
            SettingValue::Vec3(v) => Ok(*v),
            other => Err(expected(key, "vec3", other)),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            SettingValue::Str(s) => Ok(s),
            other => Err(expected(key, "string", other)),
        }
    }

    /// Optional string; absent keys and empty strings both read as `None`.
    pub fn get_str_opt(&self, key: &str) -> Result<Option<&str>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(SettingValue::Str(s)) if s.is_empty() => Ok(None),
            Some(SettingValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(expected(key, "string", other)),
        }
    }

    fn get_tag_value(&self, key: &str) -> Result<TagValue> {
        match self.require(key)? {
            SettingValue::Bool(b) => Ok(TagValue::Bool(*b)),
            SettingValue::Int(i) => Ok(TagValue::Int(*i)),
            SettingValue::Float(f) => Ok(TagValue::Float(*f)),
            SettingValue::Str(s) => Ok(TagValue::Str(s.clone())),
            other => Err(expected(key, "tag value", other)),
        }
    }
}

fn expected(key: &str, wanted: &str, got: &SettingValue) -> Error {
    Error::InvalidConfig(format!("setting '{key}' expects {wanted}, got {got:?}"))
}

type Constructor = fn(&Settings) -> Result<NodeKind>;

struct RegistryEntry {
    type_name: &'static str,
    construct: Constructor,
}

/// Ordered mapping from node-type identifier to constructor.
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
}

impl NodeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The registry with every built-in node type, in the editor's listing order.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("ObjectInputNodeType", |s| {
            Ok(NodeKind::Geo(GeoSpec::object(s.get_str("inputObject")?)))
        });
        registry.register("GroupInputNodeType", |s| {
            Ok(NodeKind::Geo(GeoSpec::group(s.get_str("inputGroup")?)))
        });
        registry.register("GeoSwitchNodeType", |s| {
            Ok(NodeKind::Geo(GeoSpec::switch(s.get_f32("switchAmount")?)))
        });
        registry.register("TemplateSwitchNodeType", |s| {
            Ok(NodeKind::Template(TemplateSpec::switch(
                s.get_f32("switchAmount")?,
            )))
        });
        registry.register("ParentNodeType", |s| {
            Ok(NodeKind::Geo(GeoSpec::parent(s.get_str("parentTo")?)))
        });
        registry.register("TemplateNodeType", |s| {
            Ok(NodeKind::Template(TemplateSpec::agent(
                s.get_str("brainType")?,
            )))
        });
        registry.register("OffsetNodeType", |s| {
            Ok(NodeKind::Template(TemplateSpec::offset(OffsetParams {
                carry_incoming: s.get_bool("offset")?,
                reference_object: s.get_str_opt("referenceObject")?.map(str::to_owned),
                location_offset: s.get_vec3("locationOffset")?,
                rotation_offset: s.get_vec3("rotationOffset")?,
            })))
        });
        registry.register("RandomNodeType", |s| {
            Ok(NodeKind::Template(TemplateSpec::random(
                s.get_f32("minRandRot")?,
                s.get_f32("maxRandRot")?,
                s.get_f32("minRandSz")?,
                s.get_f32("maxRandSz")?,
            )))
        });
        registry.register("RandomPositionNodeType", |s| {
            match s.get_str("locationType")? {
                "radius" => {}
                other => {
                    return Err(Error::InvalidConfig(format!(
                        "unknown location type '{other}'"
                    )))
                }
            }
            Ok(NodeKind::Template(TemplateSpec::random_positioning(
                s.get_u32("noToPlace")?,
                s.get_f32("radius")?,
            )))
        });
        registry.register("FormationPositionNodeType", |s| {
            Ok(NodeKind::Template(TemplateSpec::formation(
                s.get_u32("noToPlace")?,
                s.get_u32("ArrayRows")?,
                s.get_f32("ArrayRowMargin")?,
                s.get_f32("ArrayColumnMargin")?,
            )))
        });
        registry.register("TargetPositionNodeType", |s| {
            Ok(NodeKind::Template(TemplateSpec::target(
                s.get_str("targetObject")?,
                s.get_bool("overwritePosition")?,
            )))
        });
        registry.register("SetTagNodeType", |s| {
            Ok(NodeKind::Template(TemplateSpec::set_tag(
                s.get_str("tagName")?,
                s.get_tag_value("tagValue")?,
            )))
        });
        registry
    }

    /// Registers a constructor. A repeated type name replaces the constructor in
    /// place, keeping its original position in the listing order.
    pub fn register(&mut self, type_name: &'static str, construct: Constructor) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.type_name == type_name)
        {
            entry.construct = construct;
        } else {
            self.entries.push(RegistryEntry {
                type_name,
                construct,
            });
        }
    }

    /// Instantiates a node spec from the editor's type identifier and settings.
    pub fn instantiate(&self, type_name: &str, settings: &Settings) -> Result<NodeKind> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.type_name == type_name)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown node type '{type_name}'")))?;
        (entry.construct)(settings)
    }

    /// Registered type names in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
