//! High-level runner for executing generation runs across spawn points.
use std::collections::HashMap;

use rand::RngCore;
use tracing::{info, warn};

use crate::build::eval::{build_template, EvalCtx};
use crate::build::events::{BuildEvent, BuildEventKind, EventSink};
use crate::build::CrowdGroup;
use crate::error::{Error, Result};
use crate::request::{SpatialRequest, TagMap};
use crate::scene::{AgentRegistrar, SceneHost};
use crate::template::validate::{validate, REASON_CYCLE};
use crate::template::{NodeId, TemplateGraph, ValidationCache, Verdict};

/// Configuration for a generation run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Ceiling on template builds per spawn point. Bounds runaway fan-out on
    /// misconfigured graphs; checked before each fan-out expansion.
    pub max_placements: usize,
    /// Ceiling on recursion depth per spawn point.
    pub max_depth: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_placements: 10_000,
            max_depth: 64,
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-spawn placement ceiling.
    pub fn with_max_placements(mut self, max_placements: usize) -> Self {
        self.max_placements = max_placements;
        self
    }

    /// Sets the per-spawn recursion depth ceiling.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_placements == 0 {
            return Err(Error::InvalidConfig("max_placements must be > 0".into()));
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig("max_depth must be > 0".into()));
        }
        Ok(())
    }
}

/// A registered agent produced by one spawn.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// Scene name of the agent's top-level object.
    pub name: String,
    /// Brain type handed to the registrar.
    pub brain_type: String,
    /// Name of the shared crowd group.
    pub parent_group: String,
    /// Name of the freshly created geometry group.
    pub geo_group: String,
    /// Tags accumulated along the placement branch.
    pub tags: TagMap,
}

/// A placement branch that aborted without stopping the run.
#[derive(Debug, Clone)]
pub struct BranchFailure {
    /// Node at which the failure was contained.
    pub node: NodeId,
    /// Spawn point the branch belongs to.
    pub spawn_index: usize,
    pub message: String,
}

/// Result of a generation run.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    /// Agents registered during the run.
    pub agents: Vec<AgentRecord>,
    /// Branches that aborted; the rest of the run continued.
    pub failures: Vec<BranchFailure>,
    /// Spawn points processed.
    pub spawns_run: usize,
    /// Total template builds issued across all spawns.
    pub placements_issued: usize,
    /// Build invocations per node, for diagnostics.
    pub builds_by_node: HashMap<NodeId, usize>,
}

impl BuildResult {
    /// Creates a new empty [`BuildResult`].
    pub fn new() -> Self {
        Self::default()
    }
}

/// Validates a graph once, then runs spawn batches against it.
pub struct BuildRunner<'a> {
    /// Build configuration applied to this runner.
    pub config: BuildConfig,
    /// The pre-validated template graph.
    pub graph: &'a TemplateGraph,
}

impl<'a> BuildRunner<'a> {
    /// Creates a runner, rejecting invalid configuration or an invalid graph
    /// before any scene side effect can happen.
    pub fn try_new(config: BuildConfig, graph: &'a TemplateGraph) -> Result<Self> {
        config.validate()?;
        let mut cache = ValidationCache::new();
        match validate(graph, &mut cache) {
            Verdict::Valid => Ok(Self { config, graph }),
            Verdict::Invalid {
                node: Some(node),
                reason,
            } if reason == REASON_CYCLE => Err(Error::Cycle { node }),
            Verdict::Invalid {
                node: Some(node),
                reason,
            } => Err(Error::Structural(format!("node '{node}': {reason}"))),
            Verdict::Invalid { node: None, reason } => Err(Error::Structural(reason)),
        }
    }

    /// Runs one spawn per request, returning the aggregated result.
    pub fn run<S, A, R>(
        &self,
        scene: &mut S,
        registrar: &mut A,
        group: &CrowdGroup,
        requests: &[SpatialRequest],
        rng: &mut R,
    ) -> BuildResult
    where
        S: SceneHost,
        A: AgentRegistrar,
        R: RngCore,
    {
        run_spawns(
            self.graph,
            &self.config,
            scene,
            registrar,
            group,
            requests,
            rng,
        )
    }

    pub fn run_with_events<S, A, R>(
        &self,
        scene: &mut S,
        registrar: &mut A,
        group: &CrowdGroup,
        requests: &[SpatialRequest],
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> BuildResult
    where
        S: SceneHost,
        A: AgentRegistrar,
        R: RngCore,
    {
        run_spawns_with_events(
            self.graph,
            &self.config,
            scene,
            registrar,
            group,
            requests,
            rng,
            sink,
        )
    }
}

/// Runs one spawn per request against a pre-validated graph.
///
/// Unlike [`BuildRunner::try_new`], the free functions do not validate the graph;
/// structural defects surface as per-spawn failures instead.
#[allow(clippy::too_many_arguments)]
pub fn run_spawns<S, A, R>(
    graph: &TemplateGraph,
    config: &BuildConfig,
    scene: &mut S,
    registrar: &mut A,
    group: &CrowdGroup,
    requests: &[SpatialRequest],
    rng: &mut R,
) -> BuildResult
where
    S: SceneHost,
    A: AgentRegistrar,
    R: RngCore,
{
    run_spawns_internal(graph, config, scene, registrar, group, requests, rng, &mut ())
}

#[allow(clippy::too_many_arguments)]
pub fn run_spawns_with_events<S, A, R>(
    graph: &TemplateGraph,
    config: &BuildConfig,
    scene: &mut S,
    registrar: &mut A,
    group: &CrowdGroup,
    requests: &[SpatialRequest],
    rng: &mut R,
    sink: &mut dyn EventSink,
) -> BuildResult
where
    S: SceneHost,
    A: AgentRegistrar,
    R: RngCore,
{
    run_spawns_internal(graph, config, scene, registrar, group, requests, rng, sink)
}

#[allow(clippy::too_many_arguments)]
fn run_spawns_internal(
    graph: &TemplateGraph,
    config: &BuildConfig,
    scene: &mut dyn SceneHost,
    registrar: &mut dyn AgentRegistrar,
    group: &CrowdGroup,
    requests: &[SpatialRequest],
    rng: &mut dyn RngCore,
    sink: &mut dyn EventSink,
) -> BuildResult {
    if sink.wants(BuildEventKind::RunStarted) {
        sink.send(BuildEvent::RunStarted {
            config: config.clone(),
            spawn_count: requests.len(),
        });
    }
    info!(
        "Generation run: {} spawn point(s) under group '{}'.",
        requests.len(),
        group.name
    );

    let mut result = BuildResult::new();

    let Some(root) = graph.root() else {
        warn!("Template graph has no root; nothing to build.");
        if sink.wants(BuildEventKind::Warning) {
            sink.send(BuildEvent::Warning {
                context: "graph".into(),
                message: "Template graph has no root; nothing to build".into(),
            });
        }
        if sink.wants(BuildEventKind::RunFinished) {
            sink.send(BuildEvent::RunFinished {
                result: result.clone(),
            });
        }
        return result;
    };

    for (index, request) in requests.iter().enumerate() {
        if sink.wants(BuildEventKind::SpawnStarted) {
            sink.send(BuildEvent::SpawnStarted {
                index,
                position: request.position,
            });
        }

        if request.scale <= 0.0 {
            let message = format!("spawn scale {} must be > 0", request.scale);
            warn!("Spawn {index}: {message}.");
            result.failures.push(BranchFailure {
                node: root.clone(),
                spawn_index: index,
                message,
            });
            result.spawns_run += 1;
            continue;
        }

        let mut ctx = EvalCtx {
            graph,
            config,
            scene: &mut *scene,
            registrar: &mut *registrar,
            rng: &mut *rng,
            sink: &mut *sink,
            group,
            spawn_index: index,
            placements: 0,
            out: &mut result,
        };
        let outcome = build_template(&mut ctx, root, request.clone(), 0);
        let placements = ctx.placements;

        result.placements_issued += placements;
        result.spawns_run += 1;

        if let Err(err) = outcome {
            warn!("Spawn {index} aborted: {err}.");
            let message = err.to_string();
            result.failures.push(BranchFailure {
                node: root.clone(),
                spawn_index: index,
                message: message.clone(),
            });
            if sink.wants(BuildEventKind::BranchFailed) {
                sink.send(BuildEvent::BranchFailed {
                    spawn_index: index,
                    node: root.clone(),
                    message,
                });
            }
        }
    }

    info!(
        "Generation run finished: {} agent(s), {} failure(s).",
        result.agents.len(),
        result.failures.len()
    );
    if sink.wants(BuildEventKind::RunFinished) {
        sink.send(BuildEvent::RunFinished {
            result: result.clone(),
        });
    }

    result
}
