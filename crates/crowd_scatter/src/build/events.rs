//! Event types and sinks for observing generation runs.
//!
//! This module defines [`BuildEvent`] and sinks to collect or forward events while
//! executing spawns via [`crate::build::runner::BuildRunner`] or
//! [`crate::build::runner::run_spawns`].
use glam::Vec3;

use crate::build::runner::{AgentRecord, BuildConfig, BuildResult};
use crate::template::NodeId;

/// Describes events emitted during a generation run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// Emitted once when a run starts.
    RunStarted {
        /// The build configuration used.
        config: BuildConfig,
        /// Number of spawn points in this run.
        spawn_count: usize,
    },

    /// Emitted once when the run finishes.
    RunFinished {
        /// Aggregated result for all spawns.
        result: BuildResult,
    },

    /// Emitted when one spawn point starts building.
    SpawnStarted {
        /// Index of the spawn point in the run.
        index: usize,
        /// Requested root position.
        position: Vec3,
    },

    /// Emitted when an agent has been registered.
    AgentPlaced {
        /// Index of the spawn point that produced the agent.
        spawn_index: usize,
        /// The registered agent.
        agent: AgentRecord,
    },

    /// Emitted when a placement branch aborted without stopping the run.
    BranchFailed {
        /// Index of the spawn point the branch belongs to.
        spawn_index: usize,
        /// Node at which the failure was contained.
        node: NodeId,
        /// Human-readable failure message.
        message: String,
    },

    /// Non-fatal warning generated during the run.
    Warning {
        /// Context string (e.g. node id, spawn index).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant for [`BuildEvent`], used by [`EventSink::wants`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildEventKind {
    RunStarted,
    RunFinished,
    SpawnStarted,
    AgentPlaced,
    BranchFailed,
    Warning,
}

impl BuildEvent {
    pub fn kind(&self) -> BuildEventKind {
        match self {
            BuildEvent::RunStarted { .. } => BuildEventKind::RunStarted,
            BuildEvent::RunFinished { .. } => BuildEventKind::RunFinished,
            BuildEvent::SpawnStarted { .. } => BuildEventKind::SpawnStarted,
            BuildEvent::AgentPlaced { .. } => BuildEventKind::AgentPlaced,
            BuildEvent::BranchFailed { .. } => BuildEventKind::BranchFailed,
            BuildEvent::Warning { .. } => BuildEventKind::Warning,
        }
    }
}

/// Receiver for build events.
pub trait EventSink {
    /// Whether the sink wants events of this kind; senders may skip constructing
    /// events nobody wants.
    fn wants(&self, kind: BuildEventKind) -> bool;

    fn send(&mut self, event: BuildEvent);
}

/// The no-op sink.
impl EventSink for () {
    fn wants(&self, _kind: BuildEventKind) -> bool {
        false
    }

    fn send(&mut self, _event: BuildEvent) {}
}

/// Sink that collects every event into a vector.
#[derive(Default)]
pub struct VecSink {
    events: Vec<BuildEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[BuildEvent] {
        &self.events
    }

    pub fn into_inner(self) -> Vec<BuildEvent> {
        self.events
    }
}

impl EventSink for VecSink {
    fn wants(&self, _kind: BuildEventKind) -> bool {
        true
    }

    fn send(&mut self, event: BuildEvent) {
        self.events.push(event);
    }
}

/// Sink that forwards every event to a closure.
pub struct FnSink<F: FnMut(BuildEvent)> {
    f: F,
}

impl<F: FnMut(BuildEvent)> FnSink<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: FnMut(BuildEvent)> EventSink for FnSink<F> {
    fn wants(&self, _kind: BuildEventKind) -> bool {
        true
    }

    fn send(&mut self, event: BuildEvent) {
        (self.f)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink = VecSink::new();
        sink.send(BuildEvent::SpawnStarted {
            index: 0,
            position: Vec3::ZERO,
        });
        sink.send(BuildEvent::Warning {
            context: "n".into(),
            message: "m".into(),
        });

        let kinds: Vec<_> = sink.events().iter().map(BuildEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![BuildEventKind::SpawnStarted, BuildEventKind::Warning]
        );
    }

    #[test]
    fn unit_sink_wants_nothing() {
        let sink = ();
        assert!(!sink.wants(BuildEventKind::AgentPlaced));
    }

    #[test]
    fn fn_sink_forwards_events() {
        let mut seen = Vec::new();
        {
            let mut sink = FnSink::new(|event: BuildEvent| seen.push(event.kind()));
            sink.send(BuildEvent::Warning {
                context: "c".into(),
                message: "m".into(),
            });
        }
        assert_eq!(seen, vec![BuildEventKind::Warning]);
    }
}
