//! Shared helpers for the example binaries.
use crowd_scatter::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a tracing subscriber honoring `RUST_LOG`, defaulting to info.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Prints a run summary and the placed agents to stdout.
pub fn print_result(scene: &MemoryScene, result: &BuildResult) {
    println!(
        "{} spawn(s), {} agent(s), {} failure(s), {} template build(s)",
        result.spawns_run,
        result.agents.len(),
        result.failures.len(),
        result.placements_issued
    );
    for agent in &result.agents {
        let handle = scene
            .object_by_name(&agent.name)
            .expect("agent object exists");
        let (position, _, scale) = scene.transform_of(handle);
        println!(
            "  {:<12} brain={:<8} group={:<16} pos=({:6.2}, {:6.2}, {:6.2}) scale={:.2}",
            agent.name, agent.brain_type, agent.geo_group, position.x, position.y, position.z, scale
        );
    }
    for failure in &result.failures {
        println!(
            "  failed at '{}' (spawn {}): {}",
            failure.node, failure.spawn_index, failure.message
        );
    }
}
