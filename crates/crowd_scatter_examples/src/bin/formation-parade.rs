//! A marching block: a rotated formation of guards with slight per-agent
//! rotation and scale jitter.
use crowd_scatter_examples::{init_tracing, print_result};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crowd_scatter::prelude::*;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut scene = MemoryScene::new();
    scene.add_object("Guard", ObjectKind::Mesh);

    let mut graph = TemplateGraph::new();
    graph.add_geo("guard", GeoSpec::object("Guard"));
    graph.add_template("spawn", TemplateSpec::agent("marcher"));
    graph.connect("spawn", slots::OBJECTS, "guard")?;
    graph.add_template("jitter", TemplateSpec::random(-5.0, 5.0, 0.95, 1.05));
    graph.connect("jitter", slots::TEMPLATE, "spawn")?;
    graph.add_template("block", TemplateSpec::formation(24, 6, 1.2, 1.8));
    graph.connect("block", slots::TEMPLATE, "jitter")?;
    graph.set_root("block")?;

    let runner = BuildRunner::try_new(BuildConfig::default(), &graph)?;

    let mut registrar = RecordingRegistrar::new();
    let mut rng = StdRng::seed_from_u64(42);
    let request = SpatialRequest::at(Vec3::new(0.0, 0.0, 0.0))
        .with_rotation(Vec3::new(0.0, 0.0, 30f32.to_radians()));

    let result = runner.run(
        &mut scene,
        &mut registrar,
        &CrowdGroup::new("Parade"),
        &[request],
        &mut rng,
    );

    print_result(&scene, &result);
    Ok(())
}
