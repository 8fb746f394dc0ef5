//! A loose crowd: radial scatter around two spawn points, with a random split
//! between two body types and a faction tag per branch.
use crowd_scatter_examples::{init_tracing, print_result};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crowd_scatter::prelude::*;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut scene = MemoryScene::new();
    scene.add_object("Villager", ObjectKind::Mesh);
    scene.add_object("Merchant", ObjectKind::Mesh);

    let mut graph = TemplateGraph::new();
    graph.add_geo("villager", GeoSpec::object("Villager"));
    graph.add_geo("merchant", GeoSpec::object("Merchant"));

    graph.add_template("spawn_villager", TemplateSpec::agent("wander"));
    graph.connect("spawn_villager", slots::OBJECTS, "villager")?;
    graph.add_template(
        "tag_villager",
        TemplateSpec::set_tag("faction", TagValue::Str("commoner".into())),
    );
    graph.connect("tag_villager", slots::TEMPLATE, "spawn_villager")?;

    graph.add_template("spawn_merchant", TemplateSpec::agent("trade"));
    graph.connect("spawn_merchant", slots::OBJECTS, "merchant")?;

    graph.add_template("split", TemplateSpec::switch(0.8));
    graph.connect("split", slots::TEMPLATE_1, "tag_villager")?;
    graph.connect("split", slots::TEMPLATE_2, "spawn_merchant")?;

    graph.add_template("scatter", TemplateSpec::random_positioning(20, 8.0));
    graph.connect("scatter", slots::TEMPLATE, "split")?;
    graph.set_root("scatter")?;

    let runner = BuildRunner::try_new(BuildConfig::default(), &graph)?;

    let mut registrar = RecordingRegistrar::new();
    let mut rng = StdRng::seed_from_u64(7);
    let requests = [
        SpatialRequest::at(Vec3::new(-12.0, 0.0, 0.0)),
        SpatialRequest::at(Vec3::new(12.0, 0.0, 0.0)),
    ];

    let mut sink = VecSink::new();
    let result = runner.run_with_events(
        &mut scene,
        &mut registrar,
        &CrowdGroup::new("Market"),
        &requests,
        &mut rng,
        &mut sink,
    );

    print_result(&scene, &result);
    println!("{} event(s) observed", sink.events().len());
    Ok(())
}
