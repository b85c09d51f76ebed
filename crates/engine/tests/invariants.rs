//! Structural guarantees of the build graph and the errors around it.

mod common;

use c3i_core::{Error, VariantMatrix};
use c3i_engine::{
    BuildGraph, DownstreamExpander, ExpandOptions, GraphBuilder, NoarchCollapser, NodeKind,
    PlanRequest, Planner, order,
};
use common::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn build(renderer: &FakeRenderer, resolver: &FakeResolver, seeds: &[&str]) -> BuildGraph {
    let root = recipe_tree(renderer);
    GraphBuilder::new(renderer, resolver, VariantMatrix::new())
        .with_recipes_root(root.path())
        .build(seeds, &linux())
        .unwrap()
}

fn diamond() -> FakeRenderer {
    FakeRenderer::new()
        .with("base", FakeRecipe::new())
        .with("left", FakeRecipe::new().build_deps(&["base"]))
        .with("right", FakeRecipe::new().run_deps(&["base"]))
        .with(
            "top",
            FakeRecipe::new()
                .build_deps(&["left", "right"])
                .test_deps(&["pytest"]),
        )
        .with("pytest", FakeRecipe::new())
}

#[test]
fn test_every_build_has_a_test_twin() {
    let graph = build(&diamond(), &FakeResolver::empty(), &["top"]);

    for node in graph.nodes().filter(|n| n.kind == NodeKind::Build) {
        let twin = node.key_as(NodeKind::Test);
        assert!(graph.contains(&twin), "{} has no test twin", node.key);
        assert!(
            graph.dependencies(&twin).contains(&node.key.as_str()),
            "{twin} does not depend on {}",
            node.key
        );
    }
}

#[test]
fn test_no_self_edges_and_order_respects_dependencies() {
    let graph = build(&diamond(), &FakeResolver::empty(), &["top"]);
    for (from, to) in graph.edges() {
        assert_ne!(from, to);
    }

    let ordered = order(&graph).unwrap();
    assert_eq!(ordered.len(), graph.len());
    let position: HashMap<&str, usize> = ordered
        .iter()
        .enumerate()
        .map(|(i, n)| (n.key.as_str(), i))
        .collect();
    for (dependent, dependency) in graph.edges() {
        assert!(position[dependency] < position[dependent]);
    }
}

#[test]
fn test_run_dependency_feeds_only_the_test_node() {
    let graph = build(&diamond(), &FakeResolver::empty(), &["right"]);
    assert_eq!(
        graph.dependencies("build-right-0-linux-64"),
        Vec::<&str>::new()
    );
    assert_eq!(
        graph.dependencies("test-right-0-linux-64"),
        vec!["build-base-0-linux-64", "build-right-0-linux-64"]
    );
}

#[test]
fn test_building_twice_gives_the_same_graph() {
    let renderer = diamond();
    let resolver = FakeResolver::empty();
    let first = build(&renderer, &resolver, &["top", "right"]);
    let second = build(&renderer, &resolver, &["right", "top"]);
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(edges(&first), edges(&second));
}

#[test]
fn test_unbounded_expansion_is_idempotent() {
    let renderer = chain();
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let builder = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path());
    let expander = DownstreamExpander::new(
        &builder,
        ExpandOptions {
            steps: -1,
            max_downstream: -1,
        },
    );

    let mut graph = builder.build(&["a"], &linux()).unwrap();
    assert_eq!(expander.expand(&mut graph, &linux()).unwrap(), 6);
    let before = keys(&graph);
    assert_eq!(expander.expand(&mut graph, &linux()).unwrap(), 0);
    assert_eq!(keys(&graph), before);
}

#[test]
fn test_expansion_with_explicit_root_override() {
    let renderer = chain();
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let builder = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path());
    let mut graph = builder.build(&["c"], &linux()).unwrap();

    let empty = tempfile::tempdir().unwrap();
    let added = DownstreamExpander::new(
        &builder,
        ExpandOptions {
            steps: -1,
            max_downstream: -1,
        },
    )
    .with_recipes_root(empty.path())
    .expand(&mut graph, &linux())
    .unwrap();
    assert_eq!(added, 0);
    assert!(!graph.contains("build-d-0-linux-64"));
}

#[test]
fn test_root_override_also_resolves_dependencies() {
    let renderer = FakeRenderer::new()
        .with("m", FakeRecipe::new().build_deps(&["z"]))
        .with("z", FakeRecipe::new());
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let rootless = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new());
    let mut graph = rootless.build(&[root.path().join("z")], &linux()).unwrap();

    let added = DownstreamExpander::new(
        &rootless,
        ExpandOptions {
            steps: 1,
            max_downstream: -1,
        },
    )
    .with_recipes_root(root.path())
    .expand(&mut graph, &linux())
    .unwrap();
    assert_eq!(added, 2);
    assert!(graph.contains("build-m-0-linux-64"));
    assert_eq!(
        graph.dependencies("build-m-0-linux-64"),
        vec!["build-z-0-linux-64"]
    );
}

#[test]
fn test_empty_seeds_give_empty_graph() {
    let seeds: [&str; 0] = [];
    let graph = build(&chain(), &FakeResolver::empty(), &seeds);
    assert!(graph.is_empty());
    assert!(order(&graph).unwrap().is_empty());
}

#[test]
fn test_non_recipe_seed_is_ignored() {
    let graph = build(&chain(), &FakeResolver::empty(), &["docs"]);
    assert!(graph.is_empty());
}

#[test]
fn test_skipped_recipe_adds_no_node() {
    let renderer = FakeRenderer::new().with("s", FakeRecipe::new().skip_on("linux-64"));
    let graph = build(&renderer, &FakeResolver::empty(), &["s"]);
    assert!(graph.is_empty());
}

#[test]
fn test_skipped_dependency_is_unresolvable() {
    let renderer = FakeRenderer::new()
        .with("s", FakeRecipe::new().skip_on("linux-64"))
        .with("t", FakeRecipe::new().build_deps(&["s"]));
    let root = recipe_tree(&renderer);
    let resolver = FakeResolver::empty();
    let err = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path())
        .build(&["t"], &linux())
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvableDependency { .. }));
}

#[test]
fn test_expansion_without_root_is_a_config_error() {
    let renderer = chain();
    let resolver = FakeResolver::empty();
    let builder = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new());
    let mut graph = BuildGraph::new();

    let err = DownstreamExpander::new(
        &builder,
        ExpandOptions {
            steps: 1,
            max_downstream: 5,
        },
    )
    .expand(&mut graph, &linux())
    .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_unresolvable_dependency_names_the_node() {
    let renderer = FakeRenderer::new().with("y", FakeRecipe::new().build_deps(&["ghost 2.0"]));
    let root = recipe_tree(&renderer);
    let resolver = FakeResolver::empty();
    let err = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path())
        .build(&["y"], &linux())
        .unwrap_err();

    match err {
        Error::UnresolvableDependency { dependency, node } => {
            assert_eq!(dependency, "ghost 2.0");
            assert_eq!(node, "build-y-0-linux-64");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dependency_version_mismatch_is_unresolvable() {
    let renderer = FakeRenderer::new()
        .with("x", FakeRecipe::new().version("2.0"))
        .with("y", FakeRecipe::new().build_deps(&["x 1.0"]));
    let root = recipe_tree(&renderer);
    let resolver = FakeResolver::empty();
    let err = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path())
        .build(&["y"], &linux())
        .unwrap_err();
    assert!(matches!(err, Error::UnresolvableDependency { .. }));
}

#[test]
fn test_renderer_error_propagates() {
    let renderer = chain().failing_on("b");
    let root = recipe_tree(&renderer);
    let resolver = FakeResolver::empty();
    let err = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path())
        .build(&["c"], &linux())
        .unwrap_err();
    assert!(matches!(err, Error::Recipe { .. }));
}

#[test]
fn test_resolver_error_propagates() {
    let renderer = chain();
    let root = recipe_tree(&renderer);
    let resolver = FakeResolver::failing();
    let err = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path())
        .build(&["b"], &linux())
        .unwrap_err();
    assert!(matches!(err, Error::Resolver { .. }));
}

#[test]
fn test_noarch_without_builder_fails_untouched() {
    let renderer = FakeRenderer::new().with("p", FakeRecipe::new().noarch());
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let builder = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path());
    let mut graph = builder.build(&["p"], &osx()).unwrap();
    let before = keys(&graph);

    let err = NoarchCollapser::new().collapse(&mut graph).unwrap_err();
    match err {
        Error::NoarchWithoutBuilder {
            package,
            build_subdir,
        } => {
            assert_eq!(package, "p");
            assert_eq!(build_subdir, "linux-64");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(keys(&graph), before);
}

#[test]
fn test_noarch_consumers_move_to_the_builder() {
    let renderer = FakeRenderer::new()
        .with("p", FakeRecipe::new().noarch())
        .with("q", FakeRecipe::new().build_deps(&["p"]));
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);

    let graph = Planner::new(&renderer, &resolver, VariantMatrix::new())
        .plan(&PlanRequest {
            recipes_root: Some(root.path().to_path_buf()),
            seeds: vec![PathBuf::from("q")],
            platforms: vec![linux(), osx()],
            ..PlanRequest::default()
        })
        .unwrap();

    assert!(!graph.contains("build-p-0-osx-64"));
    assert_eq!(
        graph.dependencies("build-q-0-osx-64"),
        vec!["build-p-0-linux-64"]
    );
    assert_eq!(
        graph.dependencies("test-only-p-0-osx-64"),
        vec!["build-p-0-linux-64"]
    );
    assert!(order(&graph).is_ok());
}

#[test]
fn test_noarch_builder_on_custom_subdir() {
    let renderer = FakeRenderer::new().with("p", FakeRecipe::new().noarch());
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);

    let graph = Planner::new(&renderer, &resolver, VariantMatrix::new())
        .plan(&PlanRequest {
            recipes_root: Some(root.path().to_path_buf()),
            seeds: vec![PathBuf::from("p")],
            platforms: vec![linux(), osx()],
            noarch_build_subdir: "osx-64".to_string(),
            ..PlanRequest::default()
        })
        .unwrap();

    assert!(graph.contains("build-p-0-osx-64"));
    assert!(graph.contains("test-only-p-0-linux-64"));
    assert!(!graph.contains("build-p-0-linux-64"));
}

#[test]
fn test_multiple_noarch_builders_keep_one() {
    let renderer = FakeRenderer::new().with("p", FakeRecipe::new().noarch().varies_with("python"));
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);

    let graph = Planner::new(
        &renderer,
        &resolver,
        matrix(&[("python", &["3.11", "3.12"])]),
    )
    .plan(&PlanRequest {
        recipes_root: Some(root.path().to_path_buf()),
        seeds: vec![PathBuf::from("p")],
        platforms: vec![linux()],
        ..PlanRequest::default()
    })
    .unwrap();

    let builds: Vec<&str> = graph
        .nodes()
        .filter(|n| n.kind == NodeKind::Build)
        .map(|n| n.key.as_str())
        .collect();
    assert_eq!(builds, vec!["build-p-v311_0-linux-64"]);
    assert!(graph.contains("test-only-p-v312_0-linux-64"));
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let renderer = FakeRenderer::new().with("a", FakeRecipe::new().build_deps(&["a"]));
    let root = recipe_tree(&renderer);
    let resolver = FakeResolver::empty();
    let err = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(root.path())
        .build(&["a"], &linux())
        .unwrap_err();

    match err {
        Error::CycleDetected { edges } => assert_eq!(
            edges,
            vec![(
                "build-a-0-linux-64".to_string(),
                "build-a-0-linux-64".to_string()
            )]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_runtime_cycle_is_allowed() {
    let renderer = FakeRenderer::new()
        .with("a", FakeRecipe::new().run_deps(&["b"]))
        .with("b", FakeRecipe::new().run_deps(&["a"]));
    let graph = build(&renderer, &FakeResolver::empty(), &["a"]);

    assert_eq!(graph.len(), 4);
    let ordered = order(&graph).unwrap();
    let kinds: Vec<NodeKind> = ordered.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Build,
            NodeKind::Build,
            NodeKind::Test,
            NodeKind::Test
        ]
    );
}

#[test]
fn test_variants_multiply_nodes() {
    let renderer = FakeRenderer::new().with("n", FakeRecipe::new().varies_with("python"));
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let graph = GraphBuilder::new(
        &renderer,
        &resolver,
        matrix(&[("python", &["3.11", "3.12"]), ("numpy", &["1.26"])]),
    )
    .with_recipes_root(root.path())
    .build(&["n"], &linux())
    .unwrap();

    assert_eq!(
        keys(&graph),
        set(&[
            "build-n-v311_0-linux-64",
            "test-n-v311_0-linux-64",
            "build-n-v312_0-linux-64",
            "test-n-v312_0-linux-64",
        ])
    );
    let attrs = graph.attributes("build-n-v312_0-linux-64").unwrap();
    assert_eq!(attrs.variant.get("python"), Some("3.12"));
    assert_eq!(attrs.variant.get("numpy"), Some("1.26"));
}

#[test]
fn test_variant_independent_recipe_collapses_to_one_node() {
    let renderer = FakeRenderer::new().with("n", FakeRecipe::new());
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let graph = GraphBuilder::new(
        &renderer,
        &resolver,
        matrix(&[("python", &["3.11", "3.12"])]),
    )
    .with_recipes_root(root.path())
    .build(&["n"], &linux())
    .unwrap();
    assert_eq!(graph.len(), 2);
}

#[test]
fn test_platform_overrides_replace_matrix_values() {
    let renderer = FakeRenderer::new().with("n", FakeRecipe::new().varies_with("python"));
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let platform = linux().with_variant("python", vec!["3.10".to_string()]);
    let graph = GraphBuilder::new(
        &renderer,
        &resolver,
        matrix(&[("python", &["3.11", "3.12"])]),
    )
    .with_recipes_root(root.path())
    .build(&["n"], &platform)
    .unwrap();

    assert_eq!(
        keys(&graph),
        set(&["build-n-v310_0-linux-64", "test-n-v310_0-linux-64"])
    );
}

#[test]
fn test_empty_value_list_renders_nothing() {
    let renderer = FakeRenderer::new().with("n", FakeRecipe::new());
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let graph = GraphBuilder::new(&renderer, &resolver, matrix(&[("python", &[])]))
        .with_recipes_root(root.path())
        .build(&["n"], &linux())
        .unwrap();
    assert!(graph.is_empty());
    assert_eq!(renderer.renders.get(), 0);
}

#[test]
fn test_absolute_seed_ignores_root() {
    let renderer = chain();
    let resolver = FakeResolver::empty();
    let root = recipe_tree(&renderer);
    let seed = root.path().join("a");
    let graph = GraphBuilder::new(&renderer, &resolver, VariantMatrix::new())
        .with_recipes_root(Path::new("/nonexistent"))
        .build(&[seed], &linux())
        .unwrap();
    assert_eq!(graph.len(), 2);
}
