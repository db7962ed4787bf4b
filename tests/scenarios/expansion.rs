/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use lexigraph::graph::{EdgeKind, ExpansionState};
use lexigraph::services::suggest::SuggestError;
use lexigraph::{ExpandOutcome, SeedOutcome};

use crate::harness::{ScriptedSource, TestHarness, greetings, key};

#[tokio::test]
async fn seed_hello_builds_three_node_star() {
    let harness = TestHarness::new(greetings());

    let outcome = harness.app.seed("Hello").await;
    assert!(matches!(outcome, SeedOutcome::Seeded { .. }));

    assert_eq!(harness.app.node_count(), 3);
    assert_eq!(
        harness.edge_ids(),
        vec!["hello-hi-semantic", "hello-hallo-visual"]
    );
    let hello = harness.app.node(&key("hello")).unwrap();
    assert!(hello.is_expanded());
    assert!(!hello.is_busy());
}

#[tokio::test]
async fn same_key_seeds_once() {
    let harness = TestHarness::new(greetings());
    harness.app.seed("Hello").await;
    let before = harness.app.snapshot();

    let outcome = harness.app.seed("  hELLO").await;
    assert!(matches!(
        outcome,
        SeedOutcome::AlreadyPresent { ref key, .. } if key.as_str() == "hello"
    ));
    assert_eq!(harness.app.snapshot(), before);
    assert_eq!(harness.calls(), 1);
    assert_eq!(harness.app.node(&key("hello")).unwrap().display_word, "Hello");
}

#[tokio::test]
async fn expanding_back_to_parent_adds_nothing() {
    let harness = TestHarness::new(greetings());
    harness.app.seed("Hello").await;

    let outcome = harness.app.expand(&key("hi")).await;
    let ExpandOutcome::Expanded(report) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(report.related_count, 1);
    assert_eq!(report.nodes_added, 0);
    assert_eq!(report.edges_added, 0);

    assert_eq!(harness.app.node_count(), 3);
    assert_eq!(harness.edge_ids().len(), 2);
    assert!(harness.app.node(&key("hi")).unwrap().is_expanded());
}

#[tokio::test]
async fn expanded_node_is_not_fetched_again() {
    let harness = TestHarness::new(greetings());
    harness.app.seed("Hello").await;
    harness.app.expand(&key("hi")).await;
    let calls = harness.calls();
    let before = harness.app.snapshot();

    assert_eq!(harness.app.expand(&key("hi")).await, ExpandOutcome::Ignored);
    assert_eq!(harness.app.expand(&key("hello")).await, ExpandOutcome::Ignored);
    assert_eq!(harness.calls(), calls);
    assert_eq!(harness.app.snapshot(), before);
}

#[tokio::test]
async fn failing_source_leaves_node_idle() {
    let harness = TestHarness::new(greetings().script("seedling", &[("xyz", "无意义")], &[]));
    harness.app.seed("seedling").await;
    let nodes_before = harness.app.node_count();
    let edges_before = harness.edge_ids();

    let outcome = harness.app.expand(&key("xyz")).await;
    assert!(matches!(
        outcome,
        ExpandOutcome::Failed(SuggestError::Network(_))
    ));

    let xyz = harness.app.node(&key("xyz")).unwrap();
    assert_eq!(xyz.state, ExpansionState::Idle);
    assert!(!xyz.is_busy());
    assert!(!xyz.is_expanded());
    assert_eq!(harness.app.node_count(), nodes_before);
    assert_eq!(harness.edge_ids(), edges_before);

    // Still retryable.
    assert!(matches!(
        harness.app.expand(&key("xyz")).await,
        ExpandOutcome::Failed(_)
    ));
    assert_eq!(harness.calls(), 3);
}

#[tokio::test]
async fn annotations_never_change_after_creation() {
    let source = ScriptedSource::default()
        .script("cold", &[], &[("cord", "一个字母不同")])
        .script("warm", &[("cord", "绳子")], &[]);
    let harness = TestHarness::new(source);
    harness.app.seed("cold").await;
    harness.app.seed("warm").await;

    let cord = harness.app.node(&key("cord")).unwrap();
    assert_eq!(cord.similarity_note(), Some("一个字母不同"));
    assert_eq!(cord.definition(), None);
    harness.app.with_graph(|graph| {
        assert!(graph.has_edge(&key("cold"), &key("cord"), EdgeKind::Visual));
        assert!(graph.has_edge(&key("cord"), &key("warm"), EdgeKind::Semantic));
    });
}

#[tokio::test]
async fn no_edge_appears_twice_in_either_direction() {
    let source = ScriptedSource::default()
        .script("a", &[("b", "")], &[("c", "")])
        .script("b", &[("a", ""), ("c", "")], &[("a", "")])
        .script("c", &[("b", "")], &[("a", ""), ("a", "")]);
    let harness = TestHarness::new(source);
    harness.app.seed("a").await;
    harness.app.expand(&key("b")).await;
    harness.app.expand(&key("c")).await;

    let mut pairs: Vec<(String, String, EdgeKind)> = harness.app.with_graph(|graph| {
        graph
            .edges()
            .map(|edge| {
                let (low, high) = if edge.source <= edge.target {
                    (edge.source.to_string(), edge.target.to_string())
                } else {
                    (edge.target.to_string(), edge.source.to_string())
                };
                (low, high, edge.kind)
            })
            .collect()
    });
    let total = pairs.len();
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), total);
    // a-b semantic, a-c visual, b-c semantic, b-a visual.
    assert_eq!(total, 4);
}
