/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use euclid::default::Point2D;
use lexigraph::graph::{ExpansionState, Viewport};
use lexigraph::persistence::export::{export_document, to_pretty_json, write_export};
use lexigraph::persistence::types::CanvasDocument;
use lexigraph::persistence::{CANVAS_STATE_KEY, KeyValueStore, MemoryStore};
use tempfile::TempDir;
use time::macros::date;

use crate::harness::{TestHarness, greetings, key};

#[tokio::test]
async fn restore_reproduces_saved_canvas() {
    let store = Arc::new(MemoryStore::new());
    let harness = TestHarness::with_store(greetings(), store.clone());
    harness.app.seed("Hello").await;
    harness.app.move_node(&key("hi"), Point2D::new(-75.0, 12.5));
    harness.app.set_viewport(Viewport {
        x: 40.0,
        y: -8.0,
        zoom: 0.8,
    });
    let saved = harness.app.snapshot();

    let reopened = TestHarness::with_store(greetings(), store);
    assert_eq!(reopened.app.snapshot(), saved);
    assert_eq!(
        reopened.app.node(&key("hi")).unwrap().position,
        Point2D::new(-75.0, 12.5)
    );
    // A restored expanded node is still not re-fetched.
    assert_eq!(
        reopened.app.expand(&key("hello")).await,
        lexigraph::ExpandOutcome::Ignored
    );
    assert_eq!(reopened.calls(), 0);
}

#[tokio::test]
async fn corrupt_state_starts_empty() {
    let store = Arc::new(MemoryStore::new());
    store.set(CANVAS_STATE_KEY, "definitely not json").unwrap();

    let harness = TestHarness::with_store(greetings(), store);
    assert_eq!(harness.app.node_count(), 0);
    assert!(matches!(
        harness.app.seed("Hello").await,
        lexigraph::SeedOutcome::Seeded { .. }
    ));
}

#[tokio::test]
async fn nodes_saved_mid_expansion_reload_idle() {
    let store = Arc::new(MemoryStore::new());
    let harness = TestHarness::with_store(greetings(), store.clone());
    harness.app.seed("Hello").await;

    let mut document = harness.app.snapshot();
    for node in &mut document.nodes {
        if node.id == "hallo" {
            node.data.loading = true;
        }
    }
    store
        .set(CANVAS_STATE_KEY, &document.to_json().unwrap())
        .unwrap();

    let reopened = TestHarness::with_store(greetings(), store);
    let hallo = reopened.app.node(&key("hallo")).unwrap();
    assert_eq!(hallo.state, ExpansionState::Idle);
}

#[tokio::test]
async fn clear_forgets_persisted_canvas() {
    let store = Arc::new(MemoryStore::new());
    let harness = TestHarness::with_store(greetings(), store.clone());
    harness.app.seed("Hello").await;
    assert!(store.get(CANVAS_STATE_KEY).is_some());

    harness.app.clear();
    assert!(store.get(CANVAS_STATE_KEY).is_none());
    let reopened = TestHarness::with_store(greetings(), store);
    assert_eq!(reopened.app.node_count(), 0);
}

#[tokio::test]
async fn failed_seed_writes_nothing() {
    let harness = TestHarness::new(greetings());

    let outcome = harness.app.seed("xyz").await;
    assert!(matches!(outcome, lexigraph::SeedOutcome::Failed { .. }));
    assert_eq!(harness.app.node_count(), 0);
    assert!(harness.store.get(CANVAS_STATE_KEY).is_none());

    harness.app.seed("Hello").await;
    let saved = harness.store.get(CANVAS_STATE_KEY).unwrap();
    harness.app.seed("xyz").await;
    let after = harness.store.get(CANVAS_STATE_KEY).unwrap();
    let after = CanvasDocument::from_json(&after).unwrap();
    assert_eq!(after, CanvasDocument::from_json(&saved).unwrap());
    assert!(after.nodes.iter().all(|node| node.id != "xyz"));
}

#[tokio::test]
async fn export_round_trips_structurally() {
    let harness = TestHarness::new(greetings());
    harness.app.seed("Hello").await;
    harness.app.expand(&key("hi")).await;

    let document = export_document(&harness.app);
    let pretty = to_pretty_json(&document).unwrap();
    assert_eq!(CanvasDocument::from_json(&pretty).unwrap(), document);

    let dir = TempDir::new().unwrap();
    let path = write_export(&document, dir.path(), date!(2024 - 01 - 09)).unwrap();
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("word-canvas-2024-01-09.json")
    );
    let written = std::fs::read_to_string(path).unwrap();
    assert_eq!(CanvasDocument::from_json(&written).unwrap(), document);
}

#[test]
fn edge_rendering_hints_follow_kind() {
    use lexigraph::graph::EdgeKind;
    assert!(EdgeKind::Semantic.is_animated() && !EdgeKind::Semantic.is_dashed());
    assert!(EdgeKind::Visual.is_dashed() && !EdgeKind::Visual.is_animated());
}
