//! Integration tests for roster-graph
//!
//! These tests build graphs from a real SQLite snapshot.

use roster_domain::member::attributes;
use roster_domain::{Assignment, Member, MemberId, RelationType, RelationshipEdge};
use roster_graph::{GraphBuilder, GraphError};
use roster_store::SqliteStore;

fn seeded_store() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let members: Vec<Member> = (1..=6)
        .map(|id| {
            Member::new(MemberId::new(id), "2025")
                .with_attribute(attributes::ACADEMIC, 40.0 + id as f64 * 5.0)
                .with_attribute(attributes::EFFORT, "high")
                .with_attribute(attributes::HOUSE, if id % 2 == 0 { "Red" } else { "Blue" })
        })
        .collect();
    let edges = vec![
        RelationshipEdge::new(MemberId::new(1), MemberId::new(2), RelationType::Friend),
        RelationshipEdge::new(MemberId::new(2), MemberId::new(3), RelationType::Friend),
        RelationshipEdge::new(MemberId::new(4), MemberId::new(5), RelationType::Influence),
        RelationshipEdge::new(MemberId::new(5), MemberId::new(77), RelationType::Advice),
        RelationshipEdge::new(MemberId::new(6), MemberId::new(1), RelationType::Disrespect),
    ];
    store.import_cohort("2025", &members, &edges).unwrap();
    store
}

#[test]
fn test_build_from_store() {
    let store = seeded_store();
    let builder = GraphBuilder::default_config();

    let (graph, diagnostics) = builder.build(&store, "2025").unwrap();

    assert_eq!(graph.len(), 6);
    assert_eq!(graph.cohort(), "2025");
    assert_eq!(graph.feature_dim(), 5);
    assert_eq!(graph.edges(RelationType::Friend).len(), 2);
    assert_eq!(graph.edges(RelationType::Disrespect).len(), 1);
    assert!(graph.edges(RelationType::Advice).is_empty());
    assert_eq!(graph.edge_count(), 4);

    assert_eq!(diagnostics.dropped_unknown.get(&RelationType::Advice), Some(&1));
    assert!(diagnostics.is_partial());
    // "high" is not a number
    assert_eq!(diagnostics.coerced_values, 6);
}

#[test]
fn test_empty_cohort_is_error() {
    let store = seeded_store();
    let builder = GraphBuilder::default_config();

    let result = builder.build(&store, "1999");
    assert!(matches!(result, Err(GraphError::EmptyCohort(cohort)) if cohort == "1999"));
}

#[test]
fn test_unchanged_snapshot_same_fingerprint() {
    let store = seeded_store();
    let builder = GraphBuilder::default_config();

    let (first, _) = builder.build(&store, "2025").unwrap();
    let (second, _) = builder.build(&store, "2025").unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn test_fingerprint_changes_with_new_edge() {
    let mut store = seeded_store();
    let builder = GraphBuilder::default_config();
    let (before, _) = builder.build(&store, "2025").unwrap();

    store
        .insert_edge(
            "2025",
            &RelationshipEdge::new(MemberId::new(3), MemberId::new(4), RelationType::MoreTime),
        )
        .unwrap();
    let (after, _) = builder.build(&store, "2025").unwrap();

    assert_ne!(before.fingerprint(), after.fingerprint());
}

#[test]
fn test_rebuild_for_assignment_ignores_later_members() {
    let mut store = seeded_store();
    let builder = GraphBuilder::default_config();

    let ids: Vec<MemberId> = [1, 2, 3, 4, 5, 6, 9].into_iter().map(MemberId::new).collect();
    let assignment = Assignment::from_labels(&ids, &[0, 1, 0, 1, 0, 1, 0], 2).unwrap();

    store
        .insert_member(&Member::new(MemberId::new(7), "2025").with_attribute(attributes::ACADEMIC, 70.0))
        .unwrap();
    store
        .insert_edge(
            "2025",
            &RelationshipEdge::new(MemberId::new(7), MemberId::new(1), RelationType::Friend),
        )
        .unwrap();

    let (graph, diagnostics) = builder.build_for_assignment(&store, "2025", &assignment).unwrap();

    assert_eq!(graph.len(), 6);
    assert_eq!(graph.index_of(MemberId::new(7)), None);
    assert_eq!(graph.edges(RelationType::Friend).len(), 2);
    assert_eq!(diagnostics.unassigned_members, vec![MemberId::new(7)]);
    assert_eq!(diagnostics.missing_members, vec![MemberId::new(9)]);
    assert_eq!(diagnostics.dropped_unknown.get(&RelationType::Friend), Some(&1));
    assert!(diagnostics.is_partial());

    // The cohort as a whole still includes the new member
    let (full, _) = builder.build(&store, "2025").unwrap();
    assert_eq!(full.len(), 7);
}
