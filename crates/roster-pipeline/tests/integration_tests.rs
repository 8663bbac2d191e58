//! Integration tests for roster-pipeline

use roster_allocator::PolicyKind;
use roster_domain::member::attributes;
use roster_domain::{ErrorKind, GroupId, Member, MemberId, RelationType, RelationshipEdge};
use roster_pipeline::{AllocationRequest, Pipeline, PipelineConfig, PipelineError, PipelineWorker};
use roster_store::SqliteStore;

fn members(cohort: &str, ids: std::ops::RangeInclusive<u64>) -> Vec<Member> {
    ids.map(|id| {
        Member::new(MemberId::new(id), cohort)
            .with_attribute(attributes::ACADEMIC, 30.0 + (id * 13 % 60) as f64)
            .with_attribute(attributes::EFFORT, (id % 4) as f64)
            .with_attribute(attributes::ATTENDANCE, 80.0 + (id % 3) as f64)
    })
    .collect()
}

fn ring(ids: std::ops::RangeInclusive<u64>, relation: RelationType) -> Vec<RelationshipEdge> {
    let ids: Vec<u64> = ids.collect();
    ids.iter()
        .zip(ids.iter().cycle().skip(1))
        .map(|(s, t)| RelationshipEdge::new(MemberId::new(*s), MemberId::new(*t), relation))
        .collect()
}

fn seeded_store() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let mut edges = ring(1..=12, RelationType::Friend);
    edges.extend(ring(1..=12, RelationType::Advice).into_iter().step_by(2));
    edges.push(RelationshipEdge::new(
        MemberId::new(1),
        MemberId::new(7),
        RelationType::Disrespect,
    ));
    store.import_cohort("2025", &members("2025", 1..=12), &edges).unwrap();
    store
}

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::fast()).unwrap()
}

#[test]
fn test_allocate_persists_balanced_run() {
    let mut store = seeded_store();
    let pipeline = pipeline();

    let result = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 3))
        .unwrap();

    assert_eq!(result.total_members, 12);
    assert_eq!(result.total_groups, 3);
    assert_eq!(result.policy, "solver");
    assert!(result.groups.values().all(|m| m.len() == 4));
    assert_eq!(result.group_averages.len(), 3);
    assert!(result.group_averages.values().all(|a| a.contains_key(attributes::ACADEMIC)));

    let record = pipeline.load(&store, result.run_id).unwrap();
    assert_eq!(record.assignment.groups(), result.groups);
    assert_eq!(record.run.group_count, 3);
    assert!(record.run.parent.is_none());
    assert!(!record.preservation.is_empty());
    assert_eq!(store.stats().unwrap().runs, 1);
}

#[test]
fn test_policy_override_is_recorded() {
    let mut store = seeded_store();
    let pipeline = pipeline();

    for (policy, label) in [(PolicyKind::Greedy, "greedy"), (PolicyKind::Random, "random")] {
        let request = AllocationRequest::new("2025", 4).with_policy(policy);
        let result = pipeline.allocate(&mut store, &request).unwrap();
        assert_eq!(result.policy, label);
        assert!(result.groups.values().all(|m| m.len() == 3));
    }
    assert_eq!(pipeline.runs(&store, Some("2025")).unwrap().len(), 2);
}

#[test]
fn test_invalid_group_count_writes_nothing() {
    let mut store = seeded_store();
    let pipeline = pipeline();

    let zero = pipeline.allocate(&mut store, &AllocationRequest::new("2025", 0));
    assert!(matches!(zero, Err(PipelineError::Config(_))));

    let too_many = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 13))
        .unwrap_err();
    assert_eq!(too_many.kind(), ErrorKind::Configuration);

    assert_eq!(store.stats().unwrap().runs, 0);
}

#[test]
fn test_empty_cohort_is_data_error() {
    let mut store = seeded_store();
    let err = pipeline()
        .allocate(&mut store, &AllocationRequest::new("1999", 2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
    assert!(!err.is_retryable());
}

#[test]
fn test_invalid_weights_rejected() {
    let mut store = seeded_store();
    let mut weights = roster_allocator::ObjectiveWeights::default();
    weights.negative = 0.1;

    let request = AllocationRequest::new("2025", 3).with_weights(weights);
    let err = pipeline().allocate(&mut store, &request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_unknown_endpoint_reported_as_partial() {
    let mut store = seeded_store();
    store
        .insert_edge(
            "2025",
            &RelationshipEdge::new(MemberId::new(2), MemberId::new(999), RelationType::Friend),
        )
        .unwrap();

    let result = pipeline()
        .allocate(&mut store, &AllocationRequest::new("2025", 2))
        .unwrap();
    assert!(result.diagnostics.is_partial());
    assert_eq!(result.diagnostics.kind(), Some(ErrorKind::PartialGraph));
}

#[test]
fn test_reallocate_creates_child_run() {
    let mut store = seeded_store();
    let pipeline = pipeline();
    let parent = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 3))
        .unwrap();

    let from = GroupId::from_index(0);
    let to = GroupId::from_index(1);
    let member = parent.groups[&from][0];

    let moved = pipeline
        .reallocate(&mut store, parent.run_id, member, from, to)
        .unwrap();
    assert_eq!(moved.parent_run_id, parent.run_id);
    assert_ne!(moved.new_run_id, parent.run_id);
    assert!(moved.groups[&to].contains(&member));
    assert_eq!(moved.groups[&from].len(), 3);
    assert_eq!(moved.groups[&to].len(), 5);
    assert!(!moved.balanced);

    // Every other member keeps its group
    for (group, ids) in &parent.groups {
        for id in ids.iter().filter(|id| **id != member) {
            assert!(moved.groups[group].contains(id));
        }
    }

    let original = pipeline.load(&store, parent.run_id).unwrap();
    assert_eq!(original.assignment.groups(), parent.groups);

    let child = pipeline.load(&store, moved.new_run_id).unwrap();
    assert_eq!(child.run.parent, Some(parent.run_id));
    assert_eq!(child.run.policy, "manual");
}

#[test]
fn test_stored_run_survives_cohort_growth() {
    let mut store = seeded_store();
    let pipeline = pipeline();
    let parent = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 3))
        .unwrap();

    store.insert_member(&members("2025", 13..=13)[0]).unwrap();
    store
        .insert_edge(
            "2025",
            &RelationshipEdge::new(MemberId::new(13), MemberId::new(1), RelationType::Friend),
        )
        .unwrap();

    let analysis = pipeline.analyze(&store, Some(parent.run_id)).unwrap();
    assert_eq!(analysis.run.id, parent.run_id);
    assert_eq!(analysis.report.relation(RelationType::Friend).unwrap().total, 12);
    assert_eq!(analysis.profiles.iter().map(|p| p.size).sum::<usize>(), 12);
    assert_eq!(analysis.diagnostics.unassigned_members, vec![MemberId::new(13)]);
    assert_eq!(analysis.diagnostics.kind(), Some(ErrorKind::PartialGraph));

    let from = GroupId::from_index(0);
    let to = GroupId::from_index(2);
    let member = parent.groups[&from][0];
    let moved = pipeline
        .reallocate(&mut store, parent.run_id, member, from, to)
        .unwrap();
    assert_eq!(moved.groups.values().map(Vec::len).sum::<usize>(), 12);
    assert_eq!(moved.diagnostics.unassigned_members, vec![MemberId::new(13)]);

    let child = pipeline.load(&store, moved.new_run_id).unwrap();
    assert_eq!(child.assignment.group_of(MemberId::new(13)), None);
}

#[test]
fn test_member_moved_to_other_cohort_is_reported() {
    let mut store = seeded_store();
    let pipeline = pipeline();
    let parent = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 3))
        .unwrap();

    store
        .import_cohort("2026", &members("2026", 5..=5), &[])
        .unwrap();

    let analysis = pipeline.analyze(&store, Some(parent.run_id)).unwrap();
    assert_eq!(analysis.diagnostics.missing_members, vec![MemberId::new(5)]);
    assert!(analysis.diagnostics.unassigned_members.is_empty());
    assert!(analysis
        .diagnostics
        .messages()
        .iter()
        .any(|m| m.contains("no longer in the cohort")));
}

#[test]
fn test_reallocate_rejects_wrong_source_group() {
    let mut store = seeded_store();
    let pipeline = pipeline();
    let parent = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 3))
        .unwrap();

    let member = parent.groups[&GroupId::from_index(0)][0];
    let err = pipeline
        .reallocate(
            &mut store,
            parent.run_id,
            member,
            GroupId::from_index(2),
            GroupId::from_index(1),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(store.stats().unwrap().runs, 1);
}

#[test]
fn test_reallocate_unknown_run() {
    let mut store = seeded_store();
    let err = pipeline()
        .reallocate(
            &mut store,
            roster_domain::RunId::new(),
            MemberId::new(1),
            GroupId::from_index(0),
            GroupId::from_index(1),
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_analyze_latest_run() {
    let mut store = seeded_store();
    let pipeline = pipeline();

    let none = pipeline.analyze(&store, None);
    assert!(matches!(none, Err(PipelineError::Config(_))));

    pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 2))
        .unwrap();
    let latest = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 3))
        .unwrap();

    let analysis = pipeline.analyze(&store, None).unwrap();
    assert_eq!(analysis.run.id, latest.run_id);
    assert_eq!(analysis.profiles.len(), 3);
    assert_eq!(analysis.profiles.iter().map(|p| p.size).sum::<usize>(), 12);

    let friends = analysis.report.relation(RelationType::Friend).unwrap();
    assert_eq!(friends.total, 12);
    assert!(friends.preserved <= friends.total);
    assert_eq!(analysis.report.global_centrality[&RelationType::Friend].nodes, 12);
}

#[test]
fn test_runs_listed_newest_first() {
    let mut store = seeded_store();
    store
        .import_cohort("2024", &members("2024", 101..=106), &ring(101..=106, RelationType::Friend))
        .unwrap();
    let pipeline = pipeline();

    let first = pipeline
        .allocate(&mut store, &AllocationRequest::new("2025", 2))
        .unwrap();
    let second = pipeline
        .allocate(&mut store, &AllocationRequest::new("2024", 2))
        .unwrap();

    let all = pipeline.runs(&store, None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second.run_id);
    assert_eq!(all[1].id, first.run_id);

    let only_2024 = pipeline.runs(&store, Some("2024")).unwrap();
    assert_eq!(only_2024.len(), 1);
    assert_eq!(only_2024[0].cohort, "2024");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_runs_cohorts_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store
            .import_cohort("2024", &members("2024", 101..=110), &ring(101..=110, RelationType::Friend))
            .unwrap();
        store
            .import_cohort("2025", &members("2025", 1..=12), &ring(1..=12, RelationType::Friend))
            .unwrap();
    }

    let open_path = path.clone();
    let worker = PipelineWorker::new(pipeline(), move || {
        SqliteStore::new(&open_path).map_err(|e| e.to_string())
    });

    let results = worker
        .allocate_many(vec![
            AllocationRequest::new("2024", 2),
            AllocationRequest::new("2025", 3),
            AllocationRequest::new("2025", 20),
        ])
        .await;

    assert_eq!(results.len(), 3);
    let a = results[0].as_ref().unwrap();
    let b = results[1].as_ref().unwrap();
    assert_eq!(a.cohort, "2024");
    assert_eq!(b.cohort, "2025");
    assert!(a.groups.values().all(|m| m.len() == 5));
    assert!(b.groups.values().all(|m| m.len() == 4));
    assert!(matches!(results[2], Err(PipelineError::Config(_))));

    let store = SqliteStore::new(&path).unwrap();
    assert_eq!(store.stats().unwrap().runs, 2);
}

#[tokio::test]
async fn test_worker_reports_open_failure() {
    let worker = PipelineWorker::new(pipeline(), || -> Result<SqliteStore, String> {
        Err("disk unavailable".to_string())
    });

    let err = worker
        .allocate(AllocationRequest::new("2025", 2))
        .await
        .unwrap_err();
    assert_eq!(err, PipelineError::Persistence("disk unavailable".to_string()));
}
