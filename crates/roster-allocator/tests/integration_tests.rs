//! Integration tests for roster-allocator

use proptest::prelude::*;
use roster_allocator::{
    AllocationOutcome, AllocatorConfig, AllocatorError, ConstrainedAllocator, PolicyKind,
};
use roster_domain::member::attributes;
use roster_domain::{Member, MemberId, RelationType, RelationshipEdge};
use roster_encoder::{EncoderConfig, GraphEncoder, RelationalGraphEncoder};
use roster_graph::{CohortGraph, GraphBuilder};

fn cohort(n: u64, edges: &[(u64, u64, RelationType)]) -> CohortGraph {
    let members = (1..=n)
        .map(|id| {
            Member::new(MemberId::new(id), "2025")
                .with_attribute(attributes::ACADEMIC, 40.0 + (id * 17 % 50) as f64)
                .with_attribute(attributes::EFFORT, (id % 5) as f64)
        })
        .collect();
    let edges = edges
        .iter()
        .map(|(s, t, r)| RelationshipEdge::new(MemberId::new(*s), MemberId::new(*t), *r))
        .collect();
    GraphBuilder::default_config()
        .build_snapshot("2025", members, edges)
        .unwrap()
        .0
}

fn run(graph: &CohortGraph, k: usize, policy: PolicyKind) -> AllocationOutcome {
    let allocator = ConstrainedAllocator::new(AllocatorConfig {
        policy,
        ..AllocatorConfig::default()
    })
    .unwrap();
    let embeddings = RelationalGraphEncoder::new(EncoderConfig::fast())
        .unwrap()
        .encode(graph)
        .unwrap();
    let hints = allocator.hint(&embeddings, k).unwrap();
    allocator.allocate(graph, &hints, k).unwrap()
}

fn mutual(a: u64, b: u64) -> [(u64, u64, RelationType); 2] {
    [(a, b, RelationType::Friend), (b, a, RelationType::Friend)]
}

#[test]
fn test_two_triangles_stay_together() {
    let edges: Vec<_> = [mutual(1, 2), mutual(2, 3), mutual(1, 3), mutual(4, 5), mutual(5, 6), mutual(4, 6)]
        .concat();
    let graph = cohort(10, &edges);

    let outcome = run(&graph, 2, PolicyKind::Solver);
    let a = outcome.assignment;

    let g1 = a.group_of(MemberId::new(1)).unwrap();
    assert_eq!(a.group_of(MemberId::new(2)), Some(g1));
    assert_eq!(a.group_of(MemberId::new(3)), Some(g1));

    let g4 = a.group_of(MemberId::new(4)).unwrap();
    assert_eq!(a.group_of(MemberId::new(5)), Some(g4));
    assert_eq!(a.group_of(MemberId::new(6)), Some(g4));

    assert!(outcome.solution.stats.proven_optimal);
}

#[test]
fn test_nine_members_three_groups_exact_sizes() {
    let graph = cohort(9, &[(1, 2, RelationType::Advice), (3, 4, RelationType::Feedback)]);

    for policy in [PolicyKind::Solver, PolicyKind::Greedy, PolicyKind::Random] {
        let outcome = run(&graph, 3, policy);
        let sizes: Vec<usize> = outcome.assignment.group_sizes().into_values().collect();
        assert_eq!(sizes, vec![3, 3, 3], "policy {}", policy);
    }
}

#[test]
fn test_disrespect_pair_separated() {
    let graph = cohort(10, &[(7, 8, RelationType::Disrespect)]);

    let a = run(&graph, 2, PolicyKind::Solver).assignment;
    assert_ne!(a.group_of(MemberId::new(7)), a.group_of(MemberId::new(8)));
}

#[test]
fn test_disrespect_pair_separated_by_local_search() {
    let edges = [(7, 8, RelationType::Disrespect), (8, 7, RelationType::Disrespect)];
    let graph = cohort(40, &edges);
    let allocator = ConstrainedAllocator::new(AllocatorConfig::fast()).unwrap();
    let embeddings = RelationalGraphEncoder::new(EncoderConfig::fast())
        .unwrap()
        .encode(&graph)
        .unwrap();
    let hints = allocator.hint(&embeddings, 4).unwrap();

    let a = allocator.allocate(&graph, &hints, 4).unwrap().assignment;
    assert_ne!(a.group_of(MemberId::new(7)), a.group_of(MemberId::new(8)));
}

#[test]
fn test_group_count_larger_than_cohort() {
    let graph = cohort(3, &[]);
    let allocator = ConstrainedAllocator::new(AllocatorConfig::default()).unwrap();
    let embeddings = RelationalGraphEncoder::new(EncoderConfig::fast())
        .unwrap()
        .encode(&graph)
        .unwrap();

    assert!(matches!(allocator.hint(&embeddings, 4), Err(AllocatorError::Config(_))));
    assert!(matches!(allocator.hint(&embeddings, 0), Err(AllocatorError::Config(_))));
}

#[test]
fn test_zero_budget_is_infeasible() {
    let graph = cohort(6, &[]);
    let allocator = ConstrainedAllocator::new(AllocatorConfig {
        time_budget_secs: 0,
        ..AllocatorConfig::default()
    })
    .unwrap();
    let embeddings = RelationalGraphEncoder::new(EncoderConfig::fast())
        .unwrap()
        .encode(&graph)
        .unwrap();
    let hints = allocator.hint(&embeddings, 2).unwrap();

    assert!(matches!(
        allocator.allocate(&graph, &hints, 2),
        Err(AllocatorError::Infeasible(_))
    ));
}

#[test]
fn test_invalid_weights_rejected() {
    let mut config = AllocatorConfig::default();
    config.weights.negative = 1.0;
    assert!(matches!(ConstrainedAllocator::new(config), Err(AllocatorError::Config(_))));
}

#[test]
fn test_policy_label_recorded() {
    let graph = cohort(4, &[]);
    assert_eq!(run(&graph, 2, PolicyKind::Greedy).policy, "greedy");
    assert_eq!(run(&graph, 2, PolicyKind::Random).policy, "random");
    assert_eq!(run(&graph, 2, PolicyKind::Solver).policy, "solver");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: every policy assigns every member exactly once and keeps
    /// sizes within one of each other
    #[test]
    fn test_every_policy_balanced_and_total(
        n in 1u64..16,
        k_seed in 1usize..16,
        raw_edges in prop::collection::vec((1u64..16, 1u64..16, 0usize..6), 0..25),
        policy in prop::sample::select(vec![PolicyKind::Solver, PolicyKind::Greedy, PolicyKind::Random]),
    ) {
        let k = (k_seed - 1) % n as usize + 1;
        let edges: Vec<_> = raw_edges
            .into_iter()
            .filter(|(s, t, _)| *s <= n && *t <= n)
            .map(|(s, t, r)| (s, t, RelationType::from_index(r).unwrap()))
            .collect();
        let graph = cohort(n, &edges);

        let allocator = ConstrainedAllocator::new(AllocatorConfig {
            policy,
            exact_search_limit: 8,
            ..AllocatorConfig::fast()
        })
        .unwrap();
        let embeddings = RelationalGraphEncoder::new(EncoderConfig::fast())
            .unwrap()
            .encode(&graph)
            .unwrap();
        let hints = allocator.hint(&embeddings, k).unwrap();
        let a = allocator.allocate(&graph, &hints, k).unwrap().assignment;

        prop_assert_eq!(a.len(), n as usize);
        for id in 1..=n {
            prop_assert!(a.group_of(MemberId::new(id)).is_some());
        }
        prop_assert!(a.is_balanced());
        prop_assert_eq!(a.group_sizes().len(), k);
        if n as usize % k == 0 {
            let expected = n as usize / k;
            prop_assert!(a.group_sizes().values().all(|&s| s == expected));
        }
        prop_assert!(a.iter().all(|(_, g)| g.index() < k));
    }
}
