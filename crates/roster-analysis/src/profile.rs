//! Per-group attribute averages and social tie profiles

use crate::preservation::member_groups;
use crate::{AnalysisConfig, AnalysisError};
use roster_domain::{Assignment, GroupId, RelationType};
use roster_graph::CohortGraph;
use std::collections::BTreeMap;

/// Summary of one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupProfile {
    /// Group described
    pub group: GroupId,

    /// Number of members
    pub size: usize,

    /// Mean of each tracked attribute over raw (unstandardized) values
    pub averages: BTreeMap<String, f64>,

    /// Group means min-max scaled to [0, 1] across the non-empty groups
    ///
    /// An attribute whose group means are all equal scales to 0.0, as do
    /// empty groups.
    pub normalized_averages: BTreeMap<String, f64>,

    /// Positive edges with both endpoints in the group
    pub positive_ties: usize,

    /// Negative edges with both endpoints in the group
    pub negative_ties: usize,

    /// Weighted tie balance
    pub net_score: f64,
}

/// Mean of each attribute per group, from raw values
///
/// Empty groups report 0.0 for every attribute.
pub fn group_averages(
    graph: &CohortGraph,
    assignment: &Assignment,
    attributes: &[String],
) -> Result<BTreeMap<GroupId, BTreeMap<String, f64>>, AnalysisError> {
    let groups = member_groups(graph, assignment)?;
    let mut sums: BTreeMap<GroupId, (usize, Vec<f64>)> = (0..assignment.group_count())
        .map(|i| (GroupId::from_index(i), (0, vec![0.0; attributes.len()])))
        .collect();

    for (index, group) in groups.iter().enumerate() {
        let (count, totals) = sums.entry(*group).or_insert_with(|| (0, vec![0.0; attributes.len()]));
        *count += 1;
        for (total, attribute) in totals.iter_mut().zip(attributes) {
            *total += graph.raw_value(index, attribute);
        }
    }

    Ok(sums
        .into_iter()
        .map(|(group, (count, totals))| {
            let means = attributes
                .iter()
                .zip(totals)
                .map(|(attribute, total)| {
                    let mean = if count == 0 { 0.0 } else { total / count as f64 };
                    (attribute.clone(), mean)
                })
                .collect();
            (group, means)
        })
        .collect())
}

/// Profile of every group in `assignment`
pub fn group_profiles(
    graph: &CohortGraph,
    assignment: &Assignment,
    attributes: &[String],
    config: &AnalysisConfig,
) -> Result<Vec<GroupProfile>, AnalysisError> {
    let groups = member_groups(graph, assignment)?;
    let averages = group_averages(graph, assignment, attributes)?;
    let sizes = assignment.group_sizes();

    let mut ties: BTreeMap<GroupId, (usize, usize)> = BTreeMap::new();
    for relation in RelationType::ALL {
        for &(s, t) in graph.edges(relation) {
            if groups[s] != groups[t] {
                continue;
            }
            let entry = ties.entry(groups[s]).or_default();
            if relation.is_positive() {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    let normalized = normalize_group_means(&averages, &sizes, attributes);

    Ok(averages
        .into_iter()
        .map(|(group, averages)| {
            let (positive_ties, negative_ties) = ties.get(&group).copied().unwrap_or_default();
            GroupProfile {
                group,
                size: sizes.get(&group).copied().unwrap_or(0),
                normalized_averages: normalized.get(&group).cloned().unwrap_or_default(),
                averages,
                positive_ties,
                negative_ties,
                net_score: positive_ties as f64 * config.positive_tie_score
                    + negative_ties as f64 * config.negative_tie_score,
            }
        })
        .collect())
}

fn normalize_group_means(
    averages: &BTreeMap<GroupId, BTreeMap<String, f64>>,
    sizes: &BTreeMap<GroupId, usize>,
    attributes: &[String],
) -> BTreeMap<GroupId, BTreeMap<String, f64>> {
    let occupied = |group: &GroupId| sizes.get(group).copied().unwrap_or(0) > 0;
    let ranges: Vec<Option<(f64, f64)>> = attributes
        .iter()
        .map(|attribute| {
            averages
                .iter()
                .filter(|(group, _)| occupied(group))
                .filter_map(|(_, means)| means.get(attribute).copied())
                .fold(None, |range, v| match range {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
                })
        })
        .collect();

    averages
        .iter()
        .map(|(group, means)| {
            let scaled = attributes
                .iter()
                .zip(&ranges)
                .map(|(attribute, range)| {
                    let value = match (range, means.get(attribute)) {
                        (Some((lo, hi)), Some(v)) if occupied(group) && hi > lo => (v - lo) / (hi - lo),
                        _ => 0.0,
                    };
                    (attribute.clone(), value)
                })
                .collect();
            (*group, scaled)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_domain::member::attributes;
    use roster_domain::{Member, MemberId, RelationshipEdge};
    use roster_graph::GraphBuilder;

    fn graph() -> CohortGraph {
        let members = (1..=4)
            .map(|id| {
                let member = Member::new(MemberId::new(id), "c")
                    .with_attribute(attributes::ACADEMIC, id as f64 * 10.0);
                if id == 4 {
                    member
                } else {
                    member.with_attribute(attributes::EFFORT, 3.0)
                }
            })
            .collect();
        let edges = vec![
            RelationshipEdge::new(MemberId::new(1), MemberId::new(2), RelationType::Friend),
            RelationshipEdge::new(MemberId::new(2), MemberId::new(1), RelationType::Advice),
            RelationshipEdge::new(MemberId::new(3), MemberId::new(4), RelationType::Disrespect),
            RelationshipEdge::new(MemberId::new(1), MemberId::new(3), RelationType::Friend),
        ];
        GraphBuilder::default_config()
            .build_snapshot("c", members, edges)
            .unwrap()
            .0
    }

    fn assignment(k: usize, labels: &[usize]) -> Assignment {
        let ids: Vec<MemberId> = (1..=labels.len() as u64).map(MemberId::new).collect();
        Assignment::from_labels(&ids, labels, k).unwrap()
    }

    fn tracked() -> Vec<String> {
        vec![attributes::ACADEMIC.to_string(), attributes::EFFORT.to_string()]
    }

    #[test]
    fn test_averages_use_raw_values() {
        let averages = group_averages(&graph(), &assignment(2, &[0, 0, 1, 1]), &tracked()).unwrap();

        let first = &averages[&GroupId::new(1).unwrap()];
        assert_eq!(first[attributes::ACADEMIC], 15.0);
        assert_eq!(first[attributes::EFFORT], 3.0);

        // Missing effort for member 4 counts as the missing value (0.0)
        let second = &averages[&GroupId::new(2).unwrap()];
        assert_eq!(second[attributes::ACADEMIC], 35.0);
        assert_eq!(second[attributes::EFFORT], 1.5);
    }

    #[test]
    fn test_empty_group_averages_zero() {
        let averages = group_averages(&graph(), &assignment(3, &[0, 0, 1, 1]), &tracked()).unwrap();
        let third = &averages[&GroupId::new(3).unwrap()];
        assert_eq!(third[attributes::ACADEMIC], 0.0);
    }

    #[test]
    fn test_profiles_count_ties() {
        let profiles = group_profiles(
            &graph(),
            &assignment(2, &[0, 0, 1, 1]),
            &tracked(),
            &AnalysisConfig::default(),
        )
        .unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].size, 2);
        assert_eq!((profiles[0].positive_ties, profiles[0].negative_ties), (2, 0));
        assert_eq!(profiles[0].net_score, 2.0);
        assert_eq!((profiles[1].positive_ties, profiles[1].negative_ties), (0, 1));
        assert_eq!(profiles[1].net_score, -2.0);
    }

    #[test]
    fn test_profiles_scale_group_means() {
        let profiles = group_profiles(
            &graph(),
            &assignment(3, &[0, 0, 1, 1]),
            &tracked(),
            &AnalysisConfig::default(),
        )
        .unwrap();

        // Academic means 15 and 35 span the range; the empty third group is 0
        assert_eq!(profiles[0].normalized_averages[attributes::ACADEMIC], 0.0);
        assert_eq!(profiles[1].normalized_averages[attributes::ACADEMIC], 1.0);
        assert_eq!(profiles[2].normalized_averages[attributes::ACADEMIC], 0.0);
        assert_eq!(profiles[0].normalized_averages[attributes::EFFORT], 1.0);
        assert_eq!(profiles[1].normalized_averages[attributes::EFFORT], 0.0);
    }

    #[test]
    fn test_equal_group_means_scale_to_zero() {
        let profiles = group_profiles(
            &graph(),
            &assignment(2, &[0, 1, 1, 0]),
            &tracked(),
            &AnalysisConfig::default(),
        )
        .unwrap();

        // Academic means are 25 and 25
        assert!(profiles
            .iter()
            .all(|p| p.normalized_averages[attributes::ACADEMIC] == 0.0));
    }
}
