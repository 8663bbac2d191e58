//! Assignment module - the final member → group mapping of a run

use crate::{GroupId, MemberId};
use std::collections::BTreeMap;
use std::fmt;

/// Group size bounds `(⌊n/k⌋, ⌈n/k⌉)` for `n` members in `k` groups
///
/// Returns `(0, 0)` when `k == 0`.
pub fn size_bounds(n: usize, k: usize) -> (usize, usize) {
    if k == 0 {
        return (0, 0);
    }
    (n / k, n.div_ceil(k))
}

/// Errors raised by assignment construction and moves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// Group count must be at least 1
    InvalidGroupCount(usize),

    /// Group outside `1..=k`
    GroupOutOfRange {
        /// Offending group
        group: GroupId,
        /// Number of groups in the assignment
        group_count: usize,
    },

    /// Member not part of the assignment
    UnknownMember(MemberId),

    /// Member already assigned
    DuplicateMember(MemberId),

    /// Member is not in the group the caller expected
    WrongSourceGroup {
        /// Member being moved
        member: MemberId,
        /// Group the caller named
        expected: GroupId,
        /// Group the member is actually in
        actual: GroupId,
    },

    /// Source and destination are the same group
    SameGroup(GroupId),

    /// Label/member slices differ in length
    LengthMismatch {
        /// Number of members
        members: usize,
        /// Number of labels
        labels: usize,
    },
}

impl fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentError::InvalidGroupCount(k) => {
                write!(f, "group count must be at least 1, got {}", k)
            }
            AssignmentError::GroupOutOfRange { group, group_count } => {
                write!(f, "group {} is outside 1..={}", group, group_count)
            }
            AssignmentError::UnknownMember(member) => {
                write!(f, "member {} is not part of the assignment", member)
            }
            AssignmentError::DuplicateMember(member) => {
                write!(f, "member {} is assigned twice", member)
            }
            AssignmentError::WrongSourceGroup {
                member,
                expected,
                actual,
            } => write!(
                f,
                "member {} is in group {}, not group {}",
                member, actual, expected
            ),
            AssignmentError::SameGroup(group) => {
                write!(f, "source and destination are both group {}", group)
            }
            AssignmentError::LengthMismatch { members, labels } => {
                write!(f, "{} members but {} labels", members, labels)
            }
        }
    }
}

impl std::error::Error for AssignmentError {}

/// A total function from member to group for one run
///
/// Groups are numbered `1..=group_count`. Empty groups are still part of the
/// assignment (they show up in [`Assignment::groups`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    group_count: usize,
    groups: BTreeMap<MemberId, GroupId>,
}

impl Assignment {
    /// Create an empty assignment over `group_count` groups
    pub fn new(group_count: usize) -> Result<Self, AssignmentError> {
        if group_count == 0 {
            return Err(AssignmentError::InvalidGroupCount(group_count));
        }
        Ok(Self {
            group_count,
            groups: BTreeMap::new(),
        })
    }

    /// Build from 0-based labels aligned with `members`
    pub fn from_labels(
        members: &[MemberId],
        labels: &[usize],
        group_count: usize,
    ) -> Result<Self, AssignmentError> {
        if members.len() != labels.len() {
            return Err(AssignmentError::LengthMismatch {
                members: members.len(),
                labels: labels.len(),
            });
        }
        let mut assignment = Self::new(group_count)?;
        for (member, label) in members.iter().zip(labels) {
            assignment.insert(*member, GroupId::from_index(*label))?;
        }
        Ok(assignment)
    }

    /// Assign a member to a group
    pub fn insert(&mut self, member: MemberId, group: GroupId) -> Result<(), AssignmentError> {
        self.check_group(group)?;
        if self.groups.contains_key(&member) {
            return Err(AssignmentError::DuplicateMember(member));
        }
        self.groups.insert(member, group);
        Ok(())
    }

    fn check_group(&self, group: GroupId) -> Result<(), AssignmentError> {
        if group.value() as usize > self.group_count {
            return Err(AssignmentError::GroupOutOfRange {
                group,
                group_count: self.group_count,
            });
        }
        Ok(())
    }

    /// Group of a member
    pub fn group_of(&self, member: MemberId) -> Option<GroupId> {
        self.groups.get(&member).copied()
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Number of assigned members
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no member is assigned
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate `(member, group)` pairs in member order
    pub fn iter(&self) -> impl Iterator<Item = (MemberId, GroupId)> + '_ {
        self.groups.iter().map(|(m, g)| (*m, *g))
    }

    /// Members of one group, in member order
    pub fn members_of(&self, group: GroupId) -> Vec<MemberId> {
        self.iter()
            .filter(|(_, g)| *g == group)
            .map(|(m, _)| m)
            .collect()
    }

    /// Group → members mapping, including empty groups
    pub fn groups(&self) -> BTreeMap<GroupId, Vec<MemberId>> {
        let mut groups: BTreeMap<GroupId, Vec<MemberId>> = (0..self.group_count)
            .map(|i| (GroupId::from_index(i), Vec::new()))
            .collect();
        for (member, group) in self.iter() {
            groups.entry(group).or_default().push(member);
        }
        groups
    }

    /// Group → size mapping, including empty groups
    pub fn group_sizes(&self) -> BTreeMap<GroupId, usize> {
        self.groups()
            .into_iter()
            .map(|(g, members)| (g, members.len()))
            .collect()
    }

    /// Whether every group size lies in `[⌊n/k⌋, ⌈n/k⌉]`
    pub fn is_balanced(&self) -> bool {
        let (lower, upper) = size_bounds(self.len(), self.group_count);
        self.group_sizes()
            .values()
            .all(|size| (lower..=upper).contains(size))
    }

    /// New assignment with one member moved from `from` to `to`
    ///
    /// Every other member keeps its group. The original is left untouched.
    pub fn with_move(
        &self,
        member: MemberId,
        from: GroupId,
        to: GroupId,
    ) -> Result<Assignment, AssignmentError> {
        self.check_group(from)?;
        self.check_group(to)?;
        if from == to {
            return Err(AssignmentError::SameGroup(from));
        }
        let actual = self
            .group_of(member)
            .ok_or(AssignmentError::UnknownMember(member))?;
        if actual != from {
            return Err(AssignmentError::WrongSourceGroup {
                member,
                expected: from,
                actual,
            });
        }

        let mut moved = self.clone();
        moved.groups.insert(member, to);
        Ok(moved)
    }
}
