//! Checks proposed tree settings against the live graph

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::violation::{Violation, ViolationKind, summarize_names};
use crate::kinship::KinshipIndex;
use crate::models::{MemberId, TreeSettings};
use crate::{PhyloError, Result};

/// Outcome of validating a settings change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            is_valid: violations.is_empty(),
            violations,
        }
    }

    /// `Err(PolicyViolation)` carrying every violation, if there are any
    pub fn into_result(self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(PhyloError::PolicyViolation(self.violations))
        }
    }
}

/// Stateless validator for settings changes.
///
/// Only tightened rules are checked: loosening a setting can never make
/// existing relationships invalid.
pub struct PolicyValidator;

impl PolicyValidator {
    /// Validate a change from `current` to `proposed` against the graph
    pub fn validate(
        index: &KinshipIndex,
        current: &TreeSettings,
        proposed: &TreeSettings,
    ) -> ValidationReport {
        let tightened = Self::tightened(current, proposed);
        let violations: Vec<Violation> = tightened
            .iter()
            .filter_map(|kind| Self::check(index, *kind, proposed))
            .collect();

        debug!(
            checked = tightened.len(),
            violations = violations.len(),
            "validated settings change"
        );
        ValidationReport::from_violations(violations)
    }

    /// Every rule `settings` enforces that the graph currently breaks
    pub fn audit(index: &KinshipIndex, settings: &TreeSettings) -> ValidationReport {
        Self::validate(index, &TreeSettings::permissive(), settings)
    }

    /// Rules made stricter by moving from `current` to `proposed`
    pub fn tightened(current: &TreeSettings, proposed: &TreeSettings) -> Vec<ViolationKind> {
        let mut kinds = Vec::new();
        if proposed.monogamy && !current.monogamy {
            kinds.push(ViolationKind::Monogamy);
        }
        if bound_tightened(current.max_spouses_per_member, proposed.max_spouses_per_member) {
            kinds.push(ViolationKind::MaxSpouses);
        }
        if !proposed.allow_same_sex && current.allow_same_sex {
            kinds.push(ViolationKind::SameSex);
        }
        if !proposed.allow_single_parent && current.allow_single_parent {
            kinds.push(ViolationKind::SingleParent);
        }
        if !proposed.allow_multi_parent_children && current.allow_multi_parent_children {
            kinds.push(ViolationKind::MultiParent);
        }
        if bound_tightened(current.max_parents_per_child, proposed.max_parents_per_child) {
            kinds.push(ViolationKind::MaxParents);
        }
        kinds
    }

    /// Scan the graph for breaches of one rule as configured in `settings`
    pub fn check(
        index: &KinshipIndex,
        kind: ViolationKind,
        settings: &TreeSettings,
    ) -> Option<Violation> {
        match kind {
            ViolationKind::Monogamy => {
                let over = Self::members_with_spouses_over(index, 1);
                counted_violation(index, kind, &over, |n, names| {
                    format!(
                        "Cannot enable monogamy: {} member(s) have multiple spouses. Members affected: {}",
                        n, names
                    )
                })
            }
            ViolationKind::MaxSpouses => {
                let max = settings.max_spouses_per_member?;
                let over = Self::members_with_spouses_over(index, max as usize);
                let max_found = over.iter().map(|(_, count)| *count).max()?;
                counted_violation(index, kind, &over, |n, names| {
                    format!(
                        "Cannot reduce max_spouses_per_member to {}: {} member(s) currently have more spouses (up to {}). Members affected: {}",
                        max, n, max_found, names
                    )
                })
                .map(|v| v.with_max_found(max_found as u32))
            }
            ViolationKind::SameSex => {
                let pairs = Self::same_sex_pairs(index);
                if pairs.is_empty() {
                    return None;
                }
                let mut names: Vec<String> = pairs
                    .iter()
                    .map(|(a, b)| format!("{} & {}", index.display_name(a), index.display_name(b)))
                    .collect();
                names.sort();
                let message = format!(
                    "Cannot disable same-sex unions: {} same-sex spouse relationship(s) exist. Relationships: {}",
                    pairs.len(),
                    summarize_names(&names)
                );
                let ids = pairs.into_iter().flat_map(|(a, b)| [a, b]).collect();
                Some(
                    Violation::new(kind, message)
                        .with_affected(names)
                        .with_member_ids(ids),
                )
            }
            ViolationKind::SingleParent => {
                let children: Vec<(MemberId, usize)> = Self::children_with_parent_count(index, |n| n == 1);
                counted_violation(index, kind, &children, |n, names| {
                    format!(
                        "Cannot disable single parents: {} child(ren) have only one parent. Children affected: {}",
                        n, names
                    )
                })
            }
            ViolationKind::MultiParent => {
                let children = Self::children_with_parent_count(index, |n| n > 2);
                counted_violation(index, kind, &children, |n, names| {
                    format!(
                        "Cannot disable multi-parent children: {} child(ren) have more than 2 parents. Children affected: {}",
                        n, names
                    )
                })
            }
            ViolationKind::MaxParents => {
                let max = settings.max_parents_per_child?;
                let children = Self::children_with_parent_count(index, |n| n > max as usize);
                let max_found = children.iter().map(|(_, count)| *count).max()?;
                counted_violation(index, kind, &children, |n, names| {
                    format!(
                        "Cannot reduce max_parents_per_child to {}: {} child(ren) currently have more parents (up to {}). Children affected: {}",
                        max, n, max_found, names
                    )
                })
                .map(|v| v.with_max_found(max_found as u32))
            }
        }
    }

    /// Members with more than `limit` spouses, in id order
    pub fn members_with_spouses_over(index: &KinshipIndex, limit: usize) -> Vec<(MemberId, usize)> {
        index
            .members_with_spouses()
            .filter(|(_, count)| *count > limit)
            .map(|(id, count)| (id.clone(), count))
            .collect()
    }

    /// Spouse pairs whose members share the same binary gender category
    pub fn same_sex_pairs(index: &KinshipIndex) -> Vec<(MemberId, MemberId)> {
        index
            .spouse_pairs()
            .filter(|(a, b)| {
                let ga = index.member(a).map(|m| m.gender_category());
                let gb = index.member(b).map(|m| m.gender_category());
                matches!((ga, gb), (Some(x), Some(y)) if x == y && x.is_binary())
            })
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect()
    }

    fn children_with_parent_count(
        index: &KinshipIndex,
        predicate: impl Fn(usize) -> bool,
    ) -> Vec<(MemberId, usize)> {
        index
            .children_with_parents()
            .filter(|(_, count)| predicate(*count))
            .map(|(id, count)| (id.clone(), count))
            .collect()
    }
}

/// A proposed bound is tighter when it is set and the current one is unset
/// or larger.
fn bound_tightened(current: Option<u32>, proposed: Option<u32>) -> bool {
    match (current, proposed) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(current), Some(proposed)) => proposed < current,
    }
}

fn counted_violation(
    index: &KinshipIndex,
    kind: ViolationKind,
    offenders: &[(MemberId, usize)],
    message: impl FnOnce(usize, String) -> String,
) -> Option<Violation> {
    if offenders.is_empty() {
        return None;
    }

    let mut names: Vec<String> = offenders
        .iter()
        .map(|(id, _)| index.display_name(id))
        .collect();
    names.sort();

    let message = message(offenders.len(), summarize_names(&names));
    Some(
        Violation::new(kind, message)
            .with_affected(names)
            .with_member_ids(offenders.iter().map(|(id, _)| id.clone()).collect()),
    )
}
