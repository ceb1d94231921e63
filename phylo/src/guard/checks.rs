//! Forward checks for a single proposed mutation
//!
//! These run against an index built from the snapshot the mutation will be
//! committed on top of. Structural errors (unknown member, self reference,
//! duplicate, cycle) fail immediately; policy breaches are collected and
//! reported together.

use crate::kinship::KinshipIndex;
use crate::models::{MemberId, TreeSettings};
use crate::policy::{Violation, ViolationKind, summarize_names};
use crate::{PhyloError, Result};

fn require_members<'a>(
    index: &KinshipIndex,
    ids: impl IntoIterator<Item = &'a MemberId>,
) -> Result<()> {
    for id in ids {
        if !index.contains(id) {
            return Err(PhyloError::NotFound(format!("member {}", id)));
        }
    }
    Ok(())
}

fn policy_result(violations: Vec<Violation>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(PhyloError::PolicyViolation(violations))
    }
}

/// Whether a spouse edge between `a` and `b` may be added
pub fn check_spouse(
    index: &KinshipIndex,
    settings: &TreeSettings,
    a: &MemberId,
    b: &MemberId,
) -> Result<()> {
    require_members(index, [a, b])?;

    if a == b {
        return Err(PhyloError::SelfReference(format!(
            "member {} cannot be their own spouse",
            a
        )));
    }
    if index.spouses_of(a).contains(b) {
        return Err(PhyloError::DuplicateEdge(format!(
            "{} and {} are already spouses",
            a, b
        )));
    }

    let pair = [a, b];
    let mut violations = Vec::new();

    if settings.monogamy {
        let married: Vec<&MemberId> = pair
            .into_iter()
            .filter(|m| index.spouse_count(m) >= 1)
            .collect();
        if let Some(v) = member_violation(index, ViolationKind::Monogamy, &married, |names| {
            format!(
                "Cannot add spouse: monogamy is enforced and {} already married",
                names
            )
        }) {
            violations.push(v);
        }
    }

    if let Some(max) = settings.max_spouses_per_member {
        let at_limit: Vec<&MemberId> = pair
            .into_iter()
            .filter(|m| index.spouse_count(m) >= max as usize)
            .collect();
        let max_found = at_limit.iter().map(|m| index.spouse_count(m)).max();
        if let Some(v) = member_violation(index, ViolationKind::MaxSpouses, &at_limit, |names| {
            format!(
                "Cannot add spouse: {} already at the limit of {} spouse(s)",
                names, max
            )
        }) {
            violations.push(v.with_max_found(max_found.unwrap_or_default() as u32 + 1));
        }
    }

    if !settings.allow_same_sex {
        let ga = index.member(a).map(|m| m.gender_category());
        let gb = index.member(b).map(|m| m.gender_category());
        if matches!((ga, gb), (Some(x), Some(y)) if x == y && x.is_binary()) {
            let pair_name = format!("{} & {}", index.display_name(a), index.display_name(b));
            violations.push(
                Violation::new(
                    ViolationKind::SameSex,
                    format!(
                        "Cannot add spouse: same-sex unions are not allowed in this tree ({})",
                        pair_name
                    ),
                )
                .with_affected(vec![pair_name])
                .with_member_ids(vec![a.clone(), b.clone()]),
            );
        }
    }

    policy_result(violations)
}

/// Whether `parents` may all be added as parents of `child` in one step
pub fn check_parent_child(
    index: &KinshipIndex,
    settings: &TreeSettings,
    parents: &[MemberId],
    child: &MemberId,
) -> Result<()> {
    require_members(index, parents.iter().chain([child]))?;

    for (i, parent) in parents.iter().enumerate() {
        if parent == child {
            return Err(PhyloError::SelfReference(format!(
                "member {} cannot be their own parent",
                child
            )));
        }
        if parents[..i].contains(parent) {
            return Err(PhyloError::DuplicateEdge(format!(
                "member {} given twice as a parent of {}",
                parent, child
            )));
        }
        if index.children_of(parent).contains(child) {
            return Err(PhyloError::DuplicateEdge(format!(
                "{} is already a parent of {}",
                parent, child
            )));
        }
        if index.ancestor_distances(parent).contains(child) {
            return Err(PhyloError::Cycle {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
    }

    let current = index.parent_count(child);
    let after = current + parents.len();
    let child_name = index.display_name(child);
    let mut violations = Vec::new();

    let affected = |kind: ViolationKind, message: String| {
        Violation::new(kind, message)
            .with_affected(vec![child_name.clone()])
            .with_member_ids(
                parents
                    .iter()
                    .cloned()
                    .chain(std::iter::once(child.clone()))
                    .collect(),
            )
    };

    if current == 0 && after == 1 && !settings.allow_single_parent {
        violations.push(affected(
            ViolationKind::SingleParent,
            format!(
                "Cannot add a single parent: {} needs two parents in this tree; add both together",
                child_name
            ),
        ));
    }
    if after > 2 && !settings.allow_multi_parent_children {
        violations.push(
            affected(
                ViolationKind::MultiParent,
                format!(
                    "Cannot add parent: {} would have {} parents and multi-parent children are not allowed",
                    child_name, after
                ),
            )
            .with_max_found(after as u32),
        );
    }
    if let Some(max) = settings.max_parents_per_child {
        if after > max as usize {
            violations.push(
                affected(
                    ViolationKind::MaxParents,
                    format!(
                        "Cannot add parent: {} would have {} parents, exceeding the limit of {}",
                        child_name, after, max
                    ),
                )
                .with_max_found(after as u32),
            );
        }
    }

    policy_result(violations)
}

fn member_violation(
    index: &KinshipIndex,
    kind: ViolationKind,
    members: &[&MemberId],
    message: impl FnOnce(String) -> String,
) -> Option<Violation> {
    if members.is_empty() {
        return None;
    }
    let mut names: Vec<String> = members.iter().map(|m| index.display_name(m)).collect();
    names.sort();
    Some(
        Violation::new(kind, message(summarize_names(&names)))
            .with_affected(names)
            .with_member_ids(members.iter().map(|m| (*m).clone()).collect()),
    )
}
