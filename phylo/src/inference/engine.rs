//! Relationship inference over a kinship index

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::labels::Kinship;
use crate::kinship::KinshipIndex;
use crate::models::{GenderCategory, MemberId};
use crate::{PhyloError, Result};

/// Outcome of inferring what member `to` is to member `from`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipResult {
    pub from: MemberId,
    pub to: MemberId,
    /// Neutral label, e.g. `"1st cousin, 1x removed"`
    pub relationship: String,
    /// Label using the gender of `to`, e.g. `"grandmother"`
    pub gendered_relationship: String,
    pub kinship: Kinship,
    /// Member ids from `from` to `to`, inclusive
    pub path: Vec<MemberId>,
    /// Display names aligned with `path`
    pub path_names: Vec<String>,
    /// Nearest common ancestor used for blood relationships
    pub common_ancestor: Option<MemberId>,
}

/// A blood relationship together with the ancestor it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct BloodRelation {
    pub kinship: Kinship,
    pub ancestor: MemberId,
    pub distance_from: u32,
    pub distance_to: u32,
    pub path: Vec<MemberId>,
}

struct Classified {
    kinship: Kinship,
    path: Vec<MemberId>,
    common_ancestor: Option<MemberId>,
}

impl Classified {
    fn new(kinship: Kinship, path: Vec<MemberId>) -> Self {
        Self {
            kinship,
            path,
            common_ancestor: None,
        }
    }
}

/// Stateless relationship classifier borrowing an index
#[derive(Debug, Clone, Copy)]
pub struct RelationshipEngine<'a> {
    index: &'a KinshipIndex,
}

impl<'a> RelationshipEngine<'a> {
    pub fn new(index: &'a KinshipIndex) -> Self {
        Self { index }
    }

    /// Infer what `to` is to `from`.
    ///
    /// Checks run in precedence order: identity, spouse, direct parent or
    /// child, blood via the nearest common ancestor, in-law and step
    /// relations, then extended in-laws. The first match wins.
    #[instrument(skip(self), level = "debug")]
    pub fn infer(&self, from: &MemberId, to: &MemberId) -> Result<RelationshipResult> {
        for id in [from, to] {
            if !self.index.contains(id) {
                return Err(PhyloError::NotFound(format!("member {}", id)));
            }
        }

        let classified = self.classify(from, to);
        let gender = self
            .index
            .member(to)
            .map(|m| m.gender_category())
            .unwrap_or(GenderCategory::Unspecified);

        let result = RelationshipResult {
            from: from.clone(),
            to: to.clone(),
            relationship: classified.kinship.to_string(),
            gendered_relationship: classified.kinship.gendered_label(gender),
            path_names: classified
                .path
                .iter()
                .map(|id| self.index.display_name(id))
                .collect(),
            kinship: classified.kinship,
            path: classified.path,
            common_ancestor: classified.common_ancestor,
        };

        debug!(
            relationship = %result.relationship,
            hops = result.path.len().saturating_sub(1),
            "relationship inferred"
        );
        Ok(result)
    }

    fn classify(&self, a: &MemberId, b: &MemberId) -> Classified {
        let direct = vec![a.clone(), b.clone()];

        if a == b {
            return Classified::new(Kinship::Itself, vec![a.clone()]);
        }
        if self.index.spouses_of(a).contains(b) {
            return Classified::new(Kinship::Spouse, direct);
        }
        if self.index.parents_of(a).contains(b) {
            return Classified::new(Kinship::Ancestor { generations: 1 }, direct);
        }
        if self.index.children_of(a).contains(b) {
            return Classified::new(Kinship::Descendant { generations: 1 }, direct);
        }

        if let Some(blood) = self.blood_relation(a, b) {
            return Classified {
                kinship: blood.kinship,
                path: blood.path,
                common_ancestor: Some(blood.ancestor),
            };
        }

        if let Some(found) = self.in_law(a, b) {
            return found;
        }
        if let Some(found) = self.extended_in_law(a, b) {
            return found;
        }

        Classified::new(Kinship::Unrelated, direct)
    }

    /// Blood relationship of `b` to `a` through their nearest common
    /// ancestor, or `None` when they share no ancestor.
    ///
    /// The ancestor minimizing the summed distance wins; ties go to the
    /// smaller of the two distances' maximum, then to the smallest id.
    pub fn blood_relation(&self, a: &MemberId, b: &MemberId) -> Option<BloodRelation> {
        if a == b {
            return None;
        }

        let from_a = self.index.ancestor_distances(a);
        let from_b = self.index.ancestor_distances(b);

        let mut best: Option<(u32, u32, &MemberId, u32, u32)> = None;
        for (ancestor, da) in from_a.entries() {
            let Some(db) = from_b.distance(ancestor) else {
                continue;
            };
            let key = (da + db, da.max(db));
            // entries are visited in id order, so strict comparison keeps the smallest id
            if best.is_none_or(|(sum, max, ..)| key < (sum, max)) {
                best = Some((key.0, key.1, ancestor, da, db));
            }
        }

        let (_, _, ancestor, da, db) = best?;
        let full = (da, db) == (1, 1) && {
            let pa = self.index.parents_of(a);
            !pa.is_empty() && pa == self.index.parents_of(b)
        };

        let mut path = from_a.path_to(ancestor)?;
        let mut down = from_b.path_to(ancestor)?;
        down.pop();
        path.extend(down.into_iter().rev());

        Some(BloodRelation {
            kinship: Kinship::from_distances(da, db, full),
            ancestor: ancestor.clone(),
            distance_from: da,
            distance_to: db,
            path,
        })
    }

    fn in_law(&self, a: &MemberId, b: &MemberId) -> Option<Classified> {
        let idx = self.index;
        let via = |kinship: Kinship, middle: &MemberId| {
            Classified::new(kinship, vec![a.clone(), middle.clone(), b.clone()])
        };

        if let Some(s) = idx.spouses_of(a).iter().find(|s| idx.parents_of(s).contains(b)) {
            return Some(via(Kinship::ParentInLaw, s));
        }
        if let Some(s) = idx.spouses_of(b).iter().find(|s| idx.are_siblings(a, s)) {
            return Some(via(Kinship::SiblingInLaw, s));
        }
        if let Some(s) = idx.spouses_of(a).iter().find(|s| idx.are_siblings(s, b)) {
            return Some(via(Kinship::SiblingInLaw, s));
        }
        if !idx.children_of(a).contains(b) {
            if let Some(s) = idx.spouses_of(a).iter().find(|s| idx.children_of(s).contains(b)) {
                return Some(via(Kinship::StepChild, s));
            }
        }
        if let Some(c) = idx.children_of(a).iter().find(|c| idx.spouses_of(c).contains(b)) {
            return Some(via(Kinship::ChildInLaw, c));
        }
        if !idx.parents_of(a).contains(b) {
            if let Some(p) = idx.parents_of(a).iter().find(|p| idx.spouses_of(p).contains(b)) {
                return Some(via(Kinship::StepParent, p));
            }
        }
        None
    }

    /// In-laws one marriage away from a blood relationship: blood relatives
    /// of `a`'s spouses, then spouses of `a`'s blood relatives.
    fn extended_in_law(&self, a: &MemberId, b: &MemberId) -> Option<Classified> {
        for spouse in self.index.spouses_of(a) {
            if let Some(blood) = self.blood_relation(spouse, b) {
                let kinship = match blood.kinship {
                    Kinship::Ancestor { generations: 1 } => Kinship::ParentInLaw,
                    Kinship::Descendant { generations: 1 } => Kinship::StepChild,
                    relation @ Kinship::Descendant { .. } => Kinship::Step {
                        relation: Box::new(relation),
                    },
                    Kinship::Sibling { .. } => Kinship::SiblingInLaw,
                    relation => Kinship::InLaw {
                        relation: Box::new(relation),
                    },
                };
                let mut path = vec![a.clone()];
                path.extend(blood.path);
                return Some(Classified::new(kinship, path));
            }
        }

        for relative in self.index.spouses_of(b) {
            if let Some(blood) = self.blood_relation(a, relative) {
                let kinship = match blood.kinship {
                    Kinship::Ancestor { generations: 1 } => Kinship::StepParent,
                    relation @ Kinship::Ancestor { .. } => Kinship::Step {
                        relation: Box::new(relation),
                    },
                    Kinship::Descendant { generations: 1 } => Kinship::ChildInLaw,
                    Kinship::Sibling { .. } => Kinship::SiblingInLaw,
                    relation => Kinship::InLaw {
                        relation: Box::new(relation),
                    },
                };
                let mut path = blood.path;
                path.push(b.clone());
                return Some(Classified::new(kinship, path));
            }
        }

        None
    }
}
