//! Relationship kinds and their natural-language labels

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::GenderCategory;

/// What member `B` is to member `A`.
///
/// Generation counts are parent hops, so `Ancestor { generations: 2 }` is a
/// grandparent and `AuntUncle { generations: 3 }` is a great-aunt/uncle
/// (`A` sits three generations below the shared ancestor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kinship {
    Itself,
    Spouse,
    Ancestor { generations: u32 },
    Descendant { generations: u32 },
    Sibling { full: bool },
    AuntUncle { generations: u32 },
    NieceNephew { generations: u32 },
    Cousin { degree: u32, removal: u32 },
    ParentInLaw,
    ChildInLaw,
    SiblingInLaw,
    StepChild,
    StepParent,
    /// Blood relative of a spouse, or spouse of a collateral relative
    InLaw { relation: Box<Kinship> },
    /// Descendant of a spouse, or spouse of an ancestor
    Step { relation: Box<Kinship> },
    Unrelated,
}

impl Kinship {
    /// Classify a blood relationship from the distances of `A` and `B` to
    /// their nearest common ancestor. `full_siblings` only matters for `(1, 1)`.
    pub fn from_distances(from_a: u32, from_b: u32, full_siblings: bool) -> Kinship {
        match (from_a, from_b) {
            (0, 0) => Kinship::Itself,
            (0, n) => Kinship::Descendant { generations: n },
            (n, 0) => Kinship::Ancestor { generations: n },
            (1, 1) => Kinship::Sibling {
                full: full_siblings,
            },
            (1, n) => Kinship::NieceNephew { generations: n },
            (n, 1) => Kinship::AuntUncle { generations: n },
            (m, n) => Kinship::Cousin {
                degree: m.min(n) - 1,
                removal: m.abs_diff(n),
            },
        }
    }

    /// What `A` is to `B`
    pub fn inverse(&self) -> Kinship {
        match self {
            Kinship::Ancestor { generations } => Kinship::Descendant {
                generations: *generations,
            },
            Kinship::Descendant { generations } => Kinship::Ancestor {
                generations: *generations,
            },
            Kinship::AuntUncle { generations } => Kinship::NieceNephew {
                generations: *generations,
            },
            Kinship::NieceNephew { generations } => Kinship::AuntUncle {
                generations: *generations,
            },
            Kinship::ParentInLaw => Kinship::ChildInLaw,
            Kinship::ChildInLaw => Kinship::ParentInLaw,
            Kinship::StepChild => Kinship::StepParent,
            Kinship::StepParent => Kinship::StepChild,
            Kinship::InLaw { relation } => Kinship::InLaw {
                relation: Box::new(relation.inverse()),
            },
            Kinship::Step { relation } => Kinship::Step {
                relation: Box::new(relation.inverse()),
            },
            other => other.clone(),
        }
    }

    pub fn is_blood(&self) -> bool {
        matches!(
            self,
            Kinship::Ancestor { .. }
                | Kinship::Descendant { .. }
                | Kinship::Sibling { .. }
                | Kinship::AuntUncle { .. }
                | Kinship::NieceNephew { .. }
                | Kinship::Cousin { .. }
        )
    }

    pub fn is_related(&self) -> bool {
        !matches!(self, Kinship::Unrelated)
    }

    /// Label using the gender of the member being described. Cousins and
    /// members outside the binary categories keep the neutral label.
    pub fn gendered_label(&self, gender: GenderCategory) -> String {
        self.render(gender)
    }

    fn render(&self, gender: GenderCategory) -> String {
        let pick = |neutral: &'static str, male: &'static str, female: &'static str| match gender {
            GenderCategory::Male => male,
            GenderCategory::Female => female,
            _ => neutral,
        };

        match self {
            Kinship::Itself => "self".to_string(),
            Kinship::Spouse => pick("spouse", "husband", "wife").to_string(),
            Kinship::Ancestor { generations } => lineal(
                *generations,
                pick("parent", "father", "mother"),
                pick("grandparent", "grandfather", "grandmother"),
            ),
            Kinship::Descendant { generations } => lineal(
                *generations,
                pick("child", "son", "daughter"),
                pick("grandchild", "grandson", "granddaughter"),
            ),
            Kinship::Sibling { full: true } => {
                pick("sibling (full)", "brother", "sister").to_string()
            }
            Kinship::Sibling { full: false } => {
                pick("sibling (half)", "half-brother", "half-sister").to_string()
            }
            Kinship::AuntUncle { generations } => format!(
                "{}{}",
                greats(*generations),
                pick("aunt/uncle", "uncle", "aunt")
            ),
            Kinship::NieceNephew { generations } => format!(
                "{}{}",
                greats(*generations),
                pick("niece/nephew", "nephew", "niece")
            ),
            Kinship::Cousin { degree, removal } => {
                if *removal == 0 {
                    format!("{} cousin", ordinal(*degree))
                } else {
                    format!("{} cousin, {}x removed", ordinal(*degree), removal)
                }
            }
            Kinship::ParentInLaw => pick("parent-in-law", "father-in-law", "mother-in-law").to_string(),
            Kinship::ChildInLaw => pick("child-in-law", "son-in-law", "daughter-in-law").to_string(),
            Kinship::SiblingInLaw => {
                pick("sibling-in-law", "brother-in-law", "sister-in-law").to_string()
            }
            Kinship::StepChild => pick("step-child", "step-son", "step-daughter").to_string(),
            Kinship::StepParent => pick("step-parent", "step-father", "step-mother").to_string(),
            Kinship::InLaw { relation } => format!("{}-in-law", relation.render(gender)),
            Kinship::Step { relation } => format!("step-{}", relation.render(gender)),
            Kinship::Unrelated => "no direct relationship".to_string(),
        }
    }
}

impl fmt::Display for Kinship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(GenderCategory::Unspecified))
    }
}

fn lineal(generations: u32, first: &str, grand: &str) -> String {
    if generations <= 1 {
        first.to_string()
    } else {
        format!("{}{}", greats(generations), grand)
    }
}

/// `"great-"` repeated `generations - 2` times
fn greats(generations: u32) -> String {
    "great-".repeat(generations.saturating_sub(2) as usize)
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
