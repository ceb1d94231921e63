//! Structured policy violations

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::MemberId;

/// Names listed in a violation message before the rest are summarized
pub const MESSAGE_NAME_LIMIT: usize = 5;

/// Which structural rule a violation breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Monogamy,
    SameSex,
    SingleParent,
    MultiParent,
    MaxSpouses,
    MaxParents,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Monogamy => "monogamy",
            ViolationKind::SameSex => "same_sex",
            ViolationKind::SingleParent => "single_parent",
            ViolationKind::MultiParent => "multi_parent",
            ViolationKind::MaxSpouses => "max_spouses",
            ViolationKind::MaxParents => "max_parents",
        }
    }

    /// Name of the tree setting governing this rule
    pub fn setting(&self) -> &'static str {
        match self {
            ViolationKind::Monogamy => "monogamy",
            ViolationKind::SameSex => "allow_same_sex",
            ViolationKind::SingleParent => "allow_single_parent",
            ViolationKind::MultiParent => "allow_multi_parent_children",
            ViolationKind::MaxSpouses => "max_spouses_per_member",
            ViolationKind::MaxParents => "max_parents_per_child",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One broken rule and everything it touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,

    /// Human-readable explanation
    pub message: String,

    /// Display names of the affected members or spouse pairs, sorted
    pub affected: Vec<String>,

    /// Ids of every member involved
    pub member_ids: Vec<MemberId>,

    /// Highest count observed, for bound violations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_found: Option<u32>,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            affected: Vec::new(),
            member_ids: Vec::new(),
            max_found: None,
        }
    }

    pub fn with_affected(mut self, mut names: Vec<String>) -> Self {
        names.sort();
        self.affected = names;
        self
    }

    pub fn with_member_ids(mut self, mut ids: Vec<MemberId>) -> Self {
        ids.sort();
        ids.dedup();
        self.member_ids = ids;
        self
    }

    pub fn with_max_found(mut self, max_found: u32) -> Self {
        self.max_found = Some(max_found);
        self
    }

    pub fn involves(&self, member: &MemberId) -> bool {
        self.member_ids.contains(member)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Comma-separated list of the first few names, with a count of the rest
pub fn summarize_names(names: &[String]) -> String {
    let shown = names
        .iter()
        .take(MESSAGE_NAME_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    if names.len() > MESSAGE_NAME_LIMIT {
        format!("{} and {} more", shown, names.len() - MESSAGE_NAME_LIMIT)
    } else {
        shown
    }
}
