//! Member identity and gender classification

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a member. Ordering is lexicographic and is used for
/// deterministic tie-breaks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque identifier of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(String);

impl TreeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TreeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A person node in a tree's kinship graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub tree_id: TreeId,
    /// Display name used in paths and violation reports
    pub name: String,
    /// Free-form gender; `None` means unspecified
    pub gender: Option<String>,
    #[serde(default)]
    pub deceased: bool,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, tree_id: impl Into<TreeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tree_id: tree_id.into(),
            name: name.into(),
            gender: None,
            deceased: false,
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        let gender = gender.into();
        self.gender = if gender.trim().is_empty() || gender.eq_ignore_ascii_case("unspecified") {
            None
        } else {
            Some(gender)
        };
        self
    }

    pub fn deceased(mut self) -> Self {
        self.deceased = true;
        self
    }

    pub fn gender_category(&self) -> GenderCategory {
        self.gender
            .as_deref()
            .map(GenderCategory::classify)
            .unwrap_or(GenderCategory::Unspecified)
    }
}

/// Binary category a free-form gender string folds into.
///
/// Only `Male` and `Female` take part in same-sex checks and gendered labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderCategory {
    Male,
    Female,
    NonBinary,
    Unspecified,
}

impl GenderCategory {
    pub fn classify(gender: &str) -> Self {
        match gender.trim().to_lowercase().as_str() {
            "" | "unspecified" | "unknown" | "prefer-not-to-say" => GenderCategory::Unspecified,
            "male" | "man" | "m" | "boy" | "transgender-man" | "trans-man" | "demiboy" => {
                GenderCategory::Male
            }
            "female" | "woman" | "f" | "girl" | "transgender-woman" | "trans-woman"
            | "demigirl" => GenderCategory::Female,
            _ => GenderCategory::NonBinary,
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, GenderCategory::Male | GenderCategory::Female)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_classification() {
        assert_eq!(GenderCategory::classify("Male"), GenderCategory::Male);
        assert_eq!(GenderCategory::classify("woman"), GenderCategory::Female);
        assert_eq!(GenderCategory::classify("transgender-man"), GenderCategory::Male);
        assert_eq!(GenderCategory::classify("non-binary"), GenderCategory::NonBinary);
        assert_eq!(GenderCategory::classify(" "), GenderCategory::Unspecified);
    }

    #[test]
    fn test_unspecified_gender_is_none() {
        let member = Member::new("m1", "t1", "Ada").with_gender("unspecified");
        assert!(member.gender.is_none());
        assert_eq!(member.gender_category(), GenderCategory::Unspecified);

        let member = Member::new("m2", "t1", "Bo").with_gender("man");
        assert_eq!(member.gender_category(), GenderCategory::Male);
    }

    #[test]
    fn test_id_ordering_is_lexicographic() {
        assert!(MemberId::from("a10") < MemberId::from("a9"));
        assert_ne!(MemberId::generate(), MemberId::generate());
    }
}
