//! Structural policy of a tree

use serde::{Deserialize, Serialize};

/// Declarative structural rules for one tree.
///
/// Settings are never trusted as a description of the graph: every check
/// re-derives counts from live edges. Alternate key spellings (camelCase from
/// web clients) are accepted here, at the serialization boundary, and nowhere
/// else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    #[serde(alias = "allowSameSex")]
    pub allow_same_sex: bool,

    pub monogamy: bool,

    #[serde(alias = "allowPolygamy")]
    pub allow_polygamy: bool,

    /// Upper bound on spouse edges per member; `None` means unbounded
    #[serde(alias = "maxSpousesPerMember")]
    pub max_spouses_per_member: Option<u32>,

    #[serde(alias = "allowSingleParent")]
    pub allow_single_parent: bool,

    /// Whether a child may have more than two parents
    #[serde(alias = "allowMultiParentChildren")]
    pub allow_multi_parent_children: bool,

    /// Upper bound on parent edges per child; `None` means unbounded
    #[serde(alias = "maxParentsPerChild")]
    pub max_parents_per_child: Option<u32>,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            allow_same_sex: true,
            monogamy: true,
            allow_polygamy: false,
            max_spouses_per_member: None,
            allow_single_parent: true,
            allow_multi_parent_children: false,
            max_parents_per_child: Some(2),
        }
    }
}

impl TreeSettings {
    /// The most permissive settings; every existing graph satisfies them.
    pub fn permissive() -> Self {
        Self {
            allow_same_sex: true,
            monogamy: false,
            allow_polygamy: true,
            max_spouses_per_member: None,
            allow_single_parent: true,
            allow_multi_parent_children: true,
            max_parents_per_child: None,
        }
    }

    /// Check the settings are internally consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.monogamy && self.allow_polygamy {
            return Err("Cannot enable both monogamy and polygamy".to_string());
        }
        if self.max_spouses_per_member == Some(0) {
            return Err("max_spouses_per_member must be at least 1".to_string());
        }
        if self.max_parents_per_child == Some(0) {
            return Err("max_parents_per_child must be at least 1".to_string());
        }
        Ok(())
    }
}
