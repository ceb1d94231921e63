//! Impact report for a proposed settings change

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::validator::{PolicyValidator, ValidationReport};
use super::violation::{Violation, ViolationKind};
use crate::kinship::KinshipIndex;
use crate::models::{TreeId, TreeSettings};

/// Names carried by an impact warning
pub const WARNING_NAME_LIMIT: usize = 10;

/// A single setting whose value differs between current and proposed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingChange {
    pub setting: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Summary of one tightening violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactWarning {
    pub kind: ViolationKind,
    pub count: usize,
    /// First few affected names
    pub affected: Vec<String>,
}

impl From<&Violation> for ImpactWarning {
    fn from(violation: &Violation) -> Self {
        Self {
            kind: violation.kind,
            count: violation.affected.len(),
            affected: violation
                .affected
                .iter()
                .take(WARNING_NAME_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsImpact {
    pub member_count: usize,
    pub relationship_count: usize,
    pub changes: Vec<SettingChange>,
    pub warnings: Vec<ImpactWarning>,
}

impl SettingsImpact {
    pub fn analyze(
        index: &KinshipIndex,
        current: &TreeSettings,
        proposed: &TreeSettings,
        violations: &[Violation],
    ) -> Self {
        Self {
            member_count: index.member_count(),
            relationship_count: index.edge_count(),
            changes: changed_settings(current, proposed),
            warnings: violations.iter().map(ImpactWarning::from).collect(),
        }
    }

    pub fn is_safe(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Read-only answer to "what happens if these settings are applied"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsPreview {
    pub tree_id: TreeId,
    pub current: TreeSettings,
    pub proposed: TreeSettings,
    pub can_apply: bool,
    pub violations: Vec<Violation>,
    pub impact: SettingsImpact,
    pub recommendation: String,
}

impl SettingsPreview {
    pub fn build(
        tree_id: TreeId,
        index: &KinshipIndex,
        current: TreeSettings,
        proposed: TreeSettings,
    ) -> Self {
        let ValidationReport {
            is_valid,
            violations,
        } = PolicyValidator::validate(index, &current, &proposed);
        let impact = SettingsImpact::analyze(index, &current, &proposed, &violations);

        let recommendation = if is_valid {
            "Safe to apply - no conflicts detected".to_string()
        } else {
            "Cannot apply - would violate existing relationships. \
             Remove or modify conflicting relationships first."
                .to_string()
        };

        Self {
            tree_id,
            current,
            proposed,
            can_apply: is_valid,
            violations,
            impact,
            recommendation,
        }
    }
}

fn changed_settings(current: &TreeSettings, proposed: &TreeSettings) -> Vec<SettingChange> {
    let fields = [
        ("allow_same_sex", json!(current.allow_same_sex), json!(proposed.allow_same_sex)),
        ("monogamy", json!(current.monogamy), json!(proposed.monogamy)),
        ("allow_polygamy", json!(current.allow_polygamy), json!(proposed.allow_polygamy)),
        (
            "max_spouses_per_member",
            json!(current.max_spouses_per_member),
            json!(proposed.max_spouses_per_member),
        ),
        (
            "allow_single_parent",
            json!(current.allow_single_parent),
            json!(proposed.allow_single_parent),
        ),
        (
            "allow_multi_parent_children",
            json!(current.allow_multi_parent_children),
            json!(proposed.allow_multi_parent_children),
        ),
        (
            "max_parents_per_child",
            json!(current.max_parents_per_child),
            json!(proposed.max_parents_per_child),
        ),
    ];

    fields
        .into_iter()
        .filter(|(_, old, new)| old != new)
        .map(|(setting, old_value, new_value)| SettingChange {
            setting: setting.to_string(),
            old_value,
            new_value,
        })
        .collect()
}
