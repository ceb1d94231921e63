//! Tree policy validation
//!
//! Decides whether a proposed settings change is compatible with the
//! relationships already recorded, and describes its impact.

pub mod impact;
pub mod validator;
pub mod violation;

pub use impact::{ImpactWarning, SettingChange, SettingsImpact, SettingsPreview};
pub use validator::{PolicyValidator, ValidationReport};
pub use violation::{Violation, ViolationKind, summarize_names};
