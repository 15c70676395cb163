//! Build configuration.
//!
//! [`BuildOptions`] is passed explicitly into every build; there is no global
//! state, so a build is fully determined by its input and its options.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::warning::WarningKind;

/// What to do when more than one disconnected tree is found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MultiRootPolicy {
    /// Record a `MultipleTrees` warning and keep the forest.
    #[default]
    Warn,
    /// Fail with `MorphologyError::MultipleTrees`.
    Fatal,
}

/// How to treat a section that ends up with a single point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SinglePointPolicy {
    /// Fold the point into neighbouring sections when no geometry is lost,
    /// otherwise fall back to [`SinglePointPolicy::Duplicate`].
    #[default]
    Merge,
    /// Pad the section to two points by repeating its point.
    Duplicate,
    /// Fail with `SectionBuilderError::SinglePoint`.
    Reject,
}

/// Post-processing applied after validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Modifiers {
    /// Keep only the first and last point of each section.
    pub two_points_sections: bool,
    /// Replace the soma by a single-point sphere.
    pub soma_sphere: bool,
    /// Drop a child's first point when it repeats the parent's last point.
    pub no_duplicates: bool,
    /// Order root sections axon, basal, apical, custom before numbering.
    pub nrn_order: bool,
}

impl Modifiers {
    /// True if no modifier is enabled.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Tree builder configuration.
///
/// ```rust
/// use dendra_core::{BuildOptions, MultiRootPolicy, SinglePointPolicy};
///
/// let options = BuildOptions::default()
///     .with_strict_ids(true)
///     .with_multi_root_policy(MultiRootPolicy::Fatal)
///     .with_single_point_policy(SinglePointPolicy::Reject)
///     .with_max_warnings(Some(100));
/// assert!(options.strict_ids);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildOptions {
    /// Reject (`true`) or renumber and warn (`false`) on point id gaps.
    pub strict_ids: bool,
    /// Multiple-tree handling.
    pub multi_root_policy: MultiRootPolicy,
    /// Single-point section handling.
    pub single_point_policy: SinglePointPolicy,
    /// Drop repeated consecutive points inside sections.
    pub collapse_zero_length_segments: bool,
    /// Maximum number of stored warnings; `None` keeps all.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub max_warnings: Option<usize>,
    /// Warning kinds that are never recorded.
    pub ignored_warnings: Vec<WarningKind>,
    /// Post-processing modifiers.
    pub modifiers: Modifiers,
}

impl BuildOptions {
    /// Strictest configuration: every recoverable anomaly becomes fatal.
    pub fn strict() -> Self {
        Self {
            strict_ids: true,
            multi_root_policy: MultiRootPolicy::Fatal,
            single_point_policy: SinglePointPolicy::Reject,
            ..Self::default()
        }
    }

    /// Sets id strictness.
    pub fn with_strict_ids(mut self, strict: bool) -> Self {
        self.strict_ids = strict;
        self
    }

    /// Sets the multiple-tree policy.
    pub fn with_multi_root_policy(mut self, policy: MultiRootPolicy) -> Self {
        self.multi_root_policy = policy;
        self
    }

    /// Sets the single-point section policy.
    pub fn with_single_point_policy(mut self, policy: SinglePointPolicy) -> Self {
        self.single_point_policy = policy;
        self
    }

    /// Enables or disables zero-length segment collapsing.
    pub fn with_collapse_zero_length_segments(mut self, collapse: bool) -> Self {
        self.collapse_zero_length_segments = collapse;
        self
    }

    /// Sets the warning cap.
    pub fn with_max_warnings(mut self, max: Option<usize>) -> Self {
        self.max_warnings = max;
        self
    }

    /// Adds a warning kind to the ignore list.
    pub fn ignore_warning(mut self, kind: WarningKind) -> Self {
        if !self.ignored_warnings.contains(&kind) {
            self.ignored_warnings.push(kind);
        }
        self
    }

    /// Sets the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BuildOptions::default();
        assert!(!options.strict_ids);
        assert_eq!(options.multi_root_policy, MultiRootPolicy::Warn);
        assert_eq!(options.single_point_policy, SinglePointPolicy::Merge);
        assert!(!options.collapse_zero_length_segments);
        assert_eq!(options.max_warnings, None);
        assert!(options.modifiers.is_empty());
    }

    #[test]
    fn test_strict() {
        let options = BuildOptions::strict();
        assert!(options.strict_ids);
        assert_eq!(options.multi_root_policy, MultiRootPolicy::Fatal);
        assert_eq!(options.single_point_policy, SinglePointPolicy::Reject);
    }

    #[test]
    fn test_ignore_warning_dedups() {
        let options = BuildOptions::default()
            .ignore_warning(WarningKind::OnlyChild)
            .ignore_warning(WarningKind::OnlyChild);
        assert_eq!(options.ignored_warnings, vec![WarningKind::OnlyChild]);
    }
}
