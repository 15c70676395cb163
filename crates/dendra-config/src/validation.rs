//! Build option and profile validation.
//!
//! Options that the builder would accept but that contradict each other are
//! rejected here, before a profile is used or saved. All problems are
//! collected; more than one comes back as [`ValidationError::Multiple`].
//!
//! # Example
//!
//! ```rust
//! use dendra_config::{validate_options, ValidationError};
//! use dendra_core::{BuildOptions, Modifiers};
//!
//! let options = BuildOptions::default().with_modifiers(Modifiers {
//!     two_points_sections: true,
//!     no_duplicates: true,
//!     ..Modifiers::default()
//! });
//! assert!(matches!(
//!     validate_options(&options),
//!     Err(ValidationError::IncompatibleModifiers { .. })
//! ));
//! ```

use dendra_core::{BuildOptions, WarningKind};
use thiserror::Error;

use crate::Profile;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Profile has an empty or blank name.
    #[error("profile name must not be empty")]
    EmptyName,

    /// Two modifiers that cannot be enabled together.
    #[error("modifiers '{first}' and '{second}' cannot be combined")]
    IncompatibleModifiers {
        /// First modifier.
        first: &'static str,
        /// Second modifier.
        second: &'static str,
    },

    /// A warning kind appears more than once in `ignored_warnings`.
    #[error("warning kind {0:?} is listed more than once in ignored_warnings")]
    DuplicateIgnoredWarning(WarningKind),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a set of build options.
pub fn validate_options(options: &BuildOptions) -> ValidationResult<()> {
    let mut errors = Vec::new();
    collect_option_errors(options, &mut errors);
    finish(errors)
}

/// Validate a profile: its name and its options.
pub fn validate_profile(profile: &Profile) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if profile.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    collect_option_errors(&profile.options, &mut errors);
    finish(errors)
}

fn collect_option_errors(options: &BuildOptions, errors: &mut Vec<ValidationError>) {
    let modifiers = options.modifiers;
    // no_duplicates never fires on a two-point section.
    if modifiers.two_points_sections && modifiers.no_duplicates {
        errors.push(ValidationError::IncompatibleModifiers {
            first: "two_points_sections",
            second: "no_duplicates",
        });
    }

    let mut seen: Vec<WarningKind> = Vec::with_capacity(options.ignored_warnings.len());
    for &kind in &options.ignored_warnings {
        if seen.contains(&kind) {
            let error = ValidationError::DuplicateIgnoredWarning(kind);
            if !errors.contains(&error) {
                errors.push(error);
            }
        } else {
            seen.push(kind);
        }
    }
}

fn finish(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
