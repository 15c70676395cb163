//! Build profiles for dendra morphology loading.
//!
//! A [`Profile`] names a [`BuildOptions`](dendra_core::BuildOptions) set and
//! persists it as TOML, so the same validation strictness and modifiers can
//! be reused across runs and shared between tools.
//!
//! # Features
//!
//! - **Profiles**: Load and save build options from TOML files
//! - **Validation**: Reject contradictory option combinations before use
//! - **Factory Profiles**: Built-in profiles for common loading modes
//!
//! # Example
//!
//! ```rust,no_run
//! use dendra_config::{Profile, load_profile};
//! use dendra_core::{BuildOptions, MultiRootPolicy};
//!
//! // Factory profile by name, or a TOML file by path
//! let strict = load_profile("strict").unwrap();
//! assert!(strict.options.strict_ids);
//!
//! // Create and save a custom profile
//! let profile = Profile::new("lab")
//!     .with_description("Single tree, relaxed ids")
//!     .with_options(
//!         BuildOptions::default().with_multi_root_policy(MultiRootPolicy::Fatal),
//!     );
//! profile.save("profiles/lab.toml").unwrap();
//! ```

mod error;
mod profile;

/// Option and profile validation.
pub mod validation;

/// Factory profiles bundled with the library.
pub mod factory_profiles;

use std::path::Path;

pub use error::ConfigError;
pub use factory_profiles::{
    FACTORY_PROFILE_NAMES, factory_profile_names, factory_profiles, get_factory_profile,
    is_factory_profile,
};
pub use profile::Profile;
pub use validation::{ValidationError, ValidationResult, validate_options, validate_profile};

/// Resolve a profile by factory name, then by TOML file path.
///
/// The loaded profile is validated before it is returned.
pub fn load_profile(name_or_path: &str) -> Result<Profile, ConfigError> {
    let profile = if let Some(profile) = get_factory_profile(name_or_path) {
        tracing::info!(name = name_or_path, "using factory profile");
        profile
    } else if Path::new(name_or_path).is_file() {
        tracing::info!(path = name_or_path, "loading profile file");
        Profile::load(name_or_path)?
    } else {
        return Err(ConfigError::ProfileNotFound(name_or_path.to_string()));
    };
    validate_profile(&profile)?;
    Ok(profile)
}
