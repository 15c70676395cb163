//! Profile file format and operations.

use std::path::Path;

use dendra_core::{BuildOptions, Morphology, MorphologyResult, RecordStream};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A named, persisted set of build options.
///
/// # TOML Format
///
/// ```toml
/// name = "strict-swc"
/// description = "Reject anything a clean SWC file would not contain"
///
/// [options]
/// strict_ids = true
/// multi_root_policy = "fatal"
/// single_point_policy = "reject"
/// ignored_warnings = ["only_child"]
///
/// [options.modifiers]
/// nrn_order = true
/// ```
///
/// Every `options` key is optional and falls back to [`BuildOptions::default`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Name of the profile.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Builder configuration.
    #[serde(default)]
    pub options: BuildOptions,
}

impl Profile {
    /// Create a profile with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            options: BuildOptions::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the build options.
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Load a profile from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let profile: Profile = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), name = %profile.name, "profile loaded");
        Ok(profile)
    }

    /// Load a profile from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the profile to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), name = %self.name, "profile saved");
        Ok(())
    }

    /// Convert the profile to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Build a morphology with this profile's options.
    pub fn build(&self, stream: &RecordStream) -> MorphologyResult<Morphology> {
        Morphology::from_records(stream, &self.options)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dendra_core::{MultiRootPolicy, SinglePointPolicy, WarningKind};

    #[test]
    fn test_profile_new() {
        let profile = Profile::new("Test");
        assert_eq!(profile.name, "Test");
        assert!(profile.description.is_none());
        assert_eq!(profile.options, BuildOptions::default());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let profile = Profile::from_toml("name = \"bare\"").unwrap();
        assert_eq!(profile.name, "bare");
        assert_eq!(profile.options, BuildOptions::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
name = "picky"
description = "no surprises"

[options]
strict_ids = true
multi_root_policy = "fatal"
single_point_policy = "duplicate"
max_warnings = 10
ignored_warnings = ["only_child", "zero_length_segment"]

[options.modifiers]
nrn_order = true
"#;
        let profile = Profile::from_toml(toml).unwrap();
        let options = &profile.options;
        assert_eq!(profile.description.as_deref(), Some("no surprises"));
        assert!(options.strict_ids);
        assert_eq!(options.multi_root_policy, MultiRootPolicy::Fatal);
        assert_eq!(options.single_point_policy, SinglePointPolicy::Duplicate);
        assert_eq!(options.max_warnings, Some(10));
        assert_eq!(
            options.ignored_warnings,
            vec![WarningKind::OnlyChild, WarningKind::ZeroLengthSegment]
        );
        assert!(options.modifiers.nrn_order);
        assert!(!options.modifiers.soma_sphere);
    }

    #[test]
    fn test_toml_round_trip() {
        let profile = Profile::new("rt")
            .with_description("round trip")
            .with_options(BuildOptions::strict().ignore_warning(WarningKind::OnlyChild));
        let toml = profile.to_toml().unwrap();
        assert_eq!(Profile::from_toml(&toml).unwrap(), profile);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = Profile::from_toml("name = \"x\"\n[options]\nmulti_root_policy = \"ignore\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
