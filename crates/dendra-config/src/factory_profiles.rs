//! Factory profiles bundled with the library.
//!
//! These cover the common ways morphologies get loaded: permissive defaults,
//! strict validation for curated archives, a lenient mode for messy legacy
//! reconstructions, and simulation-oriented simplifications.

use crate::Profile;

/// Array of factory profile names for external access.
pub static FACTORY_PROFILE_NAMES: &[&str] = &["default", "strict", "lenient", "neuron", "simplified"];

/// TOML content for factory profiles, embedded at compile time.
static FACTORY_PROFILES_TOML: &[(&str, &str)] = &[
    ("default", DEFAULT_PROFILE),
    ("strict", STRICT_PROFILE),
    ("lenient", LENIENT_PROFILE),
    ("neuron", NEURON_PROFILE),
    ("simplified", SIMPLIFIED_PROFILE),
];

/// Builder defaults.
const DEFAULT_PROFILE: &str = r#"
name = "default"
description = "Renumber id gaps, warn on multiple trees, merge single-point sections"
"#;

/// Every recoverable anomaly is fatal.
const STRICT_PROFILE: &str = r#"
name = "strict"
description = "Contiguous ids, a single tree, no single-point sections"

[options]
strict_ids = true
multi_root_policy = "fatal"
single_point_policy = "reject"
"#;

/// Legacy reconstructions with repeated points and noisy topology.
const LENIENT_PROFILE: &str = r#"
name = "lenient"
description = "Pad single points, collapse repeated points, silence topology noise"

[options]
single_point_policy = "duplicate"
collapse_zero_length_segments = true
max_warnings = 1000
ignored_warnings = ["only_child", "wrong_duplicate", "zero_length_segment", "mixed_type_adjacency"]
"#;

/// Section ordering and soma shape as NEURON expects them.
const NEURON_PROFILE: &str = r#"
name = "neuron"
description = "NEURON root ordering with a spherical soma"

[options.modifiers]
nrn_order = true
soma_sphere = true
"#;

/// Coarse geometry for fast, topology-only work.
const SIMPLIFIED_PROFILE: &str = r#"
name = "simplified"
description = "Two points per section and a spherical soma"

[options]
collapse_zero_length_segments = true

[options.modifiers]
two_points_sections = true
soma_sphere = true
"#;

/// Get all factory profiles, in [`FACTORY_PROFILE_NAMES`] order.
pub fn factory_profiles() -> Vec<Profile> {
    FACTORY_PROFILES_TOML
        .iter()
        .filter_map(|(name, toml)| match Profile::from_toml(toml) {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::error!(name, %err, "factory profile failed to parse");
                None
            }
        })
        .collect()
}

/// Get a factory profile by name (case-insensitive).
pub fn get_factory_profile(name: &str) -> Option<Profile> {
    FACTORY_PROFILES_TOML
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, toml)| Profile::from_toml(toml).ok())
}

/// Get the list of factory profile names.
pub fn factory_profile_names() -> Vec<&'static str> {
    FACTORY_PROFILE_NAMES.to_vec()
}

/// Check if a name refers to a factory profile.
pub fn is_factory_profile(name: &str) -> bool {
    FACTORY_PROFILE_NAMES
        .iter()
        .any(|key| key.eq_ignore_ascii_case(name))
}
