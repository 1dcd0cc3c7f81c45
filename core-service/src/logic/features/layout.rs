//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the model input schema**
//!
//! ## Rules (never break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The order below is the classifier's column order and the key order of
//! every attribution map.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE KINDS
// ============================================================================

/// JSON shape a model-visible field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Non-negative integer
    Count,
    /// Integer 0 or 1
    Flag,
    /// Number in [0, 1]
    Ratio,
}

/// One column of the model input
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    /// Wire name (JSON key, model column name)
    pub name: &'static str,
    /// Rust field name on `UrlFeatures`
    pub field: &'static str,
    pub kind: FeatureKind,
}

const fn spec(name: &'static str, field: &'static str, kind: FeatureKind) -> FeatureSpec {
    FeatureSpec { name, field, kind }
}

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

use FeatureKind::{Count, Flag, Ratio};

/// Model-visible features in exact column order
pub const FEATURE_LAYOUT: &[FeatureSpec] = &[
    // === URL structure (0-6) ===
    spec("URLLength", "url_length", Count),
    spec("DomainLength", "domain_length", Count),
    spec("IsDomainIP", "is_domain_ip", Flag),
    spec("NoOfSubDomain", "no_of_sub_domain", Count),
    spec("HasObfuscation", "has_obfuscation", Flag),
    spec("NoOfObfuscatedChar", "no_of_obfuscated_char", Count),
    spec("ObfuscationRatio", "obfuscation_ratio", Ratio),

    // === URL characters (7-15) ===
    spec("NoOfLettersInURL", "no_of_letters_in_url", Count),
    spec("LetterRatioInURL", "letter_ratio_in_url", Ratio),
    spec("NoOfDegitsInURL", "no_of_degits_in_url", Count),
    spec("DegitRatioInURL", "degit_ratio_in_url", Ratio),
    spec("NoOfEqualsInURL", "no_of_equals_in_url", Count),
    spec("NoOfQMarkInURL", "no_of_qmark_in_url", Count),
    spec("NoOfAmpersandInURL", "no_of_ampersand_in_url", Count),
    spec("NoOfOtherSpecialCharsInURL", "no_of_other_special_chars_in_url", Count),
    spec("SpacialCharRatioInURL", "spacial_char_ratio_in_url", Ratio),

    // === Transport (16) ===
    spec("IsHTTPS", "is_https", Flag),

    // === Page structure (17-26) ===
    spec("LineOfCode", "line_of_code", Count),
    spec("LargestLineLength", "largest_line_length", Count),
    spec("HasFavicon", "has_favicon", Flag),
    spec("Robots", "robots", Flag),
    spec("IsResponsive", "is_responsive", Flag),
    spec("NoOfURLRedirect", "no_of_url_redirect", Count),
    spec("NoOfSelfRedirect", "no_of_self_redirect", Count),
    spec("HasDescription", "has_description", Flag),
    spec("NoOfPopup", "no_of_popup", Count),
    spec("NoOfiFrame", "no_of_iframe", Count),

    // === Forms & content (27-35) ===
    spec("HasExternalFormSubmit", "has_external_form_submit", Flag),
    spec("HasSocialNet", "has_social_net", Flag),
    spec("HasSubmitButton", "has_submit_button", Flag),
    spec("HasHiddenFields", "has_hidden_fields", Flag),
    spec("HasPasswordField", "has_password_field", Flag),
    spec("Bank", "bank", Flag),
    spec("Pay", "pay", Flag),
    spec("Crypto", "crypto", Flag),
    spec("HasCopyrightInfo", "has_copyright_info", Flag),

    // === Resources & references (36-41) ===
    spec("NoOfImage", "no_of_image", Count),
    spec("NoOfCSS", "no_of_css", Count),
    spec("NoOfJS", "no_of_js", Count),
    spec("NoOfSelfRef", "no_of_self_ref", Count),
    spec("NoOfEmptyRef", "no_of_empty_ref", Count),
    spec("NoOfExternalRef", "no_of_external_ref", Count),
];

/// Total number of model-visible features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 42;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for spec in FEATURE_LAYOUT {
        hasher.update(spec.name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.name.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "Feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by wire name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|s| s.name == name)
}

/// Get feature wire name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).map(|s| s.name)
}

/// Find a spec by wire name or Rust field name
pub fn find_spec(key: &str) -> Option<&'static FeatureSpec> {
    FEATURE_LAYOUT.iter().find(|s| s.name == key || s.field == key)
}

// ============================================================================
// TESTS
// ============================================================================
