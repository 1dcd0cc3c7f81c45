//! Feature Record - Validated request-scoped input
//!
//! A record is split into two closed types:
//! - `UrlFeatures`: the model-visible columns, in layout order
//! - `PageMetadata`: descriptive fields that never reach the classifier
//!
//! They are joined only in `FeatureRecord`, which is what the transport
//! layer produces after validation (see `validate.rs`).

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::layout::FEATURE_COUNT;
use super::vector::FeatureVector;
use crate::logic::trust;

// ============================================================================
// MODEL-VISIBLE FEATURES
// ============================================================================

/// Model-visible features of one URL/page
///
/// Field order matches `FEATURE_LAYOUT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UrlFeatures {
    #[serde(rename = "URLLength")]
    pub url_length: u32,
    #[serde(rename = "DomainLength")]
    pub domain_length: u32,
    #[serde(rename = "IsDomainIP")]
    #[validate(range(max = 1))]
    pub is_domain_ip: u8,
    #[serde(rename = "NoOfSubDomain")]
    pub no_of_sub_domain: u32,
    #[serde(rename = "HasObfuscation")]
    #[validate(range(max = 1))]
    pub has_obfuscation: u8,
    #[serde(rename = "NoOfObfuscatedChar")]
    pub no_of_obfuscated_char: u32,
    #[serde(rename = "ObfuscationRatio")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub obfuscation_ratio: f64,
    #[serde(rename = "NoOfLettersInURL")]
    pub no_of_letters_in_url: u32,
    #[serde(rename = "LetterRatioInURL")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub letter_ratio_in_url: f64,
    #[serde(rename = "NoOfDegitsInURL")]
    pub no_of_degits_in_url: u32,
    #[serde(rename = "DegitRatioInURL")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub degit_ratio_in_url: f64,
    #[serde(rename = "NoOfEqualsInURL")]
    pub no_of_equals_in_url: u32,
    #[serde(rename = "NoOfQMarkInURL")]
    pub no_of_qmark_in_url: u32,
    #[serde(rename = "NoOfAmpersandInURL")]
    pub no_of_ampersand_in_url: u32,
    #[serde(rename = "NoOfOtherSpecialCharsInURL")]
    pub no_of_other_special_chars_in_url: u32,
    #[serde(rename = "SpacialCharRatioInURL")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub spacial_char_ratio_in_url: f64,
    #[serde(rename = "IsHTTPS")]
    #[validate(range(max = 1))]
    pub is_https: u8,
    #[serde(rename = "LineOfCode")]
    pub line_of_code: u32,
    #[serde(rename = "LargestLineLength")]
    pub largest_line_length: u32,
    #[serde(rename = "HasFavicon")]
    #[validate(range(max = 1))]
    pub has_favicon: u8,
    #[serde(rename = "Robots")]
    #[validate(range(max = 1))]
    pub robots: u8,
    #[serde(rename = "IsResponsive")]
    #[validate(range(max = 1))]
    pub is_responsive: u8,
    #[serde(rename = "NoOfURLRedirect")]
    pub no_of_url_redirect: u32,
    #[serde(rename = "NoOfSelfRedirect")]
    pub no_of_self_redirect: u32,
    #[serde(rename = "HasDescription")]
    #[validate(range(max = 1))]
    pub has_description: u8,
    #[serde(rename = "NoOfPopup")]
    pub no_of_popup: u32,
    #[serde(rename = "NoOfiFrame")]
    pub no_of_iframe: u32,
    #[serde(rename = "HasExternalFormSubmit")]
    #[validate(range(max = 1))]
    pub has_external_form_submit: u8,
    #[serde(rename = "HasSocialNet")]
    #[validate(range(max = 1))]
    pub has_social_net: u8,
    #[serde(rename = "HasSubmitButton")]
    #[validate(range(max = 1))]
    pub has_submit_button: u8,
    #[serde(rename = "HasHiddenFields")]
    #[validate(range(max = 1))]
    pub has_hidden_fields: u8,
    #[serde(rename = "HasPasswordField")]
    #[validate(range(max = 1))]
    pub has_password_field: u8,
    #[serde(rename = "Bank")]
    #[validate(range(max = 1))]
    pub bank: u8,
    #[serde(rename = "Pay")]
    #[validate(range(max = 1))]
    pub pay: u8,
    #[serde(rename = "Crypto")]
    #[validate(range(max = 1))]
    pub crypto: u8,
    #[serde(rename = "HasCopyrightInfo")]
    #[validate(range(max = 1))]
    pub has_copyright_info: u8,
    #[serde(rename = "NoOfImage")]
    pub no_of_image: u32,
    #[serde(rename = "NoOfCSS")]
    pub no_of_css: u32,
    #[serde(rename = "NoOfJS")]
    pub no_of_js: u32,
    #[serde(rename = "NoOfSelfRef")]
    pub no_of_self_ref: u32,
    #[serde(rename = "NoOfEmptyRef")]
    pub no_of_empty_ref: u32,
    #[serde(rename = "NoOfExternalRef")]
    pub no_of_external_ref: u32,
}

impl UrlFeatures {
    /// Convert to a model input row in layout order
    pub fn to_vector(&self) -> FeatureVector {
        let values: [f32; FEATURE_COUNT] = [
            self.url_length as f32,
            self.domain_length as f32,
            self.is_domain_ip as f32,
            self.no_of_sub_domain as f32,
            self.has_obfuscation as f32,
            self.no_of_obfuscated_char as f32,
            self.obfuscation_ratio as f32,
            self.no_of_letters_in_url as f32,
            self.letter_ratio_in_url as f32,
            self.no_of_degits_in_url as f32,
            self.degit_ratio_in_url as f32,
            self.no_of_equals_in_url as f32,
            self.no_of_qmark_in_url as f32,
            self.no_of_ampersand_in_url as f32,
            self.no_of_other_special_chars_in_url as f32,
            self.spacial_char_ratio_in_url as f32,
            self.is_https as f32,
            self.line_of_code as f32,
            self.largest_line_length as f32,
            self.has_favicon as f32,
            self.robots as f32,
            self.is_responsive as f32,
            self.no_of_url_redirect as f32,
            self.no_of_self_redirect as f32,
            self.has_description as f32,
            self.no_of_popup as f32,
            self.no_of_iframe as f32,
            self.has_external_form_submit as f32,
            self.has_social_net as f32,
            self.has_submit_button as f32,
            self.has_hidden_fields as f32,
            self.has_password_field as f32,
            self.bank as f32,
            self.pay as f32,
            self.crypto as f32,
            self.has_copyright_info as f32,
            self.no_of_image as f32,
            self.no_of_css as f32,
            self.no_of_js as f32,
            self.no_of_self_ref as f32,
            self.no_of_empty_ref as f32,
            self.no_of_external_ref as f32,
        ];
        FeatureVector::from_values(values)
    }
}

// ============================================================================
// DESCRIPTIVE METADATA
// ============================================================================

/// Optional descriptive fields
///
/// Carried for context only; stripped before any model call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(rename = "HasTitle", default, skip_serializing_if = "Option::is_none")]
    pub has_title: Option<u8>,
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "DomainTitleMatchScore", default, skip_serializing_if = "Option::is_none")]
    pub domain_title_match_score: Option<f64>,
    #[serde(rename = "URLTitleMatchScore", default, skip_serializing_if = "Option::is_none")]
    pub url_title_match_score: Option<f64>,
    /// Declared origin host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Declared origin URL
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Wire names of the descriptive fields, with the JSON shape each accepts
pub const METADATA_FIELDS: &[(&str, MetadataKind)] = &[
    ("HasTitle", MetadataKind::Flag),
    ("Title", MetadataKind::Text),
    ("DomainTitleMatchScore", MetadataKind::Number),
    ("URLTitleMatchScore", MetadataKind::Number),
    ("hostname", MetadataKind::Text),
    ("URL", MetadataKind::Text),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Flag,
    Text,
    Number,
}

impl PageMetadata {
    /// Hostname used for the trusted-domain check
    ///
    /// Prefers the declared `hostname`, falls back to the host part of `URL`.
    pub fn origin_host(&self) -> Option<String> {
        if let Some(host) = self.hostname.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            return Some(host.to_string());
        }
        self.url.as_deref().and_then(trust::host_from_url)
    }
}

// ============================================================================
// FEATURE RECORD
// ============================================================================

/// One validated input record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    #[serde(flatten)]
    pub features: UrlFeatures,
    #[serde(flatten)]
    pub metadata: PageMetadata,
}

impl FeatureRecord {
    pub fn new(features: UrlFeatures, metadata: PageMetadata) -> Self {
        Self { features, metadata }
    }

    /// Model input row (descriptive fields excluded)
    pub fn to_vector(&self) -> FeatureVector {
        self.features.to_vector()
    }

    /// Hostname for the trusted-domain check, if the record declares one
    pub fn origin_host(&self) -> Option<String> {
        self.metadata.origin_host()
    }
}
