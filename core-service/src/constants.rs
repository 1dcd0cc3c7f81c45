//! Central Configuration Constants
//!
//! Single source of truth for defaults shared by the core and the server.

/// Apex domains that bypass the model in batch analysis
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "linkedin.com",
    "google.com",
    "github.com",
    "microsoft.com",
    "apple.com",
    "amazon.com",
    "stackoverflow.com",
    "facebook.com",
];

/// Number of ranked attributions returned per record
pub const TOP_K: usize = 5;

/// Explanation text for features without a table entry
pub const FALLBACK_EXPLANATION: &str = "No explanation available";

/// Default model artifact location
pub const DEFAULT_MODEL_PATH: &str = "models/phishing_model.json";

/// Default upper bound on records per batch request
pub const DEFAULT_MAX_BATCH_SIZE: usize = 256;

/// Default base score when the artifact does not carry one
pub const DEFAULT_BASE_SCORE: f64 = 0.5;

/// Library version
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
