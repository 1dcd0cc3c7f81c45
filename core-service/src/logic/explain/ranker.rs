//! Attribution Ranker
//!
//! Orders contributions by magnitude and attaches a static description.

use super::types::{AttributionMap, Explanation, RankedAttribution};
use crate::constants::{FALLBACK_EXPLANATION, TOP_K};

/// Static description of a model feature
pub fn describe(feature: &str) -> &'static str {
    match feature {
        "URLLength" => "Length of the URL",
        "DomainLength" => "Length of the domain part of the URL",
        "IsDomainIP" => "Whether the domain is an IP address",
        "NoOfSubDomain" => "Number of subdomains",
        "HasObfuscation" => "Presence of obfuscation techniques",
        "NoOfLettersInURL" => "Count of letters in the URL",
        "LetterRatioInURL" => "Ratio of letters in the URL",
        "NoOfDegitsInURL" => "Count of digits in the URL",
        "DegitRatioInURL" => "Ratio of digits in the URL",
        "NoOfEqualsInURL" => "Number of '=' characters",
        "NoOfQMarkInURL" => "Number of '?' characters",
        "NoOfAmpersandInURL" => "Number of '&' characters",
        "IsHTTPS" => "Whether HTTPS protocol is used",
        "NoOfURLRedirect" => "Number of URL redirects",
        "HasFavicon" => "Presence of favicon",
        "NoOfPopup" => "Number of popups",
        "NoOfiFrame" => "Number of iframe tags",
        "HasExternalFormSubmit" => "Form submits data externally",
        "HasSubmitButton" => "Presence of submit buttons",
        "HasPasswordField" => "Presence of password input fields",
        "HasCopyrightInfo" => "Presence of copyright info",
        _ => FALLBACK_EXPLANATION,
    }
}

/// Top `k` contributions by descending absolute value
///
/// Ties keep column order (`sort_by` is stable).
pub fn rank(map: &AttributionMap, k: usize) -> Vec<RankedAttribution> {
    let mut ordered: Vec<(&str, f64)> = map.iter().collect();
    ordered.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ordered
        .into_iter()
        .take(k)
        .map(|(feature, value)| RankedAttribution {
            feature: feature.to_string(),
            value,
            explanation: describe(feature).to_string(),
        })
        .collect()
}

/// Ranked top-K view plus the full map
pub fn explain(map: AttributionMap) -> Explanation {
    Explanation {
        top: rank(&map, TOP_K),
        full: map,
    }
}
