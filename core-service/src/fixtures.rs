//! Shared test fixtures

use serde_json::{json, Value};

use crate::logic::features::{parse_record, FeatureRecord};

/// A complete, valid request record
pub fn sample_json() -> Value {
    json!({
        "URLLength": 80,
        "DomainLength": 12,
        "IsDomainIP": 0,
        "NoOfSubDomain": 1,
        "HasObfuscation": 0,
        "NoOfObfuscatedChar": 0,
        "ObfuscationRatio": 0.0,
        "NoOfLettersInURL": 45,
        "LetterRatioInURL": 0.56,
        "NoOfDegitsInURL": 5,
        "DegitRatioInURL": 0.12,
        "NoOfEqualsInURL": 1,
        "NoOfQMarkInURL": 1,
        "NoOfAmpersandInURL": 0,
        "NoOfOtherSpecialCharsInURL": 2,
        "SpacialCharRatioInURL": 0.03,
        "IsHTTPS": 1,
        "LineOfCode": 150,
        "LargestLineLength": 300,
        "HasTitle": 1,
        "Title": "Welcome to Amazon",
        "DomainTitleMatchScore": 0.9,
        "URLTitleMatchScore": 0.85,
        "HasFavicon": 1,
        "Robots": 1,
        "IsResponsive": 1,
        "NoOfURLRedirect": 0,
        "NoOfSelfRedirect": 0,
        "HasDescription": 1,
        "NoOfPopup": 0,
        "NoOfiFrame": 0,
        "HasExternalFormSubmit": 0,
        "HasSocialNet": 1,
        "HasSubmitButton": 1,
        "HasHiddenFields": 0,
        "HasPasswordField": 1,
        "Bank": 0,
        "Pay": 1,
        "Crypto": 0,
        "HasCopyrightInfo": 1,
        "NoOfImage": 8,
        "NoOfCSS": 2,
        "NoOfJS": 5,
        "NoOfSelfRef": 12,
        "NoOfEmptyRef": 0,
        "NoOfExternalRef": 4
    })
}

/// Sample record with overrides applied on top of `sample_json`
pub fn record_with(overrides: Value) -> FeatureRecord {
    let mut value = sample_json();
    if let (Some(target), Some(extra)) = (value.as_object_mut(), overrides.as_object()) {
        for (key, v) in extra {
            target.insert(key.clone(), v.clone());
        }
    }
    parse_record(&value, &[]).expect("fixture record must be valid")
}

pub fn sample_record() -> FeatureRecord {
    record_with(json!({}))
}
