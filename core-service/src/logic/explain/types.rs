use serde::ser::{Serialize, SerializeMap, Serializer};

/// Per-feature signed contributions for one prediction, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributionMap {
    entries: Vec<(String, f64)>,
}

impl AttributionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, feature: impl Into<String>, value: f64) {
        self.entries.push((feature.into(), value));
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, value)| value).sum()
    }
}

// Rendered as a JSON object; insertion order is kept by the writer
impl Serialize for AttributionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One entry of the ranked top-K view
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedAttribution {
    pub feature: String,
    pub value: f64,
    pub explanation: String,
}

/// Ranked view plus the untruncated map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Explanation {
    pub top: Vec<RankedAttribution>,
    pub full: AttributionMap,
}
