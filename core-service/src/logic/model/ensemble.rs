//! Tree Ensemble - Gradient-boosted trees with exact attributions
//!
//! Loads an XGBoost JSON dump (`dump_model(..., with_stats=True)`) wrapped
//! in a small envelope:
//!
//! ```json
//! {"base_score": 0.5, "feature_names": ["URLLength", ...], "trees": [...]}
//! ```
//!
//! Serves as both `Classifier` and `Explainer`. Attributions are exact
//! path-dependent TreeSHAP values in margin space, so for every row
//! `sum(contributions) == margin - expected_value()`.

use std::collections::HashMap;

use serde::Deserialize;

use super::inference::{Classifier, Explainer, Label, ModelError};
use crate::constants::DEFAULT_BASE_SCORE;
use crate::logic::explain::AttributionMap;
use crate::logic::features::{feature_index, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(default = "default_base_score")]
    base_score: f64,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    trees: Vec<RawNode>,
}

fn default_base_score() -> f64 {
    DEFAULT_BASE_SCORE
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNode {
    Split {
        nodeid: usize,
        split: String,
        split_condition: f64,
        yes: usize,
        no: usize,
        missing: Option<usize>,
        cover: Option<f64>,
        children: Vec<RawNode>,
    },
    Leaf {
        nodeid: usize,
        leaf: f64,
        cover: Option<f64>,
    },
}

impl RawNode {
    fn nodeid(&self) -> usize {
        match self {
            RawNode::Split { nodeid, .. } | RawNode::Leaf { nodeid, .. } => *nodeid,
        }
    }

    fn cover(&self) -> Option<f64> {
        match self {
            RawNode::Split { cover, .. } | RawNode::Leaf { cover, .. } => *cover,
        }
    }
}

// ============================================================================
// COMPILED TREES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        /// Column in `FEATURE_LAYOUT` order
        feature: usize,
        threshold: f32,
        yes: usize,
        no: usize,
        missing: usize,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

/// One tree; root at index 0, every child index is greater than its parent's
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn cover(&self, index: usize) -> f64 {
        match self.nodes[index] {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => cover,
        }
    }

    /// Child a row descends to at a split
    fn route(row: &[f32], feature: usize, threshold: f32, yes: usize, no: usize, missing: usize) -> usize {
        let x = row[feature];
        if x.is_nan() {
            missing
        } else if x < threshold {
            yes
        } else {
            no
        }
    }

    fn leaf_value(&self, row: &[f32]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value, .. } => return value,
                Node::Split { feature, threshold, yes, no, missing, .. } => {
                    index = Self::route(row, feature, threshold, yes, no, missing);
                }
            }
        }
    }

    /// Cover-weighted mean output, the prediction with every feature unknown
    fn expected_value(&self) -> f64 {
        let mut expectations = vec![0.0; self.nodes.len()];
        // Children always follow their parent, so a reverse pass sees them first
        for index in (0..self.nodes.len()).rev() {
            expectations[index] = match self.nodes[index] {
                Node::Leaf { value, .. } => value,
                Node::Split { yes, no, cover, .. } => {
                    (self.cover(yes) * expectations[yes] + self.cover(no) * expectations[no]) / cover
                }
            };
        }
        expectations[0]
    }

    fn compile(raw: &RawNode, columns: &[usize], names: &[String], tree_index: usize) -> Result<Self, ModelError> {
        let mut flat: Vec<&RawNode> = Vec::new();
        let mut stack = vec![raw];
        while let Some(node) = stack.pop() {
            flat.push(node);
            if let RawNode::Split { children, .. } = node {
                stack.extend(children.iter().rev());
            }
        }

        let mut positions: HashMap<usize, usize> = HashMap::with_capacity(flat.len());
        for (position, &node) in flat.iter().enumerate() {
            if positions.insert(node.nodeid(), position).is_some() {
                return Err(load_error(tree_index, node.nodeid(), "duplicate node id"));
            }
        }

        let mut nodes = Vec::with_capacity(flat.len());
        for (position, &node) in flat.iter().enumerate() {
            let nodeid = node.nodeid();
            let cover = node
                .cover()
                .ok_or_else(|| load_error(tree_index, nodeid, "missing cover statistics (dump with stats)"))?;
            if !cover.is_finite() || cover < 0.0 {
                return Err(load_error(tree_index, nodeid, "cover must be a non-negative number"));
            }

            let compiled = match node {
                RawNode::Leaf { leaf, .. } => Node::Leaf { value: *leaf, cover },
                RawNode::Split { split, split_condition, yes, no, missing, .. } => {
                    if cover <= 0.0 {
                        return Err(load_error(tree_index, nodeid, "split with zero cover"));
                    }
                    let feature = resolve_feature(split, columns, names)
                        .ok_or_else(|| load_error(tree_index, nodeid, &format!("unknown feature {:?}", split)))?;

                    let child = |id: usize| -> Result<usize, ModelError> {
                        match positions.get(&id) {
                            Some(&index) if index > position => Ok(index),
                            Some(_) => Err(load_error(tree_index, nodeid, "child must follow its parent")),
                            None => Err(load_error(tree_index, nodeid, &format!("dangling child id {}", id))),
                        }
                    };
                    let yes = child(*yes)?;
                    let no = child(*no)?;
                    let missing = match missing {
                        Some(id) => child(*id)?,
                        None => yes,
                    };
                    if yes == no || (missing != yes && missing != no) {
                        return Err(load_error(tree_index, nodeid, "inconsistent yes/no/missing children"));
                    }

                    Node::Split {
                        feature,
                        threshold: *split_condition as f32,
                        yes,
                        no,
                        missing,
                        cover,
                    }
                }
            };
            nodes.push(compiled);
        }

        Ok(Self { nodes })
    }
}

fn load_error(tree: usize, node: usize, reason: &str) -> ModelError {
    ModelError::Load(format!("tree {} node {}: {}", tree, node, reason))
}

/// Map a split name (`URLLength` or `f0`) to a layout column
fn resolve_feature(split: &str, columns: &[usize], names: &[String]) -> Option<usize> {
    if let Some(position) = names.iter().position(|name| name == split) {
        return columns.get(position).copied();
    }
    let position: usize = split.strip_prefix('f')?.parse().ok()?;
    columns.get(position).copied()
}

// ============================================================================
// TREESHAP
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero: f64,
    one: f64,
    weight: f64,
}

fn extend(path: &mut Vec<PathElement>, zero: f64, one: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero,
        one,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    for i in (0..depth).rev() {
        path[i + 1].weight += one * path[i].weight * (i + 1) as f64 / (depth + 1) as f64;
        path[i].weight = zero * path[i].weight * (depth - i) as f64 / (depth + 1) as f64;
    }
}

/// Path with element `index` removed, as if it had never been extended
fn unwind(path: &[PathElement], index: usize) -> Vec<PathElement> {
    let len = path.len();
    let PathElement { zero, one, .. } = path[index];
    let mut out = path[..len - 1].to_vec();

    let mut next = path[len - 1].weight;
    for j in (0..len - 1).rev() {
        if one != 0.0 {
            let previous = out[j].weight;
            out[j].weight = next * len as f64 / ((j + 1) as f64 * one);
            next = previous - out[j].weight * zero * (len - 1 - j) as f64 / len as f64;
        } else {
            out[j].weight = out[j].weight * len as f64 / (zero * (len - 1 - j) as f64);
        }
    }
    for j in index..len - 1 {
        out[j].feature = path[j + 1].feature;
        out[j].zero = path[j + 1].zero;
        out[j].one = path[j + 1].one;
    }
    out
}

struct ShapContext<'a> {
    tree: &'a Tree,
    row: &'a [f32],
    phi: &'a mut [f64],
}

impl ShapContext<'_> {
    fn recurse(&mut self, node: usize, mut path: Vec<PathElement>, zero: f64, one: f64, feature: Option<usize>) {
        extend(&mut path, zero, one, feature);

        match self.tree.nodes[node] {
            Node::Leaf { value, .. } => {
                for i in 1..path.len() {
                    let weight: f64 = unwind(&path, i).iter().map(|e| e.weight).sum();
                    let element = path[i];
                    if let Some(column) = element.feature {
                        self.phi[column] += weight * (element.one - element.zero) * value;
                    }
                }
            }
            Node::Split { feature, threshold, yes, no, missing, cover } => {
                let hot = Tree::route(self.row, feature, threshold, yes, no, missing);
                let cold = if hot == yes { no } else { yes };

                let (mut incoming_zero, mut incoming_one) = (1.0, 1.0);
                if let Some(k) = (1..path.len()).find(|&k| path[k].feature == Some(feature)) {
                    incoming_zero = path[k].zero;
                    incoming_one = path[k].one;
                    path = unwind(&path, k);
                }

                let hot_zero = incoming_zero * self.tree.cover(hot) / cover;
                let cold_zero = incoming_zero * self.tree.cover(cold) / cover;

                if hot_zero != 0.0 || incoming_one != 0.0 {
                    self.recurse(hot, path.clone(), hot_zero, incoming_one, Some(feature));
                }
                // A cold branch with no cover carries no weight
                if cold_zero != 0.0 {
                    self.recurse(cold, path, cold_zero, 0.0, Some(feature));
                }
            }
        }
    }
}

// ============================================================================
// ENSEMBLE
// ============================================================================

/// Immutable gradient-boosted tree ensemble
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    trees: Vec<Tree>,
    base_score: f64,
    base_margin: f64,
    expected_value: f64,
}

impl TreeEnsemble {
    /// Parse and compile an artifact
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: Artifact = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::Load(format!("invalid model artifact: {}", e)))?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: Artifact) -> Result<Self, ModelError> {
        let base_score = artifact.base_score;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(ModelError::Load(format!(
                "base_score must be in (0, 1), got {}",
                base_score
            )));
        }

        let names: Vec<String> = match artifact.feature_names {
            Some(names) => names,
            None => FEATURE_LAYOUT.iter().map(|spec| spec.name.to_string()).collect(),
        };
        let columns = names
            .iter()
            .map(|name| {
                feature_index(name)
                    .ok_or_else(|| ModelError::Load(format!("model feature {:?} is not a known input", name)))
            })
            .collect::<Result<Vec<usize>, ModelError>>()?;

        if artifact.trees.is_empty() {
            return Err(ModelError::Load("model has no trees".to_string()));
        }
        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(index, raw)| Tree::compile(raw, &columns, &names, index))
            .collect::<Result<Vec<Tree>, ModelError>>()?;

        let base_margin = (base_score / (1.0 - base_score)).ln();
        let expected_value = base_margin + trees.iter().map(Tree::expected_value).sum::<f64>();

        Ok(Self {
            trees,
            base_score,
            base_margin,
            expected_value,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Margin predicted when every feature is unknown
    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    /// Raw log-odds for one row
    pub fn margin(&self, row: &FeatureVector) -> f64 {
        let values = row.as_slice();
        self.base_margin + self.trees.iter().map(|tree| tree.leaf_value(values)).sum::<f64>()
    }

    /// Probability of class 1 (legitimate)
    pub fn probability(&self, row: &FeatureVector) -> f64 {
        1.0 / (1.0 + (-self.margin(row)).exp())
    }

    /// Per-column contributions for one row, in layout order
    pub fn contributions(&self, row: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut phi = [0.0; FEATURE_COUNT];
        for tree in &self.trees {
            let mut context = ShapContext {
                tree,
                row: row.as_slice(),
                phi: &mut phi,
            };
            context.recurse(0, Vec::new(), 1.0, 1.0, None);
        }
        phi
    }
}

fn check_rows(rows: &[FeatureVector]) -> Result<(), ModelError> {
    for (index, row) in rows.iter().enumerate() {
        row.validate()
            .map_err(|e| ModelError::Shape(format!("row {}: {}", index, e)))?;
    }
    Ok(())
}

impl Classifier for TreeEnsemble {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>, ModelError> {
        check_rows(rows)?;
        Ok(rows
            .iter()
            .map(|row| {
                if self.probability(row) > 0.5 {
                    Label::Legitimate
                } else {
                    Label::Phishing
                }
            })
            .collect())
    }
}

impl Explainer for TreeEnsemble {
    fn explain(&self, rows: &[FeatureVector]) -> Result<Vec<AttributionMap>, ModelError> {
        check_rows(rows)?;
        Ok(rows
            .iter()
            .map(|row| {
                let phi = self.contributions(row);
                AttributionMap::from_entries(
                    FEATURE_LAYOUT
                        .iter()
                        .zip(phi.iter())
                        .map(|(spec, value)| (spec.name.to_string(), *value))
                        .collect(),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(nodeid: usize, value: f64, cover: f64) -> serde_json::Value {
        json!({ "nodeid": nodeid, "leaf": value, "cover": cover })
    }

    fn split(
        nodeid: usize,
        feature: &str,
        condition: f64,
        yes: serde_json::Value,
        no: serde_json::Value,
        cover: f64,
    ) -> serde_json::Value {
        let yes_id = yes["nodeid"].clone();
        let no_id = no["nodeid"].clone();
        json!({
            "nodeid": nodeid,
            "split": feature,
            "split_condition": condition,
            "yes": yes_id,
            "no": no_id,
            "missing": yes_id,
            "cover": cover,
            "children": [yes, no],
        })
    }

    /// Splits on URLLength twice along one path
    fn nested_tree() -> serde_json::Value {
        split(
            0,
            "URLLength",
            10.0,
            split(
                1,
                "DomainLength",
                3.0,
                split(
                    3,
                    "URLLength",
                    5.0,
                    leaf(7, 1.2, 1.5),
                    split(8, "IsDomainIP", 0.5, leaf(9, -0.2, 1.0), leaf(10, 0.4, 1.5), 2.5),
                    4.0,
                ),
                leaf(4, -0.7, 2.0),
                6.0,
            ),
            split(2, "URLLength", 20.0, leaf(5, 0.3, 3.0), leaf(6, 0.9, 1.0), 4.0),
            10.0,
        )
    }

    fn ensemble(trees: Vec<serde_json::Value>) -> TreeEnsemble {
        let artifact = json!({ "base_score": 0.5, "trees": trees });
        TreeEnsemble::from_slice(artifact.to_string().as_bytes()).unwrap()
    }

    fn row(url_length: f32, domain_length: f32, is_ip: f32) -> FeatureVector {
        let mut vector = FeatureVector::new();
        vector.set_by_name("URLLength", url_length);
        vector.set_by_name("DomainLength", domain_length);
        vector.set_by_name("IsDomainIP", is_ip);
        vector
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn test_margin_follows_splits() {
        let model = ensemble(vec![nested_tree()]);

        assert_close(model.margin(&row(7.0, 1.0, 1.0)), 0.4);
        assert_close(model.margin(&row(12.0, 0.0, 0.0)), 0.3);
        assert_close(model.margin(&row(25.0, 0.0, 0.0)), 0.9);
        assert_close(model.margin(&row(1.0, 5.0, 0.0)), -0.7);
    }

    #[test]
    fn test_missing_value_takes_missing_branch() {
        let model = ensemble(vec![nested_tree()]);
        // NaN URLLength -> yes at node 0 and node 3
        assert_close(model.margin(&row(f32::NAN, 1.0, 0.0)), 1.2);
    }

    #[test]
    fn test_labels() {
        let model = ensemble(vec![nested_tree()]);
        let labels = model
            .predict(&[row(7.0, 1.0, 1.0), row(1.0, 5.0, 0.0)])
            .unwrap();
        assert_eq!(labels, vec![Label::Legitimate, Label::Phishing]);
        assert!(model.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_base_score_shifts_margin() {
        let artifact = json!({ "base_score": 0.2, "trees": [leaf(0, 0.5, 1.0)] });
        let model = TreeEnsemble::from_slice(artifact.to_string().as_bytes()).unwrap();
        let expected = (0.2f64 / 0.8).ln() + 0.5;

        assert_close(model.margin(&FeatureVector::new()), expected);
        assert_close(model.expected_value(), expected);
        assert_eq!(model.predict(&[FeatureVector::new()]).unwrap(), vec![Label::Phishing]);
    }

    #[test]
    fn test_expected_value_is_cover_weighted() {
        let model = ensemble(vec![nested_tree()]);
        assert_close(model.expected_value(), 0.26);
    }

    #[test]
    fn test_exact_contributions() {
        let model = ensemble(vec![nested_tree()]);
        let phi = model.contributions(&row(7.0, 1.0, 1.0));

        assert_close(phi[0], -0.301666666666667);
        assert_close(phi[1], 0.3);
        assert_close(phi[2], 0.141666666666667);
        assert!(phi[3..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_symmetric_interaction_is_split_evenly() {
        let and_tree = split(
            0,
            "URLLength",
            0.5,
            split(1, "DomainLength", 0.5, leaf(3, 1.0, 1.0), leaf(4, 0.0, 1.0), 2.0),
            leaf(2, 0.0, 2.0),
            4.0,
        );
        let model = ensemble(vec![and_tree]);
        let phi = model.contributions(&row(0.0, 0.0, 0.0));

        assert_close(phi[0], 0.375);
        assert_close(phi[1], 0.375);
    }

    #[test]
    fn test_local_accuracy() {
        let second = split(0, "IsDomainIP", 0.5, leaf(1, 0.25, 7.0), leaf(2, -1.1, 3.0), 10.0);
        let model = ensemble(vec![nested_tree(), second]);

        for r in [
            row(7.0, 1.0, 1.0),
            row(3.0, 1.0, 0.0),
            row(12.0, 9.0, 1.0),
            row(40.0, 2.0, 0.0),
            row(f32::NAN, 4.0, 1.0),
        ] {
            let total: f64 = model.contributions(&r).iter().sum();
            assert_close(total, model.margin(&r) - model.expected_value());
        }
    }

    #[test]
    fn test_explain_covers_every_column_in_order() {
        let model = ensemble(vec![nested_tree()]);
        let maps = model.explain(&[row(7.0, 1.0, 1.0), row(25.0, 0.0, 0.0)]).unwrap();

        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].len(), FEATURE_COUNT);
        let names: Vec<&str> = maps[0].iter().map(|(name, _)| name).collect();
        let layout: Vec<&str> = FEATURE_LAYOUT.iter().map(|spec| spec.name).collect();
        assert_eq!(names, layout);
        assert_close(maps[0].get("DomainLength").unwrap(), 0.3);
    }

    #[test]
    fn test_index_names_resolve_through_feature_names() {
        let by_index = json!({
            "feature_names": ["IsDomainIP", "URLLength"],
            "trees": [split(0, "f1", 10.0, leaf(1, -1.0, 1.0), leaf(2, 1.0, 1.0), 2.0)],
        });
        let model = TreeEnsemble::from_slice(by_index.to_string().as_bytes()).unwrap();

        assert_close(model.margin(&row(5.0, 0.0, 0.0)), -1.0);
        assert_close(model.margin(&row(15.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_layout_mismatch_is_shape_error() {
        let model = ensemble(vec![nested_tree()]);
        let mut stale = FeatureVector::new();
        stale.layout_hash ^= 1;

        assert!(matches!(model.predict(&[stale.clone()]), Err(ModelError::Shape(_))));
        assert!(matches!(model.explain(&[stale]), Err(ModelError::Shape(_))));
    }

    #[test]
    fn test_load_errors() {
        let cases = vec![
            json!({ "trees": [split(0, "Favicon", 1.0, leaf(1, 0.0, 1.0), leaf(2, 0.0, 1.0), 2.0)] }),
            json!({ "trees": [{ "nodeid": 0, "leaf": 0.1 }] }),
            json!({ "trees": [{
                "nodeid": 0, "split": "URLLength", "split_condition": 1.0,
                "yes": 1, "no": 9, "cover": 2.0,
                "children": [leaf(1, 0.0, 1.0), leaf(2, 0.0, 1.0)],
            }] }),
            json!({ "base_score": 1.0, "trees": [leaf(0, 0.0, 1.0)] }),
            json!({ "feature_names": ["NotAFeature"], "trees": [leaf(0, 0.0, 1.0)] }),
            json!({ "trees": [] }),
        ];

        for artifact in cases {
            let result = TreeEnsemble::from_slice(artifact.to_string().as_bytes());
            assert!(matches!(result, Err(ModelError::Load(_))), "accepted {}", artifact);
        }
        assert!(matches!(TreeEnsemble::from_slice(b"not json"), Err(ModelError::Load(_))));
    }
}
