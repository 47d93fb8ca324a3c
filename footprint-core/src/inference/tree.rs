//! Gradient-boosted regression tree ensemble.
//!
//! Each tree is a flat node array rooted at index 0. A split node sends the
//! sample left when `x[split] < threshold`; a missing (NaN) value follows
//! `default_left`. The prediction is `base_score` plus one leaf per tree.

use super::{Predictor, ensure_width};
use crate::error::MlError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        split: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_true")]
        default_left: bool,
    },
    Leaf {
        leaf: f64,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, tree_index: usize, n_features: usize) -> Result<(), MlError> {
        if self.nodes.is_empty() {
            return Err(MlError::model(format!("tree {tree_index} has no nodes")));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    split,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if *split >= n_features {
                        return Err(MlError::model(format!(
                            "tree {tree_index} node {i} splits on feature {split} of {n_features}"
                        )));
                    }
                    // Children must point forward, which also rules out cycles.
                    let len = self.nodes.len();
                    if *left <= i || *right <= i || *left >= len || *right >= len {
                        return Err(MlError::model(format!(
                            "tree {tree_index} node {i} has invalid children ({left}, {right})"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(MlError::model(format!(
                            "tree {tree_index} node {i} has NaN threshold"
                        )));
                    }
                }
                TreeNode::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        return Err(MlError::model(format!(
                            "tree {tree_index} node {i} has non-finite leaf"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    split,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = features[*split];
                    let go_left = if x.is_nan() { *default_left } else { x < *threshold };
                    index = if go_left { *left } else { *right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub base_score: f64,
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<RegressionTree>,
}

impl TreeEnsemble {
    /// Structural checks; after this, evaluation cannot index out of bounds
    /// or loop.
    pub fn validate(&self) -> Result<(), MlError> {
        if self.trees.is_empty() {
            return Err(MlError::model("tree ensemble has no trees"));
        }
        if self.n_features == 0 {
            return Err(MlError::model("tree ensemble declares zero features"));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(MlError::model(format!(
                    "tree ensemble lists {} feature names for {} features",
                    names.len(),
                    self.n_features
                )));
            }
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features)?;
        }
        Ok(())
    }
}

impl Predictor for TreeEnsemble {
    fn name(&self) -> &str {
        "tree_ensemble"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, MlError> {
        ensure_width(self.n_features, features)?;
        Ok(self
            .trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.leaf_value(features)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(split: usize, threshold: f64, low: f64, high: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    split,
                    threshold,
                    left: 1,
                    right: 2,
                    default_left: true,
                },
                TreeNode::Leaf { leaf: low },
                TreeNode::Leaf { leaf: high },
            ],
        }
    }

    fn ensemble() -> TreeEnsemble {
        TreeEnsemble {
            base_score: 1000.0,
            n_features: 2,
            feature_names: None,
            trees: vec![stump(0, 100.0, -50.0, 200.0), stump(1, 0.5, 0.0, 30.0)],
        }
    }

    #[test]
    fn test_predict_sums_leaves() {
        let model = ensemble();
        model.validate().unwrap();
        assert_eq!(model.predict(&[50.0, 0.0]).unwrap(), 950.0);
        assert_eq!(model.predict(&[150.0, 1.0]).unwrap(), 1230.0);
    }

    #[test]
    fn test_missing_value_follows_default() {
        let model = ensemble();
        assert_eq!(model.predict(&[f64::NAN, 1.0]).unwrap(), 980.0);
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(matches!(
            ensemble().predict(&[1.0]),
            Err(MlError::Inference(_))
        ));
    }

    #[test]
    fn test_backward_child_rejected() {
        let mut model = ensemble();
        model.trees[0].nodes[0] = TreeNode::Split {
            split: 0,
            threshold: 1.0,
            left: 0,
            right: 2,
            default_left: true,
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_split_feature_out_of_range_rejected() {
        let mut model = ensemble();
        model.trees[1] = stump(7, 1.0, 0.0, 1.0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_deserialize_nodes() {
        let json = r#"{
            "kind": "tree_ensemble",
            "base_score": 10.0,
            "n_features": 1,
            "trees": [{"nodes": [
                {"split": 0, "threshold": 2.5, "left": 1, "right": 2},
                {"leaf": 1.0},
                {"leaf": 5.0}
            ]}]
        }"#;
        let artifact: crate::inference::ModelArtifact = serde_json::from_str(json).unwrap();
        let model = artifact.into_predictor().unwrap();
        assert_eq!(model.predict(&[3.0]).unwrap(), 15.0);
        assert_eq!(model.predict(&[f64::NAN]).unwrap(), 11.0);
    }
}
