//! Decision tree and random forest classifiers
//!
//! Trees are stored as flat node arrays with the root at index 0. A split
//! sends a row left when `row[feature] <= threshold`. Leaves carry the
//! probability of the potable class. Child indices must be strictly greater
//! than their parent's index, which rules out cycles and bounds traversal.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelLoadError};
use crate::features::{FeatureVector, FEATURE_COUNT};

/// Probability above which a tree or forest predicts `1`
pub const DECISION_BOUNDARY: f64 = 0.5;

/// A single tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probability: f64,
    },
}

/// A flat-array binary tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.nodes.is_empty() {
            return Err(ModelLoadError::invalid("tree has no nodes"));
        }

        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FEATURE_COUNT {
                        return Err(ModelLoadError::invalid(format!(
                            "node {} splits on feature {} but only {} features exist",
                            idx, feature, FEATURE_COUNT
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelLoadError::invalid(format!(
                            "node {} has a non-finite threshold",
                            idx
                        )));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= len {
                            return Err(ModelLoadError::invalid(format!(
                                "node {} has invalid child index {}",
                                idx, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(ModelLoadError::invalid(format!(
                            "leaf {} probability {} is outside [0, 1]",
                            idx, probability
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walk the tree and return the leaf probability for `row`
    pub fn probability(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        let values = row.as_slice();
        let mut idx = 0;

        // Each step moves to a strictly larger index, so a well-formed tree
        // reaches a leaf within `nodes.len()` steps.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = values.get(*feature).ok_or(ModelError::ShapeMismatch {
                        expected: feature + 1,
                        actual: values.len(),
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Malformed(format!(
                        "node index {} out of range",
                        idx
                    )))
                }
            }
        }

        Err(ModelError::Malformed(
            "traversal did not reach a leaf".to_string(),
        ))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// A single decision tree classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub tree: Tree,
}

impl DecisionTree {
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        self.tree.validate()
    }

    pub fn predict_row(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        let p = self.tree.probability(row)?;
        Ok(if p > DECISION_BOUNDARY { 1.0 } else { 0.0 })
    }
}

/// Averaging ensemble of decision trees
///
/// The forest predicts `1` when the mean leaf probability exceeds one half.
/// An exact tie predicts `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<Tree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.trees.is_empty() {
            return Err(ModelLoadError::invalid("random forest has no trees"));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ModelLoadError::invalid(format!("tree {}: {}", idx, e))
            })?;
        }
        Ok(())
    }

    pub fn probability(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Malformed("random forest has no trees".to_string()));
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.probability(row)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    pub fn predict_row(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        let p = self.probability(row)?;
        Ok(if p > DECISION_BOUNDARY { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split on `feature` at `threshold`; left leaf gets `low`, right leaf `high`.
    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { probability: low },
                TreeNode::Leaf { probability: high },
            ],
        }
    }

    fn row_with(idx: usize, value: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[idx] = value;
        FeatureVector::from_columns(values)
    }

    #[test]
    fn test_tree_goes_left_on_equal() {
        let tree = stump(8, 4.0, 0.9, 0.1);
        assert_eq!(tree.probability(&row_with(8, 4.0)).unwrap(), 0.9);
        assert_eq!(tree.probability(&row_with(8, 4.5)).unwrap(), 0.1);
    }

    #[test]
    fn test_decision_tree_prediction() {
        let dt = DecisionTree {
            feature_names: None,
            tree: stump(0, 6.5, 0.2, 0.8),
        };
        assert!(dt.validate().is_ok());
        assert_eq!(dt.predict_row(&row_with(0, 5.0)).unwrap(), 0.0);
        assert_eq!(dt.predict_row(&row_with(0, 7.0)).unwrap(), 1.0);
    }

    #[test]
    fn test_forest_averages_and_ties_predict_zero() {
        let forest = RandomForest {
            feature_names: None,
            trees: vec![stump(0, 6.5, 0.0, 1.0), stump(1, 100.0, 1.0, 0.0)],
        };
        // ph 7 -> 1.0, hardness 0 -> 1.0
        assert_eq!(forest.probability(&row_with(0, 7.0)).unwrap(), 1.0);
        assert_eq!(forest.predict_row(&row_with(0, 7.0)).unwrap(), 1.0);

        // ph 5 -> 0.0, hardness 0 -> 1.0: mean is exactly 0.5
        assert_eq!(forest.probability(&row_with(0, 5.0)).unwrap(), 0.5);
        assert_eq!(forest.predict_row(&row_with(0, 5.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let tree = Tree {
            nodes: vec![
                TreeNode::Leaf { probability: 0.5 },
                TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 2,
                },
                TreeNode::Leaf { probability: 0.5 },
            ],
        };
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_feature_and_child() {
        assert!(stump(FEATURE_COUNT, 1.0, 0.0, 1.0).validate().is_err());

        let mut tree = stump(0, 1.0, 0.0, 1.0);
        tree.nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 1.0,
            left: 1,
            right: 7,
        };
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_probability_and_empty() {
        assert!(stump(0, 1.0, -0.1, 1.0).validate().is_err());
        assert!(Tree { nodes: vec![] }.validate().is_err());
        assert!(RandomForest {
            feature_names: None,
            trees: vec![]
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_unvalidated_cycle_does_not_hang() {
        let tree = Tree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 1.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(matches!(
            tree.probability(&row_with(0, 0.0)),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn test_nodes_deserialize_untagged() {
        let tree: Tree = serde_json::from_str(
            r#"{"nodes": [
                {"feature": 4, "threshold": 333.0, "left": 1, "right": 2},
                {"probability": 0.25},
                {"probability": 0.75}
            ]}"#,
        )
        .unwrap();
        assert_eq!(tree, stump(4, 333.0, 0.25, 0.75));
    }
}
