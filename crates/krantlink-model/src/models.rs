//! The model variants behind the [`Model`](crate::Model) trait and their
//! JSON weight-file format.
//!
//! All four share the same contract: an ordered feature list and a
//! `predict` that maps an example to a probability. The weight file carries
//! a `model` discriminator:
//!
//! ```json
//! { "model": "logistic_regression",
//!   "features": ["match_txt_date", "..."],
//!   "coefficients": [0.3, ...],
//!   "intercept": -0.1 }
//! ```

use serde::Deserialize;

use crate::{FeatureSchema, Model, ModelError};

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// One dense layer: `weights[out][in]` and a bias per output unit.
#[derive(Debug, Clone, Deserialize)]
pub struct Layer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl Layer {
    fn out_dim(&self) -> usize {
        self.weights.len()
    }

    fn in_dim(&self) -> Option<usize> {
        self.weights.first().map(Vec::len)
    }

    fn forward(&self, input: &[f64], relu: bool) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let z = dot(row, input) + b;
                if relu { z.max(0.0) } else { z }
            })
            .collect()
    }

    fn validate(&self, expected_in: usize, label: &str) -> Result<(), ModelError> {
        if self.out_dim() != self.bias.len() {
            return Err(ModelError::Shape(format!(
                "{label}: {} weight rows but {} bias values",
                self.out_dim(),
                self.bias.len()
            )));
        }
        for row in &self.weights {
            if row.len() != expected_in {
                return Err(ModelError::Shape(format!(
                    "{label}: expected input width {expected_in}, found {}",
                    row.len()
                )));
            }
        }
        Ok(())
    }
}

fn validate_chain(layers: &[Layer], mut in_dim: usize, label: &str) -> Result<usize, ModelError> {
    if layers.is_empty() {
        return Err(ModelError::Shape(format!("{label}: no layers")));
    }
    for (i, layer) in layers.iter().enumerate() {
        layer.validate(in_dim, &format!("{label} layer {i}"))?;
        in_dim = layer.out_dim();
    }
    Ok(in_dim)
}

/// σ(w·x + b).
pub struct LogisticRegression {
    schema: FeatureSchema,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(
        schema: FeatureSchema,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, ModelError> {
        if coefficients.len() != schema.len() {
            return Err(ModelError::Shape(format!(
                "{} coefficients for {} features",
                coefficients.len(),
                schema.len()
            )));
        }
        Ok(Self {
            schema,
            coefficients,
            intercept,
        })
    }
}

impl Model for LogisticRegression {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, example: &[f64]) -> f64 {
        sigmoid(dot(&self.coefficients, example) + self.intercept)
    }
}

/// A linear SVM decision value passed through Platt scaling:
/// σ(A·(w·x + b) + B).
pub struct LinearSvm {
    schema: FeatureSchema,
    coefficients: Vec<f64>,
    intercept: f64,
    platt_a: f64,
    platt_b: f64,
}

impl LinearSvm {
    pub fn new(
        schema: FeatureSchema,
        coefficients: Vec<f64>,
        intercept: f64,
        platt_a: f64,
        platt_b: f64,
    ) -> Result<Self, ModelError> {
        if coefficients.len() != schema.len() {
            return Err(ModelError::Shape(format!(
                "{} coefficients for {} features",
                coefficients.len(),
                schema.len()
            )));
        }
        Ok(Self {
            schema,
            coefficients,
            intercept,
            platt_a,
            platt_b,
        })
    }
}

impl Model for LinearSvm {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, example: &[f64]) -> f64 {
        let decision = dot(&self.coefficients, example) + self.intercept;
        sigmoid(self.platt_a * decision + self.platt_b)
    }
}

/// Feed-forward net: ReLU hidden layers, sigmoid output unit.
pub struct NeuralNet {
    schema: FeatureSchema,
    layers: Vec<Layer>,
}

impl NeuralNet {
    pub fn new(schema: FeatureSchema, layers: Vec<Layer>) -> Result<Self, ModelError> {
        let out = validate_chain(&layers, schema.len(), "net")?;
        if out != 1 {
            return Err(ModelError::Shape(format!("final layer has width {out}, expected 1")));
        }
        Ok(Self { schema, layers })
    }
}

impl Model for NeuralNet {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, example: &[f64]) -> f64 {
        let mut activation = example.to_vec();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            activation = layer.forward(&activation, i < last);
        }
        sigmoid(activation[0])
    }
}

/// Two dense branches over a partition of the schema, concatenated and fed
/// through merge layers to a sigmoid output.
pub struct BranchingNeuralNet {
    schema: FeatureSchema,
    // Positions into the example vector, one list per branch.
    branch_inputs: [Vec<usize>; 2],
    branch_layers: [Vec<Layer>; 2],
    merge_layers: Vec<Layer>,
}

impl BranchingNeuralNet {
    pub fn new(
        schema: FeatureSchema,
        branch_features: [Vec<String>; 2],
        branch_layers: [Vec<Layer>; 2],
        merge_layers: Vec<Layer>,
    ) -> Result<Self, ModelError> {
        let positions: std::collections::HashMap<&str, usize> = schema
            .iter()
            .enumerate()
            .map(|(i, f)| (f.as_str(), i))
            .collect();

        let mut seen = vec![false; schema.len()];
        let mut branch_inputs: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        for (b, names) in branch_features.iter().enumerate() {
            for name in names {
                let Some(&pos) = positions.get(name.as_str()) else {
                    return Err(ModelError::UnknownFeature(name.clone()));
                };
                if seen[pos] {
                    return Err(ModelError::DuplicateFeature(name.clone()));
                }
                seen[pos] = true;
                branch_inputs[b].push(pos);
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            let name = schema.iter().nth(missing).map(|f| f.as_str()).unwrap_or("?");
            return Err(ModelError::Shape(format!(
                "feature {name} not assigned to a branch"
            )));
        }

        let mut merged_width = 0;
        for (b, layers) in branch_layers.iter().enumerate() {
            merged_width += validate_chain(layers, branch_inputs[b].len(), &format!("branch {b}"))?;
        }
        let out = validate_chain(&merge_layers, merged_width, "merge")?;
        if out != 1 {
            return Err(ModelError::Shape(format!("final layer has width {out}, expected 1")));
        }

        Ok(Self {
            schema,
            branch_inputs,
            branch_layers,
            merge_layers,
        })
    }
}

impl Model for BranchingNeuralNet {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, example: &[f64]) -> f64 {
        let mut merged = Vec::new();
        for (inputs, layers) in self.branch_inputs.iter().zip(&self.branch_layers) {
            let mut activation: Vec<f64> = inputs.iter().map(|&i| example[i]).collect();
            for layer in layers {
                activation = layer.forward(&activation, true);
            }
            merged.extend(activation);
        }
        let last = self.merge_layers.len() - 1;
        for (i, layer) in self.merge_layers.iter().enumerate() {
            merged = layer.forward(&merged, i < last);
        }
        sigmoid(merged[0])
    }
}

#[derive(Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
enum ModelFile {
    LogisticRegression {
        features: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    LinearSvm {
        features: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
        platt_a: f64,
        platt_b: f64,
    },
    NeuralNet {
        features: Vec<String>,
        layers: Vec<Layer>,
    },
    BranchingNeuralNet {
        features: Vec<String>,
        branches: [BranchFile; 2],
        merge_layers: Vec<Layer>,
    },
}

#[derive(Deserialize)]
struct BranchFile {
    features: Vec<String>,
    layers: Vec<Layer>,
}

pub(crate) fn from_json(json: &str) -> Result<Box<dyn Model>, ModelError> {
    let file: ModelFile = serde_json::from_str(json)?;
    match file {
        ModelFile::LogisticRegression {
            features,
            coefficients,
            intercept,
        } => {
            let schema = FeatureSchema::from_names(&features)?;
            Ok(Box::new(LogisticRegression::new(schema, coefficients, intercept)?))
        }
        ModelFile::LinearSvm {
            features,
            coefficients,
            intercept,
            platt_a,
            platt_b,
        } => {
            let schema = FeatureSchema::from_names(&features)?;
            Ok(Box::new(LinearSvm::new(
                schema,
                coefficients,
                intercept,
                platt_a,
                platt_b,
            )?))
        }
        ModelFile::NeuralNet { features, layers } => {
            let schema = FeatureSchema::from_names(&features)?;
            Ok(Box::new(NeuralNet::new(schema, layers)?))
        }
        ModelFile::BranchingNeuralNet {
            features,
            branches,
            merge_layers,
        } => {
            let schema = FeatureSchema::from_names(&features)?;
            let [a, b] = branches;
            Ok(Box::new(BranchingNeuralNet::new(
                schema,
                [a.features, b.features],
                [a.layers, b.layers],
                merge_layers,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema2() -> FeatureSchema {
        FeatureSchema::from_names(&["match_txt_date", "candidate_lang"]).unwrap()
    }

    #[test]
    fn logistic_regression_predicts_sigmoid() {
        let model = LogisticRegression::new(schema2(), vec![1.0, 2.0], 0.5).unwrap();
        let p = model.predict(&[1.0, -1.0]);
        // 1*1 + 2*(-1) + 0.5 = -0.5
        assert!((p - sigmoid(-0.5)).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn logistic_regression_rejects_width_mismatch() {
        assert!(matches!(
            LogisticRegression::new(schema2(), vec![1.0], 0.0),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn svm_applies_platt_scaling() {
        let model = LinearSvm::new(schema2(), vec![1.0, 0.0], 0.0, -2.0, 0.1).unwrap();
        let p = model.predict(&[0.5, 0.0]);
        assert!((p - sigmoid(-2.0 * 0.5 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn neural_net_forward_pass() {
        // Hidden: 2 -> 2 ReLU, output 2 -> 1
        let layers = vec![
            Layer {
                weights: vec![vec![1.0, 0.0], vec![-1.0, 1.0]],
                bias: vec![0.0, 0.0],
            },
            Layer {
                weights: vec![vec![1.0, 1.0]],
                bias: vec![0.0],
            },
        ];
        let model = NeuralNet::new(schema2(), layers).unwrap();
        // input [1, 2]: hidden = relu([1, 1]) = [1, 1]; out = 2; sigmoid(2)
        let p = model.predict(&[1.0, 2.0]);
        assert!((p - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn neural_net_rejects_broken_chain() {
        let layers = vec![Layer {
            weights: vec![vec![1.0, 1.0, 1.0]],
            bias: vec![0.0],
        }];
        assert!(matches!(
            NeuralNet::new(schema2(), layers),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn branching_net_requires_full_partition() {
        let layers = |n| {
            vec![Layer {
                weights: vec![vec![1.0; n]],
                bias: vec![0.0],
            }]
        };
        let err = BranchingNeuralNet::new(
            schema2(),
            [vec!["match_txt_date".to_string()], vec![]],
            [layers(1), vec![Layer { weights: vec![vec![]], bias: vec![0.0] }]],
            layers(2),
        );
        assert!(err.is_err());
    }

    #[test]
    fn loads_weight_file_and_rejects_unknown_feature() {
        let good = r#"{
            "model": "logistic_regression",
            "features": ["match_txt_date", "candidate_lang"],
            "coefficients": [0.5, -0.5],
            "intercept": 0.0
        }"#;
        let model = from_json(good).unwrap();
        assert_eq!(model.schema().len(), 2);

        let bad = r#"{
            "model": "logistic_regression",
            "features": ["match_txt_date", "mystery"],
            "coefficients": [0.5, -0.5],
            "intercept": 0.0
        }"#;
        assert!(matches!(
            from_json(bad),
            Err(ModelError::UnknownFeature(name)) if name == "mystery"
        ));
    }

    #[test]
    fn loads_branching_weight_file() {
        let json = r#"{
            "model": "branching_neural_net",
            "features": ["match_txt_date", "candidate_lang", "entity_quotes"],
            "branches": [
                {
                    "features": ["match_txt_date"],
                    "layers": [{"weights": [[1.0]], "bias": [0.0]}]
                },
                {
                    "features": ["candidate_lang", "entity_quotes"],
                    "layers": [{"weights": [[0.5, 0.5]], "bias": [0.1]}]
                }
            ],
            "merge_layers": [{"weights": [[1.0, 1.0]], "bias": [0.0]}]
        }"#;
        let model = from_json(json).unwrap();
        let p = model.predict(&[1.0, 1.0, 1.0]);
        // branch a: relu(1) = 1; branch b: relu(0.5 + 0.5 + 0.1) = 1.1
        // merge: 2.1 -> sigmoid
        assert!((p - sigmoid(2.1)).abs() < 1e-12);
    }
}
