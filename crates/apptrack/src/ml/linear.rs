//! Bag-of-words linear classifier exported to JSON.
//!
//! The exported model carries its label names, the token vocabulary, one weight row
//! per label and a bias per label. Features are sublinear term frequencies,
//! L2-normalised; confidence is the softmax probability of the best label.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::PredictError;

use super::predictor::{MessagePredictor, Prediction};

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    labels: Vec<String>,
    vocabulary: HashMap<String, usize>,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct LinearPredictor {
    labels: Vec<String>,
    vocabulary: HashMap<String, usize>,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl LinearPredictor {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PredictError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PredictError::ModelRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            labels = model.labels.len(),
            vocabulary = model.vocabulary.len(),
            "Linear model loaded"
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self, PredictError> {
        let file: LinearModelFile = serde_json::from_str(content)?;
        Self::validate(&file)?;
        Ok(Self {
            labels: file.labels,
            vocabulary: file.vocabulary,
            weights: file.weights,
            bias: file.bias,
        })
    }

    fn validate(file: &LinearModelFile) -> Result<(), PredictError> {
        if file.labels.is_empty() {
            return Err(PredictError::InvalidModel("model has no labels".to_string()));
        }
        if file.weights.len() != file.labels.len() || file.bias.len() != file.labels.len() {
            return Err(PredictError::InvalidModel(format!(
                "expected {} weight rows and biases, found {} and {}",
                file.labels.len(),
                file.weights.len(),
                file.bias.len()
            )));
        }
        let width = file.vocabulary.values().max().map_or(0, |max| max + 1);
        if let Some(row) = file.weights.iter().position(|row| row.len() < width) {
            return Err(PredictError::InvalidModel(format!(
                "weight row {} is shorter than the vocabulary ({} < {})",
                row,
                file.weights[row].len(),
                width
            )));
        }
        Ok(())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn features(&self, subject: &str, body: &str) -> Vec<(usize, f32)> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokenize(subject).chain(tokenize(body)) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let mut features: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, count)| (index, 1.0 + count.ln()))
            .collect();
        let norm = features.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, value) in &mut features {
                *value /= norm;
            }
        }
        features
    }
}

impl MessagePredictor for LinearPredictor {
    fn predict(&self, subject: &str, body: &str) -> Result<Prediction, PredictError> {
        let features = self.features(subject, body);

        let scores: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| bias + features.iter().map(|(i, v)| row[*i] * v).sum::<f32>())
            .collect();

        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if !max.is_finite() {
            return Err(PredictError::Inference(
                "non-finite score in linear model".to_string(),
            ));
        }
        let exp: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exp.iter().sum();

        let (best, best_exp) = exp
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| PredictError::Inference("empty score vector".to_string()))?;

        Ok(Prediction::new(self.labels[best].clone(), best_exp / total))
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/// Lowercased alphanumeric runs of two or more characters.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
}
