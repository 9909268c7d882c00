//! Prediction Ranking Module
//!
//! Converts the classifier's raw per-class scores into the user-facing
//! result: a probability distribution, the arg-max label with its
//! confidence, and the top-k ranked classes.
//!
//! Every step here is pure and deterministic. Ties are always broken toward
//! the lowest class index so repeated calls produce identical results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::classes::ClassMap;
use crate::utils::error::{LeafsightError, Result};

/// Number of ranked entries returned (bounded by the class count)
pub const TOP_K: usize = 3;

/// A single ranked class with its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    /// Class name
    #[serde(rename = "class")]
    pub name: String,

    /// Probability assigned to this class
    pub confidence: f32,
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class name (arg-max of the distribution)
    pub prediction: String,

    /// Probability of the predicted class
    pub confidence: f32,

    /// Top-k classes by descending probability; the first entry is the prediction
    pub top_predictions: Vec<ClassScore>,
}

/// Numerically stable softmax over a raw score vector
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the maximum probability; ties resolve to the lowest index
fn arg_max(probs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &p) in probs.iter().enumerate().skip(1) {
        if p > probs[best] {
            best = i;
        }
    }
    best
}

/// Rank raw classifier scores into a [`PredictionResult`].
///
/// The score vector length must match the class map cardinality; a mismatch
/// or an index without a name is a configuration-integrity error, not a
/// per-request failure.
pub fn rank(logits: &[f32], classes: &ClassMap) -> Result<PredictionResult> {
    if logits.len() != classes.len() {
        return Err(LeafsightError::ConfigIntegrity(format!(
            "classifier produced {} scores for {} classes",
            logits.len(),
            classes.len()
        )));
    }
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(LeafsightError::Inference(
            "classifier produced non-finite scores".to_string(),
        ));
    }

    let probs = softmax(logits);

    let predicted = arg_max(&probs);
    let prediction = classes
        .name(predicted)
        .ok_or_else(|| {
            LeafsightError::ConfigIntegrity(format!("no class name for index {}", predicted))
        })?
        .to_string();

    // Descending probability, ascending index on exact ties.
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| {
        probs[b]
            .partial_cmp(&probs[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let top_predictions = order
        .iter()
        .take(TOP_K.min(classes.len()))
        .map(|&idx| {
            let name = classes.name(idx).ok_or_else(|| {
                LeafsightError::ConfigIntegrity(format!("no class name for index {}", idx))
            })?;
            Ok(ClassScore {
                name: name.to_string(),
                confidence: probs[idx],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PredictionResult {
        prediction,
        confidence: probs[predicted],
        top_predictions,
    })
}
