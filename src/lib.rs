//! # Leafsight
//!
//! Mask-guided leaf disease classification inference core, built with the
//! Burn framework.
//!
//! An uploaded leaf photograph is first passed through an encoder-decoder
//! segmentation network that isolates the leaf and lesion region as a
//! probability map. That map is fused as a fourth input channel into the
//! disease classifier, whose scores are ranked into a label, a confidence
//! and a top-k list.
//!
//! ## Modules
//!
//! - `model`: the mask network architecture and the classifier capability
//! - `pipeline`: deterministic preprocessing and channel fusion
//! - `inference`: the detector handle, prediction ranking, health reporting
//! - `classes`: the bijective class name/index map
//! - `backend`: Burn backend and device selection
//! - `utils`: error types and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leafsight::inference::{DetectorConfig, LeafDetector};
//!
//! let config = DetectorConfig::load("detector.json".as_ref())?;
//! let detector = LeafDetector::load(&config)?;
//!
//! let result = detector.predict(&image_bytes)?;
//! println!("{} ({:.1}%)", result.prediction, result.confidence * 100.0);
//! ```

pub mod backend;
pub mod classes;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod utils;

// Re-export commonly used items for convenience
pub use classes::ClassMap;
pub use inference::engine::{ClassList, DetectorConfig, HealthReport, LeafDetector};
pub use inference::ranking::{ClassScore, PredictionResult};
pub use model::classifier::{ClassifierModel, GuidedClassifier, GuidedClassifierConfig};
pub use model::masknet::{MaskNet, MaskNetConfig};
pub use pipeline::{CLASSIFIER_INPUT_SIZE, MASK_INPUT_SIZE};
pub use utils::error::{LeafsightError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
