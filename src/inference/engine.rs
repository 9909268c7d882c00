//! Inference Engine Module
//!
//! [`LeafDetector`] is the immutable handle produced by the startup phase:
//! it owns both networks' weights, the validated class map and the device,
//! and serves every request for the process lifetime. All methods take
//! `&self`; concurrent requests share the handle read-only.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::backend::{self, DefaultBackend};
use crate::classes::ClassMap;
use crate::inference::ranking::{self, PredictionResult};
use crate::model::classifier::{ClassifierModel, GuidedClassifier, GuidedClassifierConfig};
use crate::model::masknet::{MaskNet, MaskNetConfig};
use crate::pipeline;
use crate::utils::error::{LeafsightError, Result};

/// File locations needed to assemble a detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Mask network weight record
    pub mask_weights: PathBuf,

    /// Classifier weight record
    pub classifier_weights: PathBuf,

    /// JSON class map (name -> index)
    pub class_map: PathBuf,
}

impl DetectorConfig {
    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Read-only view over the class map, as exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassList {
    /// Class names ordered by index
    pub classes: Vec<String>,
    /// Number of classes
    pub num_classes: usize,
}

/// Readiness and introspection report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// True once both weight sets are loaded and validated
    pub ready: bool,
    /// Execution device description
    pub device: String,
    /// Number of classes the classifier predicts
    pub num_classes: usize,
}

/// Immutable inference handle: mask network, classifier, class map, device.
pub struct LeafDetector<B: Backend> {
    mask_net: MaskNet<B>,
    classifier: Box<dyn ClassifierModel<B>>,
    classes: ClassMap,
    device: B::Device,
}

impl<B: Backend> LeafDetector<B> {
    /// Assemble a detector from already-loaded parts.
    ///
    /// Validates that the class map cardinality matches the classifier
    /// output width; a mismatch is fatal and the detector never becomes
    /// ready.
    pub fn new(
        mask_net: MaskNet<B>,
        classifier: Box<dyn ClassifierModel<B>>,
        classes: ClassMap,
        device: B::Device,
    ) -> Result<Self> {
        if classifier.num_classes() != classes.len() {
            return Err(LeafsightError::ConfigIntegrity(format!(
                "classifier predicts {} classes but class map declares {}",
                classifier.num_classes(),
                classes.len()
            )));
        }

        info!(
            "detector ready: {} classes on {:?}",
            classes.len(),
            device
        );

        Ok(Self {
            mask_net,
            classifier,
            classes,
            device,
        })
    }

    /// Run the full pipeline on raw image bytes and rank the scores.
    ///
    /// Client-input failures (undecodable bytes) keep their detail; internal
    /// failures are logged in full here and should be reported generically
    /// to callers via [`LeafsightError::public_message`].
    pub fn predict(&self, image_bytes: &[u8]) -> Result<PredictionResult> {
        let result = self.run_pipeline(image_bytes);

        match &result {
            Ok(prediction) => {
                info!(
                    "predicted '{}' at {:.1}%",
                    prediction.prediction,
                    prediction.confidence * 100.0
                );
            }
            Err(err) if err.is_client_error() => {
                warn!("rejected request: {}", err);
            }
            Err(err) => {
                error!("prediction failed: {}", err);
            }
        }

        result
    }

    fn run_pipeline(&self, image_bytes: &[u8]) -> Result<PredictionResult> {
        let fused = pipeline::fused_input(image_bytes, &self.mask_net, &self.device)?;
        let scores = self.classifier.score(fused);

        let logits: Vec<f32> = scores
            .into_data()
            .to_vec()
            .map_err(|e| LeafsightError::Inference(format!("{:?}", e)))?;

        ranking::rank(&logits, &self.classes)
    }

    /// All class names with the total count
    pub fn list_classes(&self) -> ClassList {
        ClassList {
            classes: self.classes.names().to_vec(),
            num_classes: self.classes.len(),
        }
    }

    /// Readiness report. A constructed detector is always ready; failed
    /// validation prevents construction instead.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            ready: true,
            device: format!("{:?}", self.device),
            num_classes: self.classes.len(),
        }
    }

    /// The class map backing this detector
    pub fn classes(&self) -> &ClassMap {
        &self.classes
    }
}

impl LeafDetector<DefaultBackend> {
    /// Load a detector on the default backend from weight files and a class
    /// map, using the reference network configurations.
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        let device = backend::default_device();
        info!("loading models on {}", backend::backend_name());

        let classes = ClassMap::from_file(&config.class_map)?;

        let recorder = CompactRecorder::new();
        let mask_net = MaskNet::new(&MaskNetConfig::new(), &device)
            .load_file(config.mask_weights.clone(), &recorder, &device)
            .map_err(|e| {
                LeafsightError::Model(format!(
                    "failed to load mask network weights: {:?}",
                    e
                ))
            })?;

        let classifier_config = GuidedClassifierConfig::new(classes.len());
        let classifier = GuidedClassifier::new(&classifier_config, &device)
            .load_file(config.classifier_weights.clone(), &recorder, &device)
            .map_err(|e| {
                LeafsightError::Model(format!("failed to load classifier weights: {:?}", e))
            })?;

        Self::new(mask_net, Box::new(classifier), classes, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;

    type TestBackend = NdArray;

    /// Classifier stub returning fixed logits, for exercising the pipeline
    /// without trained weights.
    struct FixedClassifier {
        logits: Vec<f32>,
    }

    impl ClassifierModel<TestBackend> for FixedClassifier {
        fn score(&self, input: Tensor<TestBackend, 4>) -> Tensor<TestBackend, 2> {
            // The fused-input contract is part of what these tests pin down.
            assert_eq!(
                input.dims(),
                [
                    1,
                    4,
                    pipeline::CLASSIFIER_INPUT_SIZE,
                    pipeline::CLASSIFIER_INPUT_SIZE
                ]
            );

            let device = Default::default();
            Tensor::<TestBackend, 1>::from_floats(self.logits.as_slice(), &device)
                .reshape([1, self.logits.len()])
        }

        fn num_classes(&self) -> usize {
            self.logits.len()
        }
    }

    fn class_map(names: &[&str]) -> ClassMap {
        let table: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_string(), idx))
            .collect();
        ClassMap::new(table).unwrap()
    }

    fn test_detector(logits: Vec<f32>, names: &[&str]) -> LeafDetector<TestBackend> {
        let device = Default::default();
        let mask_net = MaskNet::new(&MaskNetConfig::new().with_base_filters(2), &device);
        LeafDetector::new(
            mask_net,
            Box::new(FixedClassifier { logits }),
            class_map(names),
            device,
        )
        .unwrap()
    }

    fn leaf_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([30, (120 + (x + y) % 90) as u8, 40])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    #[test]
    fn test_cardinality_mismatch_rejected_at_construction() {
        let device = Default::default();
        let mask_net = MaskNet::new(&MaskNetConfig::new().with_base_filters(2), &device);

        let err = LeafDetector::new(
            mask_net,
            Box::new(FixedClassifier {
                logits: vec![0.0, 1.0],
            }),
            class_map(&["healthy", "blight", "mosaic"]),
            device,
        )
        .unwrap_err();

        assert!(matches!(err, LeafsightError::ConfigIntegrity(_)));
    }

    #[test]
    fn test_predict_valid_image() {
        let detector = test_detector(vec![0.2, 3.0, 0.8], &["healthy", "blight", "mosaic"]);

        let result = detector.predict(&leaf_jpeg(512, 384)).unwrap();

        assert_eq!(result.prediction, "blight");
        assert!((0.0..=1.0).contains(&result.confidence));
        assert_eq!(result.top_predictions.len(), 3);

        let total: f32 = result.top_predictions.iter().map(|s| s.confidence).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_predict_deterministic() {
        let detector = test_detector(vec![0.5, 0.1, 1.2], &["healthy", "blight", "mosaic"]);
        let bytes = leaf_jpeg(96, 128);

        let first = detector.predict(&bytes).unwrap();
        let second = detector.predict(&bytes).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_predict_corrupt_bytes() {
        let detector = test_detector(vec![0.0, 0.0], &["healthy", "blight"]);

        let err = detector.predict(b"\x00\x01definitely not an image").unwrap_err();
        assert!(matches!(err, LeafsightError::Decode(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_predict_single_class() {
        let detector = test_detector(vec![-2.0], &["healthy"]);

        let result = detector.predict(&leaf_jpeg(64, 64)).unwrap();
        assert_eq!(result.top_predictions.len(), 1);
        assert!((result.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_list_classes_ordered() {
        let detector = test_detector(vec![0.0; 3], &["healthy", "blight", "mosaic"]);

        let list = detector.list_classes();
        assert_eq!(list.num_classes, 3);
        assert_eq!(list.classes, vec!["healthy", "blight", "mosaic"]);
    }

    #[test]
    fn test_health_report() {
        let detector = test_detector(vec![0.0; 2], &["healthy", "blight"]);

        let health = detector.health();
        assert!(health.ready);
        assert_eq!(health.num_classes, 2);
        assert!(!health.device.is_empty());
    }

    #[test]
    fn test_predict_with_bundled_classifier() {
        // End to end with the real classifier architecture at a reduced width.
        let device = Default::default();
        let mask_net = MaskNet::new(&MaskNetConfig::new().with_base_filters(2), &device);
        let classifier =
            GuidedClassifier::new(&GuidedClassifierConfig::new(3).with_base_filters(2), &device);

        let detector = LeafDetector::new(
            mask_net,
            Box::new(classifier),
            class_map(&["healthy", "blight", "mosaic"]),
            device,
        )
        .unwrap();

        let result = detector.predict(&leaf_jpeg(128, 96)).unwrap();
        assert!(["healthy", "blight", "mosaic"].contains(&result.prediction.as_str()));
        assert_eq!(result.top_predictions.len(), 3);
    }

    #[test]
    fn test_detector_config_round_trip() {
        let config = DetectorConfig {
            mask_weights: PathBuf::from("models/mask.mpk"),
            classifier_weights: PathBuf::from("models/classifier.mpk"),
            class_map: PathBuf::from("models/class_map.json"),
        };

        let path = std::env::temp_dir().join("leafsight_detector_config_test.json");
        config.save(&path).unwrap();
        let loaded = DetectorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.mask_weights, config.mask_weights);
        assert_eq!(loaded.class_map, config.class_map);
    }
}
