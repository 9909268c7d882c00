//! Classifier Abstraction
//!
//! The disease classifier is consumed as a capability: anything that can
//! score a fused 4-channel tensor into per-class logits. The preprocessing
//! pipeline and ranking logic depend only on the [`ClassifierModel`] trait,
//! so swapping classifier architectures never touches them.
//!
//! [`GuidedClassifier`] is the bundled implementation: a convolutional
//! network whose input stem accepts the 4-channel fused tensor (RGB plus
//! mask). Production deployments load its weights from a record file.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig,
        PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Capability contract for the disease classifier.
///
/// The only property the pipeline relies on is the input shape
/// `[1, 4, size, size]` and the output shape `[1, num_classes]` (raw logits,
/// softmax is applied by the ranking stage).
pub trait ClassifierModel<B: Backend>: Send + Sync {
    /// Score a fused input tensor into per-class logits of shape [batch, num_classes]
    fn score(&self, input: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Number of output classes
    fn num_classes(&self) -> usize;
}

/// Configuration for the bundled mask-guided classifier
#[derive(Config, Debug)]
pub struct GuidedClassifierConfig {
    /// Number of output classes
    pub num_classes: usize,

    /// Number of input channels (4: RGB plus mask)
    #[config(default = "4")]
    pub in_channels: usize,

    /// Filter count of the first block, doubled at each subsequent block
    #[config(default = "32")]
    pub base_filters: usize,

    /// Dropout rate for the classifier head
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Expected input resolution (square)
    #[config(default = "299")]
    pub input_size: usize,
}

/// Convolution, batch normalization and ReLU, optionally followed by a
/// 2x2 max pool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
    pub relu: Relu,
    pub pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    /// Build a block; `with_pool` adds the trailing downsampling pool
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        with_pool: bool,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);

        let pool = if with_pool {
            Some(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init())
        } else {
            None
        };

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.relu.forward(self.bn.forward(self.conv.forward(x)));

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Mask-guided disease classifier
///
/// Four [`ConvBlock`]s with doubling filter counts behind a 4-channel input
/// stem, global average pooling, and a two-layer fully connected head with
/// dropout. The extra stem channel carries the mask probability map.
#[derive(Module, Debug)]
pub struct GuidedClassifier<B: Backend> {
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,
    pub conv4: ConvBlock<B>,

    pub global_pool: AdaptiveAvgPool2d,

    pub fc1: Linear<B>,
    pub dropout: Dropout,
    pub fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> GuidedClassifier<B> {
    /// Initialize the classifier from its configuration
    pub fn new(config: &GuidedClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        let conv1 = ConvBlock::new(config.in_channels, base, true, device);
        let conv2 = ConvBlock::new(base, base * 2, true, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, true, device);
        let conv4 = ConvBlock::new(base * 4, base * 8, true, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let fc1 = LinearConfig::new(base * 8, 256).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc2 = LinearConfig::new(256, config.num_classes).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            global_pool,
            fc1,
            dropout,
            fc2,
            num_classes: config.num_classes,
        }
    }

    /// Map a fused [batch, 4, height, width] input to per-class logits of
    /// shape [batch, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = Relu::new().forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }
}

impl<B: Backend> ClassifierModel<B> for GuidedClassifier<B> {
    fn score(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(input)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}
