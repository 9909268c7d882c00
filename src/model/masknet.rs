//! Mask Network Architecture
//!
//! This module implements the encoder-decoder segmentation network that maps
//! a leaf photograph to a single-channel saliency map. The map is fused into
//! the classifier input as a fourth channel, steering the classifier toward
//! the leaf and lesion regions.
//!
//! The network is a 4-level U-shaped encoder-decoder: each encoder stage is a
//! pair of same-padding 3x3 convolutions followed by 2x2 max pooling, the
//! decoder mirrors it with transposed convolutions and skip concatenations,
//! and a 1x1 convolution produces the single-channel output. The output is
//! raw logits; the preprocessing pipeline applies the sigmoid.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the mask network
#[derive(Config, Debug)]
pub struct MaskNetConfig {
    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Number of output channels (1 for a saliency map)
    #[config(default = "1")]
    pub out_channels: usize,

    /// Channel width of the first encoder stage; later stages double it
    #[config(default = "32")]
    pub base_filters: usize,

    /// Expected input resolution (square), must be divisible by 16
    #[config(default = "256")]
    pub input_size: usize,
}

/// A pair of same-padding 3x3 convolutions, each followed by ReLU
#[derive(Module, Debug)]
pub struct ConvPair<B: Backend> {
    pub conv1: Conv2d<B>,
    pub conv2: Conv2d<B>,
    pub relu: Relu,
}

impl<B: Backend> ConvPair<B> {
    /// Create a new convolution pair
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        Self {
            conv1,
            conv2,
            relu: Relu::new(),
        }
    }

    /// Forward pass through the pair
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.relu.forward(self.conv1.forward(x));
        self.relu.forward(self.conv2.forward(x))
    }
}

/// Encoder-decoder mask network
///
/// Architecture (base_filters = 32):
/// - Encoder: conv pairs at 32, 64, 128, 256 channels, 2x2 max pool between stages
/// - Bottleneck: conv pair at 512 channels
/// - Decoder: 2x2 transposed convolutions halving channels, skip concatenation
///   with the matching encoder feature map, then a conv pair back to the skip width
/// - Head: 1x1 convolution to a single logit channel
#[derive(Module, Debug)]
pub struct MaskNet<B: Backend> {
    pub down1: ConvPair<B>,
    pub down2: ConvPair<B>,
    pub down3: ConvPair<B>,
    pub down4: ConvPair<B>,
    pub bottleneck: ConvPair<B>,

    pub up1: ConvTranspose2d<B>,
    pub dec1: ConvPair<B>,
    pub up2: ConvTranspose2d<B>,
    pub dec2: ConvPair<B>,
    pub up3: ConvTranspose2d<B>,
    pub dec3: ConvPair<B>,
    pub up4: ConvTranspose2d<B>,
    pub dec4: ConvPair<B>,

    pub head: Conv2d<B>,

    pool: MaxPool2d,
}

impl<B: Backend> MaskNet<B> {
    /// Create a new mask network from configuration
    pub fn new(config: &MaskNetConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        let down1 = ConvPair::new(config.in_channels, base, device);
        let down2 = ConvPair::new(base, base * 2, device);
        let down3 = ConvPair::new(base * 2, base * 4, device);
        let down4 = ConvPair::new(base * 4, base * 8, device);
        let bottleneck = ConvPair::new(base * 8, base * 16, device);

        let up1 = upsample(base * 16, base * 8, device);
        let dec1 = ConvPair::new(base * 16, base * 8, device);
        let up2 = upsample(base * 8, base * 4, device);
        let dec2 = ConvPair::new(base * 8, base * 4, device);
        let up3 = upsample(base * 4, base * 2, device);
        let dec3 = ConvPair::new(base * 4, base * 2, device);
        let up4 = upsample(base * 2, base, device);
        let dec4 = ConvPair::new(base * 2, base, device);

        let head = Conv2dConfig::new([base, config.out_channels], [1, 1]).init(device);

        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            down1,
            down2,
            down3,
            down4,
            bottleneck,
            up1,
            dec1,
            up2,
            dec2,
            up3,
            dec3,
            up4,
            dec4,
            head,
            pool,
        }
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width],
    ///   height and width divisible by 16
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, 1, height, width]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let c1 = self.down1.forward(x);
        let c2 = self.down2.forward(self.pool.forward(c1.clone()));
        let c3 = self.down3.forward(self.pool.forward(c2.clone()));
        let c4 = self.down4.forward(self.pool.forward(c3.clone()));
        let c5 = self.bottleneck.forward(self.pool.forward(c4.clone()));

        // Upsampled features first, skip second; the conv pairs are trained
        // against this channel order.
        let x = self.dec1.forward(Tensor::cat(vec![self.up1.forward(c5), c4], 1));
        let x = self.dec2.forward(Tensor::cat(vec![self.up2.forward(x), c3], 1));
        let x = self.dec3.forward(Tensor::cat(vec![self.up3.forward(x), c2], 1));
        let x = self.dec4.forward(Tensor::cat(vec![self.up4.forward(x), c1], 1));

        self.head.forward(x)
    }
}

/// Learned 2x upsampling: 2x2 transposed convolution with stride 2
fn upsample<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    device: &B::Device,
) -> ConvTranspose2d<B> {
    ConvTranspose2dConfig::new([in_channels, out_channels], [2, 2])
        .with_stride([2, 2])
        .init(device)
}
