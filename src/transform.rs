//! Image to input tensor conversion.

use image::{imageops, DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{Error, Result};

/// Channel order of the planar tensor handed to the model.
///
/// Decoded images are RGB; `Bgr` swaps the red and blue planes for models that
/// were trained on BGR input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Per-pixel value mapping applied after resizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// `pixel / 255`
    Scale,
    /// `(pixel / 255 - mean) / std`, per channel in RGB order.
    MeanStd { mean: [f32; 3], std: [f32; 3] },
}

impl Normalization {
    pub const IMAGENET: Self = Self::MeanStd {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    fn apply(&self, value: u8, rgb_channel: usize) -> f32 {
        let v = value as f32 / 255.0;
        match self {
            Self::Scale => v,
            Self::MeanStd { mean, std } => (v - mean[rgb_channel]) / std[rgb_channel],
        }
    }
}

/// Stretch-resizes an image to a fixed size and lays it out as `[1, 3, H, W]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    width: u32,
    height: u32,
    channel_order: ChannelOrder,
    normalization: Normalization,
}

impl ImageTransform {
    pub fn new(width: u32, height: u32, channel_order: ChannelOrder, normalization: Normalization) -> Self {
        Self {
            width,
            height,
            channel_order,
            normalization,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resizes (bilinear, aspect ratio ignored), normalizes and permutes `img`
    /// into a planar batch of one. The input image is not modified.
    pub fn apply(&self, img: &DynamicImage) -> Result<Array4<f32>> {
        let (img_width, img_height) = img.dimensions();
        if img_width == 0 || img_height == 0 {
            return Err(Error::EmptyImage {
                width: img_width,
                height: img_height,
            });
        }

        let resized = img
            .resize_exact(self.width, self.height, imageops::FilterType::Triangle)
            .into_rgb8();

        let mut input = Array4::zeros((1, 3, self.height as usize, self.width as usize));

        for pixel in resized.enumerate_pixels() {
            let x = pixel.0 as usize;
            let y = pixel.1 as usize;
            for (rgb_channel, &value) in pixel.2 .0.iter().enumerate() {
                let plane = match self.channel_order {
                    ChannelOrder::Rgb => rgb_channel,
                    ChannelOrder::Bgr => 2 - rgb_channel,
                };
                input[[0, plane, y, x]] = self.normalization.apply(value, rgb_channel);
            }
        }

        Ok(input)
    }
}
