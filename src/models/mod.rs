//! Implemented layout model families and their output decoders.

mod doclayout;
mod picodet;
mod yolov8;

pub use doclayout::DocLayoutDecoder;
pub use picodet::PicoDetDecoder;
pub use yolov8::Yolov8Decoder;

use ndarray::{ArrayD, ArrayView3, Ix3};

use crate::error::{Error, Result};
use crate::geometry::{BBox, ModelGeometry};
use crate::transform::{ChannelOrder, ImageTransform, Normalization};

/// Label used for class ids outside the label table.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One decoded region in original image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub score: f32,
    pub class_id: i64,
}

/// Confidence and NMS IoU thresholds, both within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    confidence: f32,
    iou: f32,
}

impl Thresholds {
    pub fn new(confidence: f32, iou: f32) -> Result<Self> {
        for (name, value) in [("confidence threshold", confidence), ("iou threshold", iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Configuration(format!(
                    "{name} {value} is outside [0, 1]"
                )));
            }
        }
        Ok(Self { confidence, iou })
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn iou(&self) -> f32 {
        self.iou
    }
}

/// Class names indexed by class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses the newline separated label list stored in model metadata.
    ///
    /// Line `i` names class `i`, so blank lines inside the list keep their
    /// slot. Only trailing blank lines are dropped.
    pub fn from_metadata(value: &str) -> Self {
        let mut labels: Vec<&str> = value.lines().map(str::trim).collect();
        while labels.last().is_some_and(|l| l.is_empty()) {
            labels.pop();
        }
        Self::new(labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Name for `class_id`, or [`UNKNOWN_LABEL`] when out of range.
    pub fn resolve(&self, class_id: i64) -> &str {
        usize::try_from(class_id)
            .ok()
            .and_then(|i| self.labels.get(i))
            .map_or(UNKNOWN_LABEL, String::as_str)
    }
}

/// Detection head convention shared by a group of models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModelFamily {
    /// PP-PicoDet layout models: per-stride score maps and box distributions.
    PpLayout,
    /// YOLOv8 layout models: one `[batch, 4 + classes, candidates]` tensor.
    Yolov8,
    /// DocLayout-YOLO models: rows of `[x, y, w, h, ..., confidence, class]`.
    DocLayout,
}

impl ModelFamily {
    /// The preprocessing every model of this family was trained with.
    pub fn transform(&self) -> ImageTransform {
        match self {
            Self::PpLayout => {
                ImageTransform::new(608, 800, ChannelOrder::Bgr, Normalization::IMAGENET)
            }
            Self::Yolov8 => ImageTransform::new(640, 640, ChannelOrder::Rgb, Normalization::Scale),
            Self::DocLayout => {
                ImageTransform::new(1024, 1024, ChannelOrder::Rgb, Normalization::Scale)
            }
        }
    }

    pub fn decoder(&self) -> LayoutDecoder {
        match self {
            Self::PpLayout => LayoutDecoder::PicoDet(PicoDetDecoder::default()),
            Self::Yolov8 => LayoutDecoder::Yolov8(Yolov8Decoder),
            Self::DocLayout => LayoutDecoder::DocLayout(DocLayoutDecoder),
        }
    }
}

/// Decoder for one model family's raw outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutDecoder {
    PicoDet(PicoDetDecoder),
    Yolov8(Yolov8Decoder),
    DocLayout(DocLayoutDecoder),
}

impl LayoutDecoder {
    /// Decodes raw model outputs into detections in original image space.
    ///
    /// Candidates are filtered by confidence before any suppression. An empty
    /// result is not an error; a tensor whose shape does not match the
    /// family's layout is.
    pub fn decode(
        &self,
        outputs: &[ArrayD<f32>],
        geometry: &ModelGeometry,
        thresholds: Thresholds,
    ) -> Result<Vec<Detection>> {
        let detections = match self {
            Self::PicoDet(d) => d.decode(outputs, geometry, thresholds)?,
            Self::Yolov8(d) => d.decode(outputs, geometry, thresholds)?,
            Self::DocLayout(d) => d.decode(outputs, geometry, thresholds)?,
        };
        tracing::trace!("decoded {} detections", detections.len());
        Ok(detections)
    }
}

fn first_output(outputs: &[ArrayD<f32>]) -> Result<&ArrayD<f32>> {
    outputs
        .first()
        .ok_or_else(|| Error::ShapeMismatch("model produced no outputs".to_string()))
}

fn as_rank3<'a>(output: &'a ArrayD<f32>, what: &str) -> Result<ArrayView3<'a, f32>> {
    output.view().into_dimensionality::<Ix3>().map_err(|_| {
        Error::ShapeMismatch(format!(
            "expected {what} of rank 3, got shape {:?}",
            output.shape()
        ))
    })
}
