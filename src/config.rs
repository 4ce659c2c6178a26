//! Model selection and session configuration.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::models::{ModelFamily, Thresholds};

/// Pretrained layout models from [RapidLayout](https://github.com/RapidAI/RapidLayout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayoutModelType {
    PpLayoutTable,
    PpLayoutPublaynet,
    PpLayoutCdla,
    Yolov8nLayoutPaper,
    Yolov8nLayoutReport,
    Yolov8nLayoutPublaynet,
    Yolov8nLayoutGeneral6,
    DoclayoutDocstructbench,
    DoclayoutD4la,
    DoclayoutDocsynth,
}

impl LayoutModelType {
    pub const ALL: [Self; 10] = [
        Self::PpLayoutTable,
        Self::PpLayoutPublaynet,
        Self::PpLayoutCdla,
        Self::Yolov8nLayoutPaper,
        Self::Yolov8nLayoutReport,
        Self::Yolov8nLayoutPublaynet,
        Self::Yolov8nLayoutGeneral6,
        Self::DoclayoutDocstructbench,
        Self::DoclayoutD4la,
        Self::DoclayoutDocsynth,
    ];

    /// Model key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PpLayoutTable => "pp_layout_table",
            Self::PpLayoutPublaynet => "pp_layout_publaynet",
            Self::PpLayoutCdla => "pp_layout_cdla",
            Self::Yolov8nLayoutPaper => "yolov8n_layout_paper",
            Self::Yolov8nLayoutReport => "yolov8n_layout_report",
            Self::Yolov8nLayoutPublaynet => "yolov8n_layout_publaynet",
            Self::Yolov8nLayoutGeneral6 => "yolov8n_layout_general6",
            Self::DoclayoutDocstructbench => "doclayout_docstructbench",
            Self::DoclayoutD4la => "doclayout_d4la",
            Self::DoclayoutDocsynth => "doclayout_docsynth",
        }
    }

    /// File name of this model in the release assets.
    pub fn filename(&self) -> &'static str {
        match self {
            Self::PpLayoutTable => "layout_table.onnx",
            Self::PpLayoutPublaynet => "layout_publaynet.onnx",
            Self::PpLayoutCdla => "layout_cdla.onnx",
            Self::Yolov8nLayoutPaper => "yolov8n_layout_paper.onnx",
            Self::Yolov8nLayoutReport => "yolov8n_layout_report.onnx",
            Self::Yolov8nLayoutPublaynet => "yolov8n_layout_publaynet.onnx",
            Self::Yolov8nLayoutGeneral6 => "yolov8n_layout_general6.onnx",
            Self::DoclayoutDocstructbench => "doclayout_yolo_docstructbench_imgsz1024.onnx",
            Self::DoclayoutD4la | Self::DoclayoutDocsynth => {
                "doclayout_yolo_d4la_imgsz1600_docsynth_pretrain.onnx"
            }
        }
    }
}

impl fmt::Display for LayoutModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::Configuration(format!("unrecognized model type `{s}`")))
    }
}

/// Registry entry for one model key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub family: ModelFamily,
    pub url: String,
}

/// Immutable mapping of model keys to their family and download location.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: HashMap<LayoutModelType, ModelEntry>,
}

impl ModelRegistry {
    pub const RELEASE_URL: &'static str =
        "https://github.com/RapidAI/RapidLayout/releases/download/v0.0.0/";

    /// Registry of every known model, built on first use.
    pub fn builtin() -> &'static ModelRegistry {
        static REGISTRY: OnceLock<ModelRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let family_of = |t: LayoutModelType| match t {
                LayoutModelType::PpLayoutTable
                | LayoutModelType::PpLayoutPublaynet
                | LayoutModelType::PpLayoutCdla => ModelFamily::PpLayout,
                LayoutModelType::Yolov8nLayoutPaper
                | LayoutModelType::Yolov8nLayoutReport
                | LayoutModelType::Yolov8nLayoutPublaynet
                | LayoutModelType::Yolov8nLayoutGeneral6 => ModelFamily::Yolov8,
                LayoutModelType::DoclayoutDocstructbench
                | LayoutModelType::DoclayoutD4la
                | LayoutModelType::DoclayoutDocsynth => ModelFamily::DocLayout,
            };

            LayoutModelType::ALL
                .into_iter()
                .map(|t| {
                    (
                        t,
                        ModelEntry {
                            family: family_of(t),
                            url: format!("{}{}", Self::RELEASE_URL, t.filename()),
                        },
                    )
                })
                .collect()
        })
    }

    pub fn get(&self, model_type: LayoutModelType) -> Option<&ModelEntry> {
        self.entries.get(&model_type)
    }

    /// Family of `model_type`, or [`Error::UnsupportedModel`] when it is not registered.
    pub fn family(&self, model_type: LayoutModelType) -> Result<ModelFamily> {
        self.get(model_type)
            .map(|e| e.family)
            .ok_or_else(|| Error::UnsupportedModel(format!("{model_type} has no registered decoder")))
    }

    pub fn url(&self, model_type: LayoutModelType) -> Option<&str> {
        self.get(model_type).map(|e| e.url.as_str())
    }
}

impl FromIterator<(LayoutModelType, ModelEntry)> for ModelRegistry {
    fn from_iter<I: IntoIterator<Item = (LayoutModelType, ModelEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Settings for a [`LayoutModel`](crate::LayoutModel).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutConfig {
    pub model_type: LayoutModelType,
    pub model_path: PathBuf,
    /// Register the CUDA execution provider.
    pub use_cuda: bool,
    pub device_id: i32,
    pub intra_threads: Option<usize>,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    /// Class names, overriding the list stored in the model file.
    pub labels: Option<Vec<String>>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            model_type: LayoutModelType::PpLayoutCdla,
            model_path: PathBuf::from("models").join(LayoutModelType::PpLayoutCdla.filename()),
            use_cuda: false,
            device_id: 0,
            intra_threads: None,
            conf_threshold: 0.5,
            iou_threshold: 0.5,
            labels: None,
        }
    }
}

impl LayoutConfig {
    pub fn new(model_type: LayoutModelType, model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_type,
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn with_cuda(mut self, device_id: i32) -> Self {
        self.use_cuda = true;
        self.device_id = device_id;
        self
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    pub fn with_thresholds(mut self, conf_threshold: f32, iou_threshold: f32) -> Self {
        self.conf_threshold = conf_threshold;
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Checks the thresholds.
    pub fn thresholds(&self) -> Result<Thresholds> {
        Thresholds::new(self.conf_threshold, self.iou_threshold)
    }
}
