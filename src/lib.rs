//! # Overview
//!
//! Document layout detection with the [RapidLayout](https://github.com/RapidAI/RapidLayout)
//! model zoo in ONNX format through onnxruntime (bindings via [ort](https://github.com/pykeio/ort)).
//!
//! Three detection head conventions are decoded into one result shape:
//! PP-PicoDet layout models, YOLOv8 layout models and DocLayout-YOLO models.
//!
//! ```no_run
//! use rapidlayout_ort::{LayoutConfig, LayoutModel, LayoutModelType};
//!
//! # fn main() -> rapidlayout_ort::Result<()> {
//! let config = LayoutConfig::new(LayoutModelType::Yolov8nLayoutPaper, "models/yolov8n_layout_paper.onnx");
//! let model = LayoutModel::new(&config)?;
//! let img = rapidlayout_ort::image::DynamicImage::new_rgb8(640, 480);
//! let result = model.predict(&img)?;
//! for (bbox, score, class_name) in result.iter() {
//!     println!("{class_name} {score:.3} {bbox:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
pub mod geometry;
mod layout_element;
pub mod models;
pub mod nms;
mod pipeline;
mod result;
pub mod transform;
mod utils;

pub use config::{LayoutConfig, LayoutModelType, ModelEntry, ModelRegistry};
pub use engine::{InferenceEngine, OrtEngine, LABELS_METADATA_KEY};
pub use error::{Error, Result};
pub use layout_element::LayoutElement;
pub use models::{Detection, LabelTable, ModelFamily, Thresholds};
pub use pipeline::LayoutModel;
pub use result::LayoutResult;

// re-exports
pub use geo_types;
pub use image;
pub use ndarray;
pub use ort;
