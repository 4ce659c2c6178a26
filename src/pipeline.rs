use std::time::Instant;

use image::GenericImageView;
use ndarray::ArrayD;

use crate::config::{LayoutConfig, LayoutModelType, ModelRegistry};
use crate::engine::{InferenceEngine, OrtEngine};
use crate::error::Result;
use crate::geometry::ModelGeometry;
use crate::models::{LabelTable, LayoutDecoder, ModelFamily, Thresholds};
use crate::transform::ImageTransform;
use crate::LayoutResult;

/// A layout detection session: preprocessing, inference and decoding for one model.
pub struct LayoutModel<E = OrtEngine> {
    model_type: LayoutModelType,
    family: ModelFamily,
    engine: E,
    transform: ImageTransform,
    decoder: LayoutDecoder,
    labels: LabelTable,
    thresholds: Thresholds,
}

impl LayoutModel<OrtEngine> {
    /// Construct a [`LayoutModel`] from a model file, resolving the model type
    /// through the built-in registry.
    pub fn new(config: &LayoutConfig) -> Result<Self> {
        Self::with_registry(config, ModelRegistry::builtin())
    }

    pub fn with_registry(config: &LayoutConfig, registry: &ModelRegistry) -> Result<Self> {
        check(config, registry)?;
        let engine = OrtEngine::from_config(config)?;
        Self::from_engine(config, registry, engine)
    }
}

impl<E: InferenceEngine> LayoutModel<E> {
    /// Construct a [`LayoutModel`] around an already loaded engine.
    ///
    /// Labels come from `config.labels` when set, otherwise from the engine.
    pub fn from_engine(config: &LayoutConfig, registry: &ModelRegistry, engine: E) -> Result<Self> {
        let (thresholds, family) = check(config, registry)?;

        let labels = match &config.labels {
            Some(labels) => LabelTable::new(labels.iter().cloned()),
            None => engine.labels()?.unwrap_or_else(|| {
                tracing::warn!(
                    "{} has no embedded class names, every region will be labelled Unknown",
                    config.model_type
                );
                LabelTable::default()
            }),
        };
        tracing::info!("{} contains {:?}", config.model_type, labels.labels());

        Ok(Self {
            model_type: config.model_type,
            family,
            engine,
            transform: family.transform(),
            decoder: family.decoder(),
            labels,
            thresholds,
        })
    }

    pub fn model_type(&self) -> LayoutModelType {
        self.model_type
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Predict layout regions on `img`.
    pub fn predict(&self, img: &image::DynamicImage) -> Result<LayoutResult> {
        let timer = CallTimer::start(self.model_type);
        let (img_width, img_height) = img.dimensions();

        let input = self.transform.apply(img)?;

        let outputs = self.engine.run(input).map_err(|err| {
            tracing::warn!("{} inference failed: {err}", self.model_type);
            err
        })?;

        self.finish(&outputs, img_width, img_height, &timer)
    }

    /// Decode outputs this model produced elsewhere for an image of the given size.
    pub fn decode_outputs(
        &self,
        outputs: &[ArrayD<f32>],
        img_width: u32,
        img_height: u32,
    ) -> Result<LayoutResult> {
        let timer = CallTimer::start(self.model_type);
        self.finish(outputs, img_width, img_height, &timer)
    }

    fn finish(
        &self,
        outputs: &[ArrayD<f32>],
        img_width: u32,
        img_height: u32,
        timer: &CallTimer,
    ) -> Result<LayoutResult> {
        let geometry = ModelGeometry::new(
            self.transform.width(),
            self.transform.height(),
            img_width,
            img_height,
        );
        let detections = self.decoder.decode(outputs, &geometry, self.thresholds)?;

        Ok(LayoutResult::from_detections(
            &detections,
            &self.labels,
            timer.elapsed(),
        ))
    }
}

fn check(config: &LayoutConfig, registry: &ModelRegistry) -> Result<(Thresholds, ModelFamily)> {
    let thresholds = config.thresholds()?;
    let family = registry.family(config.model_type)?;
    Ok((thresholds, family))
}

/// Measures one call and logs its duration when dropped, on success and failure alike.
struct CallTimer {
    model_type: LayoutModelType,
    start: Instant,
}

impl CallTimer {
    fn start(model_type: LayoutModelType) -> Self {
        Self {
            model_type,
            start: Instant::now(),
        }
    }

    /// Seconds since start.
    fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        tracing::debug!(
            model = %self.model_type,
            elapsed = self.elapsed(),
            "layout call finished"
        );
    }
}
