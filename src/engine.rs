//! The boundary to the runtime that executes a model graph.

use std::path::Path;

use ndarray::{Array4, ArrayD};
use ort::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch, Session, SessionBuilder};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::models::LabelTable;

/// Metadata key holding the newline separated class names.
pub const LABELS_METADATA_KEY: &str = "character";

/// Runs a model on one `[1, C, H, W]` input and returns every output tensor in
/// model order.
pub trait InferenceEngine {
    fn run(&self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>>;

    /// Class names embedded in the model, if any.
    fn labels(&self) -> Result<Option<LabelTable>> {
        Ok(None)
    }
}

/// [`InferenceEngine`] over an onnxruntime session.
pub struct OrtEngine {
    session: Session,
}

impl OrtEngine {
    /// Loads the model at `config.model_path` with the execution providers and
    /// threading the config asks for.
    pub fn from_config(config: &LayoutConfig) -> Result<Self> {
        let mut providers: Vec<ExecutionProviderDispatch> = vec![];
        if config.use_cuda {
            providers.push(
                CUDAExecutionProvider::default()
                    .with_device_id(config.device_id)
                    .build(),
            );
        }
        providers.push(CPUExecutionProvider::default().build());

        let mut builder = Session::builder()?.with_execution_providers(providers)?;
        if let Some(threads) = config.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }

        Self::from_file(builder, &config.model_path)
    }

    /// Loads a model file with a caller-configured session builder.
    pub fn from_file(session_builder: SessionBuilder, path: impl AsRef<Path>) -> Result<Self> {
        let session = session_builder.commit_from_file(path)?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl InferenceEngine for OrtEngine {
    fn run(&self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>> {
        let input_name = &self.session.inputs[0].name;

        let outputs = self.session.run(ort::inputs![input_name => input]?)?;

        (0..self.session.outputs.len())
            .map(|i| Ok(outputs[i].try_extract_tensor::<f32>()?.into_owned()))
            .collect()
    }

    fn labels(&self) -> Result<Option<LabelTable>> {
        let metadata = self.session.metadata()?;
        Ok(metadata
            .custom(LABELS_METADATA_KEY)?
            .map(|value| LabelTable::from_metadata(&value)))
    }
}
