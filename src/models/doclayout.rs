use ndarray::{ArrayD, Axis};

use super::{as_rank3, first_output, Detection, Thresholds};
use crate::error::{Error, Result};
use crate::geometry::ModelGeometry;

/// Decoder for [`DocLayout-YOLO`](https://github.com/opendatalab/DocLayout-YOLO) heads.
///
/// The single output is `[batch, rows, features]` where every row is already
/// decoded and suppressed by the model: box values first, confidence and
/// class id in the last two columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocLayoutDecoder;

impl DocLayoutDecoder {
    pub(crate) fn decode(
        &self,
        outputs: &[ArrayD<f32>],
        geometry: &ModelGeometry,
        thresholds: Thresholds,
    ) -> Result<Vec<Detection>> {
        let output = as_rank3(first_output(outputs)?, "detection rows")?;
        let shape = output.shape();
        if shape[0] == 0 || shape[2] < 6 {
            return Err(Error::ShapeMismatch(format!(
                "expected [batch >= 1, rows, 4 + ... + 2], got {shape:?}"
            )));
        }
        let features = shape[2];

        Ok(output
            .index_axis(Axis(0), 0)
            .outer_iter()
            .filter_map(|row| {
                let score = row[features - 2];
                (score > thresholds.confidence()).then(|| Detection {
                    bbox: geometry.rescale([row[0], row[1], row[2], row[3]]),
                    score,
                    class_id: row[features - 1] as i64,
                })
            })
            .collect())
    }
}
