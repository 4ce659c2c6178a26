use ndarray::{ArrayD, Axis};

use super::{as_rank3, first_output, Detection, Thresholds};
use crate::error::{Error, Result};
use crate::geometry::{xywh_to_xyxy, BBox, ModelGeometry};
use crate::nms;

/// Decoder for [`YOLOv8`](https://github.com/ultralytics/ultralytics) layout heads.
///
/// The single output is `[batch, 4 + classes, candidates]`: each column holds a
/// center-size box in model input pixels followed by one score per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Yolov8Decoder;

impl Yolov8Decoder {
    pub(crate) fn decode(
        &self,
        outputs: &[ArrayD<f32>],
        geometry: &ModelGeometry,
        thresholds: Thresholds,
    ) -> Result<Vec<Detection>> {
        let output = as_rank3(first_output(outputs)?, "prediction tensor")?;
        let shape = output.shape();
        if shape[0] == 0 || shape[1] < 5 {
            return Err(Error::ShapeMismatch(format!(
                "expected [batch >= 1, 4 + classes, candidates], got {shape:?}"
            )));
        }

        // [4 + classes, candidates] -> [candidates, 4 + classes]
        let predictions = output.index_axis(Axis(0), 0).reversed_axes();

        let mut boxes: Vec<BBox> = vec![];
        let mut scores = vec![];
        let mut class_ids = vec![];

        for candidate in predictions.outer_iter() {
            let (class_id, score) = candidate.iter().skip(4).enumerate().fold(
                (0_usize, f32::NEG_INFINITY),
                |(best_id, best), (id, &s)| if s > best { (id, s) } else { (best_id, best) },
            );

            if score > thresholds.confidence() {
                boxes.push([candidate[0], candidate[1], candidate[2], candidate[3]]);
                scores.push(score);
                class_ids.push(class_id as i64);
            }
        }

        if scores.is_empty() {
            return Ok(vec![]);
        }

        let boxes: Vec<BBox> = boxes
            .into_iter()
            .map(|b| xywh_to_xyxy(geometry.rescale(b)))
            .collect();

        let keep = nms::multiclass_nms(&boxes, &scores, &class_ids, thresholds.iou());

        Ok(keep
            .into_iter()
            .map(|i| Detection {
                bbox: boxes[i],
                score: scores[i],
                class_id: class_ids[i],
            })
            .collect())
    }
}
