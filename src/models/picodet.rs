use ndarray::{s, ArrayD, ArrayView2, Axis};

use super::{as_rank3, Detection, Thresholds};
use crate::error::{Error, Result};
use crate::geometry::{BBox, ModelGeometry};
use crate::{nms, utils};

/// Decoder for [`PP-PicoDet`](https://github.com/PaddlePaddle/PaddleDetection)-based layout heads.
///
/// The model emits one class score map and one box distribution map per
/// stride, scores first: `[scores_8, scores_16, ..., boxes_8, boxes_16, ...]`.
/// Score maps are `[batch, cells, classes]`; box maps are
/// `[batch, cells, 4 * bins]` with one distance distribution per box side.
#[derive(Debug, Clone, PartialEq)]
pub struct PicoDetDecoder {
    strides: Vec<u32>,
    /// Candidates kept per stride, ranked by best class score, before decoding.
    nms_top_k: usize,
    /// Boxes kept per class after suppression.
    keep_top_k: usize,
}

impl Default for PicoDetDecoder {
    fn default() -> Self {
        Self {
            strides: vec![8, 16, 32, 64],
            nms_top_k: 1000,
            keep_top_k: 100,
        }
    }
}

/// Cells in a feature map of `stride` over `extent` input pixels.
fn cells_along(extent: u32, stride: u32) -> usize {
    extent.div_ceil(stride) as usize
}

impl PicoDetDecoder {
    pub fn strides(&self) -> &[u32] {
        &self.strides
    }

    pub(crate) fn decode(
        &self,
        outputs: &[ArrayD<f32>],
        geometry: &ModelGeometry,
        thresholds: Thresholds,
    ) -> Result<Vec<Detection>> {
        let num_levels = self.strides.len();
        if outputs.len() != 2 * num_levels {
            return Err(Error::ShapeMismatch(format!(
                "expected {} outputs ({num_levels} score maps and {num_levels} box maps), got {}",
                2 * num_levels,
                outputs.len()
            )));
        }

        let (score_maps, box_maps) = outputs.split_at(num_levels);
        let score_maps = score_maps
            .iter()
            .map(|o| as_rank3(o, "score map"))
            .collect::<Result<Vec<_>>>()?;
        let box_maps = box_maps
            .iter()
            .map(|o| as_rank3(o, "box distribution map"))
            .collect::<Result<Vec<_>>>()?;

        let batch_size = score_maps[0].shape()[0];
        let num_classes = score_maps[0].shape()[2];

        for (level, (&stride, (scores, boxes))) in self
            .strides
            .iter()
            .zip(score_maps.iter().zip(box_maps.iter()))
            .enumerate()
        {
            let cells = cells_along(geometry.input_height, stride)
                * cells_along(geometry.input_width, stride);
            let expected = [batch_size, cells, num_classes];
            if scores.shape() != expected {
                return Err(Error::ShapeMismatch(format!(
                    "score map {level} (stride {stride}): expected {expected:?}, got {:?}",
                    scores.shape()
                )));
            }
            let dist_len = boxes.shape()[2];
            if boxes.shape()[..2] != expected[..2] || dist_len < 4 || dist_len % 4 != 0 {
                return Err(Error::ShapeMismatch(format!(
                    "box map {level} (stride {stride}): expected [{batch_size}, {cells}, 4 * bins], got {:?}",
                    boxes.shape()
                )));
            }
        }

        let mut detections = vec![];
        for batch in 0..batch_size {
            let mut boxes: Vec<BBox> = vec![];
            let mut class_scores: Vec<f32> = vec![];

            for (&stride, (scores, dists)) in self
                .strides
                .iter()
                .zip(score_maps.iter().zip(box_maps.iter()))
            {
                let scores = scores.index_axis(Axis(0), batch);
                let dists = dists.index_axis(Axis(0), batch);
                let grid_width = cells_along(geometry.input_width, stride);

                for cell in self.top_cells(scores) {
                    boxes.push(decode_cell(dists, cell, grid_width, stride));
                    class_scores.extend(scores.row(cell).iter().copied());
                }
            }

            detections.extend(self.suppress(&boxes, &class_scores, num_classes, thresholds));
        }

        Ok(detections
            .into_iter()
            .map(|d| Detection {
                bbox: geometry.clamp(geometry.rescale(d.bbox)),
                ..d
            })
            .collect())
    }

    /// Indices of the `nms_top_k` cells with the highest best-class score.
    fn top_cells(&self, scores: ArrayView2<f32>) -> Vec<usize> {
        // `f32::max` skips NaN, so a corrupt cell ranks last
        let best = scores.map_axis(Axis(1), |row| row.fold(f32::NEG_INFINITY, |m, &v| m.max(v)));
        let mut order = utils::argsort_by(&best, |a, b| b.total_cmp(a));
        order.truncate(self.nms_top_k);
        order
    }

    /// Confidence filtering then per-class NMS over the decoded candidates.
    ///
    /// `class_scores` holds `num_classes` scores per entry of `boxes`.
    fn suppress(
        &self,
        boxes: &[BBox],
        class_scores: &[f32],
        num_classes: usize,
        thresholds: Thresholds,
    ) -> Vec<Detection> {
        let mut candidates = vec![];
        for class_id in 0..num_classes {
            for (i, bbox) in boxes.iter().enumerate() {
                let score = class_scores[i * num_classes + class_id];
                if score > thresholds.confidence() {
                    candidates.push(Detection {
                        bbox: *bbox,
                        score,
                        class_id: class_id as i64,
                    });
                }
            }
        }
        tracing::trace!(
            "{} of {} candidate boxes above confidence threshold",
            candidates.len(),
            boxes.len()
        );

        let cand_boxes: Vec<BBox> = candidates.iter().map(|c| c.bbox).collect();
        let cand_scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();
        let cand_classes: Vec<i64> = candidates.iter().map(|c| c.class_id).collect();

        nms::multiclass_nms_with_limit(
            &cand_boxes,
            &cand_scores,
            &cand_classes,
            thresholds.iou(),
            Some(self.keep_top_k),
        )
        .into_iter()
        .map(|i| candidates[i])
        .collect()
    }
}

/// Corner box of `cell` in model input space.
///
/// The cell center sits at `((col + 0.5) * stride, (row + 0.5) * stride)` and
/// each side lies at the expected distance of its bin distribution, in strides.
fn decode_cell(dists: ArrayView2<f32>, cell: usize, grid_width: usize, stride: u32) -> BBox {
    let stride = stride as f32;
    let cx = ((cell % grid_width) as f32 + 0.5) * stride;
    let cy = ((cell / grid_width) as f32 + 0.5) * stride;

    let row = dists.row(cell);
    let bins = row.len() / 4;
    let side = |k: usize| utils::distribution_expectation(row.slice(s![k * bins..(k + 1) * bins])) * stride;

    [cx - side(0), cy - side(1), cx + side(2), cy + side(3)]
}
