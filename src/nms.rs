//! Greedy non-maximum suppression.

use itertools::Itertools;
use ndarray::ArrayView1;

use crate::geometry::{iou, BBox};
use crate::utils;

/// Single-class NMS over corner boxes.
///
/// Returns the kept indices in descending score order. Equal scores keep their
/// input order, so the first occurrence wins. A candidate is suppressed when its
/// IoU with an already kept box is strictly greater than `iou_threshold`.
/// At most `top_k` indices are returned when it is set.
pub fn nms(boxes: &[BBox], scores: &[f32], iou_threshold: f32, top_k: Option<usize>) -> Vec<usize> {
    let mut order = utils::argsort_by(&ArrayView1::from(scores), |a, b| b.total_cmp(a));
    let mut keep = vec![];

    while !order.is_empty() {
        if top_k.is_some_and(|k| keep.len() >= k) {
            break;
        }

        let current = order.remove(0);
        keep.push(current);

        order.retain(|&i| iou(&boxes[current], &boxes[i]) <= iou_threshold);
    }

    keep
}

/// Per-class NMS. Classes never suppress each other.
///
/// Indices are grouped by class id in first-seen order and each group is
/// suppressed independently; the result is the concatenation of the groups.
pub fn multiclass_nms(boxes: &[BBox], scores: &[f32], class_ids: &[i64], iou_threshold: f32) -> Vec<usize> {
    multiclass_nms_with_limit(boxes, scores, class_ids, iou_threshold, None)
}

/// [`multiclass_nms`] keeping at most `top_k` boxes per class.
pub fn multiclass_nms_with_limit(
    boxes: &[BBox],
    scores: &[f32],
    class_ids: &[i64],
    iou_threshold: f32,
    top_k: Option<usize>,
) -> Vec<usize> {
    let mut keep = vec![];

    for class_id in class_ids.iter().unique() {
        let members: Vec<usize> = class_ids
            .iter()
            .positions(|c| c == class_id)
            .collect();

        let class_boxes: Vec<BBox> = members.iter().map(|&i| boxes[i]).collect();
        let class_scores: Vec<f32> = members.iter().map(|&i| scores[i]).collect();

        keep.extend(
            nms(&class_boxes, &class_scores, iou_threshold, top_k)
                .into_iter()
                .map(|i| members[i]),
        );
    }

    keep
}
