use ndarray::prelude::*;
use ndarray::Data;

use std::cmp::Ordering;

// argsort_by function from: https://github.com/rust-ndarray/ndarray/issues/1145
// `sort_by` is stable, so equal elements keep their original order.
pub fn argsort_by<S, F>(arr: &ArrayBase<S, Ix1>, mut compare: F) -> Vec<usize>
where
    S: Data,
    F: FnMut(&S::Elem, &S::Elem) -> Ordering,
{
    let mut indices: Vec<usize> = (0..arr.len()).collect();
    indices.sort_by(move |&i, &j| compare(&arr[i], &arr[j]));
    indices
}

/// Softmax over `logits`, then the expected bin index `Σ i * p_i`.
pub(crate) fn distribution_expectation(logits: ArrayView1<f32>) -> f32 {
    let max = logits.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let (weighted, total) = logits
        .iter()
        .enumerate()
        .fold((0.0_f32, 0.0_f32), |(weighted, total), (i, &v)| {
            let e = (v - max).exp();
            (weighted + i as f32 * e, total + e)
        });
    weighted / total
}

#[cfg(feature = "save")]
pub(crate) mod save {
    use std::path::Path;

    use crate::{LayoutResult, Result};

    /// Writes one `x1,y1,x2,y2,score,class_name` row per region.
    pub fn save_csv(result: &LayoutResult, filename: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(filename)?;
        writer.write_record(["x1", "y1", "x2", "y2", "score", "class_name"])?;
        for ((bbox, score), class_name) in result
            .boxes
            .iter()
            .zip(result.scores.iter())
            .zip(result.class_names.iter())
        {
            writer.serialize((bbox[0], bbox[1], bbox[2], bbox[3], score, class_name))?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
