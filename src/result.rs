use crate::geometry::BBox;
use crate::layout_element::LayoutElement;
use crate::models::{Detection, LabelTable};

/// Regions found on one page as parallel sequences, plus the wall-clock time
/// of the call that produced them.
///
/// Boxes are `[x1, y1, x2, y2]` in original image pixels, except for
/// DocLayout models which report the model's own box values rescaled.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutResult {
    pub boxes: Vec<BBox>,
    pub scores: Vec<f32>,
    pub class_names: Vec<String>,
    /// Seconds.
    pub elapsed: f64,
}

impl LayoutResult {
    pub fn from_detections(detections: &[Detection], labels: &LabelTable, elapsed: f64) -> Self {
        Self {
            boxes: detections.iter().map(|d| d.bbox).collect(),
            scores: detections.iter().map(|d| d.score).collect(),
            class_names: detections
                .iter()
                .map(|d| labels.resolve(d.class_id).to_string())
                .collect(),
            elapsed,
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// `(box, score, class name)` per region.
    pub fn iter(&self) -> impl Iterator<Item = (&BBox, f32, &str)> + '_ {
        self.boxes
            .iter()
            .zip(self.scores.iter().copied())
            .zip(self.class_names.iter().map(String::as_str))
            .map(|((b, s), c)| (b, s, c))
    }

    pub fn elements(&self) -> Vec<LayoutElement> {
        self.iter()
            .map(|(bbox, score, class_name)| LayoutElement::from_bbox(*bbox, class_name, score))
            .collect()
    }

    #[cfg(feature = "save")]
    pub fn save_csv(&self, filename: impl AsRef<std::path::Path>) -> crate::Result<()> {
        crate::utils::save::save_csv(self, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detections() -> Vec<Detection> {
        vec![
            Detection {
                bbox: [1.0, 2.0, 3.0, 4.0],
                score: 0.9,
                class_id: 1,
            },
            Detection {
                bbox: [5.0, 6.0, 7.0, 8.0],
                score: 0.6,
                class_id: 7,
            },
        ]
    }

    #[test]
    fn sequences_are_parallel() {
        let labels = LabelTable::new(["text", "title"]);
        let result = LayoutResult::from_detections(&detections(), &labels, 0.25);

        assert_eq!(result.len(), 2);
        assert_eq!(result.boxes, vec![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]);
        assert_eq!(result.scores, vec![0.9, 0.6]);
        assert_eq!(result.class_names, vec!["title", "Unknown"]);
        assert_eq!(result.elapsed, 0.25);
    }

    #[test]
    fn elements_carry_region_and_label() {
        let labels = LabelTable::new(["text", "title"]);
        let result = LayoutResult::from_detections(&detections(), &labels, 0.0);
        let elements = result.elements();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].element_type, "title");
        assert_eq!(elements[0].bbox.width(), 2.0);
        assert_eq!(elements[1].score, 0.6);
    }

    #[cfg(feature = "save")]
    #[test]
    fn saves_one_csv_row_per_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.csv");
        let labels = LabelTable::new(["text", "title"]);

        LayoutResult::from_detections(&detections(), &labels, 0.0)
            .save_csv(&path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "x1,y1,x2,y2,score,class_name");
        assert_eq!(lines[1], "1.0,2.0,3.0,4.0,0.9,title");
        assert_eq!(lines.len(), 3);
    }
}
