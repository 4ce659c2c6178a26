use geo_types::{coord, Rect};

use crate::geometry::BBox;

/// One detected layout region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutElement {
    pub bbox: Rect<f32>,
    pub element_type: String,
    pub score: f32,
}

impl LayoutElement {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, element_type: &str, score: f32) -> Self {
        let bbox = Rect::new(coord! { x: x1, y: y1 }, coord! { x: x2, y: y2 });

        Self {
            bbox,
            element_type: element_type.to_string(),
            score,
        }
    }

    pub fn from_bbox(bbox: BBox, element_type: &str, score: f32) -> Self {
        let [x1, y1, x2, y2] = bbox;
        Self::new(x1, y1, x2, y2, element_type, score)
    }

    /// Grows the region by `padding` on every side.
    pub fn pad(&mut self, padding: f32) {
        self.bbox
            .set_min(self.bbox.min() - coord! { x: padding, y: padding });
        self.bbox
            .set_max(self.bbox.max() + coord! { x: padding, y: padding });
    }

    /// Cuts the region out of `img`. Parts outside the image are dropped.
    pub fn crop_from_image(&self, img: &image::DynamicImage) -> image::DynamicImage {
        let x1 = self.bbox.min().x.max(0.0) as u32;
        let y1 = self.bbox.min().y.max(0.0) as u32;
        let x2 = self.bbox.max().x.max(0.0) as u32;
        let y2 = self.bbox.max().y.max(0.0) as u32;

        img.crop_imm(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView};

    #[test]
    fn pad_grows_every_side() {
        let mut element = LayoutElement::from_bbox([10.0, 20.0, 30.0, 40.0], "text", 0.9);
        element.pad(5.0);
        assert_eq!(element.bbox.min(), coord! { x: 5.0, y: 15.0 });
        assert_eq!(element.bbox.max(), coord! { x: 35.0, y: 45.0 });
    }

    #[test]
    fn crop_is_limited_to_the_image() {
        let img = DynamicImage::new_rgb8(50, 40);
        let element = LayoutElement::new(-10.0, 10.0, 30.0, 60.0, "figure", 0.7);
        let crop = element.crop_from_image(&img);
        assert_eq!(crop.dimensions(), (30, 30));
    }
}
