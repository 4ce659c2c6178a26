//! Box format conversion, overlap and rescaling helpers shared by every decoder.

/// A box as four floats. Either `[x1, y1, x2, y2]` (corners) or `[cx, cy, w, h]`
/// (center and size), depending on the decode stage.
pub type BBox = [f32; 4];

const IOU_EPS: f32 = 1e-5;

/// `[cx, cy, w, h]` to `[x1, y1, x2, y2]`.
pub fn xywh_to_xyxy(b: BBox) -> BBox {
    let [x, y, w, h] = b;
    [x - w / 2.0, y - h / 2.0, x + w / 2.0, y + h / 2.0]
}

/// `[x1, y1, x2, y2]` to `[cx, cy, w, h]`.
pub fn xyxy_to_xywh(b: BBox) -> BBox {
    let [x1, y1, x2, y2] = b;
    [(x1 + x2) / 2.0, (y1 + y2) / 2.0, x2 - x1, y2 - y1]
}

/// Scales a box from model input space to image space.
///
/// Components 0 and 2 scale by `img_w / input_w`, components 1 and 3 by
/// `img_h / input_h`, so the same call works on `xywh` and `xyxy` boxes.
pub fn rescale(b: BBox, input_w: f32, input_h: f32, img_w: f32, img_h: f32) -> BBox {
    let sx = img_w / input_w;
    let sy = img_h / input_h;
    [b[0] * sx, b[1] * sy, b[2] * sx, b[3] * sy]
}

/// Intersection over union of two corner boxes.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let inter_w = f32::max(0.0, f32::min(a[2], b[2]) - f32::max(a[0], b[0]));
    let inter_h = f32::max(0.0, f32::min(a[3], b[3]) - f32::max(a[1], b[1]));
    let inter = inter_w * inter_h;

    inter / (area(a) + area(b) - inter + IOU_EPS)
}

fn area(b: &BBox) -> f32 {
    f32::max(0.0, b[2] - b[0]) * f32::max(0.0, b[3] - b[1])
}

/// Clamps x coordinates to `[0, width]` and y coordinates to `[0, height]`.
pub fn clamp_to_image(b: BBox, width: f32, height: f32) -> BBox {
    [
        b[0].clamp(0.0, width),
        b[1].clamp(0.0, height),
        b[2].clamp(0.0, width),
        b[3].clamp(0.0, height),
    ]
}

/// Model input resolution paired with the resolution of the image it was made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelGeometry {
    pub input_width: u32,
    pub input_height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl ModelGeometry {
    pub fn new(input_width: u32, input_height: u32, original_width: u32, original_height: u32) -> Self {
        Self {
            input_width,
            input_height,
            original_width,
            original_height,
        }
    }

    pub fn scale_x(&self) -> f32 {
        self.original_width as f32 / self.input_width as f32
    }

    pub fn scale_y(&self) -> f32 {
        self.original_height as f32 / self.input_height as f32
    }

    /// Maps a box from model input space to original image space.
    pub fn rescale(&self, b: BBox) -> BBox {
        rescale(
            b,
            self.input_width as f32,
            self.input_height as f32,
            self.original_width as f32,
            self.original_height as f32,
        )
    }

    /// Clamps a corner box to the original image bounds.
    pub fn clamp(&self, b: BBox) -> BBox {
        clamp_to_image(b, self.original_width as f32, self.original_height as f32)
    }
}
