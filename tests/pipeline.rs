use rapidlayout_ort::image::{DynamicImage, Rgb, RgbImage};
use rapidlayout_ort::ndarray::{Array3, Array4, ArrayD, IxDyn};
use rapidlayout_ort::{
    Error, InferenceEngine, LabelTable, LayoutConfig, LayoutModel, LayoutModelType, ModelEntry,
    ModelFamily, ModelRegistry, Result,
};

/// Replays fixed outputs and checks the tensor it is handed.
struct FakeEngine {
    expected_input: [usize; 4],
    outputs: Vec<ArrayD<f32>>,
    labels: Option<LabelTable>,
}

impl InferenceEngine for FakeEngine {
    fn run(&self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>> {
        assert_eq!(input.shape(), &self.expected_input);
        assert!(input.iter().all(|v| v.is_finite()));
        Ok(self.outputs.clone())
    }

    fn labels(&self) -> Result<Option<LabelTable>> {
        Ok(self.labels.clone())
    }
}

struct FailingEngine;

impl InferenceEngine for FailingEngine {
    fn run(&self, _input: Array4<f32>) -> Result<Vec<ArrayD<f32>>> {
        Err(Error::Engine("session was released".into()))
    }
}

fn page(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([240, 240, 235])))
}

fn config(model_type: LayoutModelType) -> LayoutConfig {
    LayoutConfig::new(model_type, "unused.onnx")
}

#[test]
fn doclayout_row_is_rescaled_and_labelled() {
    // 1024 model input, 2048 page: factor 2 on both axes
    let outputs = vec![Array3::from_shape_vec((1, 1, 6), vec![10.0, 10.0, 20.0, 20.0, 0.9, 2.0])
        .unwrap()
        .into_dyn()];
    let engine = FakeEngine {
        expected_input: [1, 3, 1024, 1024],
        outputs,
        labels: None,
    };
    let config = config(LayoutModelType::DoclayoutDocstructbench)
        .with_labels(["title", "plain text", "figure"])
        .with_thresholds(0.5, 0.5);
    let model = LayoutModel::from_engine(&config, ModelRegistry::builtin(), engine).unwrap();

    let result = model.predict(&page(2048, 2048)).unwrap();

    assert_eq!(result.boxes, vec![[20.0, 20.0, 40.0, 40.0]]);
    assert_eq!(result.scores, vec![0.9]);
    assert_eq!(result.class_names, vec!["figure"]);
    assert!(result.elapsed >= 0.0);
}

#[test]
fn yolov8_all_zero_output_is_an_empty_result() {
    let engine = FakeEngine {
        expected_input: [1, 3, 640, 640],
        outputs: vec![ArrayD::zeros(IxDyn(&[1, 4 + 6, 8400]))],
        labels: Some(LabelTable::new(["Text", "Title", "Header", "Footer", "Figure", "Table"])),
    };
    let model = LayoutModel::from_engine(
        &config(LayoutModelType::Yolov8nLayoutGeneral6),
        ModelRegistry::builtin(),
        engine,
    )
    .unwrap();

    let result = model.predict(&page(300, 400)).unwrap();

    assert!(result.is_empty());
    assert_eq!(model.labels().len(), 6);
}

#[test]
fn yolov8_boxes_come_back_as_corners_in_page_pixels() {
    let mut out = Array3::<f32>::zeros((1, 4 + 2, 2));
    // candidate 0: center (320, 160), size (64, 32), class 1
    for (i, v) in [320.0, 160.0, 64.0, 32.0, 0.2, 0.95].into_iter().enumerate() {
        out[[0, i, 0]] = v;
    }
    // candidate 1 overlaps candidate 0 with a lower score
    for (i, v) in [322.0, 160.0, 64.0, 32.0, 0.1, 0.85].into_iter().enumerate() {
        out[[0, i, 1]] = v;
    }
    let engine = FakeEngine {
        expected_input: [1, 3, 640, 640],
        outputs: vec![out.into_dyn()],
        labels: Some(LabelTable::new(["text", "table"])),
    };
    let model = LayoutModel::from_engine(
        &config(LayoutModelType::Yolov8nLayoutPaper),
        ModelRegistry::builtin(),
        engine,
    )
    .unwrap();

    let result = model.predict(&page(1280, 320)).unwrap();

    // x * 2, y * 0.5
    assert_eq!(result.boxes, vec![[576.0, 72.0, 704.0, 88.0]]);
    assert_eq!(result.class_names, vec!["table"]);
}

#[test]
fn pp_layout_decodes_all_strides_and_clamps() {
    // 608 x 800 input: cells per stride are ceil(800 / s) * ceil(608 / s)
    let bins = 8;
    let classes = 3;
    let cells: Vec<usize> = [8_usize, 16, 32, 64]
        .iter()
        .map(|s| 800_usize.div_ceil(*s) * 608_usize.div_ceil(*s))
        .collect();

    let mut scores: Vec<Array3<f32>> = cells.iter().map(|&n| Array3::zeros((1, n, classes))).collect();
    let mut boxes: Vec<Array3<f32>> = cells
        .iter()
        .map(|&n| Array3::from_elem((1, n, 4 * bins), -30.0))
        .collect();

    // stride 32, cell 0: center (16, 16), every side one bin (32 px) away
    scores[2][[0, 0, 2]] = 0.8;
    for side in 0..4 {
        boxes[2][[0, 0, side * bins + 1]] = 30.0;
    }

    let outputs = scores
        .into_iter()
        .chain(boxes)
        .map(|a| a.into_dyn())
        .collect();
    let engine = FakeEngine {
        expected_input: [1, 3, 800, 608],
        outputs,
        labels: Some(LabelTable::from_metadata("text\ntitle\nfigure")),
    };
    let model = LayoutModel::from_engine(
        &config(LayoutModelType::PpLayoutCdla),
        ModelRegistry::builtin(),
        engine,
    )
    .unwrap();

    let result = model.predict(&page(1216, 1600)).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.class_names, vec!["figure"]);
    let [x1, y1, x2, y2] = result.boxes[0];
    // input box [-16, -16, 48, 48], doubled, clamped at the page origin
    assert_eq!((x1, y1), (0.0, 0.0));
    assert!((x2 - 96.0).abs() < 1e-3 && (y2 - 96.0).abs() < 1e-3);
}

#[test]
fn engine_failure_fails_the_call() {
    let model = LayoutModel::from_engine(
        &config(LayoutModelType::Yolov8nLayoutReport).with_labels(["text"]),
        ModelRegistry::builtin(),
        FailingEngine,
    )
    .unwrap();

    let err = model.predict(&page(64, 64)).unwrap_err();

    assert!(matches!(err, Error::Engine(_)));
}

#[test]
fn mismatched_tensor_is_reported_for_that_call_only() {
    let engine = FakeEngine {
        expected_input: [1, 3, 640, 640],
        outputs: vec![ArrayD::zeros(IxDyn(&[4, 8400]))],
        labels: None,
    };
    let model = LayoutModel::from_engine(
        &config(LayoutModelType::Yolov8nLayoutPaper),
        ModelRegistry::builtin(),
        engine,
    )
    .unwrap();

    assert!(matches!(model.predict(&page(10, 10)), Err(Error::ShapeMismatch(_))));

    let ok = model
        .decode_outputs(&[ArrayD::zeros(IxDyn(&[1, 5, 10]))], 10, 10)
        .unwrap();
    assert!(ok.is_empty());
}

#[test]
fn invalid_thresholds_fail_construction() {
    let engine = FakeEngine {
        expected_input: [1, 3, 640, 640],
        outputs: vec![],
        labels: None,
    };
    let err = LayoutModel::from_engine(
        &config(LayoutModelType::Yolov8nLayoutPaper).with_thresholds(1.1, 0.5),
        ModelRegistry::builtin(),
        engine,
    )
    .err()
    .unwrap();

    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn unregistered_model_type_is_unsupported() {
    let registry: ModelRegistry = [(
        LayoutModelType::DoclayoutD4la,
        ModelEntry {
            family: ModelFamily::DocLayout,
            url: String::new(),
        },
    )]
    .into_iter()
    .collect();

    let err = LayoutModel::from_engine(&config(LayoutModelType::PpLayoutTable), &registry, FailingEngine)
        .err()
        .unwrap();

    assert!(matches!(err, Error::UnsupportedModel(_)));
}

#[test]
fn missing_labels_resolve_to_unknown() {
    let outputs = vec![Array3::from_shape_vec((1, 1, 6), vec![0.0, 0.0, 8.0, 8.0, 0.7, 0.0])
        .unwrap()
        .into_dyn()];
    let engine = FakeEngine {
        expected_input: [1, 3, 1024, 1024],
        outputs,
        labels: None,
    };
    let model = LayoutModel::from_engine(&config(LayoutModelType::DoclayoutD4la), ModelRegistry::builtin(), engine)
        .unwrap();

    let result = model.predict(&page(1024, 1024)).unwrap();

    assert_eq!(result.class_names, vec!["Unknown"]);
    assert_eq!(model.family(), ModelFamily::DocLayout);
}
