use rapidlayout_ort::{LayoutConfig, LayoutModel, LayoutModelType, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let img = image::open("demos/data/layout.png").unwrap();

    let config = LayoutConfig::new(
        LayoutModelType::DoclayoutDocstructbench,
        "models/doclayout_yolo_docstructbench_imgsz1024.onnx",
    )
    .with_thresholds(0.2, 0.5);
    let model = LayoutModel::new(&config)?;

    let result = model.predict(&img)?;
    result.save_csv("regions.csv")?;

    for (i, mut element) in result.elements().into_iter().enumerate() {
        element.pad(5.0);
        element
            .crop_from_image(&img)
            .save(format!("region_{i}_{}.png", element.element_type))
            .unwrap();
    }

    Ok(())
}
