use rapidlayout_ort::{LayoutConfig, LayoutModel, LayoutModelType, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let model_type: LayoutModelType = args
        .next()
        .unwrap_or_else(|| "pp_layout_cdla".to_string())
        .parse()?;
    let model_path = args
        .next()
        .unwrap_or_else(|| format!("models/{}", model_type.filename()));
    let img_path = args
        .next()
        .unwrap_or_else(|| "demos/data/layout.png".to_string());

    let img = image::open(img_path).unwrap();

    let config = LayoutConfig::new(model_type, model_path).with_thresholds(0.5, 0.5);
    let model = LayoutModel::new(&config)?;

    let result = model.predict(&img)?;

    for (bbox, score, class_name) in result.iter() {
        println!("Label: {class_name}, Confidence: {score:.3}, Box: {bbox:?}");
    }
    println!("{} regions in {:.3}s", result.len(), result.elapsed);

    Ok(())
}
