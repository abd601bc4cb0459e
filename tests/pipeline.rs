use dinovis::{
  config::DetectConfig,
  input::{ImageFileInput, PreprocessResult},
  label::LabelTable,
  model::{BoundingBox, DetectorError, Model, RawDetectionSet},
  output::{Draw, Render, SaveImageFileOutput},
  task::OneShotTask,
};
use image::{Rgb, RgbImage};

/// 返回固定模型空间坐标的模型
struct ScriptedModel(RawDetectionSet);

impl Model for ScriptedModel {
  type Input = PreprocessResult;
  type Output = RawDetectionSet;
  type Error = DetectorError;

  fn infer(&mut self, input: Self::Input) -> Result<Self::Output, Self::Error> {
    assert_eq!(input.tensor.as_array().dim(), (3, 800, 1200));
    Ok(self.0.clone())
  }
}

#[test]
fn car_detection_is_scaled_to_original_resolution() {
  let dir = tempfile::tempdir().unwrap();
  let input_path = dir.path().join("street.png");
  RgbImage::from_pixel(2400, 1600, Rgb([30, 30, 30]))
    .save(&input_path)
    .unwrap();

  let image = ImageFileInput::open(&input_path).unwrap().into_image();
  let mut model = ScriptedModel(RawDetectionSet::from_candidates(&[
    ([100.0, 100.0, 300.0, 400.0], 0.92, 2),
    ([500.0, 500.0, 600.0, 700.0], 0.4, 0),
    ([700.0, 100.0, 800.0, 200.0], 0.8, 9999),
  ]));

  let labels = LabelTable::coco();
  let draw = Draw::new().unwrap();
  let config = DetectConfig::default();
  let output = OneShotTask::new(&config, &draw)
    .run(image, &mut model, &labels)
    .unwrap();

  assert_eq!(output.detections.len(), 2);
  assert_eq!(
    output.detections[0],
    BoundingBox {
      class_id: 2,
      score: 0.92,
      xmin: 200.0,
      ymin: 200.0,
      xmax: 600.0,
      ymax: 800.0,
    }
  );
  assert_eq!(labels.resolve(output.detections[0].class_id), Ok("car"));
  assert_eq!(output.unknown.len(), 1);
  assert_eq!(output.unknown[0].class_id, 9999);

  // 未知类别仍然绘制检测框
  assert_eq!(*output.image.get_pixel(1400, 300), Rgb([0, 0, 255]));

  let saved_path = dir.path().join("out/annotated.png");
  SaveImageFileOutput::new(&saved_path)
    .render(&output.image)
    .unwrap();
  let saved = image::open(&saved_path).unwrap().to_rgb8();
  assert_eq!(saved, output.image);
}
