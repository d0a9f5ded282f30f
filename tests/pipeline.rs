// 该文件是 Shibie （识别） 项目的一部分。
// tests/pipeline.rs - 端到端识别流程测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use shibie::{
  FromUrl,
  frame::RawImage,
  labels::LabelSet,
  model::{Classifier, Model, SessionBuilder, SessionHandle, StubSession},
  preprocess::{BoundingBox, DigitPreprocess, Preprocess, detect},
};
use url::Url;

fn canvas_with_square(size: u32, x0: u32, y0: u32, side: u32) -> RawImage {
  let mut data = vec![0u8; (size * size * 4) as usize];
  for y in 0..size {
    for x in 0..size {
      let i = ((y * size + x) * 4) as usize;
      let lit = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
      let v = if lit { 255 } else { 0 };
      data[i..i + 4].copy_from_slice(&[v, v, v, 255]);
    }
  }
  RawImage::new(size, size, data).unwrap()
}

#[test]
fn blank_canvas_classifies_with_stub_engine() {
  let mut logits = vec![0.0; 10];
  logits[0] = 10.0;
  let session = SessionHandle::new(StubSession::new(logits));
  let classifier = Classifier::new(&session, DigitPreprocess::default().into(), LabelSet::digits());

  let image = RawImage::filled(280, 280, [0, 0, 0, 255]).unwrap();
  let recognition = classifier.infer(&image).unwrap();

  assert_eq!(recognition.tensor.shape(), &[1, 1, 28, 28]);
  assert!(recognition.tensor.data().iter().all(|&v| v == 0.0));
  let top = recognition.result.top().unwrap();
  assert_eq!(top.index, 0);
  assert_eq!(top.label, "0");
  assert!(top.probability > 0.99);
}

#[test]
fn bright_square_is_boxed_with_margin() {
  let image = canvas_with_square(280, 100, 100, 50);
  assert_eq!(
    detect(&image, 30.0, 10),
    Some(BoundingBox {
      x: 90,
      y: 90,
      width: 70,
      height: 70,
    })
  );
}

#[test]
fn digit_tensor_is_centered_and_bounded() {
  let image = canvas_with_square(280, 20, 180, 40);
  let tensor = DigitPreprocess::default().preprocess(&image).unwrap();

  assert_eq!(tensor.shape(), &[1, 1, 28, 28]);
  assert!(tensor.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
  let at = |x: usize, y: usize| tensor.data()[y * 28 + x];
  assert!(at(14, 14) > 0.9);
  assert_eq!(at(0, 0), 0.0);
  assert_eq!(at(27, 27), 0.0);

  for y in 0..28 {
    let lit: Vec<usize> = (0..28).filter(|&x| at(x, y) > 0.5).collect();
    if let (Some(first), Some(last)) = (lit.first(), lit.last()) {
      assert_eq!(*first, 27 - *last);
    }
  }
}

#[test]
fn session_from_url_feeds_classifier() {
  let url = Url::parse("stub://?logits=0,0,0,7,0,0,0,0,0,0").unwrap();
  let session = SessionBuilder::from_url(&url).unwrap().build().unwrap();
  let classifier = Classifier::new(&session, DigitPreprocess::default().into(), LabelSet::digits())
    .top_k(5);

  let image = canvas_with_square(100, 30, 30, 20);
  let recognition = classifier.infer(&image).unwrap();
  assert_eq!(recognition.result.best_index, 3);
  assert_eq!(recognition.result.len(), 5);
  let total: f32 = recognition.result.iter().map(|r| r.probability).sum();
  assert!(total <= 1.0 + 1e-5);
}

#[cfg(all(feature = "read_image_file", feature = "directory_record"))]
#[test]
fn folder_input_to_directory_record() {
  use shibie::{
    input::InputWrapper,
    output::OutputWrapper,
    task::{OneShotTask, Task},
  };

  let input_dir = tempfile::tempdir().unwrap();
  let record_dir = tempfile::tempdir().unwrap();
  canvas_with_square(64, 10, 10, 30)
    .as_rgba_image()
    .save(input_dir.path().join("digit.png"))
    .unwrap();

  let session = SessionHandle::new(StubSession::new(vec![1.0; 10]));
  let classifier = Classifier::new(&session, DigitPreprocess::default().into(), LabelSet::digits());
  let input = InputWrapper::from_url(
    &Url::parse(&format!("folder://{}", input_dir.path().display())).unwrap(),
  )
  .unwrap();
  let output = OutputWrapper::from_url(
    &Url::parse(&format!("folder://{}", record_dir.path().display())).unwrap(),
  )
  .unwrap();

  OneShotTask.run_task(input, classifier, output).unwrap();

  let mut stack = vec![record_dir.path().to_path_buf()];
  let mut json = 0;
  while let Some(dir) = stack.pop() {
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        stack.push(path);
      } else if path.extension().is_some_and(|e| e == "json") {
        json += 1;
      }
    }
  }
  assert_eq!(json, 1);
}
