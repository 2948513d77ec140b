use std::path::{
  Path,
  PathBuf,
};
use std::sync::Arc;
use std::sync::mpsc::channel;

use glam::{
  Mat4,
  Vec3,
};

use hala_scan_export::prelude::*;

fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

fn scratch_root() -> PathBuf {
  std::env::temp_dir().join(format!("hala-export-test-{}", uuid::Uuid::new_v4()))
}

fn desc(output_root: &Path, layout: HalaVertexLayout, archive: bool) -> HalaExportDesc {
  HalaExportDesc {
    output_root: output_root.to_path_buf(),
    base_name: "scan".to_string(),
    layout,
    archive,
    ..Default::default()
  }
}

fn unit_quad(id: &str, transform: Mat4) -> HalaMeshFragment {
  HalaMeshFragment::with_data(
    id,
    transform,
    &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
    &[Vec3::Z; 4],
    &[0, 1, 2, 2, 3, 0],
  ).expect("valid quad")
}

fn camera() -> HalaCameraFrame {
  HalaCameraFrame::from_pinhole(1000.0, 1000.0, 32.0, 24.0, (64, 48), Mat4::from_translation(Vec3::new(0.5, 0.5, 3.0)))
}

fn gray_image() -> HalaImageData {
  HalaImageData::new(HalaPixelFormat::Rgb8, 64, 48, vec![128; 64 * 48 * 3]).expect("valid image")
}

fn count_lines(text: &str, prefix: &str) -> usize {
  text.lines().filter(|line| line.starts_with(prefix)).count()
}

struct FixedSource(Option<HalaSessionSnapshot>);

impl HalaAnchorSource for FixedSource {
  fn snapshot(&self) -> Option<HalaSessionSnapshot> {
    self.0.clone()
  }
}

#[test]
fn unit_quad_without_uv_writes_expected_obj() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  let exporter = HalaExporter::new(desc(&root, HalaVertexLayout::PositionNormal, false), Arc::new(HalaAnchorImageRegistry::new()))?;

  let snapshot = HalaSessionSnapshot {
    fragments: vec![unit_quad("anchor-0", Mat4::IDENTITY)],
    ..Default::default()
  };
  let files = exporter.export(snapshot).wait()?;
  assert_eq!(files.len(), 2);
  assert!(files[0].ends_with("scan.obj"));
  assert!(files[1].ends_with("scan.mtl"));

  let obj = std::fs::read_to_string(&files[0])?;
  assert_eq!(count_lines(&obj, "v "), 4);
  assert_eq!(count_lines(&obj, "vn "), 4);
  assert_eq!(count_lines(&obj, "vt "), 0);
  assert_eq!(count_lines(&obj, "f "), 2);

  std::fs::remove_dir_all(root)?;
  Ok(())
}

#[test]
fn empty_snapshot_creates_nothing() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  let exporter = HalaExporter::new(desc(&root, HalaVertexLayout::PositionNormalUv, true), Arc::new(HalaAnchorImageRegistry::new()))?;

  let files = exporter.export(HalaSessionSnapshot::default()).wait()?;
  assert!(files.is_empty());
  let files = exporter.export_session(&FixedSource(None)).wait()?;
  assert!(files.is_empty());
  assert!(!root.exists());
  Ok(())
}

#[test]
fn blocked_output_root_reports_failure() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  std::fs::create_dir_all(&root)?;
  let blocker = root.join("blocker");
  std::fs::write(&blocker, b"file in the way")?;
  let exporter = HalaExporter::new(desc(&blocker, HalaVertexLayout::PositionNormal, true), Arc::new(HalaAnchorImageRegistry::new()))?;

  let snapshot = HalaSessionSnapshot {
    fragments: vec![unit_quad("anchor-0", Mat4::IDENTITY)],
    ..Default::default()
  };
  let err = exporter.export(snapshot).wait().unwrap_err();
  assert_eq!(err.kind(), HalaExportErrorKind::FileSystem);

  std::fs::remove_dir_all(root)?;
  Ok(())
}

#[test]
fn textured_export_writes_every_material_image() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  let registry = Arc::new(HalaAnchorImageRegistry::new());
  let image_id = registry.add_image(gray_image(), Some(camera()));
  registry.assign("anchor-1", &image_id);
  let exporter = HalaExporter::new(desc(&root, HalaVertexLayout::PositionNormalUv, false), Arc::clone(&registry))?;

  let snapshot = HalaSessionSnapshot {
    fragments: vec![
      unit_quad("anchor-0", Mat4::IDENTITY),
      unit_quad("anchor-1", Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0))),
    ],
    camera: Some(camera()),
    captured_image: Some(gray_image()),
  };
  let files = exporter.export(snapshot).wait()?;
  let directory = files[0].parent().expect("export directory").to_path_buf();

  let mtl = std::fs::read_to_string(directory.join("scan.mtl"))?;
  let referenced = mtl.lines()
    .filter_map(|line| line.strip_prefix("map_Kd "))
    .collect::<Vec<_>>();
  assert_eq!(referenced.len(), 2);
  for file_name in referenced {
    assert!(directory.join(file_name).is_file(), "missing {}", file_name);
  }
  assert!(directory.join(format!("{}.jpeg", image_id)).is_file());
  assert!(directory.join("texture.jpeg").is_file());

  let obj = std::fs::read_to_string(directory.join("scan.obj"))?;
  assert_eq!(count_lines(&obj, "vt "), 8);
  assert_eq!(count_lines(&obj, "usemtl "), 2);

  std::fs::remove_dir_all(root)?;
  Ok(())
}

#[test]
fn anchor_of_missing_image_uses_default_texture() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  let registry = Arc::new(HalaAnchorImageRegistry::new());
  registry.assign("anchor-0", "ghost");
  let exporter = HalaExporter::new(desc(&root, HalaVertexLayout::PositionNormalUv, false), registry)?;

  let snapshot = HalaSessionSnapshot {
    fragments: vec![unit_quad("anchor-0", Mat4::IDENTITY)],
    camera: Some(camera()),
    captured_image: Some(gray_image()),
  };
  let files = exporter.export(snapshot).wait()?;
  let directory = files[0].parent().expect("export directory").to_path_buf();

  let mtl = std::fs::read_to_string(directory.join("scan.mtl"))?;
  assert!(mtl.contains("map_Kd texture.jpeg"));
  assert!(!mtl.contains("ghost"));
  assert!(directory.join("texture.jpeg").is_file());
  assert!(!directory.join("ghost.jpeg").exists());

  std::fs::remove_dir_all(root)?;
  Ok(())
}

#[test]
fn archived_export_returns_only_the_zip() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  let exporter = HalaExporter::new(desc(&root, HalaVertexLayout::PositionNormalUv, true), Arc::new(HalaAnchorImageRegistry::new()))?;

  let snapshot = HalaSessionSnapshot {
    fragments: vec![unit_quad("anchor-0", Mat4::IDENTITY)],
    camera: Some(camera()),
    captured_image: Some(gray_image()),
  };
  let files = exporter.export(snapshot).wait()?;
  assert_eq!(files.len(), 1);
  let archive = &files[0];
  assert_eq!(archive.extension().and_then(|e| e.to_str()), Some("zip"));
  assert_eq!(archive.parent(), Some(root.as_path()));

  let folder = archive.file_stem().and_then(|s| s.to_str()).expect("folder name").to_string();
  assert!(uuid::Uuid::parse_str(&folder).is_ok());
  let mut zip = zip::ZipArchive::new(std::fs::File::open(archive)?)?;
  let names = (0..zip.len()).map(|i| zip.by_index(i).map(|f| f.name().to_string())).collect::<Result<Vec<_>, _>>()?;
  assert!(names.contains(&format!("{}/scan.obj", folder)));
  assert!(names.contains(&format!("{}/scan.mtl", folder)));
  assert!(names.contains(&format!("{}/texture.jpeg", folder)));

  std::fs::remove_dir_all(root)?;
  Ok(())
}

#[test]
fn missing_camera_drops_texture_coordinates() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  let exporter = HalaExporter::new(desc(&root, HalaVertexLayout::PositionNormalUv, false), Arc::new(HalaAnchorImageRegistry::new()))?;

  let snapshot = HalaSessionSnapshot {
    fragments: vec![unit_quad("anchor-0", Mat4::IDENTITY)],
    ..Default::default()
  };
  let files = exporter.export_blocking(snapshot)?;
  let obj = std::fs::read_to_string(&files[0])?;
  assert_eq!(count_lines(&obj, "vt "), 0);
  assert_eq!(count_lines(&obj, "vn "), 4);

  std::fs::remove_dir_all(root)?;
  Ok(())
}

#[test]
fn concurrent_exports_use_separate_directories() -> anyhow::Result<()> {
  init_logger();
  let root = scratch_root();
  let mut export_desc = desc(&root, HalaVertexLayout::PositionNormal, false);
  export_desc.max_concurrent_exports = 2;
  let exporter = HalaExporter::new(export_desc, Arc::new(HalaAnchorImageRegistry::new()))?;

  let (sender, receiver) = channel();
  for i in 0..4 {
    let sender = sender.clone();
    let snapshot = HalaSessionSnapshot {
      fragments: vec![unit_quad(&format!("anchor-{}", i), Mat4::from_translation(Vec3::X * i as f32))],
      ..Default::default()
    };
    exporter.export_with(snapshot, move |result| {
      sender.send(result).expect("receiver alive");
    });
  }
  drop(sender);

  let mut directories = receiver.iter()
    .map(|result| result.map(|files| files[0].parent().expect("export directory").to_path_buf()))
    .collect::<Result<Vec<_>, _>>()?;
  assert_eq!(directories.len(), 4);
  directories.sort();
  directories.dedup();
  assert_eq!(directories.len(), 4);
  assert_eq!(exporter.in_flight(), 0);

  std::fs::remove_dir_all(root)?;
  Ok(())
}
