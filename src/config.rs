use std::path::{
  Path,
  PathBuf,
};

use serde::{
  Deserialize,
  Serialize,
};

use crate::error::{
  HalaExportError,
  HalaExportErrorKind,
};
use crate::scene::HalaVertexLayout;

fn default_base_name() -> String {
  "MyFirstMesh".to_string()
}

fn default_image_name() -> String {
  "texture".to_string()
}

fn default_layout() -> HalaVertexLayout {
  HalaVertexLayout::PositionNormalUv
}

fn default_as_true() -> bool {
  true
}

fn default_jpeg_quality() -> u8 {
  80
}

fn default_max_concurrent_exports() -> usize {
  1
}

/// What to do with the loose files when zipping them fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalaArchiveFailurePolicy {
  /// Remove the partial archive and return the loose files.
  #[default]
  KeepLoose,
  /// Remove the whole export directory and report the failure.
  Rollback,
}

/// The export description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HalaExportDesc {
  /// Every export gets a fresh sub directory of this directory.
  #[serde(default = "std::env::temp_dir")]
  pub output_root: PathBuf,
  #[serde(default = "default_base_name")]
  pub base_name: String,
  #[serde(default = "default_layout")]
  pub layout: HalaVertexLayout,
  #[serde(default = "default_as_true")]
  pub write_images: bool,
  #[serde(default = "default_as_true")]
  pub archive: bool,
  #[serde(default = "default_jpeg_quality")]
  pub jpeg_quality: u8,
  /// The image identifier of fragments without a mapped image.
  #[serde(default = "default_image_name")]
  pub default_image_name: String,
  #[serde(default = "default_max_concurrent_exports")]
  pub max_concurrent_exports: usize,
  #[serde(default)]
  pub archive_failure_policy: HalaArchiveFailurePolicy,
}

impl Default for HalaExportDesc {
  fn default() -> Self {
    HalaExportDesc {
      output_root: std::env::temp_dir(),
      base_name: default_base_name(),
      layout: default_layout(),
      write_images: true,
      archive: true,
      jpeg_quality: default_jpeg_quality(),
      default_image_name: default_image_name(),
      max_concurrent_exports: default_max_concurrent_exports(),
      archive_failure_policy: HalaArchiveFailurePolicy::default(),
    }
  }
}

/// The implementation of the export description.
impl HalaExportDesc {
  /// Load the export description from a JSON file.
  /// param path: The path of the JSON file.
  /// return: The export description.
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HalaExportError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
      .map_err(|err| HalaExportError::new(
        HalaExportErrorKind::Config,
        &format!("Read export description \"{:?}\" failed.", path),
        Some(Box::new(err))))?;
    Self::from_json(&text)
  }

  /// Parse the export description from JSON text.
  /// param text: The JSON text.
  /// return: The export description.
  pub fn from_json(text: &str) -> Result<Self, HalaExportError> {
    let desc: Self = serde_json::from_str(text)
      .map_err(|err| HalaExportError::new(HalaExportErrorKind::Config, "Parse export description failed.", Some(Box::new(err))))?;
    if desc.base_name.is_empty() || desc.base_name.contains(['/', '\\']) {
      return Err(HalaExportError::new(
        HalaExportErrorKind::Config,
        &format!("Invalid base name \"{}\".", desc.base_name),
        None));
    }
    Ok(desc)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_json_uses_defaults() {
    let desc = HalaExportDesc::from_json("{}").unwrap();
    assert_eq!(desc, HalaExportDesc::default());
    assert_eq!(desc.jpeg_quality, 80);
    assert_eq!(desc.max_concurrent_exports, 1);
  }

  #[test]
  fn test_fields_are_read() {
    let desc = HalaExportDesc::from_json(r#"{
      "output_root": "/tmp/scans",
      "base_name": "room",
      "layout": "position_normal",
      "archive": false,
      "archive_failure_policy": "rollback"
    }"#).unwrap();
    assert_eq!(desc.output_root, PathBuf::from("/tmp/scans"));
    assert_eq!(desc.base_name, "room");
    assert_eq!(desc.layout, HalaVertexLayout::PositionNormal);
    assert!(!desc.archive);
    assert!(desc.write_images);
    assert_eq!(desc.archive_failure_policy, HalaArchiveFailurePolicy::Rollback);
  }

  #[test]
  fn test_path_in_base_name_is_rejected() {
    let err = HalaExportDesc::from_json(r#"{"base_name": "../escape"}"#).unwrap_err();
    assert_eq!(err.kind(), HalaExportErrorKind::Config);
  }

  #[test]
  fn test_missing_file_is_config_error() {
    let err = HalaExportDesc::load("/definitely/not/here.json").unwrap_err();
    assert_eq!(err.kind(), HalaExportErrorKind::Config);
  }
}
