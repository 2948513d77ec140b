use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::scene::HalaImageLookup;
use crate::scene::cpu::{
  camera::HalaCameraFrame,
  fragment::HalaMeshFragment,
  image_data::HalaImageData,
};

/// A captured image together with the camera it was taken with.
#[derive(Clone, Debug)]
pub struct HalaCapturedImage {
  pub image: Arc<HalaImageData>,
  pub camera: Option<HalaCameraFrame>,
}

/// The state of one capture session at export time.
#[derive(Clone, Debug, Default)]
pub struct HalaSessionSnapshot {
  pub fragments: Vec<HalaMeshFragment>,
  /// The camera of the current frame.
  pub camera: Option<HalaCameraFrame>,
  /// The image of the current frame, exported as the default texture.
  pub captured_image: Option<HalaImageData>,
}

/// A producer of mesh fragments, usually the scanning session.
pub trait HalaAnchorSource {
  /// Take a read-only snapshot of the current anchors.
  /// return: The snapshot or None if no frame is available yet.
  fn snapshot(&self) -> Option<HalaSessionSnapshot>;
}

#[derive(Default)]
struct HalaRegistryMaps {
  anchor2image_mapping: HashMap<String, String>,
  image2data_mapping: HashMap<String, HalaCapturedImage>,
}

/// Maps anchor identifiers to captured images.
/// Written by the capture side as frames arrive, read by exports through snapshots.
#[derive(Default)]
pub struct HalaAnchorImageRegistry {
  maps: RwLock<HalaRegistryMaps>,
}

/// The Drop implementation of the registry.
impl Drop for HalaAnchorImageRegistry {
  fn drop(&mut self) {
    log::debug!("A HalaAnchorImageRegistry dropped.");
  }
}

/// The implementation of the registry.
impl HalaAnchorImageRegistry {
  /// Create a new registry.
  /// return: The registry.
  pub fn new() -> Self {
    log::debug!("A HalaAnchorImageRegistry created.");
    Self::default()
  }

  /// Store an image under a fresh identifier.
  /// param image: The image.
  /// param camera: The camera the image was captured with.
  /// return: The image identifier.
  pub fn add_image(&self, image: HalaImageData, camera: Option<HalaCameraFrame>) -> String {
    let image_id = uuid::Uuid::new_v4().to_string();
    self.insert_image(&image_id, image, camera);
    image_id
  }

  /// Store an image under the given identifier, replacing any image with the same identifier.
  /// param image_id: The image identifier.
  /// param image: The image.
  /// param camera: The camera the image was captured with.
  pub fn insert_image(&self, image_id: &str, image: HalaImageData, camera: Option<HalaCameraFrame>) {
    let captured = HalaCapturedImage {
      image: Arc::new(image),
      camera,
    };
    self.maps.write().image2data_mapping.insert(image_id.to_owned(), captured);
  }

  /// Point an anchor at an image.
  /// param anchor_id: The anchor identifier.
  /// param image_id: The image identifier.
  pub fn assign(&self, anchor_id: &str, image_id: &str) {
    let mut maps = self.maps.write();
    if !maps.image2data_mapping.contains_key(image_id) {
      log::warn!("Anchor \"{}\" is assigned to unknown image \"{}\".", anchor_id, image_id);
    }
    maps.anchor2image_mapping.insert(anchor_id.to_owned(), image_id.to_owned());
  }

  /// Get the image identifier of an anchor.
  /// param anchor_id: The anchor identifier.
  /// return: The image identifier.
  pub fn image_for_anchor(&self, anchor_id: &str) -> Option<String> {
    self.maps.read().anchor2image_mapping.get(anchor_id).cloned()
  }

  /// Get a captured image.
  /// param image_id: The image identifier.
  /// return: The captured image.
  pub fn image(&self, image_id: &str) -> Option<HalaCapturedImage> {
    self.maps.read().image2data_mapping.get(image_id).cloned()
  }

  pub fn num_of_images(&self) -> usize {
    self.maps.read().image2data_mapping.len()
  }

  pub fn num_of_anchors(&self) -> usize {
    self.maps.read().anchor2image_mapping.len()
  }

  /// Copy the current mappings. Images are shared, not copied.
  /// return: The snapshot.
  pub fn snapshot(&self) -> HalaImageIndex {
    let maps = self.maps.read();
    HalaImageIndex {
      anchor2image_mapping: maps.anchor2image_mapping.clone(),
      image2data_mapping: maps.image2data_mapping.clone(),
    }
  }
}

/// A consistent copy of the registry taken for one export.
#[derive(Clone, Debug, Default)]
pub struct HalaImageIndex {
  pub anchor2image_mapping: HashMap<String, String>,
  pub image2data_mapping: HashMap<String, HalaCapturedImage>,
}

impl HalaImageIndex {
  pub fn image(&self, image_id: &str) -> Option<&HalaCapturedImage> {
    self.image2data_mapping.get(image_id)
  }
}

/// Anchors whose image has no stored data resolve to nothing, so they fall back to the default image.
impl HalaImageLookup for HalaImageIndex {
  fn image_for(&self, fragment_id: &str) -> Option<String> {
    self.anchor2image_mapping.get(fragment_id)
      .filter(|image_id| self.image2data_mapping.contains_key(image_id.as_str()))
      .cloned()
  }

  fn camera_for(&self, fragment_id: &str) -> Option<HalaCameraFrame> {
    self.anchor2image_mapping.get(fragment_id)
      .and_then(|image_id| self.image2data_mapping.get(image_id))
      .and_then(|captured| captured.camera)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use glam::Mat4;
  use crate::scene::cpu::image_data::HalaPixelFormat;

  fn pixel() -> HalaImageData {
    HalaImageData::new(HalaPixelFormat::Rgb8, 1, 1, vec![1, 2, 3]).unwrap()
  }

  #[test]
  fn test_assigned_anchor_resolves_image_and_camera() {
    let registry = HalaAnchorImageRegistry::new();
    let camera = HalaCameraFrame::from_pinhole(1.0, 1.0, 0.5, 0.5, (1, 1), Mat4::IDENTITY);
    let image_id = registry.add_image(pixel(), Some(camera));
    registry.assign("anchor-0", &image_id);

    let index = registry.snapshot();
    assert_eq!(index.image_for("anchor-0"), Some(image_id.clone()));
    assert_eq!(index.camera_for("anchor-0"), Some(camera));
    assert_eq!(index.image_for("anchor-1"), None);
    assert_eq!(index.image(&image_id).map(|c| c.image.data.clone()), Some(vec![1, 2, 3]));
  }

  #[test]
  fn test_anchor_of_unknown_image_is_unmapped() {
    let registry = HalaAnchorImageRegistry::new();
    registry.assign("anchor-0", "ghost");
    assert_eq!(registry.image_for_anchor("anchor-0"), Some("ghost".to_string()));

    let index = registry.snapshot();
    assert_eq!(index.image_for("anchor-0"), None);
    assert_eq!(index.camera_for("anchor-0"), None);

    registry.insert_image("ghost", pixel(), None);
    assert_eq!(registry.snapshot().image_for("anchor-0"), Some("ghost".to_string()));
  }

  #[test]
  fn test_snapshot_is_isolated_from_later_writes() {
    let registry = HalaAnchorImageRegistry::new();
    let first = registry.add_image(pixel(), None);
    registry.assign("anchor-0", &first);
    let index = registry.snapshot();

    let second = registry.add_image(pixel(), None);
    registry.assign("anchor-0", &second);
    assert_eq!(index.image_for("anchor-0"), Some(first));
    assert_eq!(registry.image_for_anchor("anchor-0"), Some(second));
    assert_eq!(registry.num_of_images(), 2);
    assert_eq!(registry.num_of_anchors(), 1);
  }

  #[test]
  fn test_concurrent_writers() {
    let registry = Arc::new(HalaAnchorImageRegistry::new());
    let handles = (0..4).map(|t| {
      let registry = Arc::clone(&registry);
      std::thread::spawn(move || {
        for i in 0..16 {
          let image_id = registry.add_image(pixel(), None);
          registry.assign(&format!("anchor-{}-{}", t, i), &image_id);
        }
      })
    }).collect::<Vec<_>>();
    for handle in handles {
      handle.join().unwrap();
    }
    assert_eq!(registry.num_of_anchors(), 64);
    assert_eq!(registry.num_of_images(), 64);
  }
}
