use glam::Vec2;

use crate::scene::{
  HalaPositionVertex,
  HalaTexturedVertex,
  HalaVertex,
  HalaVertexBuffer,
  HalaVertexLayout,
  HalaVertexRecord,
};
use crate::scene::transform::world_position;
use crate::scene::projector::project_uv;
use super::cpu::{
  HalaMergedAsset,
  camera::HalaCameraFrame,
  fragment::HalaMeshFragment,
  material::HalaMaterial,
  mesh::HalaSubmesh,
};

/// Resolves the texture image, and the camera it was captured with, of a fragment.
pub trait HalaImageLookup {
  /// Get the image identifier of a fragment.
  /// param fragment_id: The fragment identifier.
  /// return: The image identifier or None if the fragment has no image.
  fn image_for(&self, fragment_id: &str) -> Option<String>;

  /// Get the camera the fragment's image was captured with.
  /// param fragment_id: The fragment identifier.
  /// return: The camera or None to use the builder's camera.
  fn camera_for(&self, _fragment_id: &str) -> Option<HalaCameraFrame> {
    None
  }
}

impl<F> HalaImageLookup for F
where
  F: Fn(&str) -> Option<String>,
{
  fn image_for(&self, fragment_id: &str) -> Option<String> {
    self(fragment_id)
  }
}

/// Merges mesh fragments into one export asset.
pub struct HalaMeshBuilder {
  pub layout: HalaVertexLayout,
  pub default_image: String,
  pub camera: Option<HalaCameraFrame>,
}

/// The implementation of the mesh builder.
impl HalaMeshBuilder {
  /// Create a new mesh builder.
  /// param layout: The vertex layout of every submesh.
  /// param default_image: The image identifier of fragments without a mapped image.
  /// return: The mesh builder.
  pub fn new(layout: HalaVertexLayout, default_image: &str) -> Self {
    Self {
      layout,
      default_image: default_image.to_owned(),
      camera: None,
    }
  }

  /// Set the camera used for fragments whose image has no camera of its own.
  /// param camera: The camera.
  /// return: The mesh builder.
  pub fn with_camera(mut self, camera: Option<HalaCameraFrame>) -> Self {
    self.camera = camera;
    self
  }

  /// Build the merged asset. Fragments are processed in order, each into its own submesh.
  /// param fragments: The fragments.
  /// param lookup: The fragment to image lookup.
  /// return: The merged asset.
  pub fn build(&self, fragments: &[HalaMeshFragment], lookup: &dyn HalaImageLookup) -> HalaMergedAsset {
    let mut submeshes = Vec::with_capacity(fragments.len());
    let mut materials = Vec::with_capacity(fragments.len());

    for (index, fragment) in fragments.iter().enumerate() {
      log::debug!(
        "Building submesh {} from fragment \"{}\" with {} vertices and {} faces.",
        index, fragment.id(), fragment.vertex_count(), fragment.face_count());

      let camera = if self.layout.has_uv() {
        let camera = lookup.camera_for(fragment.id()).or(self.camera);
        if camera.is_none() {
          log::warn!("No camera for fragment \"{}\", its texture coordinates are zero.", fragment.id());
        }
        camera
      } else {
        None
      };

      let vertices = match self.layout {
        HalaVertexLayout::Position => Self::build_vertices::<HalaPositionVertex>(fragment, camera.as_ref()),
        HalaVertexLayout::PositionNormal => Self::build_vertices::<HalaVertex>(fragment, camera.as_ref()),
        HalaVertexLayout::PositionNormalUv => Self::build_vertices::<HalaTexturedVertex>(fragment, camera.as_ref()),
      };

      let image_id = lookup.image_for(fragment.id()).unwrap_or_else(|| self.default_image.clone());
      materials.push(HalaMaterial::new(&format!("material_{}", index), &image_id));
      submeshes.push(HalaSubmesh {
        name: fragment.id().to_owned(),
        vertices,
        indices: fragment.faces().to_index_buffer(),
        material_index: index as u32,
      });
    }

    HalaMergedAsset {
      layout: self.layout,
      submeshes,
      materials,
    }
  }

  /// Transform and interleave the vertices of one fragment.
  /// Normals are copied without applying the anchor transform.
  /// param fragment: The fragment.
  /// param camera: The camera for texture coordinates.
  /// return: The vertex buffer.
  fn build_vertices<V: HalaVertexRecord>(fragment: &HalaMeshFragment, camera: Option<&HalaCameraFrame>) -> HalaVertexBuffer {
    let mut records = Vec::with_capacity(fragment.vertex_count());
    for i in 0..fragment.vertex_count() {
      let position = world_position(fragment.vertex(i), fragment.transform());
      let normal = fragment.normal(i);
      let uv = match camera {
        Some(camera) if V::LAYOUT.has_uv() => project_uv(position, camera),
        _ => Vec2::ZERO,
      };
      records.push(V::assemble(position, normal, uv));
    }
    HalaVertexBuffer::from_records(&records)
  }
}
