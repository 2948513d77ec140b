use crate::scene::HalaVertexLayout;
use super::mesh::HalaSubmesh;
use super::material::HalaMaterial;

/// The merged export asset: one submesh and one material per fragment, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct HalaMergedAsset {
  pub layout: HalaVertexLayout,
  pub submeshes: Vec<HalaSubmesh>,
  pub materials: Vec<HalaMaterial>,
}

/// The Drop implementation of the merged asset.
impl Drop for HalaMergedAsset {
  fn drop(&mut self) {
    log::debug!("A HalaMergedAsset with {} submeshes dropped.", self.submeshes.len());
  }
}

/// The implementation of the merged asset.
impl HalaMergedAsset {
  pub fn is_empty(&self) -> bool {
    self.submeshes.is_empty()
  }

  pub fn vertex_count(&self) -> usize {
    self.submeshes.iter().map(|submesh| submesh.vertices.len()).sum()
  }

  pub fn triangle_count(&self) -> usize {
    self.submeshes.iter().map(|submesh| submesh.triangle_count()).sum()
  }

  /// Get the material of a submesh.
  /// param submesh: The submesh.
  /// return: The material or None if the index is out of range.
  pub fn material_of(&self, submesh: &HalaSubmesh) -> Option<&HalaMaterial> {
    self.materials.get(submesh.material_index as usize)
  }

  /// Get the distinct image identifiers referenced by the materials, in material order.
  /// return: The image identifiers.
  pub fn referenced_images(&self) -> Vec<&str> {
    let mut images: Vec<&str> = Vec::new();
    for material in self.materials.iter() {
      if !images.contains(&material.base_color_image.as_str()) {
        images.push(&material.base_color_image);
      }
    }
    images
  }
}
