use glam::Vec3;

/// The file extension of exported texture images.
pub const HALA_IMAGE_EXTENSION: &str = "jpeg";

/// A material for an exported submesh.
#[derive(Debug, Clone, PartialEq)]
pub struct HalaMaterial {
  pub name: String,
  pub base_color: Vec3,
  /// The identifier of the base color image, used as its file stem.
  pub base_color_image: String,
}

/// The implementation of the material.
impl HalaMaterial {
  /// Create a white material textured with the given image.
  /// param name: The material name.
  /// param image_id: The image identifier.
  /// return: The material.
  pub fn new(name: &str, image_id: &str) -> Self {
    Self {
      name: name.to_owned(),
      base_color: Vec3::ONE,
      base_color_image: image_id.to_owned(),
    }
  }

  /// Get the file name of the base color image.
  /// return: The file name.
  pub fn base_color_file_name(&self) -> String {
    format!("{}.{}", self.base_color_image, HALA_IMAGE_EXTENSION)
  }
}
