use glam::{
  Mat4,
  Vec3,
  Vec4,
};

/// Position helpers for anchor transforms.
pub trait HalaTransformExt {
  /// Get the translation column of the transform.
  /// return: The position.
  fn position(&self) -> Vec3;
}

impl HalaTransformExt for Mat4 {
  fn position(&self) -> Vec3 {
    self.w_axis.truncate()
  }
}

/// Transform a fragment local position to world space.
/// The local position is placed in the translation column of an identity matrix,
/// so the product's translation column is the transformed point.
/// param local: The local position.
/// param transform: The local to world transform.
/// return: The world space position.
pub fn world_position(local: Vec3, transform: &Mat4) -> Vec3 {
  let mut vertex_transform = Mat4::IDENTITY;
  vertex_transform.w_axis = Vec4::new(local.x, local.y, local.z, 1.0);
  (*transform * vertex_transform).position()
}

#[cfg(test)]
mod tests {
  use super::*;
  use glam::Quat;

  #[test]
  fn test_origin_maps_to_translation() {
    let transform = Mat4::from_rotation_translation(Quat::from_rotation_y(0.7), Vec3::new(1.5, -2.0, 3.25));
    assert_eq!(world_position(Vec3::ZERO, &transform), Vec3::new(1.5, -2.0, 3.25));
  }

  #[test]
  fn test_matches_affine_point_transform() {
    let transform = Mat4::from_scale_rotation_translation(
      Vec3::new(2.0, 1.0, 0.5),
      Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
      Vec3::new(0.0, 10.0, 0.0),
    );
    let local = Vec3::new(1.0, 2.0, 3.0);
    let world = world_position(local, &transform);
    assert!(world.abs_diff_eq(transform.transform_point3(local), 1e-5));
  }

  #[test]
  fn test_identity_keeps_position() {
    let local = Vec3::new(-0.25, 0.5, 8.0);
    assert_eq!(world_position(local, &Mat4::IDENTITY), local);
  }
}
