use glam::{
  Mat3,
  Mat4,
  Vec2,
  Vec3,
};

/// The camera at the moment an image was captured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HalaCameraFrame {
  /// Pinhole intrinsics in sensor pixels, column major:
  /// x_axis = (fx, 0, 0), y_axis = (0, fy, 0), z_axis = (cx, cy, 1).
  pub intrinsics: Mat3,
  /// Camera to world transform. The camera looks down its -Z axis with +Y up.
  pub transform: Mat4,
  /// Width and height of the captured image in sensor pixels.
  pub image_resolution: (u32, u32),
}

/// The implementation of the camera frame.
impl HalaCameraFrame {
  /// Create a camera frame from pinhole parameters.
  /// param fx: The focal length in X.
  /// param fy: The focal length in Y.
  /// param cx: The principal point X.
  /// param cy: The principal point Y.
  /// param image_resolution: The image width and height.
  /// param transform: The camera to world transform.
  /// return: The camera frame.
  pub fn from_pinhole(fx: f32, fy: f32, cx: f32, cy: f32, image_resolution: (u32, u32), transform: Mat4) -> Self {
    Self {
      intrinsics: Mat3::from_cols(
        Vec3::new(fx, 0.0, 0.0),
        Vec3::new(0.0, fy, 0.0),
        Vec3::new(cx, cy, 1.0),
      ),
      transform,
      image_resolution,
    }
  }

  pub fn focal_length(&self) -> Vec2 {
    Vec2::new(self.intrinsics.x_axis.x, self.intrinsics.y_axis.y)
  }

  pub fn principal_point(&self) -> Vec2 {
    self.intrinsics.z_axis.truncate()
  }

  pub fn image_size(&self) -> Vec2 {
    Vec2::new(self.image_resolution.0 as f32, self.image_resolution.1 as f32)
  }

  /// Project a world point onto the captured image in sensor pixels.
  /// Points behind the camera are not rejected.
  /// param point: The world space point.
  /// return: The pixel position, origin at the top left.
  pub fn project_to_image(&self, point: Vec3) -> Vec2 {
    let point_camera = self.transform.inverse().transform_point3(point);
    let depth = -point_camera.z;
    let focal = self.focal_length();
    let principal = self.principal_point();
    Vec2::new(
      principal.x + focal.x * point_camera.x / depth,
      principal.y - focal.y * point_camera.y / depth,
    )
  }

  /// Project a world point into a portrait viewport.
  /// The sensor is landscape, so the image is turned 90 degrees clockwise first.
  /// param point: The world space point.
  /// param viewport_size: The viewport width and height, with the aspect ratio of the turned image.
  /// return: The viewport position, origin at the top left.
  pub fn project_portrait(&self, point: Vec3, viewport_size: Vec2) -> Vec2 {
    let pixel = self.project_to_image(point);
    let size = self.image_size();
    Vec2::new(size.y - pixel.y, pixel.x) * viewport_size / Vec2::new(size.y, size.x)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn camera() -> HalaCameraFrame {
    HalaCameraFrame::from_pinhole(1000.0, 1000.0, 960.0, 720.0, (1920, 1440), Mat4::IDENTITY)
  }

  #[test]
  fn test_optical_axis_hits_principal_point() {
    let pixel = camera().project_to_image(Vec3::new(0.0, 0.0, -2.0));
    assert!(pixel.abs_diff_eq(Vec2::new(960.0, 720.0), 1e-4));
  }

  #[test]
  fn test_up_is_towards_image_top() {
    let pixel = camera().project_to_image(Vec3::new(0.0, 0.5, -1.0));
    assert!(pixel.abs_diff_eq(Vec2::new(960.0, 220.0), 1e-3));
  }

  #[test]
  fn test_portrait_swaps_axes() {
    let camera = camera();
    let point = Vec3::new(0.3, 0.2, -1.0);
    let pixel = camera.project_to_image(point);
    let portrait = camera.project_portrait(point, Vec2::new(1440.0, 1920.0));
    assert!(portrait.abs_diff_eq(Vec2::new(1440.0 - pixel.y, pixel.x), 1e-3));
  }

  #[test]
  fn test_viewport_scales_projection() {
    let camera = camera();
    let point = Vec3::new(-0.1, 0.1, -3.0);
    let full = camera.project_portrait(point, Vec2::new(1440.0, 1920.0));
    let half = camera.project_portrait(point, Vec2::new(720.0, 960.0));
    assert!((full * 0.5).abs_diff_eq(half, 1e-3));
  }

  #[test]
  fn test_moved_camera_uses_its_pose() {
    let transform = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
    let camera = HalaCameraFrame::from_pinhole(1000.0, 1000.0, 960.0, 720.0, (1920, 1440), transform);
    let pixel = camera.project_to_image(Vec3::new(2.0, 0.0, -5.0));
    assert!(pixel.abs_diff_eq(Vec2::new(960.0, 720.0), 1e-3));
  }
}
