use glam::{
  Vec2,
  Vec3,
};

use crate::scene::cpu::camera::HalaCameraFrame;

/// Compute the texture coordinate of a world space vertex on the captured image.
/// The point goes through a portrait viewport sized (image height, image width),
/// which undoes the sensor's 90 degree rotation. The result is not clamped.
/// param world: The world space vertex.
/// param camera: The camera the image was captured with.
/// return: The texture coordinate.
pub fn project_uv(world: Vec3, camera: &HalaCameraFrame) -> Vec2 {
  let (width, height) = (camera.image_resolution.0 as f32, camera.image_resolution.1 as f32);
  let point = camera.project_portrait(world, Vec2::new(height, width));
  let v = 1.0 - point.x / height;
  let u = point.y / width;
  Vec2::new(u, v)
}
