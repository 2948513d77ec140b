pub mod fragment;
pub mod material;
pub mod image_data;
pub mod mesh;
pub mod camera;
pub mod asset;

pub use asset::HalaMergedAsset;
