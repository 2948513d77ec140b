pub mod vertex;
pub mod transform;
pub mod projector;
pub mod builder;
pub mod cpu;

pub use vertex::{
  HalaVertexLayout,
  HalaVertexRecord,
  HalaVertexBuffer,
  HalaPositionVertex,
  HalaVertex,
  HalaTexturedVertex,
};
pub use builder::{
  HalaImageLookup,
  HalaMeshBuilder,
};
