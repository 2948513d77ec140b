use bytemuck::{
  Pod,
  Zeroable,
};
use glam::{
  Vec2,
  Vec3,
};
use serde::{
  Deserialize,
  Serialize,
};

/// The attribute set of an exported vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalaVertexLayout {
  Position,
  PositionNormal,
  PositionNormalUv,
}

/// The implementation of the vertex layout.
impl HalaVertexLayout {
  /// Get the stride in bytes of one vertex record.
  /// return: The stride.
  pub fn stride(&self) -> usize {
    match self {
      HalaVertexLayout::Position => std::mem::size_of::<HalaPositionVertex>(),
      HalaVertexLayout::PositionNormal => std::mem::size_of::<HalaVertex>(),
      HalaVertexLayout::PositionNormalUv => std::mem::size_of::<HalaTexturedVertex>(),
    }
  }

  pub fn has_normal(&self) -> bool {
    *self != HalaVertexLayout::Position
  }

  pub fn has_uv(&self) -> bool {
    *self == HalaVertexLayout::PositionNormalUv
  }
}

/// A vertex record which can be built from the exported attributes.
pub trait HalaVertexRecord: Pod {
  const LAYOUT: HalaVertexLayout;

  /// Assemble a record. Attributes the layout does not carry are dropped.
  /// param position: The world space position.
  /// param normal: The normal.
  /// param uv: The texture coordinate.
  /// return: The record.
  fn assemble(position: Vec3, normal: Vec3, uv: Vec2) -> Self;
}

/// The position only vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct HalaPositionVertex {
  pub position: [f32; 3],
}

/// The vertex with position and normal.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct HalaVertex {
  pub position: [f32; 3],
  pub normal: [f32; 3],
}

/// The vertex with position, normal and texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct HalaTexturedVertex {
  pub position: [f32; 3],
  pub normal: [f32; 3],
  pub tex_coord: [f32; 2],
}

impl HalaVertexRecord for HalaPositionVertex {
  const LAYOUT: HalaVertexLayout = HalaVertexLayout::Position;

  fn assemble(position: Vec3, _normal: Vec3, _uv: Vec2) -> Self {
    Self { position: position.to_array() }
  }
}

impl HalaVertexRecord for HalaVertex {
  const LAYOUT: HalaVertexLayout = HalaVertexLayout::PositionNormal;

  fn assemble(position: Vec3, normal: Vec3, _uv: Vec2) -> Self {
    Self {
      position: position.to_array(),
      normal: normal.to_array(),
    }
  }
}

impl HalaVertexRecord for HalaTexturedVertex {
  const LAYOUT: HalaVertexLayout = HalaVertexLayout::PositionNormalUv;

  fn assemble(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
    Self {
      position: position.to_array(),
      normal: normal.to_array(),
      tex_coord: uv.to_array(),
    }
  }
}

/// An interleaved, densely packed vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct HalaVertexBuffer {
  layout: HalaVertexLayout,
  bytes: Vec<u8>,
}

/// The implementation of the vertex buffer.
impl HalaVertexBuffer {
  /// Create a vertex buffer from typed records.
  /// param records: The vertex records.
  /// return: The vertex buffer.
  pub fn from_records<V: HalaVertexRecord>(records: &[V]) -> Self {
    Self {
      layout: V::LAYOUT,
      bytes: bytemuck::cast_slice(records).to_vec(),
    }
  }

  /// Create an empty vertex buffer.
  /// param layout: The vertex layout.
  /// return: The vertex buffer.
  pub fn empty(layout: HalaVertexLayout) -> Self {
    Self {
      layout,
      bytes: Vec::new(),
    }
  }

  pub fn layout(&self) -> HalaVertexLayout {
    self.layout
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn len(&self) -> usize {
    self.bytes.len() / self.layout.stride()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// Read a float attribute at the given byte offset inside a record.
  fn read<const N: usize>(&self, index: usize, offset: usize) -> [f32; N] {
    let start = index * self.layout.stride() + offset;
    bytemuck::pod_read_unaligned(&self.bytes[start..start + N * std::mem::size_of::<f32>()])
  }

  /// Get the position of a vertex.
  /// param index: The vertex index.
  /// return: The position.
  pub fn position(&self, index: usize) -> Vec3 {
    Vec3::from_array(self.read::<3>(index, 0))
  }

  /// Get the normal of a vertex.
  /// param index: The vertex index.
  /// return: The normal or None if the layout has no normals.
  pub fn normal(&self, index: usize) -> Option<Vec3> {
    self.layout.has_normal().then(|| Vec3::from_array(self.read::<3>(index, 12)))
  }

  /// Get the texture coordinate of a vertex.
  /// param index: The vertex index.
  /// return: The texture coordinate or None if the layout has no texture coordinates.
  pub fn tex_coord(&self, index: usize) -> Option<Vec2> {
    self.layout.has_uv().then(|| Vec2::from_array(self.read::<2>(index, 24)))
  }
}
