use crate::scene::HalaVertexBuffer;

/// A triangle index buffer, keeping the width the scanner produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalaIndexBuffer {
  UInt16(Vec<u16>),
  UInt32(Vec<u32>),
}

impl HalaIndexBuffer {
  pub fn len(&self) -> usize {
    match self {
      HalaIndexBuffer::UInt16(indices) => indices.len(),
      HalaIndexBuffer::UInt32(indices) => indices.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn get(&self, index: usize) -> u32 {
    match self {
      HalaIndexBuffer::UInt16(indices) => indices[index] as u32,
      HalaIndexBuffer::UInt32(indices) => indices[index],
    }
  }

  pub fn as_bytes(&self) -> &[u8] {
    match self {
      HalaIndexBuffer::UInt16(indices) => bytemuck::cast_slice(indices),
      HalaIndexBuffer::UInt32(indices) => bytemuck::cast_slice(indices),
    }
  }

  /// Iterate the triangles.
  /// return: The triangle iterator.
  pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
    (0..self.len() / 3).map(move |t| [self.get(t * 3), self.get(t * 3 + 1), self.get(t * 3 + 2)])
  }
}

/// One fragment's contribution to the merged asset.
/// The indices address this submesh's own vertex buffer only.
#[derive(Debug, Clone, PartialEq)]
pub struct HalaSubmesh {
  pub name: String,
  pub vertices: HalaVertexBuffer,
  pub indices: HalaIndexBuffer,
  pub material_index: u32,
}

impl HalaSubmesh {
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }
}
