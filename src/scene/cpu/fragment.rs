use glam::{
  Mat4,
  Vec3,
};

use crate::error::{
  HalaExportError,
  HalaExportErrorKind,
};
use super::mesh::HalaIndexBuffer;

fn geometry_error(msg: &str) -> HalaExportError {
  HalaExportError::new(HalaExportErrorKind::Geometry, msg, None)
}

/// The element format of a geometry source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalaVertexFormat {
  Float2,
  Float3,
  Float4,
}

impl HalaVertexFormat {
  pub fn size(&self) -> usize {
    match self {
      HalaVertexFormat::Float2 => 8,
      HalaVertexFormat::Float3 => 12,
      HalaVertexFormat::Float4 => 16,
    }
  }
}

/// The index width of a geometry element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalaIndexType {
  UInt16,
  UInt32,
}

impl HalaIndexType {
  pub fn size(&self) -> usize {
    match self {
      HalaIndexType::UInt16 => 2,
      HalaIndexType::UInt32 => 4,
    }
  }
}

/// A raw per-vertex buffer with a fixed stride.
#[derive(Clone, Debug)]
pub struct HalaGeometrySource {
  bytes: Vec<u8>,
  format: HalaVertexFormat,
  offset: usize,
  stride: usize,
  count: usize,
}

/// The implementation of the geometry source.
impl HalaGeometrySource {
  /// Create a geometry source and check the buffer covers every element.
  /// param bytes: The raw buffer.
  /// param format: The element format.
  /// param offset: The byte offset of the first element.
  /// param stride: The byte distance between two elements.
  /// param count: The number of elements.
  /// return: The geometry source.
  pub fn new(bytes: Vec<u8>, format: HalaVertexFormat, offset: usize, stride: usize, count: usize) -> Result<Self, HalaExportError> {
    if stride < format.size() {
      return Err(geometry_error(&format!("The stride {} is smaller than the element size {}.", stride, format.size())));
    }
    let required = if count == 0 {
      Some(0)
    } else {
      stride.checked_mul(count - 1)
        .and_then(|span| span.checked_add(offset))
        .and_then(|span| span.checked_add(format.size()))
    };
    let Some(required) = required else {
      return Err(geometry_error(&format!("The geometry source with {} elements of stride {} is too large.", count, stride)));
    };
    if bytes.len() < required {
      return Err(geometry_error(&format!("The geometry source needs {} bytes for {} elements but has {}.", required, count, bytes.len())));
    }
    Ok(Self {
      bytes,
      format,
      offset,
      stride,
      count,
    })
  }

  /// Create a tightly packed float3 source from vectors.
  /// param values: The values.
  /// return: The geometry source.
  pub fn from_vec3s(values: &[Vec3]) -> Self {
    let packed = values.iter().map(|v| v.to_array()).collect::<Vec<_>>();
    Self {
      bytes: bytemuck::cast_slice(&packed).to_vec(),
      format: HalaVertexFormat::Float3,
      offset: 0,
      stride: HalaVertexFormat::Float3.size(),
      count: values.len(),
    }
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn format(&self) -> HalaVertexFormat {
    self.format
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  pub fn stride(&self) -> usize {
    self.stride
  }

  pub fn count(&self) -> usize {
    self.count
  }

  /// Read the three floats of an element.
  /// param index: The element index.
  /// return: The element.
  pub fn float3(&self, index: usize) -> Vec3 {
    debug_assert_eq!(self.format, HalaVertexFormat::Float3, "Expected three floats (twelve bytes) per vertex.");
    debug_assert!(index < self.count, "Element index {} out of range {}.", index, self.count);
    let start = self.offset + self.stride * index;
    Vec3::from_array(bytemuck::pod_read_unaligned(&self.bytes[start..start + 12]))
  }
}

/// A raw triangle index buffer.
#[derive(Clone, Debug)]
pub struct HalaGeometryElement {
  bytes: Vec<u8>,
  index_type: HalaIndexType,
  count: usize,
}

/// The implementation of the geometry element.
impl HalaGeometryElement {
  pub const INDICES_PER_PRIMITIVE: usize = 3;

  /// Create a geometry element and check the buffer covers every triangle.
  /// param bytes: The raw index buffer.
  /// param index_type: The index width.
  /// param count: The number of triangles.
  /// return: The geometry element.
  pub fn new(bytes: Vec<u8>, index_type: HalaIndexType, count: usize) -> Result<Self, HalaExportError> {
    let Some(required) = count.checked_mul(Self::INDICES_PER_PRIMITIVE * index_type.size()) else {
      return Err(geometry_error(&format!("The face buffer with {} triangles is too large.", count)));
    };
    if bytes.len() < required {
      return Err(geometry_error(&format!("The face buffer needs {} bytes for {} triangles but has {}.", required, count, bytes.len())));
    }
    Ok(Self {
      bytes,
      index_type,
      count,
    })
  }

  /// Create a 32 bit element from a flat index list.
  /// param indices: The indices, three per triangle.
  /// return: The geometry element.
  pub fn from_u32s(indices: &[u32]) -> Result<Self, HalaExportError> {
    Self::new(bytemuck::cast_slice(indices).to_vec(), HalaIndexType::UInt32, Self::triangle_count(indices.len())?)
  }

  /// Create a 16 bit element from a flat index list.
  /// param indices: The indices, three per triangle.
  /// return: The geometry element.
  pub fn from_u16s(indices: &[u16]) -> Result<Self, HalaExportError> {
    Self::new(bytemuck::cast_slice(indices).to_vec(), HalaIndexType::UInt16, Self::triangle_count(indices.len())?)
  }

  fn triangle_count(index_count: usize) -> Result<usize, HalaExportError> {
    if index_count % Self::INDICES_PER_PRIMITIVE != 0 {
      return Err(geometry_error(&format!("{} indices do not form whole triangles.", index_count)));
    }
    Ok(index_count / Self::INDICES_PER_PRIMITIVE)
  }

  pub fn index_type(&self) -> HalaIndexType {
    self.index_type
  }

  pub fn count(&self) -> usize {
    self.count
  }

  pub fn index_count(&self) -> usize {
    self.count * Self::INDICES_PER_PRIMITIVE
  }

  fn index(&self, at: usize) -> u32 {
    match self.index_type {
      HalaIndexType::UInt16 => {
        let start = at * 2;
        bytemuck::pod_read_unaligned::<u16>(&self.bytes[start..start + 2]) as u32
      },
      HalaIndexType::UInt32 => {
        let start = at * 4;
        bytemuck::pod_read_unaligned::<u32>(&self.bytes[start..start + 4])
      },
    }
  }

  /// Get the three indices of a triangle.
  /// param index: The triangle index.
  /// return: The vertex indices.
  pub fn face(&self, index: usize) -> [u32; 3] {
    let base = index * Self::INDICES_PER_PRIMITIVE;
    [self.index(base), self.index(base + 1), self.index(base + 2)]
  }

  /// Copy the indices keeping their width.
  /// return: The index buffer.
  pub fn to_index_buffer(&self) -> HalaIndexBuffer {
    let bytes = &self.bytes[..self.index_count() * self.index_type.size()];
    match self.index_type {
      HalaIndexType::UInt16 => HalaIndexBuffer::UInt16(bytemuck::pod_collect_to_vec(bytes)),
      HalaIndexType::UInt32 => HalaIndexBuffer::UInt32(bytemuck::pod_collect_to_vec(bytes)),
    }
  }
}

/// One scanned surface patch.
#[derive(Clone, Debug)]
/// The buffers are checked once on creation and are read-only afterwards.
pub struct HalaMeshFragment {
  id: String,
  transform: Mat4,
  vertices: HalaGeometrySource,
  normals: HalaGeometrySource,
  faces: HalaGeometryElement,
}

/// The implementation of the mesh fragment.
impl HalaMeshFragment {
  /// Create a mesh fragment.
  /// Vertices and normals must be float3 with the same count and every face index must be in range.
  /// param id: The anchor identifier.
  /// param transform: The local to world transform.
  /// param vertices: The vertex positions.
  /// param normals: The vertex normals.
  /// param faces: The triangles.
  /// return: The mesh fragment.
  pub fn new(
    id: &str,
    transform: Mat4,
    vertices: HalaGeometrySource,
    normals: HalaGeometrySource,
    faces: HalaGeometryElement,
  ) -> Result<Self, HalaExportError> {
    if vertices.format != HalaVertexFormat::Float3 || normals.format != HalaVertexFormat::Float3 {
      return Err(geometry_error(&format!("Fragment \"{}\" vertices and normals must be three floats per element.", id)));
    }
    if vertices.count != normals.count {
      return Err(geometry_error(&format!("Fragment \"{}\" has {} vertices but {} normals.", id, vertices.count, normals.count)));
    }
    for face_index in 0..faces.count {
      let face = faces.face(face_index);
      if let Some(index) = face.iter().find(|&&i| i as usize >= vertices.count) {
        return Err(geometry_error(&format!("Fragment \"{}\" face {} references vertex {} of {}.", id, face_index, index, vertices.count)));
      }
    }

    Ok(Self {
      id: id.to_owned(),
      transform,
      vertices,
      normals,
      faces,
    })
  }

  /// Create a mesh fragment from tightly packed data.
  /// param id: The anchor identifier.
  /// param transform: The local to world transform.
  /// param positions: The vertex positions.
  /// param normals: The vertex normals.
  /// param indices: The indices, three per triangle.
  /// return: The mesh fragment.
  pub fn with_data(
    id: &str,
    transform: Mat4,
    positions: &[Vec3],
    normals: &[Vec3],
    indices: &[u32],
  ) -> Result<Self, HalaExportError> {
    Self::new(
      id,
      transform,
      HalaGeometrySource::from_vec3s(positions),
      HalaGeometrySource::from_vec3s(normals),
      HalaGeometryElement::from_u32s(indices)?,
    )
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn transform(&self) -> &Mat4 {
    &self.transform
  }

  pub fn vertices(&self) -> &HalaGeometrySource {
    &self.vertices
  }

  pub fn normals(&self) -> &HalaGeometrySource {
    &self.normals
  }

  pub fn faces(&self) -> &HalaGeometryElement {
    &self.faces
  }

  pub fn vertex_count(&self) -> usize {
    self.vertices.count
  }

  pub fn face_count(&self) -> usize {
    self.faces.count
  }

  /// Get the local position of a vertex.
  /// param index: The vertex index.
  /// return: The position.
  pub fn vertex(&self, index: usize) -> Vec3 {
    self.vertices.float3(index)
  }

  /// Get the normal of a vertex.
  /// param index: The vertex index.
  /// return: The normal.
  pub fn normal(&self, index: usize) -> Vec3 {
    self.normals.float3(index)
  }
}
