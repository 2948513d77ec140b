use std::fs::File;
use std::io::{
  BufWriter,
  Write,
};
use std::path::{
  Path,
  PathBuf,
};

use crate::error::{
  HalaExportError,
  HalaExportErrorKind,
};
use crate::scene::cpu::HalaMergedAsset;

/// Writes a merged asset as Wavefront OBJ with a companion MTL library.
pub struct HalaObjWriter;

/// The implementation of the OBJ writer.
impl HalaObjWriter {
  /// Write `<base_name>.obj` and `<base_name>.mtl` into a directory.
  /// param asset: The merged asset.
  /// param directory: The destination directory, which must exist.
  /// param base_name: The file stem.
  /// return: The OBJ and MTL paths.
  pub fn save<P: AsRef<Path>>(asset: &HalaMergedAsset, directory: P, base_name: &str) -> Result<(PathBuf, PathBuf), HalaExportError> {
    let directory = directory.as_ref();
    let mtl_file_name = format!("{}.mtl", base_name);
    let obj_path = directory.join(format!("{}.obj", base_name));
    let mtl_path = directory.join(&mtl_file_name);

    Self::save_with(&obj_path, |writer| Self::write_obj(asset, &mtl_file_name, writer))?;
    Self::save_with(&mtl_path, |writer| Self::write_mtl(asset, writer))?;

    log::debug!("Wrote {} submeshes to \"{:?}\".", asset.submeshes.len(), obj_path);
    Ok((obj_path, mtl_path))
  }

  fn save_with<F>(path: &Path, write: F) -> Result<(), HalaExportError>
  where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
  {
    let file = File::create(path)
      .map_err(|err| HalaExportError::new(
        HalaExportErrorKind::FileSystem,
        &format!("Create file \"{:?}\" failed.", path),
        Some(Box::new(err))))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)
      .and_then(|_| writer.flush())
      .map_err(|err| HalaExportError::new(
        HalaExportErrorKind::Serialization,
        &format!("Write file \"{:?}\" failed.", path),
        Some(Box::new(err))))
  }

  /// Write the OBJ text. Face indices are 1-based and offset by the preceding submeshes.
  /// param asset: The merged asset.
  /// param mtl_file_name: The material library referenced by the OBJ.
  /// param writer: The destination.
  /// return: The result.
  pub fn write_obj<W: Write>(asset: &HalaMergedAsset, mtl_file_name: &str, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "# hala-scan-export")?;
    writeln!(writer, "# {} submeshes, {} vertices, {} triangles", asset.submeshes.len(), asset.vertex_count(), asset.triangle_count())?;
    writeln!(writer, "mtllib {}", mtl_file_name)?;

    let has_normal = asset.layout.has_normal();
    let has_uv = asset.layout.has_uv();
    let mut base = 1usize;
    for (index, submesh) in asset.submeshes.iter().enumerate() {
      let vertices = &submesh.vertices;
      writeln!(writer, "o {}", Self::object_name(&submesh.name, index))?;
      for i in 0..vertices.len() {
        let p = vertices.position(i);
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
      }
      if has_normal {
        for i in 0..vertices.len() {
          if let Some(n) = vertices.normal(i) {
            writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
          }
        }
      }
      if has_uv {
        for i in 0..vertices.len() {
          if let Some(t) = vertices.tex_coord(i) {
            writeln!(writer, "vt {} {}", t.x, t.y)?;
          }
        }
      }

      if let Some(material) = asset.material_of(submesh) {
        writeln!(writer, "usemtl {}", material.name)?;
      }
      for triangle in submesh.indices.triangles() {
        write!(writer, "f")?;
        for index in triangle {
          let i = base + index as usize;
          match (has_uv, has_normal) {
            (true, _) => write!(writer, " {}/{}/{}", i, i, i)?,
            (false, true) => write!(writer, " {}//{}", i, i)?,
            (false, false) => write!(writer, " {}", i)?,
          }
        }
        writeln!(writer)?;
      }
      base += vertices.len();
    }
    Ok(())
  }

  /// Make a submesh name usable as a single OBJ token.
  /// Whitespace and control characters become underscores, an empty name becomes `submesh_<index>`.
  /// param name: The submesh name.
  /// param index: The submesh index.
  /// return: The object name.
  pub fn object_name(name: &str, index: usize) -> String {
    if name.is_empty() {
      return format!("submesh_{}", index);
    }
    name.chars()
      .map(|c| if c.is_whitespace() || c.is_control() { '_' } else { c })
      .collect()
  }

  /// Write the MTL text, one material per submesh.
  /// param asset: The merged asset.
  /// param writer: The destination.
  /// return: The result.
  pub fn write_mtl<W: Write>(asset: &HalaMergedAsset, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "# hala-scan-export")?;
    for material in asset.materials.iter() {
      let c = material.base_color;
      writeln!(writer)?;
      writeln!(writer, "newmtl {}", material.name)?;
      writeln!(writer, "Ka 0 0 0")?;
      writeln!(writer, "Kd {} {} {}", c.x, c.y, c.z)?;
      writeln!(writer, "Ks 0 0 0")?;
      writeln!(writer, "d 1")?;
      writeln!(writer, "illum 1")?;
      writeln!(writer, "map_Kd {}", material.base_color_file_name())?;
    }
    Ok(())
  }
}
