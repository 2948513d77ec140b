use std::fs::File;
use std::io::BufWriter;
use std::path::{
  Path,
  PathBuf,
};
use std::sync::Arc;

use zip::write::SimpleFileOptions;

use crate::config::HalaArchiveFailurePolicy;
use crate::error::{
  HalaExportError,
  HalaExportErrorKind,
};
use crate::scene::cpu::{
  HalaMergedAsset,
  image_data::HalaImageData,
  material::HALA_IMAGE_EXTENSION,
};
use super::obj_writer::HalaObjWriter;

fn fs_error(msg: &str, err: std::io::Error) -> HalaExportError {
  HalaExportError::new(HalaExportErrorKind::FileSystem, msg, Some(Box::new(err)))
}

fn archive_error(msg: &str, err: impl std::error::Error + Send + Sync + 'static) -> HalaExportError {
  HalaExportError::new(HalaExportErrorKind::Archive, msg, Some(Box::new(err)))
}

/// Writes a merged asset and its images to disk and optionally zips them.
pub struct HalaPackager {
  pub jpeg_quality: u8,
  pub archive_failure_policy: HalaArchiveFailurePolicy,
}

/// The implementation of the packager.
impl HalaPackager {
  /// Create a new packager.
  /// param jpeg_quality: The JPEG quality of written images.
  /// param archive_failure_policy: What to do when zipping fails.
  /// return: The packager.
  pub fn new(jpeg_quality: u8, archive_failure_policy: HalaArchiveFailurePolicy) -> Self {
    Self {
      jpeg_quality,
      archive_failure_policy,
    }
  }

  /// Write the asset into a directory.
  /// A directory created by this call is removed again if a later step fails.
  /// param asset: The merged asset.
  /// param destination_dir: The output directory, created with its parents if missing.
  /// param base_name: The file stem of the OBJ and MTL files.
  /// param images: The images to write, keyed by image identifier.
  /// param archive_path: Where to zip the directory, or None to keep loose files.
  /// return: The archive path if zipped, else the written files in order.
  pub fn export(
    &self,
    asset: &HalaMergedAsset,
    destination_dir: &Path,
    base_name: &str,
    images: &[(String, Arc<HalaImageData>)],
    archive_path: Option<&Path>,
  ) -> Result<Vec<PathBuf>, HalaExportError> {
    let created = !destination_dir.exists();
    std::fs::create_dir_all(destination_dir)
      .map_err(|err| fs_error(&format!("Create directory \"{:?}\" failed.", destination_dir), err))?;
    log::debug!("Exporting {} submeshes to \"{:?}\".", asset.submeshes.len(), destination_dir);

    let files = match self.write_files(asset, destination_dir, base_name, images) {
      Ok(files) => files,
      Err(err) => {
        if created {
          Self::remove_directory(destination_dir);
        }
        return Err(err);
      },
    };

    let Some(archive_path) = archive_path else {
      return Ok(files);
    };
    match Self::zip_directory(destination_dir, archive_path) {
      Ok(()) => {
        log::debug!("Archived \"{:?}\" to \"{:?}\".", destination_dir, archive_path);
        Ok(vec![archive_path.to_path_buf()])
      },
      Err(err) => {
        if archive_path.exists() {
          if let Err(remove_err) = std::fs::remove_file(archive_path) {
            log::warn!("Remove partial archive \"{:?}\" failed: {}", archive_path, remove_err);
          }
        }
        match self.archive_failure_policy {
          HalaArchiveFailurePolicy::KeepLoose => {
            log::warn!("{} Returning {} loose files instead.", err, files.len());
            Ok(files)
          },
          HalaArchiveFailurePolicy::Rollback => {
            if created {
              Self::remove_directory(destination_dir);
            }
            Err(err)
          },
        }
      },
    }
  }

  /// Write the OBJ, MTL and image files.
  fn write_files(
    &self,
    asset: &HalaMergedAsset,
    destination_dir: &Path,
    base_name: &str,
    images: &[(String, Arc<HalaImageData>)],
  ) -> Result<Vec<PathBuf>, HalaExportError> {
    let (obj_path, mtl_path) = HalaObjWriter::save(asset, destination_dir, base_name)?;
    let mut files = vec![obj_path, mtl_path];

    for (image_id, image) in images.iter() {
      files.push(self.write_image(destination_dir, image_id, image)?);
    }

    for image_id in asset.referenced_images() {
      if !images.iter().any(|(id, _)| id == image_id) {
        log::warn!("Material image \"{}\" has no captured image and is not written.", image_id);
      }
    }

    Ok(files)
  }

  /// Encode one image as JPEG named after its identifier.
  /// param destination_dir: The output directory.
  /// param image_id: The image identifier.
  /// param image: The image.
  /// return: The image path.
  fn write_image(&self, destination_dir: &Path, image_id: &str, image: &HalaImageData) -> Result<PathBuf, HalaExportError> {
    if image_id.is_empty() || image_id.contains(['/', '\\']) || image_id == "." || image_id == ".." {
      return Err(HalaExportError::new(
        HalaExportErrorKind::Image,
        &format!("Image identifier \"{}\" is not a valid file stem.", image_id),
        None));
    }
    let path = destination_dir.join(format!("{}.{}", image_id, HALA_IMAGE_EXTENSION));
    let file = File::create(&path)
      .map_err(|err| fs_error(&format!("Create file \"{:?}\" failed.", path), err))?;
    let mut writer = BufWriter::new(file);
    image.encode_jpeg(&mut writer, self.jpeg_quality)?;
    writer.into_inner()
      .map_err(|err| fs_error(&format!("Flush file \"{:?}\" failed.", path), err.into_error()))?;
    log::debug!("Wrote {}x{} image \"{:?}\".", image.width, image.height, path);
    Ok(path)
  }

  /// Zip a directory. Entries are stored under the directory's own name.
  /// param directory: The directory.
  /// param archive_path: The archive file.
  /// return: The result.
  pub fn zip_directory(directory: &Path, archive_path: &Path) -> Result<(), HalaExportError> {
    let root = directory.file_name()
      .ok_or_else(|| HalaExportError::new(HalaExportErrorKind::Archive, &format!("Directory \"{:?}\" has no name.", directory), None))?
      .to_string_lossy()
      .to_string();
    let file = File::create(archive_path)
      .map_err(|err| archive_error(&format!("Create archive \"{:?}\" failed.", archive_path), err))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    Self::zip_entries(&mut zip, directory, &root, options)?;
    zip.finish()
      .map_err(|err| archive_error(&format!("Finish archive \"{:?}\" failed.", archive_path), err))?;
    Ok(())
  }

  fn zip_entries(
    zip: &mut zip::ZipWriter<File>,
    directory: &Path,
    prefix: &str,
    options: SimpleFileOptions,
  ) -> Result<(), HalaExportError> {
    zip.add_directory(format!("{}/", prefix), options.clone())
      .map_err(|err| archive_error(&format!("Add directory \"{}\" to archive failed.", prefix), err))?;

    let mut entries = std::fs::read_dir(directory)
      .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
      .map_err(|err| archive_error(&format!("Read directory \"{:?}\" failed.", directory), err))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
      let path = entry.path();
      let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
      if path.is_dir() {
        Self::zip_entries(zip, &path, &name, options.clone())?;
        continue;
      }
      zip.start_file(name.as_str(), options.clone())
        .map_err(|err| archive_error(&format!("Add file \"{}\" to archive failed.", name), err))?;
      let mut source = File::open(&path)
        .map_err(|err| archive_error(&format!("Open file \"{:?}\" failed.", path), err))?;
      std::io::copy(&mut source, zip)
        .map_err(|err| archive_error(&format!("Compress file \"{:?}\" failed.", path), err))?;
    }
    Ok(())
  }

  fn remove_directory(directory: &Path) {
    match std::fs::remove_dir_all(directory) {
      Ok(()) => log::debug!("Removed incomplete export \"{:?}\".", directory),
      Err(err) => log::warn!("Remove incomplete export \"{:?}\" failed: {}", directory, err),
    }
  }
}
