use std::any::Any;
use std::panic::{
  catch_unwind,
  AssertUnwindSafe,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{
  AtomicUsize,
  Ordering,
};
use std::sync::mpsc::{
  channel,
  Receiver,
  TryRecvError,
};

use crate::capture::{
  HalaAnchorImageRegistry,
  HalaAnchorSource,
  HalaImageIndex,
  HalaSessionSnapshot,
};
use crate::config::HalaExportDesc;
use crate::error::{
  HalaExportError,
  HalaExportErrorKind,
};
use crate::scene::{
  HalaImageLookup,
  HalaMeshBuilder,
  HalaVertexLayout,
};
use crate::scene::cpu::image_data::HalaImageData;
use super::packager::HalaPackager;

/// The result of one export: the produced artifacts in order.
pub type HalaExportResult = Result<Vec<PathBuf>, HalaExportError>;

/// The pending result of an export running in the background.
pub struct HalaExportTicket {
  receiver: Receiver<HalaExportResult>,
}

/// The implementation of the export ticket.
impl HalaExportTicket {
  /// Block until the export finished.
  /// return: The export result.
  pub fn wait(self) -> HalaExportResult {
    self.receiver.recv()
      .map_err(|err| HalaExportError::new(HalaExportErrorKind::Worker, "The export worker stopped without a result.", Some(Box::new(err))))?
  }

  /// Get the result if the export already finished.
  /// return: The export result, or None while the export is running.
  pub fn try_result(&self) -> Option<HalaExportResult> {
    match self.receiver.try_recv() {
      Ok(result) => Some(result),
      Err(TryRecvError::Empty) => None,
      Err(err @ TryRecvError::Disconnected) => Some(Err(HalaExportError::new(
        HalaExportErrorKind::Worker,
        "The export worker stopped without a result.",
        Some(Box::new(err))))),
    }
  }
}

/// Runs exports on a bounded pool of background workers.
pub struct HalaExporter {
  desc: Arc<HalaExportDesc>,
  registry: Arc<HalaAnchorImageRegistry>,
  pool: rayon::ThreadPool,
  in_flight: Arc<AtomicUsize>,
}

/// The Drop implementation of the exporter.
impl Drop for HalaExporter {
  fn drop(&mut self) {
    log::debug!("A HalaExporter dropped.");
  }
}

/// The implementation of the exporter.
impl HalaExporter {
  /// Create a new exporter.
  /// At most `desc.max_concurrent_exports` exports run at once, later ones queue.
  /// param desc: The export description.
  /// param registry: The anchor to image registry filled by the capture side.
  /// return: The exporter.
  pub fn new(desc: HalaExportDesc, registry: Arc<HalaAnchorImageRegistry>) -> Result<Self, HalaExportError> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(desc.max_concurrent_exports.max(1))
      .thread_name(|index| format!("hala-export-{}", index))
      .build()
      .map_err(|err| HalaExportError::new(HalaExportErrorKind::Device, "Create export workers failed.", Some(Box::new(err))))?;

    log::debug!("A HalaExporter created with {} workers.", pool.current_num_threads());
    Ok(Self {
      desc: Arc::new(desc),
      registry,
      pool,
      in_flight: Arc::new(AtomicUsize::new(0)),
    })
  }

  pub fn desc(&self) -> &HalaExportDesc {
    &self.desc
  }

  pub fn registry(&self) -> &Arc<HalaAnchorImageRegistry> {
    &self.registry
  }

  /// Get the number of exports queued or running.
  /// return: The number of exports.
  pub fn in_flight(&self) -> usize {
    self.in_flight.load(Ordering::SeqCst)
  }

  /// Snapshot a session and export it in the background.
  /// A source without a current frame yields an empty result.
  /// param source: The anchor source.
  /// return: The export ticket.
  pub fn export_session(&self, source: &dyn HalaAnchorSource) -> HalaExportTicket {
    let snapshot = source.snapshot().unwrap_or_default();
    self.export(snapshot)
  }

  /// Export a snapshot in the background.
  /// param snapshot: The session snapshot.
  /// return: The export ticket.
  pub fn export(&self, snapshot: HalaSessionSnapshot) -> HalaExportTicket {
    let (sender, receiver) = channel();
    self.export_with(snapshot, move |result| {
      if sender.send(result).is_err() {
        log::debug!("An export finished after its ticket was dropped.");
      }
    });
    HalaExportTicket { receiver }
  }

  /// Export a snapshot in the background and hand the result to a callback.
  /// The callback runs once on the worker thread.
  /// param snapshot: The session snapshot.
  /// param callback: The completion callback.
  pub fn export_with<F>(&self, snapshot: HalaSessionSnapshot, callback: F)
  where
    F: FnOnce(HalaExportResult) + Send + 'static,
  {
    let desc = Arc::clone(&self.desc);
    let index = self.registry.snapshot();
    self.spawn_job(move || Self::run(&desc, snapshot, &index), callback);
  }

  /// Run a job on the worker pool and hand its result to a callback.
  /// A panicking job is reported as a worker error, so the callback always runs once.
  /// param job: The job.
  /// param callback: The completion callback.
  fn spawn_job<J, F>(&self, job: J, callback: F)
  where
    J: FnOnce() -> HalaExportResult + Send + 'static,
    F: FnOnce(HalaExportResult) + Send + 'static,
  {
    let in_flight = Arc::clone(&self.in_flight);
    in_flight.fetch_add(1, Ordering::SeqCst);

    self.pool.spawn(move || {
      let result = catch_unwind(AssertUnwindSafe(job))
        .unwrap_or_else(|payload| Err(Self::panic_error(payload)));
      match &result {
        Ok(files) => log::info!("Export finished with {} artifacts.", files.len()),
        Err(err) => log::error!("Export failed: {}", err),
      }
      in_flight.fetch_sub(1, Ordering::SeqCst);
      if catch_unwind(AssertUnwindSafe(|| callback(result))).is_err() {
        log::error!("An export completion callback panicked.");
      }
    });
  }

  fn panic_error(payload: Box<dyn Any + Send>) -> HalaExportError {
    let reason = payload.downcast_ref::<&str>()
      .map(|reason| reason.to_string())
      .or_else(|| payload.downcast_ref::<String>().cloned())
      .unwrap_or_else(|| "unknown reason".to_string());
    HalaExportError::new(HalaExportErrorKind::Worker, &format!("The export worker panicked: {}", reason), None)
  }

  /// Build and package one snapshot into a fresh directory under the output root.
  /// param desc: The export description.
  /// param snapshot: The session snapshot.
  /// param index: The image index taken when the export was requested.
  /// return: The export result.
  pub fn run(desc: &HalaExportDesc, snapshot: HalaSessionSnapshot, index: &HalaImageIndex) -> HalaExportResult {
    if snapshot.fragments.is_empty() {
      log::debug!("No mesh anchors to export.");
      return Ok(Vec::new());
    }

    let mut layout = desc.layout;
    let has_any_camera = snapshot.camera.is_some()
      || snapshot.fragments.iter().any(|fragment| index.camera_for(fragment.id()).is_some());
    if layout.has_uv() && !has_any_camera {
      log::warn!("No camera frame available, exporting without texture coordinates.");
      layout = HalaVertexLayout::PositionNormal;
    }

    let builder = HalaMeshBuilder::new(layout, &desc.default_image_name).with_camera(snapshot.camera);
    let asset = builder.build(&snapshot.fragments, index);
    log::debug!(
      "Merged {} fragments into {} vertices and {} triangles.",
      snapshot.fragments.len(), asset.vertex_count(), asset.triangle_count());

    let images = if desc.write_images {
      Self::collect_images(&asset.referenced_images(), index, &desc.default_image_name, snapshot.captured_image)
    } else {
      Vec::new()
    };

    let folder_name = uuid::Uuid::new_v4().to_string();
    let destination_dir = desc.output_root.join(&folder_name);
    let archive_path = desc.archive.then(|| desc.output_root.join(format!("{}.zip", folder_name)));

    let packager = HalaPackager::new(desc.jpeg_quality, desc.archive_failure_policy);
    packager.export(&asset, &destination_dir, &desc.base_name, &images, archive_path.as_deref())
  }

  /// Gather the images the materials reference.
  /// The default image comes from the snapshot's current frame.
  fn collect_images(
    referenced: &[&str],
    index: &HalaImageIndex,
    default_image_name: &str,
    captured_image: Option<HalaImageData>,
  ) -> Vec<(String, Arc<HalaImageData>)> {
    let mut captured_image = captured_image.map(Arc::new);
    let mut images = Vec::with_capacity(referenced.len());
    for &image_id in referenced {
      if let Some(captured) = index.image(image_id) {
        images.push((image_id.to_owned(), Arc::clone(&captured.image)));
      } else if image_id == default_image_name {
        if let Some(image) = captured_image.take() {
          images.push((image_id.to_owned(), image));
        }
      }
    }
    images
  }

  /// Export a snapshot on the calling thread.
  /// param snapshot: The session snapshot.
  /// return: The export result.
  pub fn export_blocking(&self, snapshot: HalaSessionSnapshot) -> HalaExportResult {
    Self::run(&self.desc, snapshot, &self.registry.snapshot())
  }
}
