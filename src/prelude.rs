pub use crate::error::{
  HalaExportError,
  HalaExportErrorKind,
};
pub use crate::config::{
  HalaArchiveFailurePolicy,
  HalaExportDesc,
};
pub use crate::capture::{
  HalaAnchorImageRegistry,
  HalaAnchorSource,
  HalaSessionSnapshot,
};
pub use crate::scene::{
  HalaImageLookup,
  HalaMeshBuilder,
  HalaVertexLayout,
};
pub use crate::scene::cpu::{
  HalaMergedAsset,
  camera::HalaCameraFrame,
  fragment::HalaMeshFragment,
  image_data::{
    HalaImageData,
    HalaPixelFormat,
  },
};
pub use crate::exporter::{
  HalaExportResult,
  HalaExportTicket,
  HalaExporter,
};
