pub mod obj_writer;
pub mod packager;
pub mod scan_exporter;

pub use obj_writer::HalaObjWriter;
pub use packager::HalaPackager;
pub use scan_exporter::{
  HalaExportResult,
  HalaExportTicket,
  HalaExporter,
};
