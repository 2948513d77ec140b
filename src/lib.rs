pub mod prelude;
pub mod error;
pub mod config;
pub mod capture;
pub mod scene;
pub mod exporter;
