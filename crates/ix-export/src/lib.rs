//! # ix-export
//!
//! Exporters that turn Intune configuration objects into per-object JSON
//! manifests: device compliance policies and Win32 applications. Both
//! implement the [`ObjectExporter`] contract; batches are best-effort and
//! per-object failures surface as skipped entries in the summary.

pub mod applications;
pub mod compliance;
pub mod error;
pub mod exporter;
pub mod manifest;

pub use applications::ApplicationExporter;
pub use compliance::CompliancePolicyExporter;
pub use error::{ExportError, ExportResult};
pub use exporter::{ExportSummary, ExportedObject, ObjectExporter, SkippedObject};
pub use manifest::{icon_filename, manifest_filename, sanitize_filename, ManifestWriter};
