//! CSV export: the pipeline that projects a schema plus a filtered
//! submission set into a tabular artifact, and the lifecycle manager that
//! serves and retires those artifacts.

pub mod lifecycle;
pub mod pipeline;
pub mod types;

pub use lifecycle::ExportLifecycle;
pub use pipeline::ExportPipeline;
pub use types::{ExportJob, ExportStats};
