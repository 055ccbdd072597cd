//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod emitter;
pub mod error;
pub mod error_ext;
pub mod services;

pub use emitter::{
    emit_forest, format_statement, sink_for, JsonLinesSink, OutputFormat, RowSink, SqlStatementSink,
    DEFAULT_TABLE,
};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
