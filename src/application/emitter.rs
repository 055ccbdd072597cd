//! Statement emitter: one output record per node, in forest pre-order.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DivisionForest, NestedRow};

/// Default target table of the SQL output.
pub const DEFAULT_TABLE: &str = "nested";

/// Serialization of the emitted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `INSERT INTO ...` statements, one per line
    #[default]
    Sql,
    /// One JSON object per line
    Jsonl,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Sql => f.write_str("sql"),
            OutputFormat::Jsonl => f.write_str("jsonl"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(OutputFormat::Sql),
            "jsonl" | "json" => Ok(OutputFormat::Jsonl),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Destination for emitted rows. Any error aborts the whole emission.
pub trait RowSink {
    fn write_row(&mut self, row: &NestedRow) -> io::Result<()>;

    /// Flush buffered output once all rows are written.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes one `INSERT` statement per row.
pub struct SqlStatementSink<W: Write> {
    writer: W,
    table: String,
}

impl<W: Write> SqlStatementSink<W> {
    pub fn new(writer: W, table: impl Into<String>) -> Self {
        Self {
            writer,
            table: table.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Render a row as an insert statement against `table`.
///
/// Codes are emitted as bare numeric literals, `name` is single-quoted with
/// embedded quotes doubled.
pub fn format_statement(table: &str, row: &NestedRow) -> String {
    format!(
        "INSERT INTO {}(id, node, pid, depth, lft, rgt) VALUES({}, '{}', {}, {}, {}, {});",
        table,
        row.code,
        row.name.replace('\'', "''"),
        row.parent_code,
        row.depth,
        row.left,
        row.right
    )
}

impl<W: Write> RowSink for SqlStatementSink<W> {
    fn write_row(&mut self, row: &NestedRow) -> io::Result<()> {
        writeln!(self.writer, "{}", format_statement(&self.table, row))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Writes one JSON object per row.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn write_row(&mut self, row: &NestedRow) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Build the sink for `format` around `writer`.
pub fn sink_for<'a, W: Write + 'a>(
    format: OutputFormat,
    writer: W,
    table: &str,
) -> Box<dyn RowSink + 'a> {
    match format {
        OutputFormat::Sql => Box::new(SqlStatementSink::new(writer, table)),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
    }
}

/// Stream every node of an indexed forest into `sink` in pre-order.
///
/// Returns the number of rows written.
#[instrument(level = "debug", skip_all, fields(nodes = forest.len()))]
pub fn emit_forest(forest: &DivisionForest, sink: &mut dyn RowSink) -> ApplicationResult<usize> {
    let mut written = 0;
    let mut last_code = String::new();
    for (_, node) in forest.pre_order() {
        sink.write_row(&node.data.to_row())
            .map_err(|source| ApplicationError::Emit {
                code: node.data.code.clone(),
                source,
            })?;
        written += 1;
        last_code.clone_from(&node.data.code);
    }
    sink.finish().map_err(|source| ApplicationError::Emit {
        code: last_code,
        source,
    })?;
    debug!("emitted {} rows", written);
    Ok(written)
}
