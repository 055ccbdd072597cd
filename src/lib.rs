//! division: administrative division dataset to nested-set rows
//!
//! Flat province/city/area/street records are assembled into one tree per
//! province using the prefix convention of their codes, numbered with a
//! single pre-order traversal (`left` on entry, `right` on exit), and emitted
//! as one row per node.
//!
//! Architecture:
//! - `domain`: code resolver, arena forest, tree builder, nested-set indexer (no I/O)
//! - `application`: emitter and services orchestrating the pipeline
//! - `infrastructure`: I/O boundary traits and dependency wiring
//! - `cli`: argument parsing and command dispatch
//! - `config`: layered settings

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
