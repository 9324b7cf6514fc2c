//! Core library for figrep
//!
//! Turns the comments of design files into report rows:
//! - [`filter`] keeps top-level comments pinned to a node
//! - [`matcher`] pairs comments with nodes of a document subtree
//! - [`projection`] maps a (comment, node, file) tuple to configured columns
//! - [`report`] runs the pipeline over many files into a [`export::RowSink`]

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod matcher;
pub mod projection;
pub mod report;
pub mod types;

pub use config::{load_config, parse_config, EmailConfig, FileEntry, ReportSettings, ReporterConfig, SmtpSecurity};
pub use error::FigrepError;
pub use export::{ArtifactWriter, ReportFormat, RowBuffer, RowSink, TableWriter};
pub use projection::Projector;
pub use report::{CommentSource, FileTarget, MissingNodePolicy, ReportAssembler, ResolveMode, RunSummary};
pub use types::{Anchor, Comment, CommentStatus, FieldDescriptor, FileNodes, FileTree, Node, OutputRow};
