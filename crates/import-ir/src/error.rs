//! Error types for extraction, graph assembly and inference.

use core::fmt;

use strum::Display;

use crate::ir::NodeType;
use crate::processor::ProcessError;

/// Errors from graph construction primitives.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node `{0}` is already in the graph")]
    DuplicateNode(String),

    #[error("no node at index {0}")]
    MissingNode(usize),

    #[error("node `{node}` has no {kind} port {port}")]
    PortOutOfRange {
        node: String,
        port: usize,
        kind: &'static str,
    },

    #[error("input port {port} of node `{node}` is already connected")]
    InputAlreadyConnected { node: String, port: usize },
}

/// What went wrong while extracting one framework node.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    #[error("missing mandatory field `{0}`")]
    MissingField(String),

    #[error("malformed field `{field}`: {reason}")]
    Malformed { field: String, reason: String },

    #[error("unsupported padding mode `{0}`")]
    UnknownPadding(String),

    #[error("no enabled extractor for this operator")]
    UnsupportedOperator,

    #[error("input `{0}` does not name a node output")]
    UnknownInput(String),
}

/// A node-local extraction failure, naming the originating node.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to extract node `{node}` ({op}): {kind}")]
pub struct ExtractionError {
    pub node: String,
    pub op: String,
    pub kind: ExtractionErrorKind,
}

impl ExtractionError {
    pub fn new(node: impl Into<String>, op: impl Into<String>, kind: ExtractionErrorKind) -> Self {
        Self {
            node: node.into(),
            op: op.into(),
            kind,
        }
    }

    pub fn missing(node: impl Into<String>, op: impl Into<String>, field: &str) -> Self {
        Self::new(node, op, ExtractionErrorKind::MissingField(field.to_string()))
    }

    pub fn malformed(
        node: impl Into<String>,
        op: impl Into<String>,
        field: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            node,
            op,
            ExtractionErrorKind::Malformed {
                field: field.to_string(),
                reason: reason.into(),
            },
        )
    }
}

/// Every extraction error collected during one import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    errors: Vec<ExtractionError>,
}

impl ExtractionReport {
    pub fn push(&mut self, error: ExtractionError) {
        log::warn!("{error}");
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ExtractionError] {
        &self.errors
    }

    /// Errors reported for node `id`.
    pub fn for_node<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ExtractionError> {
        self.errors.iter().filter(move |error| error.node == id)
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} extraction error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExtractionReport {}

/// Category of a fatal conversion error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// Rank/size mismatch, a dynamic operand that is not a single scalar, or
    /// wrong input arity.
    ShapeInference,
    /// An identifier-based cross-reference did not resolve.
    UnresolvedReference,
    /// A structural invariant is violated.
    Consistency,
}

/// A fatal inference failure, naming the offending node.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind} error in node `{node}` ({op}): {reason}")]
pub struct ConversionError {
    pub node: String,
    pub op: NodeType,
    pub kind: ErrorKind,
    pub reason: String,
}

impl ConversionError {
    pub fn new(
        node: impl Into<String>,
        op: NodeType,
        kind: ErrorKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            node: node.into(),
            op,
            kind,
            reason: reason.into(),
        }
    }

    /// Attach the node identity to an error returned by a processor.
    pub fn from_process(node: impl Into<String>, op: NodeType, error: ProcessError) -> Self {
        let kind = match error {
            ProcessError::InvalidOutputCount { .. } | ProcessError::UnannotatedOutput(_) => {
                ErrorKind::Consistency
            }
            ProcessError::UnresolvedReference(_) => ErrorKind::UnresolvedReference,
            _ => ErrorKind::ShapeInference,
        };
        Self::new(node, op, kind, error.to_string())
    }
}

/// Errors returned by [`import_graph`](crate::import_graph).
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("graph assembly failed: {0}")]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Extraction(ExtractionReport),

    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}
