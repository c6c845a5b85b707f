#![cfg_attr(docsrs, feature(doc_cfg))]

//! `import-ir` is the graph intermediate representation of a model converter.
//!
//! It takes a computation graph in a training framework's encoding
//! ([`RawGraph`]), translates every node into a canonical operator through an
//! [`ExtractorRegistry`], assembles an [`IrGraph`] and runs shape and value
//! inference over it until every port carries a [`TensorDesc`].
//!
//! ```ignore
//! let outcome = import_ir::import_graph(&raw, &ImportConfig::default())?;
//! for (id, ports) in outcome.graph.annotations() {
//!     println!("{id}: {:?}", ports.outputs);
//! }
//! ```

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod import;
pub mod ir;
pub mod logger;
pub mod node;
pub mod processor;
pub mod raw;

pub use config::ImportConfig;
pub use engine::{infer_graph, InferenceReport};
pub use error::{
    ConversionError, ErrorKind, ExtractionError, ExtractionErrorKind, ExtractionReport,
    GraphError, ImportError,
};
pub use extractor::{Extractor, ExtractorRegistry};
pub use import::{extract_graph, import_graph, import_graph_with, ExtractedGraph, ImportOutcome};
pub use ir::{IrGraph, Node, NodeType, TensorDesc, TensorValue};
pub use raw::{RawAttr, RawGraph, RawNode};
