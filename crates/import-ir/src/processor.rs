//! Canonical operator catalog
//!
//! Every [`NodeType`] has one [`NodeProcessor`] declaring its attribute
//! defaults, its port arity and its inference routine. The catalog is built
//! once per process and is immutable afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::ir::{Attributes, FoldState, IrGraph, Node, NodeType};
use crate::node::{
    constant::ConstantProcessor, extract_image_patches::ExtractImagePatchesProcessor,
    identity::IdentityProcessor, parameter::ParameterProcessor, reverse::ReverseProcessor,
    tensor_array::TensorArrayProcessor, tensor_array_size::TensorArraySizeProcessor,
    unsupported::UnsupportedProcessor,
};

/// Node-local failure of an inference routine.
///
/// The engine attaches the node identity and maps it onto
/// [`ErrorKind`](crate::error::ErrorKind).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("expected {expected} input(s), found {actual}")]
    InvalidInputCount { expected: String, actual: usize },

    #[error("expected {expected} output(s), found {actual}")]
    InvalidOutputCount { expected: String, actual: usize },

    #[error("missing {0}")]
    MissingInput(String),

    #[error("missing attribute `{0}`")]
    MissingAttribute(String),

    #[error("invalid attribute `{name}`: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("input {input} must be a single scalar: {reason}")]
    NotScalar { input: usize, reason: String },

    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("attributes are incomplete after a failed extraction")]
    IncompleteAttributes,

    #[error("output {0} was left without a shape annotation")]
    UnannotatedOutput(usize),

    #[error("{0}")]
    Custom(String),
}

/// Accepted number of input ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSpec {
    Exact(usize),
    AtLeast(usize),
    /// Inclusive range.
    Range(usize, usize),
}

/// Accepted number of output ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSpec {
    Exact(usize),
    AtLeast(usize),
}

impl OutputSpec {
    /// Number of output ports a freshly extracted node gets.
    pub fn default_count(&self) -> usize {
        match self {
            OutputSpec::Exact(n) | OutputSpec::AtLeast(n) => *n,
        }
    }
}

/// Static port arity of an operator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpec {
    pub inputs: InputSpec,
    pub outputs: OutputSpec,
}

/// Read-only view of the rest of the graph offered to inference routines.
///
/// Only identifier lookups are available: routines never follow edges of
/// other nodes.
pub struct InferContext<'a> {
    graph: &'a IrGraph,
}

impl<'a> InferContext<'a> {
    pub fn new(graph: &'a IrGraph) -> Self {
        Self { graph }
    }

    /// Resolve a node identifier through the graph's side-table.
    pub fn resolve(&self, id: &str) -> Option<&'a Node> {
        self.graph.node_by_id(id)
    }
}

/// Declaration and inference routine of one canonical operator kind.
pub trait NodeProcessor: Send + Sync {
    fn spec(&self) -> NodeSpec;

    /// Values for optional attributes absent from the framework encoding.
    fn default_attrs(&self) -> Attributes {
        Attributes::new()
    }

    /// Fold state of a freshly extracted node with attributes `attrs`.
    fn initial_fold_state(&self, _attrs: &Attributes) -> FoldState {
        FoldState::NotApplicable
    }

    /// Compute the output descriptors of `node` from its input descriptors.
    ///
    /// Arity has already been checked against [`NodeProcessor::spec`].
    fn infer(&self, node: &mut Node, context: &InferContext<'_>) -> Result<(), ProcessError>;
}

pub fn validate_input_count(node: &Node, spec: InputSpec) -> Result<(), ProcessError> {
    let actual = node.inputs.len();
    let (ok, expected) = match spec {
        InputSpec::Exact(n) => (actual == n, n.to_string()),
        InputSpec::AtLeast(n) => (actual >= n, format!("at least {n}")),
        InputSpec::Range(min, max) => (
            (min..=max).contains(&actual),
            format!("between {min} and {max}"),
        ),
    };
    if ok {
        Ok(())
    } else {
        Err(ProcessError::InvalidInputCount { expected, actual })
    }
}

pub fn validate_output_count(node: &Node, spec: OutputSpec) -> Result<(), ProcessError> {
    let actual = node.outputs.len();
    let (ok, expected) = match spec {
        OutputSpec::Exact(n) => (actual == n, n.to_string()),
        OutputSpec::AtLeast(n) => (actual >= n, format!("at least {n}")),
    };
    if ok {
        Ok(())
    } else {
        Err(ProcessError::InvalidOutputCount { expected, actual })
    }
}

/// Copy the descriptor of input 0 onto every output.
pub fn same_as_input(node: &mut Node) -> Result<(), ProcessError> {
    let desc = node.require_input(0)?.clone();
    for port in node.outputs.iter_mut() {
        port.desc = Some(desc.clone());
    }
    Ok(())
}

/// The process-wide operator catalog.
pub struct ProcessorRegistry {
    processors: HashMap<NodeType, Box<dyn NodeProcessor>>,
}

impl ProcessorRegistry {
    fn with_builtins() -> Self {
        let mut registry = Self {
            processors: HashMap::new(),
        };
        registry.register(NodeType::Parameter, ParameterProcessor);
        registry.register(NodeType::Constant, ConstantProcessor);
        registry.register(NodeType::Identity, IdentityProcessor);
        registry.register(NodeType::Reverse, ReverseProcessor);
        registry.register(NodeType::TensorArray, TensorArrayProcessor);
        registry.register(NodeType::TensorArraySize, TensorArraySizeProcessor);
        registry.register(NodeType::ExtractImagePatches, ExtractImagePatchesProcessor);
        registry.register(NodeType::Unsupported, UnsupportedProcessor);
        registry
    }

    fn register(&mut self, node_type: NodeType, processor: impl NodeProcessor + 'static) {
        self.processors.insert(node_type, Box::new(processor));
    }

    /// Processor of `node_type`. Every [`NodeType`] has one.
    pub fn get(&self, node_type: NodeType) -> &dyn NodeProcessor {
        match self.processors.get(&node_type) {
            Some(processor) => processor.as_ref(),
            None => &UnsupportedProcessor,
        }
    }
}

/// The operator catalog, built on first use.
pub fn get_processor_registry() -> &'static ProcessorRegistry {
    static REGISTRY: OnceLock<ProcessorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ProcessorRegistry::with_builtins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_count_specs() {
        let node = Node::new("n", NodeType::Reverse, 2, 1);

        assert!(validate_input_count(&node, InputSpec::Exact(2)).is_ok());
        assert!(validate_input_count(&node, InputSpec::AtLeast(1)).is_ok());
        assert!(validate_input_count(&node, InputSpec::Range(1, 2)).is_ok());
        assert_eq!(
            validate_input_count(&node, InputSpec::Range(3, 4)),
            Err(ProcessError::InvalidInputCount {
                expected: "between 3 and 4".to_string(),
                actual: 2
            })
        );
    }

    #[test]
    fn output_count_specs() {
        let node = Node::new("n", NodeType::Reverse, 1, 2);

        assert!(validate_output_count(&node, OutputSpec::AtLeast(1)).is_ok());
        assert_eq!(
            validate_output_count(&node, OutputSpec::Exact(1)),
            Err(ProcessError::InvalidOutputCount {
                expected: "1".to_string(),
                actual: 2
            })
        );
    }

    #[test]
    fn every_node_type_has_a_processor() {
        let registry = get_processor_registry();
        for node_type in [
            NodeType::Parameter,
            NodeType::Constant,
            NodeType::Identity,
            NodeType::Reverse,
            NodeType::TensorArray,
            NodeType::TensorArraySize,
            NodeType::ExtractImagePatches,
            NodeType::Unsupported,
        ] {
            assert!(registry.processors.contains_key(&node_type), "{node_type}");
        }
        assert_eq!(
            registry.get(NodeType::Reverse).spec().outputs,
            OutputSpec::Exact(1)
        );
    }
}
