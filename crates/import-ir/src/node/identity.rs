//! # Identity
//!
//! Forwards its input descriptor unchanged.

use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::ir::{Attributes, Node, NodeType};
use crate::processor::{
    same_as_input, InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError,
};
use crate::raw::RawNode;

pub struct IdentityExtractor;

impl Extractor for IdentityExtractor {
    fn framework_op(&self) -> &str {
        "Identity"
    }

    fn node_type(&self) -> NodeType {
        NodeType::Identity
    }

    fn extract(&self, _node: &RawNode) -> Result<Attributes, ExtractionError> {
        Ok(Attributes::new())
    }
}

pub struct IdentityProcessor;

impl NodeProcessor for IdentityProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::Exact(1),
            outputs: OutputSpec::Exact(1),
        }
    }

    fn infer(&self, node: &mut Node, _context: &InferContext<'_>) -> Result<(), ProcessError> {
        log::debug!("Identity inference for node {}", node.id);
        same_as_input(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TensorValue;
    use crate::node::test_utils::{infer, NodeBuilder};

    #[test]
    fn forwards_value() {
        let mut node = NodeBuilder::new(NodeType::Identity, "id")
            .input_value(TensorValue::string_scalar("ta"))
            .outputs(1)
            .build();
        infer(&mut node).unwrap();
        assert_eq!(node.output(0), node.input(0));
    }

    #[test]
    fn missing_input_descriptor() {
        let mut node = NodeBuilder::new(NodeType::Identity, "id")
            .input(None)
            .outputs(1)
            .build();
        assert_eq!(
            infer(&mut node),
            Err(ProcessError::MissingInput("input 0".to_string()))
        );
    }
}
