//! # Constant
//!
//! A literal tensor held in the `value` attribute.

use crate::decode;
use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::ir::{AttributeValue, Attributes, Node, NodeType, TensorDesc};
use crate::processor::{InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError};
use crate::raw::RawNode;

/// Translates `Const`.
pub struct ConstantExtractor;

impl Extractor for ConstantExtractor {
    fn framework_op(&self) -> &str {
        "Const"
    }

    fn node_type(&self) -> NodeType {
        NodeType::Constant
    }

    fn extract(&self, node: &RawNode) -> Result<Attributes, ExtractionError> {
        let value = decode::tensor(node, "value")?;
        Ok(Attributes::from([(
            "value".to_string(),
            AttributeValue::Tensor(value),
        )]))
    }
}

pub struct ConstantProcessor;

impl NodeProcessor for ConstantProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::Exact(0),
            outputs: OutputSpec::Exact(1),
        }
    }

    fn infer(&self, node: &mut Node, _context: &InferContext<'_>) -> Result<(), ProcessError> {
        log::debug!("Constant inference for node {}", node.id);

        let value = node
            .attr("value")
            .ok_or_else(|| ProcessError::MissingAttribute("value".to_string()))?
            .clone()
            .into_tensor()?;
        node.set_output(0, TensorDesc::from_value(value))
    }
}
