//! # Parameter
//!
//! Graph input. Its descriptor comes entirely from the `dtype` and `shape`
//! attributes; an absent shape means unknown rank.

use crate::decode;
use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::ir::{AttributeValue, Attributes, Node, NodeType, TensorDesc};
use crate::processor::{InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError};
use crate::raw::RawNode;

/// Translates `Placeholder`.
pub struct ParameterExtractor;

impl Extractor for ParameterExtractor {
    fn framework_op(&self) -> &str {
        "Placeholder"
    }

    fn node_type(&self) -> NodeType {
        NodeType::Parameter
    }

    fn extract(&self, node: &RawNode) -> Result<Attributes, ExtractionError> {
        let mut attrs = Attributes::new();
        if let Some(dtype) = decode::optional_dtype(node, "dtype")? {
            attrs.insert("dtype".to_string(), AttributeValue::String(dtype.to_string()));
        }
        if let Some(shape) = decode::optional_shape(node, "shape")? {
            attrs.insert("shape".to_string(), AttributeValue::Shape(shape));
        }
        Ok(attrs)
    }
}

pub struct ParameterProcessor;

impl NodeProcessor for ParameterProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::Exact(0),
            outputs: OutputSpec::Exact(1),
        }
    }

    fn infer(&self, node: &mut Node, _context: &InferContext<'_>) -> Result<(), ProcessError> {
        log::debug!("Parameter inference for node {}", node.id);

        let dtype = node.attr_dtype("dtype")?;
        let shape = match node.attr("shape") {
            Some(value) => value.clone().into_shape()?,
            None => None,
        };
        node.set_output(
            0,
            TensorDesc {
                dtype,
                shape,
                value: None,
            },
        )
    }
}
