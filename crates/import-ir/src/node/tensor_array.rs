//! # TensorArray
//!
//! A dynamically sized container of tensors. At conversion time only its
//! handle matters: output 0 carries a string scalar naming this node, which
//! `TensorArraySize` resolves through the graph's identifier table.
//!
//! The element count is kept in the `size` attribute. When it is not part of
//! the framework encoding it is folded once from the value of input 0; the
//! input port stays connected.
//!
//! **Inputs:**
//! - `size` (0): integer scalar
//!
//! **Outputs:**
//! - `handle` (0): string scalar, value is the node identifier
//! - `flow` (1): float scalar

use crate::decode;
use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::ir::{
    AttributeValue, Attributes, DType, FoldState, Node, NodeType, TensorDesc, TensorValue,
};
use crate::processor::{InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError};
use crate::raw::RawNode;

/// Translates `TensorArrayV3`.
pub struct TensorArrayExtractor;

impl Extractor for TensorArrayExtractor {
    fn framework_op(&self) -> &str {
        "TensorArrayV3"
    }

    fn node_type(&self) -> NodeType {
        NodeType::TensorArray
    }

    fn extract(&self, node: &RawNode) -> Result<Attributes, ExtractionError> {
        let mut attrs = Attributes::new();
        if let Some(dtype) = decode::optional_dtype(node, "dtype")? {
            attrs.insert("dtype".to_string(), AttributeValue::String(dtype.to_string()));
        }
        if let Some(shape) = decode::optional_shape(node, "element_shape")? {
            attrs.insert("element_shape".to_string(), AttributeValue::Shape(shape));
        }
        if let Some(size) = decode::optional_int(node, "size")? {
            attrs.insert("size".to_string(), AttributeValue::Int64(size));
        }
        Ok(attrs)
    }
}

pub struct TensorArrayProcessor;

fn fold_size(node: &mut Node) -> Result<(), ProcessError> {
    let desc = node.require_input(0)?;
    let size = desc
        .value
        .as_ref()
        .and_then(TensorValue::single_i64)
        .ok_or_else(|| ProcessError::NotScalar {
            input: 0,
            reason: "size is not a known integer".to_string(),
        })?;

    log::debug!("TensorArray node {} has size {}", node.id, size);
    node.attrs
        .insert("size".to_string(), AttributeValue::Int64(size));
    node.fold = FoldState::Resolved;
    Ok(())
}

impl NodeProcessor for TensorArrayProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::Exact(1),
            outputs: OutputSpec::Exact(2),
        }
    }

    fn initial_fold_state(&self, attrs: &Attributes) -> FoldState {
        if attrs.contains_key("size") {
            FoldState::NotApplicable
        } else {
            FoldState::Pending
        }
    }

    fn infer(&self, node: &mut Node, _context: &InferContext<'_>) -> Result<(), ProcessError> {
        log::debug!("TensorArray inference for node {}", node.id);

        if !node.has_attr("size") {
            fold_size(node)?;
        }
        node.attr_i64("size")?;

        let handle = TensorDesc::from_value(TensorValue::string_scalar(node.id.clone()));
        node.set_output(0, handle)?;
        node.set_output(1, TensorDesc::scalar(DType::Float32))
    }
}
