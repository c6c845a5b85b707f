//! # Reverse
//!
//! Reverses the order of elements of the data input along one axis.
//!
//! The axis is either a static `axis` attribute or the value of input 1. In the
//! latter case the first successful inference folds it: the value is written
//! to the `axis` attribute, input 1 is removed from the node and the node is
//! marked [`FoldState::Resolved`]. Later passes see the attribute and never
//! touch the ports again.
//!
//! **Inputs:**
//! - `data` (0): tensor of known rank
//! - `axis` (1, optional): single integer known at conversion time
//!
//! **Outputs:**
//! - `output` (0): `data` flipped along `axis` when its value is known,
//!   otherwise a tensor of the same shape

use crate::error::ExtractionError;
use crate::ir::{AttributeValue, Attributes, FoldState, Node, NodeType, TensorDesc};
use crate::processor::{InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError};
use crate::raw::RawNode;
use crate::{decode, extractor::Extractor};

/// Translates `ReverseV2`, whose axis arrives on input 1.
pub struct ReverseExtractor;

impl Extractor for ReverseExtractor {
    fn framework_op(&self) -> &str {
        "ReverseV2"
    }

    fn node_type(&self) -> NodeType {
        NodeType::Reverse
    }

    fn extract(&self, node: &RawNode) -> Result<Attributes, ExtractionError> {
        let mut attrs = Attributes::new();
        if let Some(axis) = decode::optional_int(node, "axis")? {
            attrs.insert("axis".to_string(), AttributeValue::Int64(axis));
        }
        Ok(attrs)
    }
}

pub struct ReverseProcessor;

/// Map a possibly negative axis onto `0..rank`.
fn normalize_axis(axis: i64, rank: usize) -> Result<usize, ProcessError> {
    let rank_i64 = rank as i64;
    let normalized = if axis < 0 { axis + rank_i64 } else { axis };
    if (0..rank_i64).contains(&normalized) {
        Ok(normalized as usize)
    } else {
        Err(ProcessError::InvalidAttribute {
            name: "axis".to_string(),
            reason: format!("axis {axis} is out of range for rank {rank}"),
        })
    }
}

/// Move the value of input 1 into the `axis` attribute and drop the port.
fn fold_axis(node: &mut Node) -> Result<i64, ProcessError> {
    let desc = node.require_input(1)?;
    let value = desc.value.as_ref().ok_or_else(|| ProcessError::NotScalar {
        input: 1,
        reason: "value is not known at conversion time".to_string(),
    })?;
    let axis = value.single_i64().ok_or_else(|| ProcessError::NotScalar {
        input: 1,
        reason: format!("expected exactly one integer element, got {value:?}"),
    })?;

    log::debug!("Reverse node {} folds axis {} from input 1", node.id, axis);
    node.attrs
        .insert("axis".to_string(), AttributeValue::Int64(axis));
    node.fold_input(1)?;
    Ok(axis)
}

impl NodeProcessor for ReverseProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::Range(1, 2),
            outputs: OutputSpec::Exact(1),
        }
    }

    fn initial_fold_state(&self, attrs: &Attributes) -> FoldState {
        if attrs.contains_key("axis") {
            FoldState::NotApplicable
        } else {
            FoldState::Pending
        }
    }

    fn infer(&self, node: &mut Node, _context: &InferContext<'_>) -> Result<(), ProcessError> {
        log::debug!("Reverse inference for node {}", node.id);

        let axis = if node.has_attr("axis") {
            node.attr_i64("axis")?
        } else {
            fold_axis(node)?
        };

        let input = node.require_input(0)?;
        let rank = input.rank().ok_or_else(|| {
            ProcessError::Custom("Reverse: rank of input 0 is unknown".to_string())
        })?;
        let axis = normalize_axis(axis, rank)?;

        let output = match &input.value {
            Some(value) => TensorDesc::from_value(value.flip(axis)),
            None => TensorDesc::from_shape(input.dtype, input.shape.clone().unwrap_or_default()),
        };
        node.set_output(0, output)
    }
}
