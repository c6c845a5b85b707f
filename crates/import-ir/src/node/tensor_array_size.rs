//! # TensorArraySize
//!
//! Reports the element count of a `TensorArray`. The array is found by
//! identifier: the value on the handle input names the node whose `size`
//! attribute is read. This lookup is not an edge of the graph.
//!
//! **Inputs:**
//! - `handle` (0): string scalar naming a node
//! - `flow` (1): ordering token, unused
//!
//! **Outputs:**
//! - `size` (0..): rank-0 int64 scalar, identical on every output port

use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::ir::{Attributes, Node, NodeType, TensorDesc, TensorValue};
use crate::processor::{InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError};
use crate::raw::RawNode;

/// Translates `TensorArraySizeV3`, which has no attributes.
pub struct TensorArraySizeExtractor;

impl Extractor for TensorArraySizeExtractor {
    fn framework_op(&self) -> &str {
        "TensorArraySizeV3"
    }

    fn node_type(&self) -> NodeType {
        NodeType::TensorArraySize
    }

    fn extract(&self, _node: &RawNode) -> Result<Attributes, ExtractionError> {
        Ok(Attributes::new())
    }
}

pub struct TensorArraySizeProcessor;

impl NodeProcessor for TensorArraySizeProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::Exact(2),
            outputs: OutputSpec::AtLeast(1),
        }
    }

    fn infer(&self, node: &mut Node, context: &InferContext<'_>) -> Result<(), ProcessError> {
        log::debug!("TensorArraySize inference for node {}", node.id);

        let handle = node.require_input(0)?;
        let name = handle
            .value
            .as_ref()
            .and_then(TensorValue::single_string)
            .ok_or_else(|| {
                ProcessError::UnresolvedReference("handle value is unknown".to_string())
            })?;
        let array = context.resolve(name).ok_or_else(|| {
            ProcessError::UnresolvedReference(format!("no node named `{name}`"))
        })?;
        let size = array
            .attr("size")
            .ok_or_else(|| {
                ProcessError::UnresolvedReference(format!("node `{name}` has no `size` attribute"))
            })?
            .clone()
            .into_i64()?;

        let desc = TensorDesc::from_value(TensorValue::int64_scalar(size));
        for port in node.outputs.iter_mut() {
            port.desc = Some(desc.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AttributeValue, DType, IrGraph};
    use crate::node::test_utils::{infer, infer_in, NodeBuilder};

    fn graph_with_array(size: Option<i64>) -> IrGraph {
        let mut graph = IrGraph::new();
        let mut array = Node::new("ta", NodeType::TensorArray, 1, 2);
        if let Some(size) = size {
            array
                .attrs
                .insert("size".to_string(), AttributeValue::Int64(size));
        }
        graph.add_node(array).unwrap();
        graph
    }

    fn size_node(handle: &str, outputs: usize) -> Node {
        NodeBuilder::new(NodeType::TensorArraySize, "size1")
            .input_value(TensorValue::string_scalar(handle))
            .input_shape(DType::Float32, vec![])
            .outputs(outputs)
            .build()
    }

    #[test]
    fn size_is_read_through_the_handle() {
        let graph = graph_with_array(Some(4));
        let mut node = size_node("ta", 1);

        infer_in(&mut node, &graph).unwrap();

        assert_eq!(
            node.output(0),
            Some(&TensorDesc::from_value(TensorValue::int64_scalar(4)))
        );
        assert_eq!(node.output(0).and_then(TensorDesc::rank), Some(0));
    }

    #[test]
    fn every_output_gets_the_same_value() {
        let graph = graph_with_array(Some(7));
        let mut node = size_node("ta", 3);

        infer_in(&mut node, &graph).unwrap();

        let expected = TensorDesc::from_value(TensorValue::int64_scalar(7));
        assert!(node.outputs.iter().all(|p| p.desc.as_ref() == Some(&expected)));
    }

    #[test]
    fn missing_node_is_unresolved() {
        let mut node = size_node("ta", 1);
        assert!(matches!(
            infer(&mut node),
            Err(ProcessError::UnresolvedReference(_))
        ));
    }

    #[test]
    fn array_without_size_is_unresolved() {
        let graph = graph_with_array(None);
        let mut node = size_node("ta", 1);
        assert!(matches!(
            infer_in(&mut node, &graph),
            Err(ProcessError::UnresolvedReference(_))
        ));
    }

    #[test]
    fn unknown_handle_is_unresolved() {
        let graph = graph_with_array(Some(4));
        let mut node = NodeBuilder::new(NodeType::TensorArraySize, "size1")
            .input_shape(DType::String, vec![])
            .input_shape(DType::Float32, vec![])
            .outputs(1)
            .build();
        assert!(matches!(
            infer_in(&mut node, &graph),
            Err(ProcessError::UnresolvedReference(_))
        ));
    }
}
