use crate::ir::{
    AttributeValue, DType, FoldState, IrGraph, Node, NodeType, Port, TensorDesc, TensorValue,
};
use crate::processor::{get_processor_registry, InferContext, ProcessError};

/// Fluent builder for nodes under test, with their input descriptors already
/// in place.
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    pub fn new(node_type: NodeType, id: &str) -> Self {
        Self {
            node: Node::new(id, node_type, 0, 0),
        }
    }

    /// Add an input port carrying `desc`.
    pub fn input(mut self, desc: Option<TensorDesc>) -> Self {
        let mut port = Port::new(self.node.inputs.len());
        port.desc = desc;
        self.node.inputs.push(port);
        self
    }

    pub fn input_value(self, value: TensorValue) -> Self {
        self.input(Some(TensorDesc::from_value(value)))
    }

    pub fn input_i64s(self, shape: &[usize], data: Vec<i64>) -> Self {
        self.input_value(TensorValue::from_i64s(shape, data).unwrap())
    }

    pub fn input_f32s(self, shape: &[usize], data: Vec<f32>) -> Self {
        self.input_value(TensorValue::from_f32s(shape, data).unwrap())
    }

    pub fn input_shape(self, dtype: DType, shape: Vec<Option<usize>>) -> Self {
        self.input(Some(TensorDesc::from_shape(Some(dtype), shape)))
    }

    pub fn input_unknown_rank(self, dtype: DType) -> Self {
        self.input(Some(TensorDesc::unknown_rank(Some(dtype))))
    }

    pub fn outputs(mut self, count: usize) -> Self {
        self.node.outputs = (0..count).map(Port::new).collect();
        self
    }

    pub fn attr(mut self, name: &str, value: AttributeValue) -> Self {
        self.node.attrs.insert(name.to_string(), value);
        self
    }

    pub fn attr_i64(self, name: &str, value: i64) -> Self {
        self.attr(name, AttributeValue::Int64(value))
    }

    pub fn attr_i64s(self, name: &str, values: Vec<i64>) -> Self {
        self.attr(name, AttributeValue::Int64s(values))
    }

    pub fn attr_string(self, name: &str, value: &str) -> Self {
        self.attr(name, AttributeValue::String(value.to_string()))
    }

    /// Build the node with the fold state its processor assigns at extraction.
    pub fn build(mut self) -> Node {
        let processor = get_processor_registry().get(self.node.node_type);
        if self.node.fold == FoldState::NotApplicable {
            self.node.fold = processor.initial_fold_state(&self.node.attrs);
        }
        self.node
    }
}

/// Run the processor of `node` against `graph` for identifier lookups.
pub fn infer_in(node: &mut Node, graph: &IrGraph) -> Result<(), ProcessError> {
    let processor = get_processor_registry().get(node.node_type);
    processor.infer(node, &InferContext::new(graph))
}

/// Run the processor of `node` without any other node in scope.
pub fn infer(node: &mut Node) -> Result<(), ProcessError> {
    infer_in(node, &IrGraph::new())
}
