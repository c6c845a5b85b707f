//! Canonical node representation
//!
//! This module contains types for representing canonical nodes, including their
//! kinds, attributes, ports and the explicit fold state.

use derive_new::new;
use strum::{Display, EnumString};

use super::attribute::{AttributeValue, Attributes};
use super::tensor::{DType, TensorDesc};
use crate::processor::ProcessError;

/// Canonical operator kinds known to the IR.
///
/// The name is the canonical operator name, independent of the framework
/// encoding the node was extracted from.
#[derive(Debug, Hash, Eq, PartialEq, EnumString, Clone, Copy, Display, PartialOrd, Ord)]
pub enum NodeType {
    /// Graph input.
    Parameter,
    Constant,
    Identity,
    /// Flip elements along one axis.
    Reverse,
    /// Dynamically sized container of tensors.
    TensorArray,
    /// Element count of a [`NodeType::TensorArray`].
    TensorArraySize,
    ExtractImagePatches,
    /// Framework operator without an enabled extractor.
    Unsupported,
}

/// Whether a node still has a dynamic operand waiting to become an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldState {
    /// The node kind has nothing to fold, or the attribute was static.
    #[default]
    NotApplicable,
    /// The operand is still dynamic.
    Pending,
    /// The operand was folded into an attribute.
    Resolved,
}

/// Indexed connection point on a node.
#[derive(Debug, Clone, PartialEq, new)]
pub struct Port {
    pub index: usize,
    /// Empty until written by inference.
    #[new(default)]
    pub desc: Option<TensorDesc>,
}

/// An instance of a canonical operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identifier, unique within the graph.
    pub id: String,
    pub node_type: NodeType,
    /// Operator name in the originating framework.
    pub framework_op: String,
    pub attrs: Attributes,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    /// Set when extraction failed; inference of this node fails.
    pub attrs_incomplete: bool,
    pub fold: FoldState,
    /// Input ports removed by a fold since the graph last reconciled its edges.
    pub(crate) folded_inputs: Vec<usize>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            framework_op: node_type.to_string(),
            attrs: Attributes::new(),
            inputs: (0..num_inputs).map(Port::new).collect(),
            outputs: (0..num_outputs).map(Port::new).collect(),
            attrs_incomplete: false,
            fold: FoldState::NotApplicable,
            folded_inputs: Vec::new(),
        }
    }

    /// Descriptor currently on input port `index`, if any.
    pub fn input(&self, index: usize) -> Option<&TensorDesc> {
        self.inputs.get(index).and_then(|port| port.desc.as_ref())
    }

    /// Descriptor currently on output port `index`, if any.
    pub fn output(&self, index: usize) -> Option<&TensorDesc> {
        self.outputs.get(index).and_then(|port| port.desc.as_ref())
    }

    /// Descriptor on input port `index`, or an error naming the missing input.
    pub fn require_input(&self, index: usize) -> Result<&TensorDesc, ProcessError> {
        self.input(index)
            .ok_or_else(|| ProcessError::MissingInput(format!("input {index}")))
    }

    pub fn set_output(&mut self, index: usize, desc: TensorDesc) -> Result<(), ProcessError> {
        let num_outputs = self.outputs.len();
        let port = self
            .outputs
            .get_mut(index)
            .ok_or(ProcessError::InvalidOutputCount {
                expected: format!("at least {}", index + 1),
                actual: num_outputs,
            })?;
        port.desc = Some(desc);
        Ok(())
    }

    pub fn attr(&self, name: &str) -> Option<&AttributeValue> {
        self.attrs.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    fn require_attr(&self, name: &str) -> Result<AttributeValue, ProcessError> {
        self.attrs
            .get(name)
            .cloned()
            .ok_or_else(|| ProcessError::MissingAttribute(name.to_string()))
    }

    pub fn attr_i64(&self, name: &str) -> Result<i64, ProcessError> {
        self.require_attr(name)?.into_i64()
    }

    pub fn attr_i64s(&self, name: &str) -> Result<Vec<i64>, ProcessError> {
        self.require_attr(name)?.into_i64s()
    }

    pub fn attr_string(&self, name: &str) -> Result<String, ProcessError> {
        self.require_attr(name)?.into_string()
    }

    /// Element type stored as a canonical type name, e.g. `float32`.
    pub fn attr_dtype(&self, name: &str) -> Result<Option<DType>, ProcessError> {
        let Some(value) = self.attrs.get(name) else {
            return Ok(None);
        };
        let type_name = value.clone().into_string()?;
        type_name
            .parse::<DType>()
            .map(Some)
            .map_err(|_| ProcessError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("unknown data type `{type_name}`"),
            })
    }

    /// Remove input port `index`, renumbering the ports after it, and mark the
    /// node as folded.
    ///
    /// The owning graph drops the edge into the removed port when the node is
    /// committed back.
    pub fn fold_input(&mut self, index: usize) -> Result<(), ProcessError> {
        if self.remove_input(index).is_none() {
            return Err(ProcessError::MissingInput(format!("input {index}")));
        }
        self.folded_inputs.push(index);
        self.fold = FoldState::Resolved;
        Ok(())
    }

    /// Remove input port `index` and renumber the ports after it.
    pub(crate) fn remove_input(&mut self, index: usize) -> Option<Port> {
        if index >= self.inputs.len() {
            return None;
        }
        let port = self.inputs.remove(index);
        for (i, port) in self.inputs.iter_mut().enumerate().skip(index) {
            port.index = i;
        }
        Some(port)
    }

    pub(crate) fn take_folded_inputs(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.folded_inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_round_trips_through_names() {
        assert_eq!("Reverse".parse::<NodeType>(), Ok(NodeType::Reverse));
        assert_eq!(NodeType::TensorArraySize.to_string(), "TensorArraySize");
        assert!("ReverseV2".parse::<NodeType>().is_err());
    }

    #[test]
    fn new_node_has_contiguous_empty_ports() {
        let node = Node::new("reverse1", NodeType::Reverse, 2, 1);

        assert_eq!(
            node.inputs.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert!(node.inputs.iter().all(|p| p.desc.is_none()));
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.framework_op, "Reverse");
    }

    #[test]
    fn fold_input_renumbers_and_records() {
        let mut node = Node::new("n", NodeType::Reverse, 3, 1);
        node.fold_input(1).unwrap();

        assert_eq!(
            node.inputs.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(node.fold, FoldState::Resolved);
        assert_eq!(node.take_folded_inputs(), vec![1]);
        assert!(node.take_folded_inputs().is_empty());
    }

    #[test]
    fn fold_missing_input_is_an_error() {
        let mut node = Node::new("n", NodeType::Reverse, 1, 1);
        assert!(matches!(
            node.fold_input(1),
            Err(ProcessError::MissingInput(_))
        ));
        assert_eq!(node.fold, FoldState::NotApplicable);
    }

    #[test]
    fn dtype_attribute_is_parsed() {
        let mut node = Node::new("x", NodeType::Parameter, 0, 1);
        assert_eq!(node.attr_dtype("dtype"), Ok(None));

        node.attrs
            .insert("dtype".to_string(), AttributeValue::String("int64".to_string()));
        assert_eq!(node.attr_dtype("dtype"), Ok(Some(DType::Int64)));

        node.attrs
            .insert("dtype".to_string(), AttributeValue::String("complex".to_string()));
        assert!(matches!(
            node.attr_dtype("dtype"),
            Err(ProcessError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn missing_attribute_is_reported_by_name() {
        let node = Node::new("n", NodeType::Reverse, 1, 1);
        assert_eq!(
            node.attr_i64("axis"),
            Err(ProcessError::MissingAttribute("axis".to_string()))
        );
    }
}
