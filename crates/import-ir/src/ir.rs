//! Canonical graph IR: tensor descriptors, attributes, nodes and the graph.

mod attribute;
mod graph;
mod node;
mod tensor;

pub use attribute::{AttributeValue, Attributes};
pub use graph::{Edge, IrGraph, NodeAnnotations};
pub use node::{FoldState, Node, NodeType, Port};
pub use tensor::{DType, Dim, Shape, TensorDesc, TensorValue};
