//! The canonical graph container
//!
//! Nodes live in a [`StableGraph`] so node indices stay valid while edges are
//! added and removed. Each edge connects one output port to one input port.
//! Nodes are also addressable by their identifier through a side-table that is
//! only ever queried: a value-encoded reference to another node is never an
//! edge.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::toposort;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::node::Node;
use super::tensor::TensorDesc;
use crate::error::GraphError;

/// Port-to-port connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src_port: usize,
    pub dst_port: usize,
}

/// Shape/value annotations of one node's ports.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAnnotations {
    pub inputs: Vec<Option<TensorDesc>>,
    pub outputs: Vec<Option<TensorDesc>>,
}

#[derive(Debug, Clone, Default)]
pub struct IrGraph {
    graph: StableGraph<Node, Edge>,
    /// Identifier side-table, used for lookups only.
    ids: HashMap<String, NodeIndex>,
}

impl IrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add a node, registering its identifier in the side-table.
    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex, GraphError> {
        if self.ids.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.ids.insert(id, index);
        Ok(index)
    }

    /// Look up a node by identifier.
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(index)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.graph.node_weight_mut(index)
    }

    /// Look up a node by identifier and borrow it.
    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.find(id).and_then(|index| self.node(index))
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.graph
            .node_indices()
            .filter_map(move |index| self.graph.node_weight(index).map(|node| (index, node)))
    }

    fn node_or_err(&self, index: NodeIndex) -> Result<&Node, GraphError> {
        self.graph
            .node_weight(index)
            .ok_or(GraphError::MissingNode(index.index()))
    }

    /// Connect output port `src_port` of `src` to input port `dst_port` of `dst`.
    pub fn connect(
        &mut self,
        src: NodeIndex,
        src_port: usize,
        dst: NodeIndex,
        dst_port: usize,
    ) -> Result<EdgeIndex, GraphError> {
        let source = self.node_or_err(src)?;
        if src_port >= source.outputs.len() {
            return Err(GraphError::PortOutOfRange {
                node: source.id.clone(),
                port: src_port,
                kind: "output",
            });
        }
        let target = self.node_or_err(dst)?;
        if dst_port >= target.inputs.len() {
            return Err(GraphError::PortOutOfRange {
                node: target.id.clone(),
                port: dst_port,
                kind: "input",
            });
        }
        if self.producer(dst, dst_port).is_some() {
            return Err(GraphError::InputAlreadyConnected {
                node: target.id.clone(),
                port: dst_port,
            });
        }
        Ok(self.graph.add_edge(src, dst, Edge { src_port, dst_port }))
    }

    fn incoming_edge(&self, dst: NodeIndex, dst_port: usize) -> Option<EdgeIndex> {
        self.graph
            .edges_directed(dst, Direction::Incoming)
            .find(|edge| edge.weight().dst_port == dst_port)
            .map(|edge| edge.id())
    }

    /// Remove the edge feeding input port `dst_port` of `dst`, if any.
    ///
    /// The port itself stays on the node.
    pub fn disconnect(&mut self, dst: NodeIndex, dst_port: usize) -> Option<Edge> {
        let edge = self.incoming_edge(dst, dst_port)?;
        self.graph.remove_edge(edge)
    }

    /// Remove input port `index` of `dst` together with its edge; later ports and
    /// their edges shift down by one so indices stay contiguous.
    pub fn remove_input_port(&mut self, dst: NodeIndex, index: usize) -> Result<(), GraphError> {
        let node = self.node_or_err(dst)?;
        if index >= node.inputs.len() {
            return Err(GraphError::PortOutOfRange {
                node: node.id.clone(),
                port: index,
                kind: "input",
            });
        }
        if let Some(node) = self.graph.node_weight_mut(dst) {
            node.remove_input(index);
        }
        self.drop_input_edge(dst, index);
        Ok(())
    }

    /// Drop the edge of an input port that was already removed from the node
    /// and renumber the edges of the ports behind it.
    fn drop_input_edge(&mut self, dst: NodeIndex, index: usize) {
        self.disconnect(dst, index);
        let shifted: Vec<EdgeIndex> = self
            .graph
            .edges_directed(dst, Direction::Incoming)
            .filter(|edge| edge.weight().dst_port > index)
            .map(|edge| edge.id())
            .collect();
        for edge in shifted {
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                weight.dst_port -= 1;
            }
        }
    }

    /// Bring edges in line with the input ports `node` removed while it was
    /// being inferred. Returns the number of ports removed.
    pub(crate) fn reconcile_folds(&mut self, dst: NodeIndex) -> usize {
        let removed = match self.graph.node_weight_mut(dst) {
            Some(node) => node.take_folded_inputs(),
            None => return 0,
        };
        for &index in &removed {
            self.drop_input_edge(dst, index);
        }
        removed.len()
    }

    /// Producer of input port `dst_port` of `dst`: the source node and its output port.
    pub fn producer(&self, dst: NodeIndex, dst_port: usize) -> Option<(NodeIndex, usize)> {
        self.graph
            .edges_directed(dst, Direction::Incoming)
            .find(|edge| edge.weight().dst_port == dst_port)
            .map(|edge| (edge.source(), edge.weight().src_port))
    }

    /// Every outgoing edge of `src`, with the consuming node.
    pub fn consumers(&self, src: NodeIndex) -> Vec<(NodeIndex, Edge)> {
        let mut consumers: Vec<(NodeIndex, Edge)> = self
            .graph
            .edges_directed(src, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
            .collect();
        consumers.sort_by_key(|(node, edge)| (node.index(), edge.dst_port, edge.src_port));
        consumers
    }

    pub fn input_desc(&self, index: NodeIndex, port: usize) -> Option<&TensorDesc> {
        self.node(index)?.input(port)
    }

    pub fn output_desc(&self, index: NodeIndex, port: usize) -> Option<&TensorDesc> {
        self.node(index)?.output(port)
    }

    pub fn set_input_desc(
        &mut self,
        index: NodeIndex,
        port: usize,
        desc: Option<TensorDesc>,
    ) -> Result<(), GraphError> {
        let node = self
            .graph
            .node_weight_mut(index)
            .ok_or(GraphError::MissingNode(index.index()))?;
        let slot = node
            .inputs
            .get_mut(port)
            .ok_or_else(|| GraphError::PortOutOfRange {
                node: node.id.clone(),
                port,
                kind: "input",
            })?;
        slot.desc = desc;
        Ok(())
    }

    pub fn set_output_desc(
        &mut self,
        index: NodeIndex,
        port: usize,
        desc: Option<TensorDesc>,
    ) -> Result<(), GraphError> {
        let node = self
            .graph
            .node_weight_mut(index)
            .ok_or(GraphError::MissingNode(index.index()))?;
        let slot = node
            .outputs
            .get_mut(port)
            .ok_or_else(|| GraphError::PortOutOfRange {
                node: node.id.clone(),
                port,
                kind: "output",
            })?;
        slot.desc = desc;
        Ok(())
    }

    /// Copy producer output descriptors onto the input ports of `dst`.
    ///
    /// Returns the number of inputs updated; unconnected ports keep their
    /// current descriptor.
    pub(crate) fn refresh_inputs(&mut self, dst: NodeIndex) -> usize {
        let incoming: Vec<(usize, Option<TensorDesc>)> = self
            .graph
            .edges_directed(dst, Direction::Incoming)
            .map(|edge| {
                let desc = self
                    .graph
                    .node_weight(edge.source())
                    .and_then(|src| src.output(edge.weight().src_port))
                    .cloned();
                (edge.weight().dst_port, desc)
            })
            .collect();

        let Some(node) = self.graph.node_weight_mut(dst) else {
            return 0;
        };
        let mut updated = 0;
        for (port, desc) in incoming {
            if let Some(slot) = node.inputs.get_mut(port) {
                slot.desc = desc;
                updated += 1;
            }
        }
        updated
    }

    /// Node indices in an order consistent with the current data dependencies.
    ///
    /// On a cycle, returns the index of a node taking part in it.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, NodeIndex> {
        toposort(&self.graph, None).map_err(|cycle| cycle.node_id())
    }

    /// Snapshot of every port annotation, keyed by node identifier.
    pub fn annotations(&self) -> BTreeMap<String, NodeAnnotations> {
        self.nodes()
            .map(|(_, node)| {
                (
                    node.id.clone(),
                    NodeAnnotations {
                        inputs: node.inputs.iter().map(|p| p.desc.clone()).collect(),
                        outputs: node.outputs.iter().map(|p| p.desc.clone()).collect(),
                    },
                )
            })
            .collect()
    }
}
