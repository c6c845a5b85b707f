//! Shape and value inference over the whole graph
//!
//! A pass visits every node once, in an order consistent with the current
//! edges. For each node it copies the producers' output descriptors onto the
//! node's input ports, runs the node's routine on a working copy and commits
//! the copy. A routine may fold a dynamic operand into an attribute and drop
//! the corresponding input port; the edge into that port is removed when the
//! node is committed, and the change schedules another pass. Inference is done
//! once a pass changes no connectivity.
//!
//! Running inference again on a converged graph reproduces the same
//! annotations and performs no fold.

use petgraph::stable_graph::NodeIndex;

use crate::config::ImportConfig;
use crate::error::{ConversionError, ErrorKind};
use crate::ir::{FoldState, IrGraph, NodeType};
use crate::processor::{
    get_processor_registry, validate_input_count, validate_output_count, InferContext,
    ProcessError, ProcessorRegistry,
};

/// Statistics of one [`infer_graph`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceReport {
    pub passes: usize,
    pub nodes_visited: usize,
    /// Nodes whose pending operand was folded into an attribute.
    pub folds: usize,
}

/// Outcome of a single pass.
struct Pass {
    folds: usize,
    /// Last node whose fold removed an input port.
    restructured: Option<NodeIndex>,
}

/// Annotate every port of `graph`, running passes until connectivity is stable.
pub fn infer_graph(
    graph: &mut IrGraph,
    config: &ImportConfig,
) -> Result<InferenceReport, ConversionError> {
    let registry = get_processor_registry();
    let mut report = InferenceReport::default();
    let max_passes = config.max_passes.max(1);

    loop {
        report.passes += 1;
        log::debug!("Inference pass {}", report.passes);

        let pass = run_pass(graph, registry, &mut report)?;
        report.folds += pass.folds;

        let Some(index) = pass.restructured else {
            log::info!(
                "Inference converged after {} pass(es), {} fold(s)",
                report.passes,
                report.folds
            );
            return Ok(report);
        };

        if report.passes >= max_passes {
            let (id, op) = identity(graph, index);
            return Err(ConversionError::new(
                id,
                op,
                ErrorKind::Consistency,
                format!("graph still changing after {max_passes} inference passes"),
            ));
        }
    }
}

fn identity(graph: &IrGraph, index: NodeIndex) -> (String, NodeType) {
    match graph.node(index) {
        Some(node) => (node.id.clone(), node.node_type),
        None => (format!("#{}", index.index()), NodeType::Unsupported),
    }
}

fn run_pass(
    graph: &mut IrGraph,
    registry: &ProcessorRegistry,
    report: &mut InferenceReport,
) -> Result<Pass, ConversionError> {
    let order = graph.topological_order().map_err(|index| {
        let (id, op) = identity(graph, index);
        ConversionError::new(id, op, ErrorKind::Consistency, "graph contains a cycle")
    })?;

    let mut pass = Pass {
        folds: 0,
        restructured: None,
    };

    for index in order {
        graph.refresh_inputs(index);
        let Some(node) = graph.node(index) else {
            continue;
        };

        let id = node.id.clone();
        let node_type = node.node_type;
        let fail = |error: ProcessError| ConversionError::from_process(&id, node_type, error);

        if node.attrs_incomplete {
            return Err(fail(ProcessError::IncompleteAttributes));
        }

        let processor = registry.get(node_type);
        let spec = processor.spec();
        validate_input_count(node, spec.inputs).map_err(fail)?;
        validate_output_count(node, spec.outputs).map_err(fail)?;

        let was_pending = node.fold == FoldState::Pending;
        let mut working = node.clone();
        processor
            .infer(&mut working, &InferContext::new(graph))
            .map_err(fail)?;

        if let Some(port) = working.outputs.iter().position(|port| port.desc.is_none()) {
            return Err(fail(ProcessError::UnannotatedOutput(port)));
        }
        if was_pending && working.fold == FoldState::Resolved {
            pass.folds += 1;
        }

        for port in &working.outputs {
            if let Some(desc) = &port.desc {
                log::debug!("{} ({}) output {}: {}", id, node_type, port.index, desc);
            }
        }

        if let Some(slot) = graph.node_mut(index) {
            *slot = working;
        }
        if graph.reconcile_folds(index) > 0 {
            pass.restructured = Some(index);
        }
        report.nodes_visited += 1;
    }

    Ok(pass)
}
