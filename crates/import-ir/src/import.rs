//! Import pipeline: framework graph to annotated canonical graph
//!
//! Extraction is best effort. A node whose extractor fails is kept with
//! `attrs_incomplete` set and the error is recorded in the
//! [`ExtractionReport`]; inference of that node fails later. A framework
//! operator without an enabled extractor becomes a [`NodeType::Unsupported`]
//! node.

use std::collections::HashMap;

use crate::config::ImportConfig;
use crate::engine::{infer_graph, InferenceReport};
use crate::error::{ExtractionError, ExtractionErrorKind, ExtractionReport, ImportError};
use crate::extractor::ExtractorRegistry;
use crate::ir::{Attributes, FoldState, IrGraph, Node, NodeType};
use crate::processor::get_processor_registry;
use crate::raw::{parse_input, InputRef, RawGraph, RawNode};

/// A canonical graph before inference, with the extraction errors met while
/// building it.
#[derive(Debug)]
pub struct ExtractedGraph {
    pub graph: IrGraph,
    pub report: ExtractionReport,
}

/// A fully annotated canonical graph.
#[derive(Debug)]
pub struct ImportOutcome {
    pub graph: IrGraph,
    pub report: ExtractionReport,
    pub inference: InferenceReport,
}

/// Data inputs of a framework node by input port; `None` where the input
/// string could not be parsed.
fn data_inputs<'a>(node: &'a RawNode, report: &mut ExtractionReport) -> Vec<Option<InputRef<'a>>> {
    node.inputs
        .iter()
        .filter_map(|input| match parse_input(input) {
            Ok(Some(input)) => Some(Some(input)),
            Ok(None) => None,
            Err(reason) => {
                report.push(ExtractionError::malformed(&node.name, &node.op, "inputs", reason));
                Some(None)
            }
        })
        .collect()
}

fn extract_node(
    raw: &RawNode,
    extractors: &ExtractorRegistry,
    report: &mut ExtractionReport,
) -> (NodeType, Attributes, bool) {
    match extractors.extract(raw) {
        Ok((node_type, attrs)) => (node_type, attrs, false),
        Err(error) => {
            let node_type = extractors
                .resolve(&raw.op)
                .map(|extractor| extractor.node_type())
                .unwrap_or(NodeType::Unsupported);
            let incomplete = error.kind != ExtractionErrorKind::UnsupportedOperator;
            report.push(error);
            (node_type, Attributes::new(), incomplete)
        }
    }
}

/// Extract every framework node and assemble the canonical graph, without
/// running inference.
pub fn extract_graph(
    raw: &RawGraph,
    extractors: &ExtractorRegistry,
) -> Result<ExtractedGraph, ImportError> {
    log::info!("Extracting {} framework node(s)", raw.nodes.len());

    let processors = get_processor_registry();
    let mut report = ExtractionReport::default();
    let mut graph = IrGraph::new();

    let inputs: Vec<Vec<Option<InputRef<'_>>>> = raw
        .nodes
        .iter()
        .map(|node| data_inputs(node, &mut report))
        .collect();

    // Highest output port referenced for every producer.
    let mut referenced: HashMap<&str, usize> = HashMap::new();
    for input in inputs.iter().flatten().flatten() {
        let port = referenced.entry(input.producer).or_default();
        *port = (*port).max(input.port + 1);
    }

    for (raw_node, node_inputs) in raw.nodes.iter().zip(&inputs) {
        let (node_type, extracted, incomplete) = extract_node(raw_node, extractors, &mut report);
        let processor = processors.get(node_type);

        let mut attrs = processor.default_attrs();
        attrs.extend(extracted);

        let num_outputs = processor
            .spec()
            .outputs
            .default_count()
            .max(referenced.get(raw_node.name.as_str()).copied().unwrap_or(0));

        let mut node = Node::new(&raw_node.name, node_type, node_inputs.len(), num_outputs);
        node.framework_op = raw_node.op.clone();
        node.fold = if incomplete {
            FoldState::NotApplicable
        } else {
            processor.initial_fold_state(&attrs)
        };
        node.attrs = attrs;
        node.attrs_incomplete = incomplete;

        log::debug!(
            "Extracted {} ({} -> {}) with {} input(s), {} output(s)",
            node.id,
            node.framework_op,
            node.node_type,
            node.inputs.len(),
            node.outputs.len()
        );
        graph.add_node(node)?;
    }

    for (raw_node, node_inputs) in raw.nodes.iter().zip(&inputs) {
        let Some(dst) = graph.find(&raw_node.name) else {
            continue;
        };
        for (dst_port, input) in node_inputs.iter().enumerate() {
            let Some(input) = input else {
                continue;
            };
            match graph.find(input.producer) {
                Some(src) => {
                    graph.connect(src, input.port, dst, dst_port)?;
                }
                None => report.push(ExtractionError::new(
                    &raw_node.name,
                    &raw_node.op,
                    ExtractionErrorKind::UnknownInput(input.producer.to_string()),
                )),
            }
        }
    }

    Ok(ExtractedGraph { graph, report })
}

/// Import a framework graph with the built-in extractors.
pub fn import_graph(raw: &RawGraph, config: &ImportConfig) -> Result<ImportOutcome, ImportError> {
    import_graph_with(raw, &ExtractorRegistry::with_defaults(), config)
}

/// Import a framework graph: extraction, graph assembly and inference.
pub fn import_graph_with(
    raw: &RawGraph,
    extractors: &ExtractorRegistry,
    config: &ImportConfig,
) -> Result<ImportOutcome, ImportError> {
    let ExtractedGraph { mut graph, report } = extract_graph(raw, extractors)?;

    if !report.is_empty() {
        if config.strict_extraction {
            return Err(ImportError::Extraction(report));
        }
        log::warn!("Continuing past {report}");
    }

    let inference = infer_graph(&mut graph, config)?;
    Ok(ImportOutcome {
        graph,
        report,
        inference,
    })
}
