use import_ir::ir::{DType, FoldState, TensorDesc, TensorValue};
use import_ir::{
    extract_graph, import_graph, infer_graph, ErrorKind, ExtractionErrorKind, ExtractorRegistry,
    ImportConfig, ImportError, RawGraph,
};
use serde_json::json;

fn raw(nodes: serde_json::Value) -> RawGraph {
    serde_json::from_value(json!({ "nodes": nodes })).unwrap()
}

fn conversion_kind(result: Result<import_ir::ImportOutcome, ImportError>) -> (ErrorKind, String) {
    match result {
        Err(ImportError::Conversion(error)) => (error.kind, error.node),
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

#[test]
fn reverse_of_known_value() {
    let graph = raw(json!([
        { "name": "data", "op": "Const",
          "attrs": { "value": { "tensor": { "dtype": 9, "shape": [4], "int_val": [1, 2, 3, 4] } } } },
        { "name": "axis", "op": "Const",
          "attrs": { "value": { "tensor": { "dtype": 3, "shape": [1], "int_val": [0] } } } },
        { "name": "reverse", "op": "ReverseV2", "inputs": ["data", "axis"] }
    ]));

    let outcome = import_graph(&graph, &ImportConfig::default()).unwrap();
    let index = outcome.graph.find("reverse").unwrap();

    assert_eq!(
        outcome.graph.output_desc(index, 0),
        Some(&TensorDesc::from_value(
            TensorValue::from_i64s(&[4], vec![4, 3, 2, 1]).unwrap()
        ))
    );
}

#[test]
fn reverse_of_unknown_value_keeps_shape() {
    let graph = raw(json!([
        { "name": "data", "op": "Placeholder",
          "attrs": { "dtype": { "type": 1 }, "shape": { "shape": { "dims": [4] } } } },
        { "name": "reverse", "op": "ReverseV2", "inputs": ["data"], "attrs": { "axis": { "i": 0 } } }
    ]));

    let outcome = import_graph(&graph, &ImportConfig::default()).unwrap();
    let node = outcome.graph.node_by_id("reverse").unwrap();

    assert_eq!(
        node.output(0),
        Some(&TensorDesc::from_static_shape(Some(DType::Float32), &[4]))
    );
    assert_eq!(node.fold, FoldState::NotApplicable);
}

#[test]
fn dynamic_axis_is_folded_once() {
    let graph = raw(json!([
        { "name": "data", "op": "Placeholder",
          "attrs": { "dtype": { "type": 1 }, "shape": { "shape": { "dims": [-1, 4, 5] } } } },
        { "name": "axis", "op": "Const",
          "attrs": { "value": { "tensor": { "dtype": 3, "shape": [1], "int_val": [2] } } } },
        { "name": "reverse", "op": "ReverseV2", "inputs": ["data", "axis"] },
        { "name": "out", "op": "Identity", "inputs": ["reverse"] }
    ]));

    let mut outcome = import_graph(&graph, &ImportConfig::default()).unwrap();
    let reverse = outcome.graph.node_by_id("reverse").unwrap();

    assert_eq!(reverse.attr_i64("axis"), Ok(2));
    assert_eq!(reverse.inputs.len(), 1);
    assert_eq!(reverse.fold, FoldState::Resolved);
    assert_eq!(outcome.inference.folds, 1);

    let annotations = outcome.graph.annotations();
    let edges = outcome.graph.edge_count();
    let report = infer_graph(&mut outcome.graph, &ImportConfig::default()).unwrap();

    assert_eq!(report.passes, 1);
    assert_eq!(report.folds, 0);
    assert_eq!(outcome.graph.annotations(), annotations);
    assert_eq!(outcome.graph.edge_count(), edges);
}

#[test]
fn dynamic_axis_with_two_elements_fails() {
    let graph = raw(json!([
        { "name": "data", "op": "Placeholder",
          "attrs": { "dtype": { "type": 1 }, "shape": { "shape": { "dims": [2, 2] } } } },
        { "name": "axis", "op": "Const",
          "attrs": { "value": { "tensor": { "dtype": 3, "shape": [2], "int_val": [0, 1] } } } },
        { "name": "reverse", "op": "ReverseV2", "inputs": ["data", "axis"] }
    ]));

    let (kind, node) = conversion_kind(import_graph(&graph, &ImportConfig::default()));
    assert_eq!(kind, ErrorKind::ShapeInference);
    assert_eq!(node, "reverse");
}

#[test]
fn tensor_array_size_reaches_every_consumer() {
    let graph = raw(json!([
        { "name": "n", "op": "Const",
          "attrs": { "value": { "tensor": { "dtype": 3, "int_val": [5] } } } },
        { "name": "ta", "op": "TensorArrayV3", "inputs": ["n"],
          "attrs": { "dtype": { "type": 1 } } },
        { "name": "size", "op": "TensorArraySizeV3", "inputs": ["ta", "ta:1"] },
        { "name": "a", "op": "Identity", "inputs": ["size"] },
        { "name": "b", "op": "Identity", "inputs": ["size", "^a"] }
    ]));

    let outcome = import_graph(&graph, &ImportConfig::default()).unwrap();
    let expected = TensorDesc::from_value(TensorValue::int64_scalar(5));

    let size = outcome.graph.node_by_id("size").unwrap();
    assert_eq!(size.output(0), Some(&expected));
    assert_eq!(size.output(0).and_then(TensorDesc::rank), Some(0));
    for consumer in ["a", "b"] {
        let node = outcome.graph.node_by_id(consumer).unwrap();
        assert_eq!(node.input(0), Some(&expected));
    }
    // The handle lookup is not an edge.
    assert_eq!(outcome.graph.edge_count(), 5);
}

#[test]
fn tensor_array_size_with_dangling_handle_fails() {
    let graph = raw(json!([
        { "name": "handle", "op": "Const",
          "attrs": { "value": { "tensor": { "dtype": 7, "string_val": ["gone"] } } } },
        { "name": "flow", "op": "Const",
          "attrs": { "value": { "tensor": { "dtype": 1, "float_val": [0.0] } } } },
        { "name": "size", "op": "TensorArraySizeV3", "inputs": ["handle", "flow"] }
    ]));

    let (kind, node) = conversion_kind(import_graph(&graph, &ImportConfig::default()));
    assert_eq!(kind, ErrorKind::UnresolvedReference);
    assert_eq!(node, "size");
}

#[test]
fn image_patches_shape() {
    let graph = raw(json!([
        { "name": "images", "op": "Placeholder",
          "attrs": { "dtype": { "type": 1 }, "shape": { "shape": { "dims": [-1, 10, 10, 3] } } } },
        { "name": "patches", "op": "ExtractImagePatches", "inputs": ["images"],
          "attrs": {
            "ksizes": { "list": { "i": [1, 3, 3, 1] } },
            "strides": { "list": { "i": [1, 1, 1, 1] } },
            "rates": { "list": { "i": [1, 1, 1, 1] } },
            "padding": { "s": "SAME" }
          } }
    ]));

    let outcome = import_graph(&graph, &ImportConfig::default()).unwrap();
    let node = outcome.graph.node_by_id("patches").unwrap();

    assert_eq!(node.attr_i64s("spatial_dims"), Ok(vec![1, 2]));
    assert_eq!(node.attr_string("auto_pad"), Ok("same_upper".to_string()));
    assert_eq!(node.attr_i64s("sizes"), Ok(vec![1, 3, 3, 1]));
    assert_eq!(node.attr_i64s("strides"), Ok(vec![1, 1, 1, 1]));
    assert_eq!(node.attr_i64s("rates"), Ok(vec![1, 1, 1, 1]));
    assert!(!node.has_attr("pads_begin"));
    assert!(!node.has_attr("pads_end"));
    assert_eq!(
        node.output(0),
        Some(&TensorDesc::from_shape(
            Some(DType::Float32),
            vec![None, Some(10), Some(10), Some(27)]
        ))
    );
}

#[test]
fn oversized_image_patches_window_is_a_shape_error() {
    let graph = raw(json!([
        { "name": "images", "op": "Placeholder",
          "attrs": { "dtype": { "type": 1 }, "shape": { "shape": { "dims": [1, 10, 10, 3] } } } },
        { "name": "patches", "op": "ExtractImagePatches", "inputs": ["images"],
          "attrs": {
            "ksizes": { "list": { "i": [1, 4294967296_i64, 4294967296_i64, 1] } },
            "strides": { "list": { "i": [1, 1, 1, 1] } },
            "rates": { "list": { "i": [1, 1, 1, 1] } },
            "padding": { "s": "VALID" }
          } }
    ]));

    let (kind, node) = conversion_kind(import_graph(&graph, &ImportConfig::default()));
    assert_eq!(kind, ErrorKind::ShapeInference);
    assert_eq!(node, "patches");
}

#[test]
fn failed_extraction_is_deferred_to_inference() {
    let graph = raw(json!([
        { "name": "images", "op": "Placeholder",
          "attrs": { "dtype": { "type": 1 }, "shape": { "shape": { "dims": [1, 8, 8, 1] } } } },
        { "name": "patches", "op": "ExtractImagePatches", "inputs": ["images"],
          "attrs": {
            "ksizes": { "list": { "i": [1, 2, 2, 1] } },
            "strides": { "list": { "i": [1, 2, 2, 1] } },
            "rates": { "list": { "i": [1, 1, 1, 1] } },
            "padding": { "s": "REFLECT" }
          } }
    ]));

    let extracted = extract_graph(&graph, &ExtractorRegistry::with_defaults()).unwrap();
    assert_eq!(extracted.report.len(), 1);
    assert_eq!(
        extracted.report.errors()[0].kind,
        ExtractionErrorKind::UnknownPadding("REFLECT".to_string())
    );
    assert!(extracted.graph.node_by_id("patches").unwrap().attrs_incomplete);

    let (kind, node) = conversion_kind(import_graph(&graph, &ImportConfig::default()));
    assert_eq!(kind, ErrorKind::ShapeInference);
    assert_eq!(node, "patches");

    assert!(matches!(
        import_graph(&graph, &ImportConfig::new().with_strict_extraction(true)),
        Err(ImportError::Extraction(_))
    ));
}
