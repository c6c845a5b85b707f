//! Placeholder kind for framework operators without an enabled extractor.
//!
//! The node keeps its ports so the rest of the graph can be assembled, but its
//! inference always fails.

use crate::ir::Node;
use crate::processor::{InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError};

pub struct UnsupportedProcessor;

impl NodeProcessor for UnsupportedProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::AtLeast(0),
            outputs: OutputSpec::AtLeast(0),
        }
    }

    fn infer(&self, node: &mut Node, _context: &InferContext<'_>) -> Result<(), ProcessError> {
        Err(ProcessError::Custom(format!(
            "framework operator `{}` is not supported",
            node.framework_op
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::NodeType;
    use crate::node::test_utils::{infer, NodeBuilder};

    #[test]
    fn inference_always_fails() {
        let mut node = NodeBuilder::new(NodeType::Unsupported, "fancy").build();
        node.framework_op = "FancyOp".to_string();
        assert_eq!(
            infer(&mut node),
            Err(ProcessError::Custom(
                "framework operator `FancyOp` is not supported".to_string()
            ))
        );
    }
}
