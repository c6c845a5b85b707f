//! Extractor registry
//!
//! An [`Extractor`] turns one framework node into the attribute map of a
//! canonical operator. Several extractors may be registered for the same
//! framework operator name; [`ExtractorRegistry::resolve`] picks one with an
//! explicit rule:
//!
//! 1. disabled extractors never match;
//! 2. among the enabled ones, the highest [`Extractor::priority`] wins;
//! 3. ties go to the extractor registered last.
//!
//! Extractors for different framework names never interact, so the order in
//! which unrelated operators are registered does not matter.

use std::collections::HashMap;

use crate::error::{ExtractionError, ExtractionErrorKind};
use crate::ir::{Attributes, NodeType};
use crate::node::{
    constant::ConstantExtractor, extract_image_patches::ExtractImagePatchesExtractor,
    identity::IdentityExtractor, parameter::ParameterExtractor, reverse::ReverseExtractor,
    tensor_array::TensorArrayExtractor, tensor_array_size::TensorArraySizeExtractor,
};
use crate::raw::RawNode;

/// Translation of one framework operator into a canonical operator.
///
/// `extract` must be deterministic and must not depend on anything but the
/// framework node.
pub trait Extractor: Send + Sync {
    /// Framework operator name this extractor handles.
    fn framework_op(&self) -> &str;

    /// Canonical kind of the nodes it produces.
    fn node_type(&self) -> NodeType;

    fn enabled(&self) -> bool {
        true
    }

    fn priority(&self) -> i32 {
        0
    }

    fn extract(&self, node: &RawNode) -> Result<Attributes, ExtractionError>;
}

struct Entry {
    seq: usize,
    extractor: Box<dyn Extractor>,
}

#[derive(Default)]
pub struct ExtractorRegistry {
    entries: HashMap<String, Vec<Entry>>,
    next_seq: usize,
}

impl ExtractorRegistry {
    /// Registry without any extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ParameterExtractor);
        registry.register(ConstantExtractor);
        registry.register(IdentityExtractor);
        registry.register(ReverseExtractor);
        registry.register(TensorArrayExtractor);
        registry.register(TensorArraySizeExtractor);
        registry.register(ExtractImagePatchesExtractor);
        registry
    }

    pub fn register(&mut self, extractor: impl Extractor + 'static) {
        log::debug!(
            "Registering extractor {} -> {}",
            extractor.framework_op(),
            extractor.node_type()
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries
            .entry(extractor.framework_op().to_string())
            .or_default()
            .push(Entry {
                seq,
                extractor: Box::new(extractor),
            });
    }

    /// The extractor used for framework operator `op`, if any is enabled.
    pub fn resolve(&self, op: &str) -> Option<&dyn Extractor> {
        self.entries
            .get(op)?
            .iter()
            .filter(|entry| entry.extractor.enabled())
            .max_by_key(|entry| (entry.extractor.priority(), entry.seq))
            .map(|entry| entry.extractor.as_ref())
    }

    /// Resolve and run the extractor for `node`.
    pub fn extract(&self, node: &RawNode) -> Result<(NodeType, Attributes), ExtractionError> {
        let extractor = self.resolve(&node.op).ok_or_else(|| {
            ExtractionError::new(&node.name, &node.op, ExtractionErrorKind::UnsupportedOperator)
        })?;
        let attrs = extractor.extract(node)?;
        Ok((extractor.node_type(), attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::AttributeValue;

    struct Tagged {
        op: &'static str,
        tag: i64,
        enabled: bool,
        priority: i32,
    }

    impl Tagged {
        fn new(op: &'static str, tag: i64) -> Self {
            Self {
                op,
                tag,
                enabled: true,
                priority: 0,
            }
        }
    }

    impl Extractor for Tagged {
        fn framework_op(&self) -> &str {
            self.op
        }

        fn node_type(&self) -> NodeType {
            NodeType::Identity
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn extract(&self, _node: &RawNode) -> Result<Attributes, ExtractionError> {
            Ok(Attributes::from([(
                "tag".to_string(),
                AttributeValue::Int64(self.tag),
            )]))
        }
    }

    fn tag_of(registry: &ExtractorRegistry, op: &str) -> Option<i64> {
        let (_, attrs) = registry.extract(&RawNode::new("n", op)).ok()?;
        attrs.get("tag").cloned()?.into_i64().ok()
    }

    #[test]
    fn last_registered_wins_on_equal_priority() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Tagged::new("Foo", 1));
        registry.register(Tagged::new("Foo", 2));
        assert_eq!(tag_of(&registry, "Foo"), Some(2));
    }

    #[test]
    fn higher_priority_wins_regardless_of_order() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Tagged {
            priority: 10,
            ..Tagged::new("Foo", 1)
        });
        registry.register(Tagged::new("Foo", 2));
        assert_eq!(tag_of(&registry, "Foo"), Some(1));
    }

    #[test]
    fn disabled_extractors_never_match() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Tagged::new("Foo", 1));
        registry.register(Tagged {
            enabled: false,
            priority: 10,
            ..Tagged::new("Foo", 2)
        });
        assert_eq!(tag_of(&registry, "Foo"), Some(1));

        let mut registry = ExtractorRegistry::new();
        registry.register(Tagged {
            enabled: false,
            ..Tagged::new("Bar", 1)
        });
        assert!(registry.resolve("Bar").is_none());
    }

    #[test]
    fn unrelated_names_do_not_interact() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Tagged::new("Foo", 1));
        registry.register(Tagged::new("Bar", 2));
        registry.register(Tagged::new("Baz", 3));
        assert_eq!(tag_of(&registry, "Foo"), Some(1));
        assert_eq!(tag_of(&registry, "Bar"), Some(2));
    }

    #[test]
    fn unknown_operator_is_an_extraction_error() {
        let registry = ExtractorRegistry::with_defaults();
        let error = registry
            .extract(&RawNode::new("weird", "FancyOp"))
            .unwrap_err();
        assert_eq!(error.node, "weird");
        assert_eq!(error.kind, ExtractionErrorKind::UnsupportedOperator);
    }

    #[test]
    fn defaults_cover_builtin_operators() {
        let registry = ExtractorRegistry::with_defaults();
        for (op, node_type) in [
            ("Placeholder", NodeType::Parameter),
            ("Const", NodeType::Constant),
            ("Identity", NodeType::Identity),
            ("ReverseV2", NodeType::Reverse),
            ("TensorArrayV3", NodeType::TensorArray),
            ("TensorArraySizeV3", NodeType::TensorArraySize),
            ("ExtractImagePatches", NodeType::ExtractImagePatches),
        ] {
            assert_eq!(registry.resolve(op).map(|e| e.node_type()), Some(node_type));
        }
    }
}
