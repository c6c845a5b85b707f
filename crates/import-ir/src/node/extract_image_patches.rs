//! # ExtractImagePatches
//!
//! Gathers sliding windows of an NHWC image into the channel dimension.
//!
//! **Attributes:**
//! - `sizes`, `strides`, `rates`: four values each, one per NHWC dimension;
//!   only the spatial ones are used
//! - `auto_pad`: canonical [`PadMode`] name
//! - `spatial_dims`: always `[1, 2]`
//! - `pads`: `[begin_h, begin_w, end_h, end_w]`, used by `explicit` padding
//!
//! **Inputs:**
//! - `images` (0): rank-4 NHWC tensor
//!
//! **Outputs:**
//! - `patches` (0): `[N, out_h, out_w, C * size_h * size_w]`

use derive_new::new;

use crate::decode;
use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::ir::{AttributeValue, Attributes, Node, NodeType, TensorDesc};
use crate::node::padding::{canonicalize_padding, output_dim, same_pads, PadMode, Window};
use crate::processor::{InferContext, InputSpec, NodeProcessor, NodeSpec, OutputSpec, ProcessError};
use crate::raw::RawNode;

const SPATIAL_DIMS: [usize; 2] = [1, 2];

/// Translates the framework `ExtractImagePatches` operator.
pub struct ExtractImagePatchesExtractor;

impl Extractor for ExtractImagePatchesExtractor {
    fn framework_op(&self) -> &str {
        "ExtractImagePatches"
    }

    fn node_type(&self) -> NodeType {
        NodeType::ExtractImagePatches
    }

    fn extract(&self, node: &RawNode) -> Result<Attributes, ExtractionError> {
        let padding = decode::string(node, "padding")?;
        let auto_pad = canonicalize_padding(&padding)
            .map_err(|kind| ExtractionError::new(&node.name, &node.op, kind))?;

        let mut attrs = Attributes::from([
            (
                "spatial_dims".to_string(),
                AttributeValue::Int64s(SPATIAL_DIMS.iter().map(|&d| d as i64).collect()),
            ),
            (
                "sizes".to_string(),
                AttributeValue::Int64s(decode::int_list(node, "ksizes")?),
            ),
            (
                "strides".to_string(),
                AttributeValue::Int64s(decode::int_list(node, "strides")?),
            ),
            (
                "rates".to_string(),
                AttributeValue::Int64s(decode::int_list(node, "rates")?),
            ),
            (
                "auto_pad".to_string(),
                AttributeValue::String(auto_pad.to_string()),
            ),
        ]);

        // NHWC begin/end pairs, reordered to all begins then all ends.
        if let Some(paddings) = decode::optional_int_list(node, "explicit_paddings")? {
            if !paddings.is_empty() {
                if paddings.len() != 8 || paddings.iter().any(|&p| p < 0) {
                    return Err(ExtractionError::malformed(
                        &node.name,
                        &node.op,
                        "explicit_paddings",
                        format!("expected 8 non-negative values, got {paddings:?}"),
                    ));
                }
                let pads = vec![paddings[2], paddings[4], paddings[3], paddings[5]];
                attrs.insert("pads".to_string(), AttributeValue::Int64s(pads));
            }
        }
        Ok(attrs)
    }
}

/// Validated window geometry of an ExtractImagePatches node.
#[derive(Debug, Clone, PartialEq, new)]
pub struct ExtractImagePatchesConfig {
    /// Patch size `[height, width]`.
    pub sizes: [usize; 2],
    pub strides: [usize; 2],
    /// Dilation `[height, width]`.
    pub rates: [usize; 2],
    pub auto_pad: PadMode,
    /// `[begin_h, begin_w, end_h, end_w]`.
    pub pads: [usize; 4],
}

impl ExtractImagePatchesConfig {
    fn window(&self, i: usize) -> Window {
        Window::new(self.sizes[i], self.strides[i], self.rates[i])
    }

    fn explicit_pads(&self, i: usize) -> [usize; 2] {
        [self.pads[i], self.pads[i + 2]]
    }

    fn overflow(&self) -> ProcessError {
        ProcessError::InvalidAttribute {
            name: "sizes".to_string(),
            reason: format!(
                "window {:?} with rates {:?} and pads {:?} overflows",
                self.sizes, self.rates, self.pads
            ),
        }
    }

    /// Output length of spatial dimension `i` (0 for height, 1 for width)
    /// given `input` elements along it.
    pub fn output_size(&self, i: usize, input: usize) -> Result<usize, ProcessError> {
        output_dim(input, self.window(i), self.auto_pad, self.explicit_pads(i))
            .ok_or_else(|| self.overflow())
    }

    /// Channel count of the output for `channels` input channels.
    pub fn depth(&self, channels: usize) -> Result<usize, ProcessError> {
        channels
            .checked_mul(self.sizes[0])
            .and_then(|depth| depth.checked_mul(self.sizes[1]))
            .ok_or_else(|| self.overflow())
    }

    /// Padding `([begin_h, begin_w], [end_h, end_w])` applied to an input of
    /// spatial size `[height, width]`.
    pub fn pads(&self, input: [usize; 2]) -> Result<([usize; 2], [usize; 2]), ProcessError> {
        let mut begin = [0; 2];
        let mut end = [0; 2];
        for i in 0..2 {
            let [b, e] = match self.auto_pad {
                PadMode::SameUpper | PadMode::SameLower => {
                    same_pads(input[i], self.window(i), self.auto_pad)
                        .ok_or_else(|| self.overflow())?
                }
                PadMode::Explicit => self.explicit_pads(i),
                PadMode::Valid => [0, 0],
            };
            begin[i] = b;
            end[i] = e;
        }
        Ok((begin, end))
    }
}

/// Spatial entries of a four-value window attribute; each must be positive.
fn spatial_values(node: &Node, name: &str) -> Result<[usize; 2], ProcessError> {
    let values = node.attr_i64s(name)?;
    let invalid = |reason: String| ProcessError::InvalidAttribute {
        name: name.to_string(),
        reason,
    };
    if values.len() != 4 {
        return Err(invalid(format!("expected 4 values, got {}", values.len())));
    }
    let mut spatial = [0; 2];
    for (slot, &dim) in spatial.iter_mut().zip(SPATIAL_DIMS.iter()) {
        let value = values[dim];
        if value < 1 {
            return Err(invalid(format!("values must be positive, got {values:?}")));
        }
        *slot = value as usize;
    }
    Ok(spatial)
}

/// Create an [`ExtractImagePatchesConfig`] from the attributes of the node.
pub fn extract_image_patches_config(
    node: &Node,
) -> Result<ExtractImagePatchesConfig, ProcessError> {
    let spatial_dims = node.attr_i64s("spatial_dims")?;
    if spatial_dims != [1, 2] {
        return Err(ProcessError::InvalidAttribute {
            name: "spatial_dims".to_string(),
            reason: format!("only NHWC layout is supported, got {spatial_dims:?}"),
        });
    }

    let auto_pad_name = node.attr_string("auto_pad")?;
    let auto_pad =
        auto_pad_name
            .parse::<PadMode>()
            .map_err(|_| ProcessError::InvalidAttribute {
                name: "auto_pad".to_string(),
                reason: format!("unknown padding mode `{auto_pad_name}`"),
            })?;

    let pads = node.attr_i64s("pads")?;
    let pads: [usize; 4] = match pads.as_slice() {
        &[a, b, c, d] if pads.iter().all(|&p| p >= 0) => {
            [a as usize, b as usize, c as usize, d as usize]
        }
        _ => {
            return Err(ProcessError::InvalidAttribute {
                name: "pads".to_string(),
                reason: format!("expected 4 non-negative values, got {pads:?}"),
            });
        }
    };

    Ok(ExtractImagePatchesConfig::new(
        spatial_values(node, "sizes")?,
        spatial_values(node, "strides")?,
        spatial_values(node, "rates")?,
        auto_pad,
        pads,
    ))
}

pub struct ExtractImagePatchesProcessor;

impl NodeProcessor for ExtractImagePatchesProcessor {
    fn spec(&self) -> NodeSpec {
        NodeSpec {
            inputs: InputSpec::Exact(1),
            outputs: OutputSpec::Exact(1),
        }
    }

    fn default_attrs(&self) -> Attributes {
        Attributes::from([
            (
                "spatial_dims".to_string(),
                AttributeValue::Int64s(vec![1, 2]),
            ),
            ("pads".to_string(), AttributeValue::Int64s(vec![0; 4])),
        ])
    }

    fn infer(&self, node: &mut Node, _context: &InferContext<'_>) -> Result<(), ProcessError> {
        log::debug!("ExtractImagePatches inference for node {}", node.id);

        let config = extract_image_patches_config(node)?;
        let input = node.require_input(0)?;
        let shape = match &input.shape {
            Some(shape) if shape.len() == 4 => shape.clone(),
            Some(shape) => {
                return Err(ProcessError::Custom(format!(
                    "ExtractImagePatches: expected a rank-4 input, got rank {}",
                    shape.len()
                )));
            }
            None => {
                return Err(ProcessError::Custom(
                    "ExtractImagePatches: rank of input 0 is unknown".to_string(),
                ));
            }
        };
        let dtype = input.dtype;

        let mut spatial = [None; 2];
        for (i, &dim) in SPATIAL_DIMS.iter().enumerate() {
            if let Some(size) = shape[dim] {
                spatial[i] = Some(config.output_size(i, size)?);
            }
        }
        let depth = shape[3].map(|channels| config.depth(channels)).transpose()?;

        let output = TensorDesc::from_shape(dtype, vec![shape[0], spatial[0], spatial[1], depth]);
        node.set_output(0, output)
    }
}
