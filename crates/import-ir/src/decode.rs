//! Decoders for framework attribute encodings
//!
//! Extractors use these helpers to read typed fields out of a [`RawNode`].
//! Every failure is an [`ExtractionError`] naming the node and the field.

use crate::error::ExtractionError;
use crate::ir::{DType, Shape, TensorValue};
use crate::raw::{RawAttr, RawNode, RawTensor};

fn missing(node: &RawNode, field: &str) -> ExtractionError {
    ExtractionError::missing(&node.name, &node.op, field)
}

fn malformed(node: &RawNode, field: &str, reason: impl Into<String>) -> ExtractionError {
    ExtractionError::malformed(&node.name, &node.op, field, reason)
}

/// Decode a fixed-format integer list. Lists carrying float or string entries
/// are malformed.
pub fn int_list(node: &RawNode, field: &str) -> Result<Vec<i64>, ExtractionError> {
    optional_int_list(node, field)?.ok_or_else(|| missing(node, field))
}

pub fn optional_int_list(node: &RawNode, field: &str) -> Result<Option<Vec<i64>>, ExtractionError> {
    match node.attrs.get(field) {
        None => Ok(None),
        Some(RawAttr::List(list)) => {
            if !list.f.is_empty() || !list.s.is_empty() {
                return Err(malformed(node, field, "expected a list of integers"));
            }
            Ok(Some(list.i.clone()))
        }
        Some(other) => Err(malformed(
            node,
            field,
            format!("expected a list, got {other:?}"),
        )),
    }
}

pub fn string(node: &RawNode, field: &str) -> Result<String, ExtractionError> {
    match node.attrs.get(field) {
        None => Err(missing(node, field)),
        Some(RawAttr::S(value)) => Ok(value.clone()),
        Some(other) => Err(malformed(
            node,
            field,
            format!("expected a string, got {other:?}"),
        )),
    }
}

pub fn optional_int(node: &RawNode, field: &str) -> Result<Option<i64>, ExtractionError> {
    match node.attrs.get(field) {
        None => Ok(None),
        Some(RawAttr::I(value)) => Ok(Some(*value)),
        Some(other) => Err(malformed(
            node,
            field,
            format!("expected an integer, got {other:?}"),
        )),
    }
}

pub fn optional_dtype(node: &RawNode, field: &str) -> Result<Option<DType>, ExtractionError> {
    match node.attrs.get(field) {
        None => Ok(None),
        Some(RawAttr::Type(code)) => DType::from_code(*code)
            .map(Some)
            .ok_or_else(|| malformed(node, field, format!("unknown data type code {code}"))),
        Some(other) => Err(malformed(
            node,
            field,
            format!("expected a data type, got {other:?}"),
        )),
    }
}

/// Decode a shape attribute. The outer `Option` is `None` when the field is
/// absent, the inner one when the rank is unknown.
pub fn optional_shape(node: &RawNode, field: &str) -> Result<Option<Option<Shape>>, ExtractionError> {
    match node.attrs.get(field) {
        None => Ok(None),
        Some(RawAttr::Shape(shape)) if shape.unknown_rank => Ok(Some(None)),
        Some(RawAttr::Shape(shape)) => {
            let dims = shape
                .dims
                .iter()
                .map(|&dim| match dim {
                    -1 => Ok(None),
                    d if d >= 0 => Ok(Some(d as usize)),
                    d => Err(malformed(node, field, format!("invalid dimension {d}"))),
                })
                .collect::<Result<Shape, _>>()?;
            Ok(Some(Some(dims)))
        }
        Some(other) => Err(malformed(
            node,
            field,
            format!("expected a shape, got {other:?}"),
        )),
    }
}

pub fn tensor(node: &RawNode, field: &str) -> Result<TensorValue, ExtractionError> {
    match node.attrs.get(field) {
        None => Err(missing(node, field)),
        Some(RawAttr::Tensor(raw)) => {
            tensor_value(raw).map_err(|reason| malformed(node, field, reason))
        }
        Some(other) => Err(malformed(
            node,
            field,
            format!("expected a tensor, got {other:?}"),
        )),
    }
}

/// Largest tensor a literal may expand to from an empty or single-value list.
pub const MAX_FILL_ELEMENTS: usize = 1 << 24;

/// Expand a value list to `count` elements: an empty list means default
/// values, a single value fills the tensor.
fn fill<T: Clone + Default>(values: &[T], count: usize) -> Result<Vec<T>, String> {
    match values.len() {
        n if n == count => Ok(values.to_vec()),
        0 | 1 if count > MAX_FILL_ELEMENTS => Err(format!(
            "filling {count} elements exceeds the limit of {MAX_FILL_ELEMENTS}"
        )),
        0 => Ok(vec![T::default(); count]),
        1 => Ok(vec![values[0].clone(); count]),
        n => Err(format!("{n} values for {count} elements")),
    }
}

/// Decode a tensor literal.
pub fn tensor_value(raw: &RawTensor) -> Result<TensorValue, String> {
    let shape = raw
        .shape
        .iter()
        .map(|&dim| usize::try_from(dim).map_err(|_| format!("invalid dimension {dim}")))
        .collect::<Result<Vec<usize>, _>>()?;
    let count = shape
        .iter()
        .try_fold(1usize, |count, &dim| count.checked_mul(dim))
        .ok_or_else(|| "element count overflows".to_string())?;

    let value = match DType::from_code(raw.dtype) {
        Some(DType::Float32) => TensorValue::from_f32s(&shape, fill(&raw.float_val, count)?),
        Some(DType::Int64) => TensorValue::from_i64s(&shape, fill(&raw.int_val, count)?),
        Some(DType::Int32) => {
            let values = raw
                .int_val
                .iter()
                .map(|&v| i32::try_from(v).map_err(|_| format!("{v} does not fit in int32")))
                .collect::<Result<Vec<i32>, _>>()?;
            TensorValue::from_i32s(&shape, fill(&values, count)?)
        }
        Some(DType::Bool) => TensorValue::from_bools(&shape, fill(&raw.bool_val, count)?),
        Some(DType::String) => TensorValue::from_strings(&shape, fill(&raw.string_val, count)?),
        Some(DType::Resource) | None => {
            return Err(format!("unsupported tensor data type code {}", raw.dtype));
        }
    };
    value.map_err(|err| err.to_string())
}
