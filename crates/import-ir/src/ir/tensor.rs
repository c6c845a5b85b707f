//! Tensor descriptors
//!
//! A [`TensorDesc`] is what a port carries: the element type, the shape (each
//! dimension independently known or unknown) and, when it is statically known,
//! the concrete value.

use core::fmt;
use std::fmt::Formatter;

use ndarray::{ArrayD, Axis, IxDyn, ShapeError};
use strum::{Display, EnumString};

/// A dimension size, `None` when unknown at conversion time.
pub type Dim = Option<usize>;

/// Ordered dimension sizes of a tensor of known rank.
pub type Shape = Vec<Dim>;

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DType {
    Float32,
    Int32,
    Int64,
    Bool,
    String,
    Resource,
}

impl DType {
    /// Decode the framework's numeric data type code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(DType::Float32),
            3 => Some(DType::Int32),
            7 => Some(DType::String),
            9 => Some(DType::Int64),
            10 => Some(DType::Bool),
            20 => Some(DType::Resource),
            _ => None,
        }
    }
}

/// A statically known tensor value.
#[derive(Clone, PartialEq)]
pub enum TensorValue {
    Float32(ArrayD<f32>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    Bool(ArrayD<bool>),
    /// Strings, also used for resource handles naming another node.
    String(ArrayD<String>),
}

/// Run `$body` with `$array` bound to the inner array, whatever its element type.
macro_rules! with_array {
    ($value:expr, |$array:ident| $body:expr) => {
        match $value {
            TensorValue::Float32($array) => $body,
            TensorValue::Int32($array) => $body,
            TensorValue::Int64($array) => $body,
            TensorValue::Bool($array) => $body,
            TensorValue::String($array) => $body,
        }
    };
}

/// Like [`with_array`], but wraps the result back into the same variant.
macro_rules! map_array {
    ($value:expr, |$array:ident| $body:expr) => {
        match $value {
            TensorValue::Float32($array) => TensorValue::Float32($body),
            TensorValue::Int32($array) => TensorValue::Int32($body),
            TensorValue::Int64($array) => TensorValue::Int64($body),
            TensorValue::Bool($array) => TensorValue::Bool($body),
            TensorValue::String($array) => TensorValue::String($body),
        }
    };
}

impl TensorValue {
    pub fn int64_scalar(value: i64) -> Self {
        TensorValue::Int64(ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn float32_scalar(value: f32) -> Self {
        TensorValue::Float32(ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn string_scalar(value: impl Into<String>) -> Self {
        TensorValue::String(ArrayD::from_elem(IxDyn(&[]), value.into()))
    }

    pub fn from_i64s(shape: &[usize], data: Vec<i64>) -> Result<Self, ShapeError> {
        Ok(TensorValue::Int64(ArrayD::from_shape_vec(IxDyn(shape), data)?))
    }

    pub fn from_i32s(shape: &[usize], data: Vec<i32>) -> Result<Self, ShapeError> {
        Ok(TensorValue::Int32(ArrayD::from_shape_vec(IxDyn(shape), data)?))
    }

    pub fn from_f32s(shape: &[usize], data: Vec<f32>) -> Result<Self, ShapeError> {
        Ok(TensorValue::Float32(ArrayD::from_shape_vec(IxDyn(shape), data)?))
    }

    pub fn from_bools(shape: &[usize], data: Vec<bool>) -> Result<Self, ShapeError> {
        Ok(TensorValue::Bool(ArrayD::from_shape_vec(IxDyn(shape), data)?))
    }

    pub fn from_strings(shape: &[usize], data: Vec<String>) -> Result<Self, ShapeError> {
        Ok(TensorValue::String(ArrayD::from_shape_vec(IxDyn(shape), data)?))
    }

    pub fn dtype(&self) -> DType {
        match self {
            TensorValue::Float32(_) => DType::Float32,
            TensorValue::Int32(_) => DType::Int32,
            TensorValue::Int64(_) => DType::Int64,
            TensorValue::Bool(_) => DType::Bool,
            TensorValue::String(_) => DType::String,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        with_array!(self, |array| array.shape().to_vec())
    }

    pub fn rank(&self) -> usize {
        with_array!(self, |array| array.ndim())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_array!(self, |array| array.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reverse the order of elements along `axis`.
    ///
    /// The caller guarantees `axis < self.rank()`.
    pub fn flip(&self, axis: usize) -> TensorValue {
        map_array!(self, |array| {
            let mut view = array.view();
            view.invert_axis(Axis(axis));
            view.as_standard_layout().into_owned()
        })
    }

    /// The single integer element, if this value holds exactly one integer.
    pub fn single_i64(&self) -> Option<i64> {
        if self.len() != 1 {
            return None;
        }
        match self {
            TensorValue::Int64(array) => array.iter().next().copied(),
            TensorValue::Int32(array) => array.iter().next().map(|v| *v as i64),
            _ => None,
        }
    }

    /// The single string element, if this value holds exactly one string.
    pub fn single_string(&self) -> Option<&str> {
        match self {
            TensorValue::String(array) if array.len() == 1 => {
                array.iter().next().map(String::as_str)
            }
            _ => None,
        }
    }
}

/// Truncate the vector display for debug display
fn trunc<'a, T: fmt::Debug + 'a>(values: impl Iterator<Item = &'a T>) -> String {
    const MAX_LEN: usize = 5;
    let mut s = String::new();
    s.push('[');
    for (i, item) in values.enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        if i > MAX_LEN {
            s.push_str("...");
            break;
        }
        s.push_str(&format!("{item:?}"));
    }
    s.push(']');
    s
}

/// Shorten the tensor data for debug display
impl fmt::Debug for TensorValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let shape = self.shape();
        match self {
            TensorValue::Float32(v) => write!(f, "Float32({shape:?}, {})", trunc(v.iter())),
            TensorValue::Int32(v) => write!(f, "Int32({shape:?}, {})", trunc(v.iter())),
            TensorValue::Int64(v) => write!(f, "Int64({shape:?}, {})", trunc(v.iter())),
            TensorValue::Bool(v) => write!(f, "Bool({shape:?}, {})", trunc(v.iter())),
            TensorValue::String(v) => write!(f, "String({shape:?}, {})", trunc(v.iter())),
        }
    }
}

/// Shape and (optionally) value information attached to a port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorDesc {
    pub dtype: Option<DType>,
    /// `None` when even the rank is unknown.
    pub shape: Option<Shape>,
    pub value: Option<TensorValue>,
}

impl TensorDesc {
    /// Descriptor of a statically known value; shape and type follow the value.
    pub fn from_value(value: TensorValue) -> Self {
        Self {
            dtype: Some(value.dtype()),
            shape: Some(value.shape().into_iter().map(Some).collect()),
            value: Some(value),
        }
    }

    pub fn from_shape(dtype: Option<DType>, shape: Shape) -> Self {
        Self {
            dtype,
            shape: Some(shape),
            value: None,
        }
    }

    pub fn from_static_shape(dtype: Option<DType>, shape: &[usize]) -> Self {
        Self::from_shape(dtype, shape.iter().copied().map(Some).collect())
    }

    pub fn unknown_rank(dtype: Option<DType>) -> Self {
        Self {
            dtype,
            shape: None,
            value: None,
        }
    }

    /// Rank-0 descriptor with unknown value.
    pub fn scalar(dtype: DType) -> Self {
        Self::from_shape(Some(dtype), Vec::new())
    }

    pub fn rank(&self) -> Option<usize> {
        self.shape.as_ref().map(Vec::len)
    }

    /// The shape when every dimension is known.
    pub fn static_shape(&self) -> Option<Vec<usize>> {
        self.shape.as_ref()?.iter().copied().collect()
    }
}

impl fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.shape {
            None => write!(f, "[..]")?,
            Some(shape) => {
                write!(f, "[")?;
                for (i, dim) in shape.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match dim {
                        Some(size) => write!(f, "{size}")?,
                        None => write!(f, "?")?,
                    }
                }
                write!(f, "]")?;
            }
        }
        if let Some(dtype) = self.dtype {
            write!(f, " {dtype}")?;
        }
        if self.value.is_some() {
            write!(f, " (const)")?;
        }
        Ok(())
    }
}
