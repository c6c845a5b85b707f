//! Canonical attribute values
//!
//! This module contains the AttributeValue enum which represents the typed
//! attributes attached to canonical nodes once a framework node has been
//! extracted.

use std::collections::HashMap;

use super::tensor::{Shape, TensorValue};
use crate::processor::ProcessError;

/// The type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Float32(f32),
    Float32s(Vec<f32>),
    Int64(i64),
    Int64s(Vec<i64>),
    String(String),
    Strings(Vec<String>),
    Tensor(TensorValue),
    Shape(Option<Shape>),
}

pub type Attributes = HashMap<String, AttributeValue>;

impl AttributeValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Float32(_) => "Float32",
            AttributeValue::Float32s(_) => "Float32s",
            AttributeValue::Int64(_) => "Int64",
            AttributeValue::Int64s(_) => "Int64s",
            AttributeValue::String(_) => "String",
            AttributeValue::Strings(_) => "Strings",
            AttributeValue::Tensor(_) => "Tensor",
            AttributeValue::Shape(_) => "Shape",
        }
    }

    fn mismatch(&self, expected: &str) -> ProcessError {
        ProcessError::TypeMismatch {
            expected: expected.to_string(),
            actual: self.kind().to_string(),
        }
    }

    pub fn into_f32(self) -> Result<f32, ProcessError> {
        match self {
            AttributeValue::Float32(elem) => Ok(elem),
            other => Err(other.mismatch("Float32")),
        }
    }

    pub fn into_i64(self) -> Result<i64, ProcessError> {
        match self {
            AttributeValue::Int64(elem) => Ok(elem),
            other => Err(other.mismatch("Int64")),
        }
    }

    pub fn into_i64s(self) -> Result<Vec<i64>, ProcessError> {
        match self {
            AttributeValue::Int64s(elem) => Ok(elem),
            other => Err(other.mismatch("Int64s")),
        }
    }

    pub fn into_string(self) -> Result<String, ProcessError> {
        match self {
            AttributeValue::String(elem) => Ok(elem),
            other => Err(other.mismatch("String")),
        }
    }

    pub fn into_tensor(self) -> Result<TensorValue, ProcessError> {
        match self {
            AttributeValue::Tensor(elem) => Ok(elem),
            other => Err(other.mismatch("Tensor")),
        }
    }

    pub fn into_shape(self) -> Result<Option<Shape>, ProcessError> {
        match self {
            AttributeValue::Shape(elem) => Ok(elem),
            other => Err(other.mismatch("Shape")),
        }
    }
}
