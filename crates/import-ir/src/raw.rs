//! Framework graph as handed to the importer
//!
//! A [`RawGraph`] is a list of framework nodes in the encoding of the training
//! framework: an operator name, named inputs and an opaque map of typed
//! attributes. These types derive `serde` traits so callers can load them from
//! whatever serialization they already use.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Framework graph: nodes plus their connectivity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
}

/// One framework node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Node identifier, unique in the graph.
    pub name: String,
    /// Framework operator name.
    pub op: String,
    /// Inputs as `producer`, `producer:port` or `^producer` (control dependency).
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub attrs: HashMap<String, RawAttr>,
}

impl RawNode {
    pub fn new(name: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            inputs: Vec::new(),
            attrs: HashMap::new(),
        }
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: RawAttr) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }
}

/// A framework attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawAttr {
    I(i64),
    F(f32),
    B(bool),
    S(String),
    /// Numeric data type code.
    Type(i32),
    Shape(RawShape),
    List(RawList),
    Tensor(RawTensor),
}

/// Homogeneous list attribute; exactly one of the fields is normally populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawList {
    #[serde(default)]
    pub i: Vec<i64>,
    #[serde(default)]
    pub f: Vec<f32>,
    #[serde(default)]
    pub s: Vec<String>,
}

impl RawList {
    pub fn ints(values: impl Into<Vec<i64>>) -> Self {
        Self {
            i: values.into(),
            ..Default::default()
        }
    }
}

/// Shape attribute; `-1` marks an unknown dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawShape {
    #[serde(default)]
    pub dims: Vec<i64>,
    #[serde(default)]
    pub unknown_rank: bool,
}

/// Tensor literal.
///
/// When the value list holds a single element and the shape has more, the
/// element fills the whole tensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTensor {
    /// Numeric data type code.
    pub dtype: i32,
    #[serde(default)]
    pub shape: Vec<i64>,
    #[serde(default)]
    pub int_val: Vec<i64>,
    #[serde(default)]
    pub float_val: Vec<f32>,
    #[serde(default)]
    pub bool_val: Vec<bool>,
    #[serde(default)]
    pub string_val: Vec<String>,
}

/// A data input of a framework node, parsed from its string encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRef<'a> {
    pub producer: &'a str,
    pub port: usize,
}

/// Parse `producer` / `producer:port`. Control dependencies (`^producer`)
/// yield `Ok(None)`.
pub fn parse_input(input: &str) -> Result<Option<InputRef<'_>>, String> {
    if input.starts_with('^') {
        return Ok(None);
    }
    match input.rsplit_once(':') {
        Some((producer, port)) => {
            let port = port
                .parse::<usize>()
                .map_err(|_| format!("invalid output port in `{input}`"))?;
            Ok(Some(InputRef { producer, port }))
        }
        None => Ok(Some(InputRef {
            producer: input,
            port: 0,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_forms() {
        assert_eq!(
            parse_input("conv"),
            Ok(Some(InputRef {
                producer: "conv",
                port: 0
            }))
        );
        assert_eq!(
            parse_input("ta:1"),
            Ok(Some(InputRef {
                producer: "ta",
                port: 1
            }))
        );
        assert_eq!(parse_input("^init"), Ok(None));
        assert!(parse_input("ta:x").is_err());
    }
}
