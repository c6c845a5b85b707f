//! Canonical operators.
//!
//! Each submodule implements one operator kind, providing:
//! - the extractor translating its framework encoding, when it has one
//! - the `NodeProcessor` declaring its arity and inference routine

#[cfg(test)]
pub mod test_utils;

pub mod padding;

pub mod constant;
pub mod extract_image_patches;
pub mod identity;
pub mod parameter;
pub mod reverse;
pub mod tensor_array;
pub mod tensor_array_size;
pub mod unsupported;
