//! Padding modes and sliding-window arithmetic shared by windowed operators.

use derive_new::new;
use strum::{Display, EnumString};

use crate::error::ExtractionErrorKind;

/// Canonical automatic padding mode, stored in the `auto_pad` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PadMode {
    /// Output covers `ceil(in / stride)` windows, odd padding at the end.
    SameUpper,
    /// Output covers `ceil(in / stride)` windows, odd padding at the beginning.
    SameLower,
    /// No padding.
    Valid,
    /// Padding given by the `pads` attribute.
    Explicit,
}

/// Map a framework padding string onto the canonical mode.
pub fn canonicalize_padding(padding: &str) -> Result<PadMode, ExtractionErrorKind> {
    match padding {
        "SAME" | "SAME_UPPER" => Ok(PadMode::SameUpper),
        "SAME_LOWER" => Ok(PadMode::SameLower),
        "VALID" => Ok(PadMode::Valid),
        "EXPLICIT" => Ok(PadMode::Explicit),
        other => Err(ExtractionErrorKind::UnknownPadding(other.to_string())),
    }
}

/// Window geometry along one spatial dimension. All fields are at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct Window {
    pub size: usize,
    pub stride: usize,
    pub rate: usize,
}

impl Window {
    /// Extent of the dilated window, `None` when it does not fit in `usize`.
    pub fn effective_size(&self) -> Option<usize> {
        (self.size - 1).checked_mul(self.rate)?.checked_add(1)
    }
}

/// Number of window positions along a dimension of `input` elements, `None`
/// on arithmetic overflow.
///
/// `pads` is only read in [`PadMode::Explicit`].
pub fn output_dim(input: usize, window: Window, mode: PadMode, pads: [usize; 2]) -> Option<usize> {
    let eff = window.effective_size()?;
    let output = match mode {
        PadMode::SameUpper | PadMode::SameLower => input.div_ceil(window.stride),
        PadMode::Valid => input
            .checked_add(1)?
            .saturating_sub(eff)
            .div_ceil(window.stride),
        PadMode::Explicit => {
            let padded = input.checked_add(pads[0])?.checked_add(pads[1])?;
            if padded < eff {
                0
            } else {
                (padded - eff) / window.stride + 1
            }
        }
    };
    Some(output)
}

/// Begin and end padding implied by a `same_*` mode; zero for the others.
pub fn same_pads(input: usize, window: Window, mode: PadMode) -> Option<[usize; 2]> {
    let output = output_dim(input, window, mode, [0, 0])?;
    let total = match mode {
        PadMode::SameUpper | PadMode::SameLower if output > 0 => (output - 1)
            .checked_mul(window.stride)?
            .checked_add(window.effective_size()?)?
            .saturating_sub(input),
        _ => return Some([0, 0]),
    };
    let small = total / 2;
    Some(match mode {
        PadMode::SameLower => [total - small, small],
        _ => [small, total - small],
    })
}
