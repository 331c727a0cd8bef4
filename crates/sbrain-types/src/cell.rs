//! Cell and address types.
//!
//! Cells are signed 32-bit integers; all cell arithmetic in the machine
//! wraps at the 32-bit boundary. Addresses index either tape and never wrap.

use crate::FaultKind;
use serde_json::Value;

/// One integer slot on the data tape.
pub type Cell = i32;

/// Index into the data tape or the executable tape.
pub type Addr = usize;

/// Convert a host integer into a [`Cell`].
///
/// Fails with [`FaultKind::TypeMismatch`] for values outside the 32-bit
/// range. This is the untyped loading boundary: the engine itself only ever
/// handles [`Cell`] values and cannot produce this fault.
pub fn cell_from_i64(value: i64) -> Result<Cell, FaultKind> {
    Cell::try_from(value).map_err(|_| FaultKind::TypeMismatch)
}

/// Convert an untyped JSON value into a [`Cell`].
///
/// Only integer numbers in the 32-bit range are accepted. Floats, strings,
/// booleans, nulls, and containers fail with [`FaultKind::TypeMismatch`].
pub fn cell_from_json(value: &Value) -> Result<Cell, FaultKind> {
    value
        .as_i64()
        .ok_or(FaultKind::TypeMismatch)
        .and_then(cell_from_i64)
}
