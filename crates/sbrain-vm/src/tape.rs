//! Growable integer tape with a forgiving boundary policy.

use sbrain_types::{cell_from_i64, cell_from_json, Addr, Cell, FaultKind};
use serde_json::Value;

/// Indexed integer storage that grows on demand.
///
/// Reads at or past the end return 0; writes past the end grow the tape with
/// zero fill up to and including the target index. The tape never shrinks.
/// Both the data tape and the executable tape are instances of this type;
/// the cursors (`data_p`, `inst_p`) live in the machine's registers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<Cell>,
}

impl Tape {
    /// Create a tape with the given initial contents.
    pub fn new(values: &[Cell]) -> Self {
        Self {
            cells: values.to_vec(),
        }
    }

    /// Replace the tape contents wholesale.
    pub fn load(&mut self, values: &[Cell]) {
        self.cells.clear();
        self.cells.extend_from_slice(values);
    }

    /// Replace the contents from untyped JSON values.
    ///
    /// Fails with [`FaultKind::TypeMismatch`] on any non-integer value and
    /// leaves the existing contents untouched on failure.
    pub fn load_json(&mut self, values: &[Value]) -> Result<(), FaultKind> {
        let cells = values
            .iter()
            .map(cell_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        self.cells = cells;
        Ok(())
    }

    /// Read the cell at `index`, or 0 at or beyond the current length.
    pub fn read(&self, index: Addr) -> Cell {
        self.cells.get(index).copied().unwrap_or(0)
    }

    /// Write `value` at `index`, growing the tape if the index is past the
    /// end.
    pub fn write(&mut self, index: Addr, value: Cell) {
        self.ensure(index);
        self.cells[index] = value;
    }

    /// Write a host integer at `index`, rejecting values outside the cell
    /// range. The tape is unmodified on failure.
    pub fn write_checked(&mut self, index: Addr, value: i64) -> Result<(), FaultKind> {
        let cell = cell_from_i64(value)?;
        self.write(index, cell);
        Ok(())
    }

    /// Grow the tape with zero fill so `index` is addressable.
    pub fn ensure(&mut self, index: Addr) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, 0);
        }
    }

    /// Current number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the tape holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cells as a slice, for snapshots and diagnostics.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_past_end_is_zero() {
        let tape = Tape::new(&[1, 2, 3]);
        assert_eq!(tape.read(2), 3);
        assert_eq!(tape.read(3), 0);
        assert_eq!(tape.read(1000), 0);
    }

    #[test]
    fn test_write_grows_with_zero_fill() {
        let mut tape = Tape::new(&[7]);
        tape.write(4, 9);
        assert_eq!(tape.cells(), &[7, 0, 0, 0, 9]);
    }

    #[test]
    fn test_load_replaces_contents() {
        let mut tape = Tape::new(&[1, 2, 3]);
        tape.load(&[4, 5]);
        assert_eq!(tape.cells(), &[4, 5]);
    }

    #[test]
    fn test_ensure_never_shrinks() {
        let mut tape = Tape::new(&[1, 2, 3]);
        tape.ensure(1);
        assert_eq!(tape.len(), 3);
        tape.ensure(5);
        assert_eq!(tape.len(), 6);
    }

    #[test]
    fn test_load_json_accepts_integers() {
        let mut tape = Tape::default();
        tape.load_json(&[json!(1), json!(-2), json!(3)]).unwrap();
        assert_eq!(tape.cells(), &[1, -2, 3]);
    }

    #[test]
    fn test_load_json_failure_leaves_tape_untouched() {
        let mut tape = Tape::new(&[9, 9]);
        let err = tape.load_json(&[json!(1), json!("two")]).unwrap_err();
        assert_eq!(err, FaultKind::TypeMismatch);
        assert_eq!(tape.cells(), &[9, 9]);
    }

    #[test]
    fn test_write_checked_rejects_out_of_range() {
        let mut tape = Tape::new(&[1]);
        let err = tape.write_checked(0, i64::MAX).unwrap_err();
        assert_eq!(err, FaultKind::TypeMismatch);
        assert_eq!(tape.cells(), &[1]);
        tape.write_checked(0, -5).unwrap();
        assert_eq!(tape.cells(), &[-5]);
    }
}
