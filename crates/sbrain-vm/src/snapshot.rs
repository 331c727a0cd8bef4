//! Serializable machine-state snapshots.

use sbrain_types::{Addr, Cell, Fault};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    /// Tapes may be loaded; no instruction has run since the last load or
    /// reset.
    Ready,
    /// Execution has started and no terminal status has been reached.
    Running,
    /// The program terminated normally.
    Halted,
    /// A fatal condition stopped the program.
    Faulted(Fault),
}

impl MachineState {
    /// Returns `true` for `Halted` and `Faulted`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Halted | Self::Faulted(_))
    }
}

/// A complete copy of a machine's observable state.
///
/// Captured by [`Machine::snapshot`](crate::Machine::snapshot) at any point
/// for diagnostics or testing. Serializes to deterministic JSON: field order
/// is fixed and every value is an integer, a string tag, or a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Data tape contents.
    pub data_tape: Vec<Cell>,
    /// Data stack, bottom to top.
    pub data_stack: Vec<Cell>,
    /// Executable tape contents (raw opcodes).
    pub exec_tape: Vec<Cell>,
    /// Jump stack, bottom to top.
    pub jump_stack: Vec<Addr>,
    /// Remaining unconsumed input, in consumption order.
    pub input_tape: Vec<Cell>,
    /// Captured output so far.
    pub output: Vec<Cell>,
    /// Data pointer register.
    pub data_p: Addr,
    /// Instruction pointer register.
    pub inst_p: Addr,
    /// Scratch jump pointer register.
    pub jump_p: Addr,
    /// Auxiliary register.
    pub auxi_r: Cell,
    /// Lifecycle state at capture time.
    pub state: MachineState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbrain_types::FaultKind;

    fn sample() -> MachineSnapshot {
        MachineSnapshot {
            data_tape: vec![0, 5],
            data_stack: vec![7],
            exec_tape: vec![3, 3, 31],
            jump_stack: vec![4],
            input_tape: vec![1, 2],
            output: vec![9],
            data_p: 1,
            inst_p: 2,
            jump_p: 0,
            auxi_r: -3,
            state: MachineState::Running,
        }
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let snap = sample();
        let json = serde_json::to_string(&snap).unwrap();
        let back: MachineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_snapshot_serialization_is_deterministic() {
        let first = serde_json::to_string(&sample()).unwrap();
        for i in 0..100 {
            let json = serde_json::to_string(&sample()).unwrap();
            assert_eq!(first, json, "determinism failure at iteration {i}");
        }
    }

    #[test]
    fn test_faulted_state_serializes() {
        let mut snap = sample();
        snap.state = MachineState::Faulted(Fault::new(FaultKind::UnbalancedLoop, 4));
        let json = serde_json::to_string(&snap).unwrap();
        let back: MachineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state, snap.state);
    }

    #[test]
    fn test_terminal_states() {
        assert!(MachineState::Halted.is_terminal());
        assert!(MachineState::Faulted(Fault::new(FaultKind::TypeMismatch, 0)).is_terminal());
        assert!(!MachineState::Ready.is_terminal());
        assert!(!MachineState::Running.is_terminal());
    }
}
