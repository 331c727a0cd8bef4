//! The SBrain execution engine.
//!
//! SBrain is a Brainfuck-family language extended with a data stack, an
//! auxiliary register, and single-instruction arithmetic. This crate
//! implements the virtual machine: tape and stack primitives, the
//! fetch-decode-execute loop, and runtime loop matching. Transliteration
//! from source text to the integer-encoded executable tape is an external
//! collaborator's job; the machine only ever sees integer tapes.

mod machine;
mod snapshot;
mod stack;
mod tape;

pub use machine::{Machine, RunOutcome, StepStatus};
pub use snapshot::{MachineSnapshot, MachineState};
pub use stack::Stack;
pub use tape::Tape;

pub use sbrain_types::{Addr, Cell, Fault, FaultKind, Instruction, VmResult};

/// The result of a one-shot [`run_tape`] evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Captured program output.
    pub output: Vec<Cell>,
    /// Cycles, halt status, and exit code.
    pub outcome: RunOutcome,
    /// Final machine state, for diagnostics.
    pub snapshot: MachineSnapshot,
}

/// Run a program on a fresh machine.
///
/// Loads the executable, data, and input tapes, runs for at most `limit`
/// cycles (unbounded if `None`), and returns the captured output together
/// with the outcome and a final snapshot. On a fault the machine is
/// discarded with the error; callers that need to inspect a faulted
/// machine should drive a [`Machine`] directly.
pub fn run_tape(
    program: &[Cell],
    data: &[Cell],
    input: &[Cell],
    limit: Option<u64>,
) -> VmResult<Evaluation> {
    let mut machine = Machine::new();
    machine.load_executable_tape(program);
    machine.load_data_tape(data);
    machine.load_input_tape(input);
    let outcome = match limit {
        Some(max_cycles) => machine.run_for(max_cycles)?,
        None => machine.run()?,
    };
    Ok(Evaluation {
        output: machine.output().to_vec(),
        outcome,
        snapshot: machine.snapshot(),
    })
}
