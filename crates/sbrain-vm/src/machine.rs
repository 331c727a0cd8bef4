//! The SBrain execution engine.
//!
//! Owns one data tape, one data stack, one executable tape, one jump stack,
//! and the four control registers, and drives the fetch-decode-execute loop.
//! Loop boundaries are resolved at runtime: a forward scan finds the
//! matching loop-exit when a zero-entry loop is skipped, and the jump stack
//! records enter addresses so backward jumps never scan.

use crate::snapshot::{MachineSnapshot, MachineState};
use crate::stack::Stack;
use crate::tape::Tape;
use sbrain_types::{Addr, Cell, Fault, FaultKind, Instruction, VmResult};
use serde_json::Value;

/// Status reported by a single [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The instruction completed and the machine can keep running.
    Continue,
    /// The program terminated normally.
    Halted,
}

/// The outcome of a [`Machine::run`] or [`Machine::run_for`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Number of instructions executed before the terminal status. The
    /// halting instruction itself is not counted.
    pub cycles: u64,
    /// Whether the machine halted on its own. `false` means the cycle
    /// budget ran out first and the machine is still `Running`.
    pub halted: bool,
    /// Exit code (the auxiliary register at termination), if halted.
    pub exit_code: Option<Cell>,
}

/// The SBrain virtual machine.
///
/// Each machine exclusively owns its tapes, stacks, and registers; separate
/// machines share nothing and may run on separate threads with no
/// synchronization. Execution is synchronous and never yields: `step` and
/// `run` proceed to completion or fault, and any timeout policy is the
/// caller's, layered over repeated `step` or `run_for` calls.
pub struct Machine {
    /// Primary storage the program operates on.
    data_tape: Tape,
    /// Position-independent storage for cell values.
    data_stack: Stack<Cell>,
    /// Integer-encoded instructions. Fixed until the next load.
    exec_tape: Tape,
    /// Addresses of loop-enter instructions that are currently open.
    jump_stack: Stack<Addr>,
    /// Program input, consumed one value per input instruction.
    input_tape: Vec<Cell>,
    /// Cursor into the input tape.
    input_p: Addr,
    /// Captured program output.
    output: Vec<Cell>,

    // Control registers. Four distinct scalars, each starting at 0.
    data_p: Addr,
    inst_p: Addr,
    jump_p: Addr,
    auxi_r: Cell,

    state: MachineState,
}

impl Machine {
    /// Create a fresh machine: data tape `[0]`, empty stacks, empty
    /// executable and input tapes, all registers 0, state `Ready`.
    pub fn new() -> Self {
        Self {
            data_tape: Tape::new(&[0]),
            data_stack: Stack::new(),
            exec_tape: Tape::default(),
            jump_stack: Stack::new(),
            input_tape: Vec::new(),
            input_p: 0,
            output: Vec::new(),
            data_p: 0,
            inst_p: 0,
            jump_p: 0,
            auxi_r: 0,
            state: MachineState::Ready,
        }
    }

    /// Restore the fresh post-construction state, discarding all tapes,
    /// stacks, output, and registers.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ══════════════════════════════════════════════════════════════════════
    // Loading
    // ══════════════════════════════════════════════════════════════════════

    /// Load a data tape, replacing the old one and resetting `data_p`.
    /// Returns the machine to `Ready`.
    pub fn load_data_tape(&mut self, values: &[Cell]) {
        self.data_tape.load(values);
        self.data_p = 0;
        self.state = MachineState::Ready;
    }

    /// Load an executable tape, replacing the old one and resetting
    /// `inst_p`. The tape is fixed until the next load. Returns the machine
    /// to `Ready`.
    pub fn load_executable_tape(&mut self, program: &[Cell]) {
        self.exec_tape.load(program);
        self.inst_p = 0;
        self.state = MachineState::Ready;
    }

    /// Load an input tape. Input instructions consume it left to right and
    /// read 0 once it is exhausted.
    pub fn load_input_tape(&mut self, values: &[Cell]) {
        self.input_tape = values.to_vec();
        self.input_p = 0;
    }

    /// Load a data tape from untyped JSON values.
    ///
    /// Fails with [`FaultKind::TypeMismatch`] on any non-integer value; the
    /// previous tape and pointer are untouched on failure.
    pub fn load_data_tape_json(&mut self, values: &[Value]) -> Result<(), FaultKind> {
        self.data_tape.load_json(values)?;
        self.data_p = 0;
        self.state = MachineState::Ready;
        Ok(())
    }

    /// Load an executable tape from untyped JSON values.
    ///
    /// Integer range is checked here; whether each value is a valid opcode
    /// is still only checked at execution time.
    pub fn load_executable_tape_json(&mut self, values: &[Value]) -> Result<(), FaultKind> {
        self.exec_tape.load_json(values)?;
        self.inst_p = 0;
        self.state = MachineState::Ready;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Observation
    // ══════════════════════════════════════════════════════════════════════

    /// Current lifecycle state.
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Captured output so far.
    pub fn output(&self) -> &[Cell] {
        &self.output
    }

    /// Lossy character view of the output tape. Values that are not valid
    /// Unicode scalars are dropped.
    pub fn output_string(&self) -> String {
        self.output
            .iter()
            .filter_map(|&c| u32::try_from(c).ok().and_then(char::from_u32))
            .collect()
    }

    /// Capture the complete machine state for diagnostics or testing.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            data_tape: self.data_tape.cells().to_vec(),
            data_stack: self.data_stack.values().to_vec(),
            exec_tape: self.exec_tape.cells().to_vec(),
            jump_stack: self.jump_stack.values().to_vec(),
            input_tape: self.input_tape[self.input_p.min(self.input_tape.len())..].to_vec(),
            output: self.output.clone(),
            data_p: self.data_p,
            inst_p: self.inst_p,
            jump_p: self.jump_p,
            auxi_r: self.auxi_r,
            state: self.state,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Execution
    // ══════════════════════════════════════════════════════════════════════

    /// Execute one instruction.
    ///
    /// Decodes the instruction at `inst_p`, dispatches it, and advances
    /// `inst_p` by one unless the instruction redirected it (loop-enter
    /// skip, loop-exit re-entry). `inst_p` reaching the end of the
    /// executable tape is normal termination, unless a loop is still open,
    /// which means an unmatched loop-enter was executed. Terminal statuses
    /// are sticky: stepping a halted machine reports `Halted` again, and
    /// stepping a faulted machine returns the same fault without executing
    /// anything.
    pub fn step(&mut self) -> VmResult<StepStatus> {
        match self.state {
            MachineState::Halted => return Ok(StepStatus::Halted),
            MachineState::Faulted(fault) => return Err(fault),
            MachineState::Ready | MachineState::Running => {}
        }

        if self.inst_p >= self.exec_tape.len() {
            if !self.jump_stack.is_empty() {
                return Err(self.fault(FaultKind::UnbalancedLoop));
            }
            return Ok(self.halt());
        }
        self.state = MachineState::Running;

        let code = self.exec_tape.read(self.inst_p);
        let Some(inst) = Instruction::from_code(code) else {
            return Err(self.fault(FaultKind::InvalidOpcode { code }));
        };

        let mut next = self.inst_p + 1;
        match inst {
            Instruction::MoveLeft => self.data_p = self.data_p.saturating_sub(1),
            Instruction::MoveRight => {
                self.data_p += 1;
                self.data_tape.ensure(self.data_p);
            }
            Instruction::Decrement => self.write_cell(self.cell().wrapping_sub(1)),
            Instruction::Increment => self.write_cell(self.cell().wrapping_add(1)),

            Instruction::LoopEnter => {
                if self.cell() == 0 {
                    next = self.skip_loop()?;
                } else {
                    self.jump_stack.push(self.inst_p);
                }
            }
            Instruction::LoopExit => {
                // Stray loop-exit with nothing open is a no-op.
                if !self.jump_stack.is_empty() {
                    self.jump_p = self.jump_stack.pop();
                    if self.cell() != 0 {
                        // Re-enter: the loop-enter re-executes and pushes
                        // again, so depth stays equal to nesting depth.
                        next = self.jump_p;
                    }
                }
            }

            Instruction::Output => self.output.push(self.cell()),
            Instruction::Input => {
                let value = self.read_input();
                self.write_cell(value);
            }

            Instruction::Push => self.data_stack.push(self.cell()),
            Instruction::Pop => {
                let value = self.data_stack.pop();
                self.write_cell(value);
            }

            Instruction::LoadAux => self.auxi_r = self.cell(),
            Instruction::StoreAux => self.write_cell(self.auxi_r),
            Instruction::ZeroAux => self.auxi_r = 0,
            Instruction::NotAux => self.auxi_r = !self.auxi_r,
            // Shifts are logical on the bit pattern: zero fill, no sign
            // extension.
            Instruction::ShiftLeft => self.auxi_r = ((self.auxi_r as u32) << 1) as Cell,
            Instruction::ShiftRight => self.auxi_r = ((self.auxi_r as u32) >> 1) as Cell,

            Instruction::Or => self.write_cell(self.cell() | self.auxi_r),
            Instruction::And => self.write_cell(self.cell() & self.auxi_r),
            Instruction::Xor => self.write_cell(self.cell() ^ self.auxi_r),
            Instruction::Nor => self.write_cell(!(self.cell() | self.auxi_r)),
            Instruction::Nand => self.write_cell(!(self.cell() & self.auxi_r)),
            Instruction::Add => self.write_cell(self.cell().wrapping_add(self.auxi_r)),
            Instruction::Subtract => self.write_cell(self.cell().wrapping_sub(self.auxi_r)),
            Instruction::Quotient => {
                let divisor = self.auxi_r;
                let value = if divisor == 0 {
                    0
                } else {
                    self.cell().wrapping_div(divisor)
                };
                self.write_cell(value);
            }
            Instruction::Modulo => {
                let divisor = self.auxi_r;
                let value = if divisor == 0 {
                    0
                } else {
                    self.cell().wrapping_rem(divisor)
                };
                self.write_cell(value);
            }
            Instruction::Product => self.write_cell(self.cell().wrapping_mul(self.auxi_r)),

            Instruction::Halt => return Ok(self.halt()),
        }

        self.inst_p = next;
        Ok(StepStatus::Continue)
    }

    /// Run until the program halts or faults.
    pub fn run(&mut self) -> VmResult<RunOutcome> {
        self.run_inner(None)
    }

    /// Run for at most `max_cycles` instructions.
    ///
    /// This is the caller-side instruction budget layered over [`step`]:
    /// the machine itself never times out. An exhausted budget leaves the
    /// machine `Running`, and a later `run`, `run_for`, or `step` call
    /// picks up exactly where it stopped.
    ///
    /// [`step`]: Machine::step
    pub fn run_for(&mut self, max_cycles: u64) -> VmResult<RunOutcome> {
        self.run_inner(Some(max_cycles))
    }

    fn run_inner(&mut self, limit: Option<u64>) -> VmResult<RunOutcome> {
        let mut cycles = 0u64;
        loop {
            if let Some(limit) = limit {
                if cycles >= limit {
                    return Ok(RunOutcome {
                        cycles,
                        halted: false,
                        exit_code: None,
                    });
                }
            }
            match self.step()? {
                StepStatus::Continue => cycles += 1,
                StepStatus::Halted => {
                    return Ok(RunOutcome {
                        cycles,
                        halted: true,
                        exit_code: Some(self.auxi_r),
                    });
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Internals
    // ══════════════════════════════════════════════════════════════════════

    /// Resolve a zero-entry loop at runtime: scan forward from the
    /// instruction after the loop-enter at `inst_p`, tracking nesting
    /// depth with `jump_p` as the cursor, and return the address one past
    /// the matching loop-exit.
    ///
    /// Only raw codes are compared; a skipped body is never decoded, so an
    /// invalid code inside it does not fault. The scan running off the
    /// tape end is an `UnbalancedLoop` fault.
    fn skip_loop(&mut self) -> VmResult<Addr> {
        let enter = Instruction::LoopEnter.code();
        let exit = Instruction::LoopExit.code();
        let mut depth = 1usize;
        self.jump_p = self.inst_p + 1;
        while self.jump_p < self.exec_tape.len() {
            let code = self.exec_tape.read(self.jump_p);
            if code == enter {
                depth += 1;
            } else if code == exit {
                depth -= 1;
                if depth == 0 {
                    return Ok(self.jump_p + 1);
                }
            }
            self.jump_p += 1;
        }
        Err(self.fault(FaultKind::UnbalancedLoop))
    }

    fn cell(&self) -> Cell {
        self.data_tape.read(self.data_p)
    }

    fn write_cell(&mut self, value: Cell) {
        self.data_tape.write(self.data_p, value);
    }

    fn read_input(&mut self) -> Cell {
        let value = self.input_tape.get(self.input_p).copied().unwrap_or(0);
        if self.input_p < self.input_tape.len() {
            self.input_p += 1;
        }
        value
    }

    fn fault(&mut self, kind: FaultKind) -> Fault {
        let fault = Fault::new(kind, self.inst_p);
        self.state = MachineState::Faulted(fault);
        fault
    }

    fn halt(&mut self) -> StepStatus {
        self.state = MachineState::Halted;
        StepStatus::Halted
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
