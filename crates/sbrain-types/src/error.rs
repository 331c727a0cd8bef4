//! Fault taxonomy for the SBrain VM.
//!
//! Every fault is fatal to the running program: the machine stops, records
//! the fault, and never attempts to recover mid-program. Out-of-range tape
//! and stack access is deliberately not a fault; auto-growth and forgiving
//! pop/read policies absorb it.

use crate::{Addr, Cell};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of fatal condition that stopped the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// A non-integer or out-of-range value was offered to a tape or stack.
    /// Only reachable through the untyped loading boundary.
    #[error("type mismatch: non-integer value offered to a tape or stack")]
    TypeMismatch,
    /// A loop-enter skip scanned past the end of the executable tape
    /// without finding the matching loop-exit.
    #[error("unbalanced loop: no matching loop-exit before end of tape")]
    UnbalancedLoop,
    /// The executable tape held a value outside the instruction set.
    #[error("invalid opcode: {code}")]
    InvalidOpcode {
        /// The raw tape value that failed to decode.
        code: Cell,
    },
}

/// A fatal condition plus the instruction pointer at fault time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} at instruction {at}")]
pub struct Fault {
    /// What went wrong.
    pub kind: FaultKind,
    /// Value of `inst_p` when the fault was raised.
    pub at: Addr,
}

impl Fault {
    /// Create a fault at the given instruction address.
    pub fn new(kind: FaultKind, at: Addr) -> Self {
        Self { kind, at }
    }
}
