//! Shared types for the SBrain virtual machine.
//!
//! This crate defines the cell and address types, the closed instruction
//! set enumeration, and the fault taxonomy shared by the execution engine
//! and its embedders.

mod cell;
mod error;
mod instruction;

pub use cell::{cell_from_i64, cell_from_json, Addr, Cell};
pub use error::{Fault, FaultKind};
pub use instruction::Instruction;

/// Result type used throughout the SBrain VM.
pub type VmResult<T> = std::result::Result<T, Fault>;
