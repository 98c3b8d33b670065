//! Machine state.
//!
//! | Component | Size | Purpose |
//! |-----------|------|---------|
//! | Register file | 17 × 32-bit | r0-r15 general purpose, r6 = SP, r16 = flags |
//! | Stack memory | 1024 bytes (default) | addressed by the raw SP value |
//!
//! # Example
//!
//! ```
//! use tiny86_emu::interpreter::state::ExecutionContext;
//!
//! let mut ctx = ExecutionContext::default();
//! ctx.registers.write(0, 42).unwrap();  // r0 = 42
//! ctx.push(7).unwrap();                 // SP: 1024 -> 1020
//! assert_eq!(ctx.sp(), 1020);
//! ```

mod context;
mod registers;
mod stack;

pub use context::ExecutionContext;
pub use registers::{RegisterFile, FLAGS_REG, NUM_REGS, SP_REG};
pub use stack::{MemoryPolicy, StackMemory, DEFAULT_STACK_SIZE};
