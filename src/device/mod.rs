//! I/O devices attached to the machine.
//!
//! The only device is the console used by the print and read opcodes.
//! [`StreamConsole`] drives it from any buffered reader and writer, such as
//! the process's stdin/stdout or in-memory buffers in tests.

pub mod console;

pub use console::StreamConsole;
