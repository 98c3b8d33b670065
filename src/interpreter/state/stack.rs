//! Stack memory.
//!
//! A flat, zero-initialised byte buffer. Loads and stores are always 4 bytes
//! wide and little-endian, and their offset is the raw stack pointer value
//! (minus an instruction displacement), not an offset from a separate base.
//! The stack pointer therefore starts at the capacity and grows downward.

use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::interpreter::traits::ExecError;

/// Default stack size in bytes.
pub const DEFAULT_STACK_SIZE: usize = 1024;

/// Bytes moved by every stack access.
const ACCESS_SIZE: usize = 4;

/// How out-of-range stack accesses are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPolicy {
    /// Abort with [`ExecError::MemoryFault`].
    #[default]
    Strict,
    /// Loads read 0 and stores are dropped; each access is logged.
    Lenient,
}

impl FromStr for MemoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown memory policy {:?}", other)),
        }
    }
}

/// Bounds-checked stack memory.
#[derive(Clone)]
pub struct StackMemory {
    bytes: Vec<u8>,
    policy: MemoryPolicy,
}

impl Default for StackMemory {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_SIZE, MemoryPolicy::Strict)
    }
}

impl StackMemory {
    /// Create zeroed stack memory of `capacity` bytes.
    pub fn new(capacity: usize, policy: MemoryPolicy) -> Self {
        Self {
            bytes: vec![0; capacity],
            policy,
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Handling of out-of-range accesses.
    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    /// Raw contents (for debugging/display).
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte range of a 4-byte access, if it lies inside the buffer.
    fn range(&self, offset: i64) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(ACCESS_SIZE)?;
        (end <= self.bytes.len()).then_some(start..end)
    }

    fn fault(&self, offset: i64) -> ExecError {
        ExecError::MemoryFault {
            offset,
            capacity: self.bytes.len(),
        }
    }

    /// Load a 32-bit word from byte `offset`.
    pub fn load32(&self, offset: i64) -> Result<i32, ExecError> {
        match self.range(offset) {
            Some(range) => Ok(LittleEndian::read_i32(&self.bytes[range])),
            None => match self.policy {
                MemoryPolicy::Strict => Err(self.fault(offset)),
                MemoryPolicy::Lenient => {
                    log::warn!("stack load at offset {} out of range, reading 0", offset);
                    Ok(0)
                }
            },
        }
    }

    /// Store a 32-bit word at byte `offset`.
    pub fn store32(&mut self, offset: i64, value: i32) -> Result<(), ExecError> {
        match self.range(offset) {
            Some(range) => {
                LittleEndian::write_i32(&mut self.bytes[range], value);
                Ok(())
            }
            None => match self.policy {
                MemoryPolicy::Strict => Err(self.fault(offset)),
                MemoryPolicy::Lenient => {
                    log::warn!("stack store at offset {} out of range, dropped", offset);
                    Ok(())
                }
            },
        }
    }
}

impl fmt::Debug for StackMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.bytes.iter().filter(|b| **b != 0).count();
        write!(
            f,
            "StackMemory {{ capacity: {}, non_zero_bytes: {}, policy: {:?} }}",
            self.bytes.len(),
            used,
            self.policy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_initialised() {
        let mem = StackMemory::default();
        assert_eq!(mem.capacity(), 1024);
        assert_eq!(mem.load32(0).unwrap(), 0);
        assert_eq!(mem.load32(1020).unwrap(), 0);
    }

    #[test]
    fn test_store_load_roundtrip() {
        let mut mem = StackMemory::default();
        mem.store32(1020, -123_456).unwrap();
        mem.store32(0, i32::MAX).unwrap();
        assert_eq!(mem.load32(1020).unwrap(), -123_456);
        assert_eq!(mem.load32(0).unwrap(), i32::MAX);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut mem = StackMemory::new(8, MemoryPolicy::Strict);
        mem.store32(4, 0x1122_3344).unwrap();
        assert_eq!(&mem.as_slice()[4..8], &[0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_unaligned_access_in_bounds() {
        let mut mem = StackMemory::new(16, MemoryPolicy::Strict);
        mem.store32(3, 7).unwrap();
        assert_eq!(mem.load32(3).unwrap(), 7);
    }

    #[test]
    fn test_strict_faults() {
        let mut mem = StackMemory::default();
        assert!(matches!(
            mem.load32(1024),
            Err(ExecError::MemoryFault { offset: 1024, capacity: 1024 })
        ));
        // Straddles the end
        assert!(matches!(mem.load32(1021), Err(ExecError::MemoryFault { .. })));
        assert!(matches!(mem.store32(-4, 1), Err(ExecError::MemoryFault { offset: -4, .. })));
        assert!(matches!(mem.store32(i64::MAX, 1), Err(ExecError::MemoryFault { .. })));
    }

    #[test]
    fn test_lenient_reads_zero_and_drops_stores() {
        let mut mem = StackMemory::new(16, MemoryPolicy::Lenient);
        assert_eq!(mem.policy(), MemoryPolicy::Lenient);
        mem.store32(16, 99).unwrap();
        assert_eq!(mem.load32(16).unwrap(), 0);
        assert!(mem.as_slice().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse::<MemoryPolicy>().unwrap(), MemoryPolicy::Strict);
        assert_eq!(" Lenient ".parse::<MemoryPolicy>().unwrap(), MemoryPolicy::Lenient);
        assert!("sloppy".parse::<MemoryPolicy>().is_err());
    }
}
