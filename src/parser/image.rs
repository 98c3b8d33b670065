//! Raw program images.
//!
//! A program file is nothing but a sequence of 4-byte little-endian
//! instruction words. There is no header or magic number, so the only
//! checks possible at load time are that the file is non-empty and holds a
//! whole number of words.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::interpreter::decode::{decode_program, Program, WORD_SIZE};

/// A validated program image.
#[derive(Debug, Clone)]
pub struct ProgramImage {
    /// File the image was read from, if any.
    path: Option<PathBuf>,
    /// Raw instruction bytes.
    bytes: Vec<u8>,
}

impl ProgramImage {
    /// Load and validate a program file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("unable to open input file {}", path.display()))?;

        let mut image = Self::from_bytes(bytes)
            .with_context(|| format!("invalid program file {}", path.display()))?;
        image.path = Some(path.to_path_buf());

        log::info!("Loaded {} ({} instructions)", path.display(), image.instruction_count());
        Ok(image)
    }

    /// Validate an in-memory image
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            bail!("program is empty");
        }
        if bytes.len() % WORD_SIZE != 0 {
            bail!(
                "program size {} bytes is not a multiple of {}",
                bytes.len(),
                WORD_SIZE
            );
        }
        Ok(Self { path: None, bytes })
    }

    /// Source path, for images loaded from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the raw image data
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of instruction words
    pub fn instruction_count(&self) -> usize {
        self.bytes.len() / WORD_SIZE
    }

    /// Decode every word into a program
    pub fn decode(&self) -> Result<Program> {
        let program = decode_program(&self.bytes).context("failed to decode program image")?;
        Ok(program)
    }
}
