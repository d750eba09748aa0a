use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::PathBuf;

/// Create a BufReader that reads from a file denoted by its PathBuf
pub fn open_read(pb: &PathBuf) -> Result<BufReader<File>> {
    let file = OpenOptions::new()
        .read(true)
        .open(pb)
        .with_context(|| format!("Failed to open file \"{}\" for reading", pb.display()))?;
    Ok(BufReader::new(file))
}
