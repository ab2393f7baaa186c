use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Returns `true` if stderr is a terminal (interactive).
pub fn stderr_is_tty() -> bool {
    io::stderr().is_terminal()
}

pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    Ok(BufReader::new(file))
}

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory: {}", path.display()))
}

/// An output file opened for writing, remembering where it lives.
pub struct OutputFile {
    pub path: PathBuf,
    pub writer: BufWriter<File>,
}

pub fn create_output(dir: &Path, name: &str) -> Result<OutputFile> {
    let path = dir.join(name);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(OutputFile {
        path,
        writer: BufWriter::new(file),
    })
}
