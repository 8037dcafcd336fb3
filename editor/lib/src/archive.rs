use std::io::{Seek, Write};

use log::{debug, info};
use thiserror::Error;
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::tree::FileTree;

pub const DEFAULT_ARCHIVE_NAME: &str = "project.zip";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("nothing to archive")]
    Empty,
    #[error("cannot write archive: {0}")]
    Zip(#[from] ZipError),
    #[error("cannot write archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Write every file of `tree` into a zip archive at its full path.
pub fn write_archive<W: Write + Seek>(tree: &FileTree, writer: W) -> Result<W, ArchiveError> {
    if tree.is_empty() {
        return Err(ArchiveError::Empty);
    }

    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let files = tree.files();
    for node in &files {
        debug!("Adding {} to archive", node.path);
        zip.start_file(node.path.as_str(), options)?;
        zip.write_all(node.content().unwrap_or_default().as_bytes())?;
    }

    let writer = zip.finish()?;
    info!("Archived {} files", files.len());
    Ok(writer)
}
