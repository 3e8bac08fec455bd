//! Image file input/output
//!
//! Keeps file handling out of the removal pipeline. Handles are scoped to
//! each call, and output is staged in the destination directory and renamed
//! into place so a failed write never leaves a partial file behind.

use crate::error::{BgRemovalError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Read the whole input file
    ///
    /// ```rust,no_run
    /// use bgremove::services::ImageIOService;
    ///
    /// let bytes = ImageIOService::read_input("input.jpg")?;
    /// # Ok::<(), bgremove::BgRemovalError>(())
    /// ```
    ///
    /// # Errors
    /// - File missing or unreadable
    pub fn read_input<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path_ref = path.as_ref();
        let bytes = std::fs::read(path_ref)
            .map_err(|e| BgRemovalError::file_io_error("read input file", path_ref, &e))?;
        log::debug!("Read {} bytes from {}", bytes.len(), path_ref.display());
        Ok(bytes)
    }

    /// Create the output file's parent directory when it does not exist
    ///
    /// Returns the directory that was created, or `None` when nothing had to
    /// be created (no parent component, or it already exists).
    ///
    /// # Errors
    /// - Directory creation fails
    pub fn ensure_output_dir<P: AsRef<Path>>(output_path: P) -> Result<Option<PathBuf>> {
        let Some(parent) = output_path
            .as_ref()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        else {
            return Ok(None);
        };

        if parent.exists() {
            return Ok(None);
        }

        std::fs::create_dir_all(parent)
            .map_err(|e| BgRemovalError::file_io_error("create output directory", parent, &e))?;
        log::info!("Created output directory {}", parent.display());
        Ok(Some(parent.to_path_buf()))
    }

    /// Write bytes to the output path, replacing any existing file
    ///
    /// # Errors
    /// - Staging file cannot be created or written
    /// - Rename into place fails
    pub fn write_output<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
        let path_ref = path.as_ref();
        let staging_dir = path_ref
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut staged = NamedTempFile::new_in(staging_dir)
            .map_err(|e| BgRemovalError::file_io_error("create staging file in", staging_dir, &e))?;
        staged
            .write_all(bytes)
            .and_then(|()| staged.flush())
            .map_err(|e| BgRemovalError::file_io_error("write output file", path_ref, &e))?;
        staged
            .persist(path_ref)
            .map_err(|e| BgRemovalError::file_io_error("write output file", path_ref, &e.error))?;

        log::debug!("Wrote {} bytes to {}", bytes.len(), path_ref.display());
        Ok(())
    }
}
