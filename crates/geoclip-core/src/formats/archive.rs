//! Zip archive helpers for zipped shapefiles

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{GeoclipError, Result};

const FORMAT: &str = "Zip";

fn zip_error(context: &str, err: zip::result::ZipError) -> GeoclipError {
    GeoclipError::format(FORMAT, format!("{}: {}", context, err))
}

/// Extract every entry of `zip_path` below `dest`.
///
/// Entries whose names would escape `dest` are skipped. Returns the
/// extracted file paths.
pub fn extract_zip(zip_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| zip_error("Failed to open archive", e))?;

    fs::create_dir_all(dest)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| zip_error("Failed to read entry", e))?;

        let enclosed_name = match entry.enclosed_name() {
            Some(path) => path,
            None => {
                tracing::warn!("Skipping archive entry with unsafe path: {}", entry.name());
                continue;
            }
        };

        let out_path = dest.join(&enclosed_name);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&out_path)?;
            io::copy(&mut entry, &mut outfile)?;
            extracted.push(out_path);
        }
    }

    tracing::debug!("Extracted {} file(s) from {}", extracted.len(), zip_path.display());
    Ok(extracted)
}

/// Find the first file with `extension` below `dir`.
///
/// The walk is depth-first and top-down in sorted order: a directory's own
/// files are checked before any of its subdirectories are entered.
pub fn find_first_with_extension(dir: &Path, extension: &str) -> Result<PathBuf> {
    let mut dirs_to_visit = vec![dir.to_path_buf()];

    while let Some(current) = dirs_to_visit.pop() {
        let mut entries: Vec<PathBuf> =
            fs::read_dir(&current)?.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        entries.sort();

        let mut subdirs = Vec::new();
        for path in entries {
            if path.is_dir() {
                subdirs.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
            {
                return Ok(path);
            }
        }

        // Visit subdirectories in sorted order after the current level
        subdirs.reverse();
        dirs_to_visit.extend(subdirs);
    }

    Err(GeoclipError::not_found(
        format!(".{} file", extension),
        format!("no .{} file in {}", extension, dir.display()),
    ))
}

/// Write `files` into a new archive at `dest`, stored by file name.
pub fn write_zip(files: &[PathBuf], dest: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(dest)?);
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GeoclipError::format(FORMAT, format!("Invalid file name: {}", path.display())))?;

        zip.start_file(name, options).map_err(|e| zip_error("Failed to add entry", e))?;
        let mut input = File::open(path)?;
        io::copy(&mut input, &mut zip)?;
    }

    zip.finish().map_err(|e| zip_error("Failed to finish archive", e))?;
    Ok(())
}

/// Names of the entries stored in an archive, in archive order
pub fn list_entries(zip_path: &Path) -> Result<Vec<String>> {
    let archive = ZipArchive::new(File::open(zip_path)?)
        .map_err(|e| zip_error("Failed to open archive", e))?;
    Ok(archive.file_names().map(str::to_string).collect())
}
