use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;

/// How the input path was classified. The multiplicity of the upload result
/// mirrors this, not the number of files found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    SingleFile,
    Directory,
    Archive,
}

/// A flattened upload input: the file list, its classification, and a label
/// for progress display. For archives the scratch extraction directory is
/// held here so it is removed on every exit path when the expansion drops.
pub struct Expansion {
    pub kind: InputKind,
    pub files: Vec<PathBuf>,
    pub label: Option<String>,
    _scratch: Option<TempDir>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
    // Bare .gz/.bz2/.xz without a .tar inner extension; recognized as
    // compressed but not extractable here.
    UnsupportedCompression,
}

/// Expand a path into the flat list of files to upload.
///
/// Directories are walked recursively (hidden files excluded); recognized
/// archives are extracted to a scratch directory first, with absolute and
/// parent-traversal entries silently skipped.
pub fn expand(path: &Path) -> Result<Expansion, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        let files = walk_files(path);
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        return Ok(Expansion {
            kind: InputKind::Directory,
            files,
            label,
            _scratch: None,
        });
    }

    match detect_archive(path) {
        Some(ArchiveKind::UnsupportedCompression) => {
            Err(Error::UnsupportedArchive(path.to_path_buf()))
        }
        Some(kind) => {
            let scratch = TempDir::new()?;
            debug!(
                "Archive detected: {} — extracting to {}",
                path.display(),
                scratch.path().display()
            );
            extract_archive(kind, path, scratch.path())?;
            let files = walk_files(scratch.path());
            let label = path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned());
            Ok(Expansion {
                kind: InputKind::Archive,
                files,
                label,
                _scratch: Some(scratch),
            })
        }
        None => Ok(Expansion {
            kind: InputKind::SingleFile,
            files: vec![path.to_path_buf()],
            label: None,
            _scratch: None,
        }),
    }
}

/// True if the extension is one the expander will extract.
pub fn is_supported_archive(path: &Path) -> bool {
    matches!(
        detect_archive(path),
        Some(kind) if kind != ArchiveKind::UnsupportedCompression
    )
}

fn detect_archive(path: &Path) -> Option<ArchiveKind> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();

    if name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Some(ArchiveKind::TarBz2)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        Some(ArchiveKind::TarXz)
    } else if name.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else if name.ends_with(".gz") || name.ends_with(".bz2") || name.ends_with(".xz") {
        Some(ArchiveKind::UnsupportedCompression)
    } else {
        None
    }
}

/// Recursively enumerate regular files, excluding hidden files (names
/// starting with '.'). Subdirectories are walked, never treated as archives.
fn walk_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("Error walking {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| e.into_path())
        .collect()
}

fn extract_archive(kind: ArchiveKind, archive: &Path, dest: &Path) -> Result<(), Error> {
    match kind {
        ArchiveKind::Zip => extract_zip(archive, dest),
        ArchiveKind::Tar => extract_tar(File::open(archive)?, dest),
        ArchiveKind::TarGz => extract_tar(flate2::read::GzDecoder::new(File::open(archive)?), dest),
        ArchiveKind::TarBz2 => {
            extract_tar(bzip2::read::BzDecoder::new(File::open(archive)?), dest)
        }
        ArchiveKind::TarXz => extract_tar(xz2::read::XzDecoder::new(File::open(archive)?), dest),
        ArchiveKind::UnsupportedCompression => {
            Err(Error::UnsupportedArchive(archive.to_path_buf()))
        }
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), Error> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        // enclosed_name rejects absolute paths and parent traversal
        let relative = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                warn!("Skipping unsafe zip entry: {}", entry.name());
                continue;
            }
        };

        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<(), Error> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();

        if entry_path.has_root()
            || entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            warn!("Skipping unsafe tar entry: {}", entry_path.display());
            continue;
        }

        // unpack_in re-validates that the target stays under dest
        entry.unpack_in(dest)?;
    }

    Ok(())
}
