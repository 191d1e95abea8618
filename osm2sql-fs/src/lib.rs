//! Capability-based filesystem helpers for conversion inputs and outputs.
//!
//! Output backends never touch `std::fs` paths directly: they resolve an
//! ambient [`fs_utf8::Dir`] for the target directory and create files
//! relative to it.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::{fs, io, path::Component};

/// Create `path` and every missing ancestor.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    if path.as_str().is_empty() || path == Utf8Path::new("/") {
        return Ok(());
    }
    let (base, relative) = split_ambient(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// Create the directory that will contain `path`.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Create `path` if needed and open it as a capability directory.
pub fn open_output_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    ensure_dir(path)?;
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority())
}

/// Open an existing file for reading.
pub fn open_file(path: &Utf8Path) -> io::Result<fs::File> {
    fs_utf8::File::open_ambient(path, ambient_authority()).map(fs_utf8::File::into_std)
}

/// Create (or truncate) `name` inside `dir`.
pub fn create_file(dir: &fs_utf8::Dir, name: &str) -> io::Result<fs::File> {
    dir.create(name).map(fs_utf8::File::into_std)
}

/// Report whether `path` names an existing regular file.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let dir = match fs_utf8::Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Split a path into an ambient root directory and the remainder below it.
///
/// cap-std only opens paths relative to an existing directory, so absolute
/// paths are anchored at the filesystem root (or drive prefix) and relative
/// paths at the working directory.
pub fn split_ambient(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let (base, relative) = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = path
                .strip_prefix(&base)
                .or_else(|_| path.strip_prefix(prefix))
                .map_err(|_| io::Error::other(format!("cannot anchor {path} at {base}")))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = path
                .strip_prefix(&base)
                .map_err(|_| io::Error::other(format!("cannot anchor {path} at the root")))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), path.to_path_buf()),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((dir, relative))
}
