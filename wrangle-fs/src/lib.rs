//! Capability-based file helpers shared by the data pipeline and the CLI.
//!
//! Every path is resolved against an ambient directory handle opened with
//! `cap-std`, so later operations stay inside that directory.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open an input file (OSM extract, CSV table or rules document) for reading.
pub fn open_input(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Whether `path` names an existing regular file.
///
/// A missing parent directory counts as a missing file.
pub fn input_exists(path: &Utf8Path) -> io::Result<bool> {
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let dir = match fs_utf8::Dir::open_ambient_dir(parent_or_cwd(path), ambient_authority()) {
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

/// Create `path` and any missing ancestors.
pub fn create_dir_all(path: &Utf8Path) -> io::Result<()> {
    let (root, relative) = anchor(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    root.create_dir_all(&relative)
}

/// Create the directory that will hold `path`, e.g. a database file.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    create_dir_all(parent_or_cwd(path))
}

/// A directory the pipeline writes its tables into.
#[derive(Debug)]
pub struct OutputDir {
    path: Utf8PathBuf,
    dir: fs_utf8::Dir,
}

impl OutputDir {
    /// Create `path` if needed and open it for writing.
    pub fn create(path: &Utf8Path) -> io::Result<Self> {
        create_dir_all(path)?;
        let dir = fs_utf8::Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self {
            path: path.to_owned(),
            dir,
        })
    }

    /// The directory path as given to [`OutputDir::create`].
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Full path of a file inside the directory.
    #[must_use]
    pub fn join(&self, name: &str) -> Utf8PathBuf {
        self.path.join(name)
    }

    /// Create or truncate `name` for writing.
    pub fn create_file(&self, name: &str) -> io::Result<fs_utf8::File> {
        self.dir.create(name)
    }
}

fn parent_or_cwd(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}

/// Split `path` into a handle on its filesystem root (`/`, or a drive or UNC
/// prefix on Windows) and the remainder relative to it.
fn anchor(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let absolute = Utf8PathBuf::from_path_buf(std::path::absolute(path)?)
        .map_err(|_| io::Error::other("non-UTF-8 path"))?;
    let mut components = absolute.components();
    let mut root = Utf8PathBuf::new();
    while let Some(component @ (Utf8Component::Prefix(_) | Utf8Component::RootDir)) =
        components.clone().next()
    {
        root.push(component);
        components.next();
    }
    let relative = components.as_path().to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(&root, ambient_authority())?;
    Ok((dir, relative))
}
