//! Filesystem adapter consumed by the dispatcher.
//!
//! Handlers only talk to the [`Filesystem`] trait so the protocol logic stays
//! independent of how paths are actually stored. [`LocalFs`] maps every call
//! onto `std::fs`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Largest file `read_lines` loads into memory.
pub const MAX_READ_BYTES: u64 = 16 * 1024 * 1024;

pub trait Filesystem {
    /// Entry names of `dir`, sorted.
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Fails if `path` already exists.
    fn create_file(&self, path: &Path) -> io::Result<()>;
    fn create_dir(&self, path: &Path) -> io::Result<()>;
    /// Removes a file or an empty directory.
    fn delete(&self, path: &Path) -> io::Result<()>;
    /// Fails if `dst` already exists. A directory source yields an empty
    /// directory at `dst`; other non-regular sources are refused.
    fn copy(&self, src: &Path, dst: &Path) -> io::Result<()>;
    /// Regular files up to [`MAX_READ_BYTES`] only. Fifos and devices are
    /// refused without being opened, since opening them can block.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn copy(&self, src: &Path, dst: &Path) -> io::Result<()> {
        if self.exists(dst) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", dst.display()),
            ));
        }
        if src.is_dir() {
            return fs::create_dir(dst);
        }
        regular_file(src)?;
        fs::copy(src, dst).map(|_| ())
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let meta = regular_file(path)?;
        if meta.len() > MAX_READ_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is larger than {MAX_READ_BYTES} bytes", path.display()),
            ));
        }
        let bytes = fs::read(path)?;
        Ok(split_lines(&String::from_utf8_lossy(&bytes)))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

fn regular_file(path: &Path) -> io::Result<fs::Metadata> {
    let meta = fs::metadata(path)?;
    if !meta.file_type().is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }
    Ok(meta)
}

// LF, CR and CRLF all end a line; a trailing break does not open an empty one.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => lines.push(std::mem::take(&mut current)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;

    #[test]
    fn split_lines_handles_all_breaks() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn list_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        assert_eq!(LocalFs.list(dir.path()).unwrap(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn create_file_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        LocalFs.create_file(&path).unwrap();
        let err = LocalFs.create_file(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn copy_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::write(&src, b"new").unwrap();
        std::fs::write(&dst, b"old").unwrap();
        assert!(LocalFs.copy(&src, &dst).is_err());
        assert_eq!(std::fs::read(&dst).unwrap(), b"old");
    }

    #[test]
    fn copy_directory_creates_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("d");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("inner"), b"x").unwrap();
        let dst = dir.path().join("e");
        LocalFs.copy(&src, &dst).unwrap();
        assert!(dst.is_dir());
        assert!(LocalFs.list(&dst).unwrap().is_empty());
    }

    #[test]
    fn read_lines_refuses_directories_and_fifos() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = dir.path().join("pipe");
        mkfifo(pipe.as_path(), Mode::S_IRWXU).unwrap();
        for path in [dir.path().to_path_buf(), pipe] {
            let err = LocalFs.read_lines(&path).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{}", path.display());
        }
    }

    #[test]
    fn read_lines_refuses_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge");
        std::fs::File::create(&path).unwrap().set_len(MAX_READ_BYTES + 1).unwrap();
        let err = LocalFs.read_lines(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn copy_refuses_fifo_source() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = dir.path().join("pipe");
        mkfifo(pipe.as_path(), Mode::S_IRWXU).unwrap();
        let dst = dir.path().join("dst");
        assert_eq!(LocalFs.copy(&pipe, &dst).unwrap_err().kind(), io::ErrorKind::InvalidInput);
        assert!(!dst.exists());
    }

    #[test]
    fn delete_removes_files_and_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        let sub = dir.path().join("d");
        std::fs::write(&file, b"").unwrap();
        std::fs::create_dir(&sub).unwrap();
        LocalFs.delete(&file).unwrap();
        LocalFs.delete(&sub).unwrap();
        assert!(!LocalFs.exists(&file));
        assert!(!LocalFs.exists(&sub));
    }
}
