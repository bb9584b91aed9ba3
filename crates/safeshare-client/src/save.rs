//! Local save of decrypted files
//!
//! Bytes are written to a temporary file inside the destination directory and
//! only renamed into place once fully written. Every exit path, success or
//! failure, leaves no temporary file behind; an existing file is never
//! replaced.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use safeshare_crypto::DecryptedFile;
use tempfile::NamedTempFile;
use tracing::debug;

/// Used when a name has no usable final component.
pub const FALLBACK_NAME: &str = "download";

/// Give up after this many names are taken; the last error is returned.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Write `file` into `dir` under its sanitized name and return the final path.
pub fn save_decrypted(file: &DecryptedFile, dir: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let name = sanitize_file_name(&file.name);
    let tmp = write_temp(dir, &file.bytes)?;
    let target = persist_first_free(tmp, candidate_paths(dir, &name).take(MAX_NAME_ATTEMPTS))?;
    debug!(path = %target.display(), bytes = file.bytes.len(), "saved decrypted file");
    Ok(target)
}

/// Reduce a name to a safe final path component.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    match cleaned {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        _ => cleaned.to_string(),
    }
}

/// `name`, then `stem (1).ext`, `stem (2).ext`, ...
fn candidate_paths<'a>(dir: &'a Path, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    let as_path = Path::new(name);
    let stem = as_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let ext = as_path.extension().and_then(|s| s.to_str());

    std::iter::once(dir.join(name)).chain((1u32..).map(move |n| match ext {
        Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
        None => dir.join(format!("{stem} ({n})")),
    }))
}

// NamedTempFile removes itself on drop, so early returns clean up
fn write_temp(dir: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".safeshare-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Rename `tmp` onto the first candidate that does not exist at rename time.
///
/// The existence check is the no-clobber rename itself, so a file created by
/// another writer between attempts moves us on to the next name.
fn persist_first_free(
    mut tmp: NamedTempFile,
    candidates: impl IntoIterator<Item = PathBuf>,
) -> io::Result<PathBuf> {
    let mut last_err = io::Error::new(io::ErrorKind::AlreadyExists, "no free file name");
    for target in candidates {
        match tmp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                last_err = e.error;
                tmp = e.file;
            }
            Err(e) => return Err(e.error),
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn decrypted(name: &str, bytes: &[u8]) -> DecryptedFile {
        DecryptedFile {
            name: name.to_string(),
            media_type: "text/plain".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_save_writes_exact_bytes() {
        let dir = TempDir::new().unwrap();
        let path = save_decrypted(&decrypted("report.txt", b"hello world"), dir.path()).unwrap();

        assert_eq!(path, dir.path().join("report.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
        assert_eq!(entries(dir.path()), vec!["report.txt"]);
    }

    #[test]
    fn test_save_never_overwrites() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("report.txt"), b"original").unwrap();

        let first = save_decrypted(&decrypted("report.txt", b"one"), dir.path()).unwrap();
        let second = save_decrypted(&decrypted("report.txt", b"two"), dir.path()).unwrap();

        assert_eq!(first, dir.path().join("report (1).txt"));
        assert_eq!(second, dir.path().join("report (2).txt"));
        assert_eq!(std::fs::read(dir.path().join("report.txt")).unwrap(), b"original");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[test]
    fn test_save_suffix_without_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README"), b"x").unwrap();
        let path = save_decrypted(&decrypted("README", b"y"), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("README (1)"));
    }

    #[test]
    fn test_save_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = save_decrypted(&decrypted("empty.bin", b""), dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = save_decrypted(&decrypted("x.txt", b"x"), &nested).unwrap();
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn test_save_stays_inside_directory() {
        let dir = TempDir::new().unwrap();
        let path = save_decrypted(&decrypted("../../etc/passwd", b"x"), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("passwd"));
    }

    #[test]
    fn test_failed_persist_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing-subdir").join("out.txt");

        let tmp = write_temp(dir.path(), b"secret plaintext").unwrap();
        let result = persist_first_free(tmp, [target]);
        assert!(result.is_err());
        assert!(entries(dir.path()).is_empty(), "{:?}", entries(dir.path()));
    }

    #[test]
    fn test_persist_skips_names_taken_after_selection() {
        let dir = TempDir::new().unwrap();
        let candidates: Vec<PathBuf> = candidate_paths(dir.path(), "report.txt").take(3).collect();
        // another writer claims the first two names after candidates were chosen
        std::fs::write(&candidates[0], b"theirs").unwrap();
        std::fs::write(&candidates[1], b"theirs too").unwrap();

        let tmp = write_temp(dir.path(), b"ours").unwrap();
        let path = persist_first_free(tmp, candidates.clone()).unwrap();

        assert_eq!(path, dir.path().join("report (2).txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ours");
        assert_eq!(std::fs::read(&candidates[0]).unwrap(), b"theirs");
        assert_eq!(std::fs::read(&candidates[1]).unwrap(), b"theirs too");
        assert_eq!(entries(dir.path()).len(), 3);
    }

    #[test]
    fn test_persist_all_names_taken_cleans_up() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("taken.txt");
        std::fs::write(&target, b"theirs").unwrap();

        let tmp = write_temp(dir.path(), b"ours").unwrap();
        let err = persist_first_free(tmp, [target]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(entries(dir.path()), vec!["taken.txt"]);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("dir/sub/report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name(r"C:\Users\me\report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("  spaced name.txt  "), "spaced name.txt");
        assert_eq!(sanitize_file_name("bad\u{0}\nname"), "badname");
        assert_eq!(sanitize_file_name(""), FALLBACK_NAME);
        assert_eq!(sanitize_file_name("."), FALLBACK_NAME);
        assert_eq!(sanitize_file_name(".."), FALLBACK_NAME);
        assert_eq!(sanitize_file_name("dir/"), FALLBACK_NAME);
    }
}
