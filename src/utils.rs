use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Create an OSC8 file:// hyperlink for terminal output
pub fn osc8_file_link(path: &str, text: &str) -> String {
    let abs_path = fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string());
    format!("\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\", abs_path, text)
}

/// `report.html` -> `report.20250701-093000-123.bak.html`, next to the original
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}.{}.bak.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}.{}.bak", stem, stamp),
    };
    path.with_file_name(name)
}

/// Copy `path` to a fresh backup named with `stamp`, never replacing an
/// earlier backup. A counter is appended when the name is already taken.
fn create_backup(path: &Path, stamp: &str) -> Result<PathBuf> {
    let mut source =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut attempt = 0u32;
    loop {
        let candidate = match attempt {
            0 => backup_path(path, stamp),
            n => backup_path(path, &format!("{}-{}", stamp, n)),
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut dest) => {
                io::copy(&mut source, &mut dest).with_context(|| {
                    format!("Failed to back up {} to {}", path.display(), candidate.display())
                })?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create backup {}", candidate.display()))
            }
        }
    }
}

/// Write `content` to `path`, first copying an existing file to a
/// timestamped backup. Returns the backup path when one was made.
pub fn write_with_backup(path: &Path, content: &str) -> Result<Option<PathBuf>> {
    let backup = if path.exists() {
        let stamp = Local::now().format("%Y%m%d-%H%M%S-%3f").to_string();
        Some(create_backup(path, &stamp)?)
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        None
    };
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("output/report.html"), "20250701-093000"),
            PathBuf::from("output/report.20250701-093000.bak.html")
        );
        assert_eq!(
            backup_path(Path::new("notes"), "20250701-093000"),
            PathBuf::from("notes.20250701-093000.bak")
        );
    }

    #[test]
    fn test_write_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        assert_eq!(write_with_backup(&path, "first").unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        let backup = write_with_backup(&path, "second").unwrap().unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "first");
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_repeated_writes_keep_every_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_with_backup(&path, "first").unwrap();
        let one = write_with_backup(&path, "second").unwrap().unwrap();
        let two = write_with_backup(&path, "third").unwrap().unwrap();
        assert_ne!(one, two);
        assert_eq!(fs::read_to_string(&one).unwrap(), "first");
        assert_eq!(fs::read_to_string(&two).unwrap(), "second");
        assert_eq!(fs::read_to_string(&path).unwrap(), "third");
    }

    #[test]
    fn test_backup_name_taken_gets_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        fs::write(&path, "v1").unwrap();

        let first = create_backup(&path, "20250701-093000-000").unwrap();
        fs::write(&path, "v2").unwrap();
        let second = create_backup(&path, "20250701-093000-000").unwrap();

        assert_eq!(first, dir.path().join("report.20250701-093000-000.bak.html"));
        assert_eq!(second, dir.path().join("report.20250701-093000-000-1.bak.html"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "v1");
        assert_eq!(fs::read_to_string(&second).unwrap(), "v2");
    }

    #[test]
    fn test_osc8_file_link_wraps_text() {
        let link = osc8_file_link("does-not-exist.html", "report");
        assert!(link.starts_with("\x1b]8;;file://does-not-exist.html"));
        assert!(link.contains("report"));
    }
}
