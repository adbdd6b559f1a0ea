use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::config::ScannerConfig;

/// Bytes sniffed from the head of a file when deciding text vs binary.
const BINARY_SNIFF_BYTES: usize = 8192;

#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub path: PathBuf,
    /// Path relative to the walk root, used as the finding's file label.
    pub relative: String,
}

/// Walks a directory tree and yields the files worth scanning: allowlisted
/// extensions, below the size cap, outside the skip list.
pub struct FileWalker {
    root: PathBuf,
    max_file_size: u64,
    skip_paths: Vec<String>,
    file_extensions: Vec<String>,
}

impl FileWalker {
    pub fn from_config(root: &Path, config: &ScannerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            max_file_size: config.max_file_size_kb * 1024,
            skip_paths: config.skip_paths.clone(),
            file_extensions: config.file_extensions.clone(),
        }
    }

    /// Collect the eligible files under the root.
    pub fn files(&self) -> Vec<WalkedFile> {
        let mut files = Vec::new();

        let walk = WalkDir::new(&self.root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_dir() && self.skip_paths.iter().any(|s| s == name.as_ref()))
        });

        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.has_eligible_extension(entry.path()) {
                continue;
            }
            match entry.metadata() {
                Ok(meta) if meta.len() > self.max_file_size => {
                    debug!(
                        "Skipping oversized file ({} KiB): {}",
                        meta.len() / 1024,
                        entry.path().display()
                    );
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Metadata error for {}: {}", entry.path().display(), e);
                    continue;
                }
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();
            files.push(WalkedFile {
                path: entry.path().to_path_buf(),
                relative,
            });
        }

        files
    }

    fn has_eligible_extension(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return false,
        };
        self.file_extensions
            .iter()
            .any(|ext| name.ends_with(ext.as_str()))
    }

    /// Read a file as text. Returns `Ok(None)` for binary content; for a
    /// partially decodable file, the valid UTF-8 prefix is returned and the
    /// rest is dropped.
    pub fn read_text(path: &Path) -> std::io::Result<Option<String>> {
        let bytes = fs::read(path)?;

        let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
        if sniff.contains(&0) {
            debug!("Skipping binary file: {}", path.display());
            return Ok(None);
        }

        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                let valid_len = e.utf8_error().valid_up_to();
                if valid_len == 0 {
                    warn!("Undecodable file skipped: {}", path.display());
                    return Ok(None);
                }
                warn!(
                    "Partially decoded {} ({} of {} bytes)",
                    path.display(),
                    valid_len,
                    e.as_bytes().len()
                );
                let mut bytes = e.into_bytes();
                bytes.truncate(valid_len);
                // Truncated at valid_up_to, so this cannot fail.
                Ok(String::from_utf8(bytes).ok())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn walker(root: &Path) -> FileWalker {
        FileWalker::from_config(root, &ScannerConfig::default())
    }

    #[test]
    fn test_walk_collects_eligible_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "x = 1").unwrap();
        fs::write(dir.path().join("notes.md"), "notes").unwrap();
        fs::write(dir.path().join("settings.env"), "A=1").unwrap();

        let mut names: Vec<String> = walker(dir.path())
            .files()
            .into_iter()
            .map(|f| f.relative)
            .collect();
        names.sort();
        assert_eq!(names, vec!["app.py", "settings.env"]);
    }

    #[test]
    fn test_skip_paths_prune_whole_subtrees() {
        let dir = TempDir::new().unwrap();
        let skipped = dir.path().join("node_modules").join("pkg");
        fs::create_dir_all(&skipped).unwrap();
        fs::write(skipped.join("index.js"), "secret").unwrap();
        fs::write(dir.path().join("main.js"), "code").unwrap();

        let files = walker(dir.path()).files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "main.js");
    }

    #[test]
    fn test_oversized_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let mut config = ScannerConfig::default();
        config.max_file_size_kb = 1;
        let big = "x".repeat(2048);
        fs::write(dir.path().join("big.txt"), big).unwrap();
        fs::write(dir.path().join("small.txt"), "ok").unwrap();

        let files = FileWalker::from_config(dir.path(), &config).files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "small.txt");
    }

    #[test]
    fn test_read_text_rejects_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.txt");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"text\0binary").unwrap();
        assert!(FileWalker::read_text(&path).unwrap().is_none());
    }

    #[test]
    fn test_read_text_decodes_valid_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.txt");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"valid prefix ").unwrap();
        f.write_all(&[0xff, 0xfe]).unwrap();
        let text = FileWalker::read_text(&path).unwrap().unwrap();
        assert_eq!(text, "valid prefix ");
    }
}
