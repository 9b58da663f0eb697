use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Polls a file's mtime so the game can pick up edits made in the editor.
#[derive(Debug)]
pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once per observed change, including the file appearing.
    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_newly_created_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("0.json");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());

        fs::write(&path, "{}").expect("write");
        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
    }

    #[test]
    fn detects_newer_mtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("0.json");
        fs::write(&path, "{}").expect("write");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());

        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        let file = fs::OpenOptions::new().write(true).open(&path).expect("open");
        file.set_modified(later).expect("set mtime");
        assert!(watcher.should_reload());
    }
}
