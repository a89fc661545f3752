use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestConfig {
    pub root: TempDir,
}

impl TestConfig {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn missing(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }
}
