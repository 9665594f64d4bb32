//! Shared helpers for driving the `lopt` binary against a scratch directory.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch directory holding a config and its state files.
pub struct Workspace {
    _dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("lopt.json")
    }

    /// Write a complete config whose store points at a closed local port, so
    /// any network call fails fast instead of leaving the machine.
    pub fn write_config(&self, store_key: &str) {
        let config = json!({
            "schema_version": 1,
            "store": {
                "base_url": "http://127.0.0.1:9",
                "consumer_key": store_key,
                "consumer_secret": "cs_test"
            },
            "rewrite": {
                "api_key": "test-key",
                "endpoint": "http://127.0.0.1:9",
                "models": ["gemini-1.5-flash", "gemini-1.5-pro"]
            }
        });
        self.write_json("lopt.json", &config);
    }

    pub fn write_json(&self, name: &str, value: &Value) {
        let text = serde_json::to_string_pretty(value).expect("serialize fixture");
        std::fs::write(self.root.join(name), text).expect("write fixture");
    }

    pub fn read_json(&self, name: &str) -> Value {
        let text = std::fs::read_to_string(self.root.join(name)).expect("read state file");
        serde_json::from_str(&text).expect("parse state file")
    }

    /// Run `lopt` with `--config` pointing into this workspace and
    /// credential overrides cleared.
    pub fn lopt(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_lopt"))
            .arg("--config")
            .arg(self.config_path())
            .args(args)
            .current_dir(&self.root)
            .env_remove("LOPT_CONFIG")
            .env_remove("LOPT_STORE_KEY")
            .env_remove("LOPT_STORE_SECRET")
            .env_remove("LOPT_REWRITE_API_KEY")
            .env_remove("RUST_LOG")
            .output()
            .expect("run lopt")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
