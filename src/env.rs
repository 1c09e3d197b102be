use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Snapshot of the parent process environment.
///
/// Captured once per launch and handed to the launcher as an explicit input:
/// the launcher never reads ambient variables behind the caller's back, and
/// the snapshot itself is never mutated by a launch.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The working directory the launch was requested from; restored after
    /// a scoped working-directory change.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    pub fn capture() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of a captured environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable in the snapshot.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Build a child environment from `overrides` merged over the snapshot.
    ///
    /// Overridden keys win; every inherited variable whose key is not
    /// overridden is appended; no key appears twice.
    pub fn merge_overrides(&self, overrides: &HashMap<String, String>) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = overrides
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in &self.vars {
            if !overrides.contains_key(key) {
                merged.push((key.clone(), value.clone()));
            }
        }
        merged
    }
}
