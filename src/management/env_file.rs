use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{Res, WithingsError};

/// A `KEY=value` file that can be updated without disturbing unrelated lines.
///
/// Values are parsed with `dotenvy`; the raw lines are kept so that comments,
/// blank lines, ordering and untouched keys survive a rewrite byte for byte.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    lines: Vec<String>,
    values: HashMap<String, String>,
}

impl EnvFile {
    /// An empty store that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EnvFile {
            path: path.into(),
            lines: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Reads `path`. A file that does not exist yet yields an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Res<Self> {
        let path = path.into();
        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new(path)),
            Err(e) => return Err(WithingsError::EnvRead { path, source: e }),
        };

        Self::parse(path, &content)
    }

    /// Builds a store from file content already in memory.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Res<Self> {
        let path = path.into();
        let mut values = HashMap::new();
        for item in dotenvy::from_read_iter(content.as_bytes()) {
            let (key, value) = item.map_err(|e| WithingsError::EnvParse {
                path: path.clone(),
                source: e,
            })?;
            values.insert(key, value);
        }

        Ok(EnvFile {
            path,
            lines: content.lines().map(str::to_string).collect(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Replaces the first line defining `key` or appends a new one.
    ///
    /// Later definitions of the same key are dropped; the last one would
    /// otherwise win on the next load.
    pub fn set(&mut self, key: &str, value: &str) {
        let line = format!("{key}={}", quote_value(value));
        match self.lines.iter().position(|l| line_key(l) == Some(key)) {
            Some(idx) => {
                self.lines[idx] = line;
                let mut pos = 0;
                self.lines.retain(|l| {
                    let keep = pos <= idx || line_key(l) != Some(key);
                    pos += 1;
                    keep
                });
            }
            None => self.lines.push(line),
        }
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Writes the file through a sibling temporary file and a rename, so an
    /// interrupted run leaves either the old or the new content behind.
    pub async fn persist(&self) -> Res<()> {
        let persist_err = |source: std::io::Error| WithingsError::Persist {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent)
                .await
                .map_err(persist_err)?;
        }

        let tmp = self.tmp_path();
        async_fs::write(&tmp, self.render())
            .await
            .map_err(persist_err)?;
        if let Err(e) = async_fs::rename(&tmp, &self.path).await {
            let _ = async_fs::remove_file(&tmp).await;
            return Err(persist_err(e));
        }

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| ".env".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn line_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, _) = line.split_once('=')?;
    Some(key.trim())
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$'));
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$");
    format!("\"{escaped}\"")
}
