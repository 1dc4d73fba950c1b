//! Secret stores: process env, `KEY=VALUE` files, and in-memory maps.
//!
//! Stores only answer "what is the value of NAME"; absence logging happens in
//! `webask_core::resolve_credential`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use webask_core::SecretStore;

pub const ENV_PREFIX: &str = "WEBASK_";

#[derive(thiserror::Error, Debug)]
pub enum EnvFileError {
    #[error("failed to read env file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Process environment. `WEBASK_<NAME>` wins over `<NAME>`; blank values count as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvSecrets;

impl SecretStore for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(format!("{ENV_PREFIX}{name}"))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapSecrets {
    values: BTreeMap<String, String>,
}

impl MapSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
    /// optional `export ` prefix is accepted, and matching outer quotes are stripped.
    pub fn parse_env_file(txt: &str) -> Self {
        let mut values = BTreeMap::new();
        for raw in txt.lines() {
            let s = raw.trim();
            if s.is_empty() || s.starts_with('#') {
                continue;
            }
            let s = s.strip_prefix("export ").unwrap_or(s);
            let Some((k, v)) = s.split_once('=') else {
                continue;
            };
            let k = k.trim();
            if k.is_empty() {
                continue;
            }
            values.insert(k.to_string(), unquote(v.trim()).to_string());
        }
        Self { values }
    }

    pub fn from_env_file(path: &Path) -> Result<Self, EnvFileError> {
        let txt = std::fs::read_to_string(path).map_err(|source| EnvFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse_env_file(&txt))
    }
}

fn unquote(v: &str) -> &str {
    for q in ['"', '\''] {
        if v.len() >= 2 && v.starts_with(q) && v.ends_with(q) {
            return &v[1..v.len() - 1];
        }
    }
    v
}

impl SecretStore for MapSecrets {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// First layer with a non-blank value wins.
#[derive(Default)]
pub struct LayeredSecrets {
    layers: Vec<Box<dyn SecretStore>>,
}

impl LayeredSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, store: impl SecretStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }
}

impl SecretStore for LayeredSecrets {
    fn get(&self, name: &str) -> Option<String> {
        self.layers
            .iter()
            .find_map(|l| l.get(name).filter(|v| !v.trim().is_empty()))
    }
}
