//! YAML persistence helpers for configuration documents.
//!
//! Reading goes through `serde_yaml::Value` first so that empty documents
//! (a blank file, or one containing only comments) deserialize as all-default
//! values instead of failing.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use serde_yaml::Value as YamlValue;

use crate::io_utils;

pub fn from_str<T: DeserializeOwned + Default>(input: &str) -> Result<T> {
    let value: YamlValue = serde_yaml::from_str(input).context("Parsing YAML document")?;
    if value.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(value).context("Decoding YAML document")
}

pub fn load_from_path<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("Opening YAML file {path:?}"))?;
    from_str(&raw).with_context(|| format!("Reading YAML file {path:?}"))
}

pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("Serializing YAML document")
}

/// Writes `value` to `path`, or to stdout when no path (or `-`) is given.
pub fn save(path: Option<&Path>, value: &impl Serialize) -> Result<()> {
    let serialized = to_string(value)?;
    match path {
        Some(p) if !io_utils::is_dash(p) => {
            fs::write(p, serialized).with_context(|| format!("Creating YAML file {p:?}"))
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(serialized.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
