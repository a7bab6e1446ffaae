//! Mapping file loading.
//!
//! Walks a directory tree for `.json` and `.yaml`/`.yml` files, each holding
//! one mapping or an array of mappings, and feeds them into the index and the
//! raw registry. Bad files and bad individual mappings are logged and
//! skipped; a reload never aborts because one stub is broken.

use crate::index::RuntimeIndex;
use crate::mapping::Mapping;
use crate::registry::MappingRegistry;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of one load pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// Load every mapping file under `dir` into the given index and registry.
///
/// Files are visited in sorted path order so load order (the final matching
/// tie-break) is stable across runs.
pub fn load_dir(
    dir: &Path,
    index: &RuntimeIndex,
    registry: &MappingRegistry,
) -> anyhow::Result<LoadSummary> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;

    let mut summary = LoadSummary::default();
    for path in files {
        let mappings = match parse_file(&path) {
            Ok(mappings) => mappings,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unparseable mapping file");
                summary.skipped += 1;
                continue;
            }
        };
        for mapping in mappings {
            match index.add(mapping.clone()) {
                Ok(()) => {
                    registry.register(mapping);
                    summary.loaded += 1;
                }
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping invalid mapping");
                    summary.skipped += 1;
                }
            }
        }
    }

    info!(
        loaded = summary.loaded,
        skipped = summary.skipped,
        "mapping load complete"
    );
    Ok(summary)
}

/// Wipe the index and registry, then load everything again. Per-item
/// failures are skipped as in [`load_dir`]; already-added stubs are not
/// rolled back.
pub fn reload_dir(
    dir: &Path,
    index: &RuntimeIndex,
    registry: &MappingRegistry,
) -> anyhow::Result<LoadSummary> {
    index.reset();
    registry.reset();
    load_dir(dir, index, registry)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to list directory {}", dir.display()))?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("json") | Some("yaml") | Some("yml")
        ) {
            out.push(path);
        }
    }
    Ok(())
}

fn parse_file(path: &Path) -> anyhow::Result<Vec<Mapping>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            let value: serde_json::Value = serde_json::from_str(&text)?;
            match value {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).map_err(Into::into))
                    .collect(),
                single => Ok(vec![serde_json::from_value(single)?]),
            }
        }
        _ => {
            let value: serde_yaml::Value = serde_yaml::from_str(&text)?;
            match value {
                serde_yaml::Value::Sequence(items) => items
                    .into_iter()
                    .map(|item| serde_yaml::from_value(item).map_err(Into::into))
                    .collect(),
                single => Ok(vec![serde_yaml::from_value(single)?]),
            }
        }
    }
}
