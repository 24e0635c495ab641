//! `<artifact>.provenance.json` sidecars next to every written artifact.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::io::ensure_parent;

/// Run parameters recorded in each sidecar.
#[derive(Clone, Debug)]
pub struct Payload {
    pub params: Value,
    pub seed: u64,
    pub tag: Option<String>,
}

impl Payload {
    pub fn new(params: Value, seed: u64) -> Self {
        Self {
            params,
            seed,
            tag: None,
        }
    }

    pub fn tagged(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }
}

#[derive(Serialize)]
struct Callsite {
    file: &'static str,
    line: u32,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    code_rev: String,
    version: &'static str,
    callsite: Callsite,
    tag: Option<&'a str>,
    seed: u64,
    params: &'a Value,
    outputs: [String; 1],
}

/// Describe `artifact` in a sidecar; returns the sidecar path.
#[track_caller]
pub fn write_sidecar(artifact: &Path, payload: &Payload) -> Result<PathBuf> {
    let caller = Location::caller();
    let doc = Sidecar {
        code_rev: current_git_rev(),
        version: knn_place::VERSION,
        callsite: Callsite {
            file: caller.file(),
            line: caller.line(),
        },
        tag: payload.tag.as_deref(),
        seed: payload.seed,
        params: &payload.params,
        outputs: [artifact.display().to_string()],
    };
    let path = sidecar_path(artifact);
    ensure_parent(&path)?;
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// `out/data_points.csv` -> `out/data_points.provenance.json`.
fn sidecar_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("provenance.json")
}

/// `GIT_COMMIT` (build time, then run time), else `git rev-parse HEAD`, else `unknown`.
pub fn current_git_rev() -> String {
    let env = option_env!("GIT_COMMIT")
        .map(str::to_owned)
        .into_iter()
        .chain(std::env::var("GIT_COMMIT").ok())
        .find(|rev| !rev.is_empty());
    env.or_else(|| {
        let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
        out.status
            .success()
            .then(|| String::from_utf8_lossy(&out.stdout).trim().to_owned())
    })
    .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn sidecar_replaces_the_extension() {
        assert_eq!(
            sidecar_path(Path::new("out/run-0001/data_points.csv")),
            Path::new("out/run-0001/data_points.provenance.json")
        );
        assert_eq!(
            sidecar_path(Path::new("out/plan")),
            Path::new("out/plan.provenance.json")
        );
    }

    #[test]
    fn sidecar_records_seed_tag_and_params() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("nested").join("neighbour_options.json");
        let payload = Payload::new(json!({"order": 2}), 7).tagged(Some("trial".into()));
        let written = write_sidecar(&artifact, &payload).unwrap();
        assert_eq!(written, dir.path().join("nested/neighbour_options.provenance.json"));
        let doc: Value = serde_json::from_slice(&fs::read(written).unwrap()).unwrap();
        assert_eq!(doc["outputs"][0], artifact.display().to_string());
        assert_eq!(doc["seed"], 7);
        assert_eq!(doc["tag"], "trial");
        assert_eq!(doc["params"]["order"], 2);
        assert_eq!(doc["version"], knn_place::VERSION);
        assert!(doc["callsite"]["line"].as_u64().unwrap() > 0);
    }

    #[test]
    fn untagged_sidecar_writes_null_tag() {
        let dir = tempdir().unwrap();
        let written = write_sidecar(&dir.path().join("a.csv"), &Payload::new(json!({}), 0)).unwrap();
        let doc: Value = serde_json::from_slice(&fs::read(written).unwrap()).unwrap();
        assert!(doc["tag"].is_null());
        assert!(!doc["code_rev"].as_str().unwrap().is_empty());
    }
}
