//! CSV (polars) and JSON (serde) artifacts.

use anyhow::{bail, Context, Result};
use knn_place::ids::IdSource;
use knn_place::partition::NeighbourRecord;
use knn_place::simulation::Simulation;
use knn_place::{Site, Vec2};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;

/// One entry of `neighbour_options.json` / `query_points.json`.
#[derive(Debug, Serialize)]
pub struct NeighbourOption {
    pub query_point: [f64; 2],
    pub neighbours: Vec<String>,
    pub clearance: f64,
}

impl From<&NeighbourRecord> for NeighbourOption {
    fn from(r: &NeighbourRecord) -> Self {
        Self {
            query_point: [r.query_point.x, r.query_point.y],
            neighbours: r.neighbours.iter().map(ToString::to_string).collect(),
            clearance: r.clearance,
        }
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    ensure_parent(path)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = df.height(), "csv written");
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "json written");
    Ok(())
}

pub fn sites_frame(sites: &[Site]) -> PolarsResult<DataFrame> {
    df!(
        "point_id" => sites.iter().map(|s| s.id.to_string()).collect::<Vec<_>>(),
        "x" => sites.iter().map(|s| s.pos.x).collect::<Vec<_>>(),
        "y" => sites.iter().map(|s| s.pos.y).collect::<Vec<_>>(),
    )
}

pub fn points_frame(points: &[Vec2<f64>]) -> PolarsResult<DataFrame> {
    df!(
        "x" => points.iter().map(|p| p.x).collect::<Vec<_>>(),
        "y" => points.iter().map(|p| p.y).collect::<Vec<_>>(),
    )
}

/// `(query_points, data_points)` frames of a simulation.
pub fn simulation_frames(sim: &Simulation) -> PolarsResult<(DataFrame, DataFrame)> {
    let q = &sim.query_points;
    let d = &sim.data_points;
    let queries = df!(
        "query_point_id" => q.iter().map(|c| c.id.to_string()).collect::<Vec<_>>(),
        "x" => q.iter().map(|c| c.pos.x).collect::<Vec<_>>(),
        "y" => q.iter().map(|c| c.pos.y).collect::<Vec<_>>(),
        "normal_sd" => q.iter().map(|c| c.normal_sd).collect::<Vec<_>>(),
    )?;
    let data = df!(
        "point_id" => d.iter().map(|p| p.site.id.to_string()).collect::<Vec<_>>(),
        "query_point_id" => d.iter().map(|p| p.query_point.to_string()).collect::<Vec<_>>(),
        "x" => d.iter().map(|p| p.site.pos.x).collect::<Vec<_>>(),
        "y" => d.iter().map(|p| p.site.pos.y).collect::<Vec<_>>(),
        "distance" => d.iter().map(|p| p.distance).collect::<Vec<_>>(),
    )?;
    Ok((queries, data))
}

/// Read `x`/`y` columns (integers are cast) and tag each row from `ids`.
pub fn read_sites_csv<I: IdSource + ?Sized>(path: &Path, ids: &mut I) -> Result<Vec<Site>> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .finish()
        .with_context(|| format!("opening {}", path.display()))?
        .select([
            col("x").cast(DataType::Float64),
            col("y").cast(DataType::Float64),
        ])
        .collect()
        .with_context(|| format!("reading x/y from {}", path.display()))?;
    let xs = df.column("x")?.f64()?;
    let ys = df.column("y")?.f64()?;
    let mut sites = Vec::with_capacity(df.height());
    for (row, (x, y)) in xs.into_iter().zip(ys.into_iter()).enumerate() {
        let (Some(x), Some(y)) = (x, y) else {
            bail!("{}: row {row} has a missing coordinate", path.display());
        };
        sites.push(Site {
            id: ids.next_id(),
            pos: Vec2::new(x, y),
        });
    }
    tracing::info!(path = %path.display(), rows = sites.len(), "input sites");
    Ok(sites)
}
