use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use knn_place::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod io;
mod provenance;

use io::NeighbourOption;
use provenance::{current_git_rev, write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "knn-place-cli")]
#[command(about = "Place kNN query points that jointly retrieve every data point")]
struct Cmd {
    /// Seed for every random draw of the run
    #[arg(long, global = true, default_value_t = 0)]
    seed: u64,

    /// Optional free-form tag; propagated to provenance sidecars and logs
    #[arg(long, global = true)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Args, Clone, Debug)]
struct PointsArgs {
    /// Number of uniform random data points (ignored with --input)
    #[arg(short = 'n', long = "points", default_value_t = 10)]
    points: usize,
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0.0, 10.0])]
    x_bounds: Vec<f64>,
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0.0, 10.0])]
    y_bounds: Vec<f64>,
    /// CSV with `x` and `y` columns, used instead of random points
    #[arg(long)]
    input: Option<PathBuf>,
}

impl PointsArgs {
    fn bounds(&self) -> Bounds2 {
        Bounds2::new(
            (self.x_bounds[0], self.x_bounds[1]),
            (self.y_bounds[0], self.y_bounds[1]),
        )
    }

    fn load(&self, rng: &mut StdRng) -> Result<Vec<Site>> {
        let mut ids = SequentialIds::default();
        match &self.input {
            Some(path) => io::read_sites_csv(path, &mut ids),
            None => uniform_points(self.points, self.bounds(), rng, &mut ids)
                .with_context(|| format!("invalid bounds {:?}", self.bounds())),
        }
    }

    fn params(&self) -> serde_json::Value {
        json!({
            "points": self.points,
            "x_bounds": self.x_bounds,
            "y_bounds": self.y_bounds,
            "input": self.input,
        })
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    Trim,
    Uniform,
}

#[derive(Subcommand)]
enum Action {
    /// Build the order-k partition and write every cell's neighbour option
    Partition {
        #[command(flatten)]
        points: PointsArgs,
        #[arg(short = 'k', long)]
        order: usize,
        /// Keep one cell per neighbour set
        #[arg(long)]
        dedup: bool,
        /// Drop cells whose inscribed disc is not wider than this
        #[arg(long)]
        min_inradius: Option<f64>,
        /// Cap on the clearance used to place each query point
        #[arg(long, default_value_t = 1.0)]
        max_radius: f64,
        /// Independent draws; run i uses seed + i and writes to `<out>/run-<i>`
        #[arg(long, default_value_t = 1)]
        runs: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Pick the fewest partition cells whose neighbour sets cover every point
    Plan {
        #[command(flatten)]
        points: PointsArgs,
        #[arg(short = 'k', long)]
        order: usize,
        #[arg(long)]
        min_inradius: Option<f64>,
        #[arg(long, default_value_t = 1.0)]
        max_radius: f64,
        #[arg(long, default_value_t = 10_000)]
        ceiling: u128,
        #[arg(long)]
        out: PathBuf,
    },
    /// Brute-force grid baseline
    Grid {
        #[command(flatten)]
        points: PointsArgs,
        #[arg(short = 'k', long)]
        k: usize,
        #[arg(long, default_value_t = 50)]
        resolution: usize,
        #[arg(long, default_value_t = 10_000)]
        ceiling: u128,
        #[arg(long)]
        out: PathBuf,
    },
    /// Greedy placement on data points
    Heuristic {
        #[command(flatten)]
        points: PointsArgs,
        #[arg(long, value_enum)]
        strategy: Strategy,
        #[arg(short = 'k', long)]
        k: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Generate clustered data around known query centres
    Simulate {
        #[arg(long, default_value_t = 3)]
        min_query_points: usize,
        #[arg(long, default_value_t = 6)]
        max_query_points: usize,
        #[arg(long, default_value_t = 3)]
        points_per_query_point: usize,
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0.0, 10.0])]
        x_bounds: Vec<f64>,
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0.0, 10.0])]
        y_bounds: Vec<f64>,
        #[arg(long, default_value_t = 1.0)]
        max_normal_sd: f64,
        #[arg(long, default_value_t = 100)]
        max_attempts: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    let mut rng = StdRng::seed_from_u64(cmd.seed);
    let tag = cmd.tag;
    let payload = |params| Payload::new(params, cmd.seed).tagged(tag.clone());
    match cmd.action {
        Action::Partition {
            points,
            order,
            dedup,
            min_inradius,
            max_radius,
            runs,
            out,
        } => {
            let params = json!({
                "command": "partition",
                "points": points.params(),
                "order": order,
                "dedup": dedup,
                "min_inradius": min_inradius,
                "max_radius": max_radius,
                "runs": runs,
            });
            let job = PartitionJob {
                order,
                dedup,
                max_radius,
                cfg: PartitionCfg {
                    min_inradius,
                    ..PartitionCfg::default()
                },
            };
            partition_runs(&points, &job, runs, cmd.seed, tag.clone(), &params, &out)
        }
        Action::Plan {
            points,
            order,
            min_inradius,
            max_radius,
            ceiling,
            out,
        } => {
            let params = json!({
                "command": "plan",
                "points": points.params(),
                "order": order,
                "min_inradius": min_inradius,
                "max_radius": max_radius,
                "ceiling": ceiling.to_string(),
            });
            let sites = points.load(&mut rng)?;
            let cfg = PartitionCfg {
                min_inradius,
                ..PartitionCfg::default()
            };
            let plan_cfg = PlanCfg {
                max_radius,
                ceiling,
            };
            plan(&sites, order, &cfg, &plan_cfg, &out, &payload(params))
        }
        Action::Grid {
            points,
            k,
            resolution,
            ceiling,
            out,
        } => {
            let params = json!({
                "command": "grid",
                "points": points.params(),
                "k": k,
                "resolution": resolution,
                "ceiling": ceiling.to_string(),
            });
            let sites = points.load(&mut rng)?;
            let cfg = GridSearchCfg {
                resolution,
                ceiling,
            };
            grid(&sites, k, points.bounds(), &cfg, &out, &payload(params))
        }
        Action::Heuristic {
            points,
            strategy,
            k,
            out,
        } => {
            let params = json!({
                "command": "heuristic",
                "points": points.params(),
                "strategy": format!("{strategy:?}").to_lowercase(),
                "k": k,
            });
            let sites = points.load(&mut rng)?;
            heuristic(&sites, strategy, k, &mut rng, &out, &payload(params))
        }
        Action::Simulate {
            min_query_points,
            max_query_points,
            points_per_query_point,
            x_bounds,
            y_bounds,
            max_normal_sd,
            max_attempts,
            out,
        } => {
            let params = json!({
                "command": "simulate",
                "min_query_points": min_query_points,
                "max_query_points": max_query_points,
                "points_per_query_point": points_per_query_point,
                "x_bounds": x_bounds,
                "y_bounds": y_bounds,
                "max_normal_sd": max_normal_sd,
                "max_attempts": max_attempts,
            });
            let cfg = SimulationCfg {
                min_query_points,
                max_query_points,
                points_per_query_point,
                bounds: Bounds2::new((x_bounds[0], x_bounds[1]), (y_bounds[0], y_bounds[1])),
                max_normal_sd,
                max_attempts,
            };
            simulation(&cfg, &mut rng, &out, &payload(params))
        }
        Action::Report => report(cmd.seed, tag.clone()),
    }
}

fn write_data_points(sites: &[Site], out: &Path, payload: &Payload) -> Result<()> {
    let path = out.join("data_points.csv");
    io::write_csv(&path, &mut io::sites_frame(sites)?)?;
    write_sidecar(&path, payload)?;
    Ok(())
}

/// Everything `partition` needs besides the sites.
#[derive(Clone, Copy, Debug)]
struct PartitionJob {
    order: usize,
    dedup: bool,
    max_radius: f64,
    cfg: PartitionCfg,
}

fn partition_runs(
    points: &PointsArgs,
    job: &PartitionJob,
    runs: usize,
    seed: u64,
    tag: Option<String>,
    params: &serde_json::Value,
    out: &Path,
) -> Result<()> {
    ensure!(runs >= 1, "--runs must be at least 1");
    ensure!(
        runs == 1 || points.input.is_none(),
        "--runs repeats random draws and cannot be combined with --input"
    );
    for run in 0..runs {
        let run_seed = seed.wrapping_add(run as u64);
        let dir = if runs == 1 {
            out.to_path_buf()
        } else {
            out.join(format!("run-{run:04}"))
        };
        tracing::info!(run, seed = run_seed, dir = %dir.display(), "partition run");
        let mut rng = StdRng::seed_from_u64(run_seed);
        let sites = points.load(&mut rng)?;
        let payload = Payload::new(params.clone(), run_seed).tagged(tag.clone());
        partition(&sites, job, &dir, &payload)?;
    }
    Ok(())
}

fn partition(sites: &[Site], job: &PartitionJob, out: &Path, payload: &Payload) -> Result<()> {
    tracing::info!(sites = sites.len(), order = job.order, dedup = job.dedup, tag = ?payload.tag, "partition");
    let solver = SimplexSolver::default();
    let mut level =
        nth_order_partition(sites, job.order, &solver, &job.cfg).context("building partition")?;
    if job.dedup {
        level = level.dedup_by_neighbours();
    }
    let records = level
        .records(&solver, job.max_radius)
        .context("placing query points")?;
    tracing::info!(cells = records.len(), "partition built");

    write_data_points(sites, out, payload)?;
    let options: Vec<NeighbourOption> = records.iter().map(NeighbourOption::from).collect();
    let path = out.join("neighbour_options.json");
    io::write_json(&path, &options)?;
    write_sidecar(&path, payload)?;
    Ok(())
}

fn plan(
    sites: &[Site],
    order: usize,
    cfg: &PartitionCfg,
    plan_cfg: &PlanCfg,
    out: &Path,
    payload: &Payload,
) -> Result<()> {
    tracing::info!(sites = sites.len(), order, tag = ?payload.tag, "plan");
    let solver = SimplexSolver::default();
    let level = nth_order_partition(sites, order, &solver, cfg).context("building partition")?;
    let options: Vec<NeighbourOption> =
        match plan_from_partition(level, sites, &solver, plan_cfg).context("selecting plan")? {
            Some(plan) => plan.records.iter().map(NeighbourOption::from).collect(),
            None => {
                tracing::warn!("partition cells do not cover every point; writing an empty plan");
                Vec::new()
            }
        };
    tracing::info!(query_points = options.len(), "plan selected");

    write_data_points(sites, out, payload)?;
    let path = out.join("query_points.json");
    io::write_json(&path, &options)?;
    write_sidecar(&path, payload)?;
    Ok(())
}

fn grid(
    sites: &[Site],
    k: usize,
    bounds: Bounds2,
    cfg: &GridSearchCfg,
    out: &Path,
    payload: &Payload,
) -> Result<()> {
    tracing::info!(sites = sites.len(), k, resolution = cfg.resolution, tag = ?payload.tag, "grid");
    let queries = match grid_search(sites, k, bounds, cfg).context("grid search")? {
        GridSearchOutcome::Found(q) => q,
        GridSearchOutcome::NotFound => {
            tracing::warn!("no covering set of grid points; try a finer resolution");
            Vec::new()
        }
    };
    write_data_points(sites, out, payload)?;
    let path = out.join("query_points.csv");
    io::write_csv(&path, &mut io::points_frame(&queries)?)?;
    write_sidecar(&path, payload)?;
    Ok(())
}

fn heuristic(
    sites: &[Site],
    strategy: Strategy,
    k: usize,
    rng: &mut StdRng,
    out: &Path,
    payload: &Payload,
) -> Result<()> {
    tracing::info!(sites = sites.len(), k, ?strategy, tag = ?payload.tag, "heuristic");
    let queries = match strategy {
        Strategy::Trim => trim_extremities(sites, k),
        Strategy::Uniform => uniform_random(sites, k, rng),
    }
    .context("running heuristic")?;
    tracing::info!(query_points = queries.len(), "heuristic done");

    write_data_points(sites, out, payload)?;
    let path = out.join("query_points.csv");
    io::write_csv(&path, &mut io::points_frame(&queries)?)?;
    write_sidecar(&path, payload)?;
    Ok(())
}

fn simulation(cfg: &SimulationCfg, rng: &mut StdRng, out: &Path, payload: &Payload) -> Result<()> {
    ensure!(cfg.bounds.is_valid(), "invalid bounds {:?}", cfg.bounds);
    tracing::info!(tag = ?payload.tag, "simulate");
    let sim = simulate(cfg, rng, &mut SequentialIds::default()).context("simulation")?;
    let (mut queries, mut data) = io::simulation_frames(&sim)?;
    for (name, df) in [("query_points.csv", &mut queries), ("data_points.csv", &mut data)] {
        let path = out.join(name);
        io::write_csv(&path, df)?;
        write_sidecar(&path, payload)?;
    }
    Ok(())
}

fn report(seed: u64, tag: Option<String>) -> Result<()> {
    let obj = json!({
        "code_rev": current_git_rev(),
        "version": knn_place::VERSION,
        "tag": tag,
        "seed": seed,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
