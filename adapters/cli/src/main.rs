#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that builds a Gridcrawl map headlessly.
//!
//! The adapter loads the prototype catalog, pre-warms the pool, generates
//! the default map and drives the scheduler one step per tick until the
//! build completes.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use gridcrawl_core::{BuildEvent, BuildMode, GridDimensions};
use gridcrawl_system_builder::BuildScheduler;
use gridcrawl_system_pool::ObjectPool;
use gridcrawl_world::generate_default_map;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gridcrawl", about = "Builds a tile-grid map and reports what was materialized")]
struct Args {
    /// Path to the prototype catalog manifest.
    #[arg(long, default_value = "assets/catalog.toml")]
    catalog: PathBuf,
    /// Scene name given to the generated map.
    #[arg(long, default_value = "default")]
    name: String,
    /// Number of floors of the generated grid.
    #[arg(long, default_value_t = 3)]
    floors: u32,
    /// Number of rows of the generated grid.
    #[arg(long, default_value_t = 5)]
    rows: u32,
    /// Number of columns of the generated grid.
    #[arg(long, default_value_t = 5)]
    columns: u32,
    /// Materialization strategy.
    #[arg(long, value_enum, default_value_t = ModeArg::Play)]
    mode: ModeArg,
    /// Upper bound on scheduling ticks before giving up.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Play,
    Edit,
}

impl From<ModeArg> for BuildMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Play => Self::Play,
            ModeArg::Edit => Self::Edit,
        }
    }
}

/// Entry point for the Gridcrawl command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let summary = run(&args)?;
    println!("{summary}");
    Ok(())
}

fn run(args: &Args) -> Result<Summary> {
    let catalog = config::load(&args.catalog)?;

    let mut pool = ObjectPool::new(catalog.prototypes);
    let prewarmed = pool.prewarm(&catalog.prewarm);
    info!(prewarmed, "pool warmed up");

    let dimensions = GridDimensions::new(args.floors, args.rows, args.columns);
    let mut map = generate_default_map(args.name.clone(), dimensions)
        .with_context(|| format!("cannot generate map `{}`", args.name))?;
    map.prefabs = catalog.prefabs;

    let mut scheduler = BuildScheduler::new(catalog.config, pool, args.mode.into());
    scheduler
        .build_map(map)
        .context("scheduler refused to start the build")?;

    let mut events = Vec::new();
    let mut ticks = 0;
    while !scheduler.advance_build(&mut events) {
        ticks += 1;
        if ticks >= args.max_ticks {
            bail!("build did not finish within {} ticks", args.max_ticks);
        }
    }
    ticks += 1;

    Ok(Summary::collect(&scheduler, &events, ticks))
}

/// Outcome of one headless build.
#[derive(Debug, PartialEq, Eq)]
struct Summary {
    map: String,
    ticks: usize,
    tiles: usize,
    prefabs: usize,
    rejected: Vec<String>,
    instantiated: usize,
}

impl Summary {
    fn collect(scheduler: &BuildScheduler, events: &[BuildEvent], ticks: usize) -> Self {
        let rejected = events
            .iter()
            .filter_map(|event| match event {
                BuildEvent::TileRejected { coord, error } => Some(format!("tile {coord}: {error}")),
                BuildEvent::PrefabRejected { prefab, error } => {
                    Some(format!("prefab {prefab}: {error}"))
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        for line in &rejected {
            warn!(%line, "rejected during build");
        }

        Self {
            map: scheduler.map_name().to_owned(),
            ticks,
            tiles: scheduler.tiles().len(),
            prefabs: scheduler.prefabs().active_len(),
            rejected,
            instantiated: scheduler.pool().instantiated_count(),
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "map `{}` built in {} ticks: {} tiles, {} placed objects, {} pooled instances",
            self.map, self.ticks, self.tiles, self.prefabs, self.instantiated
        )?;
        for line in &self.rejected {
            write!(f, "\n  rejected {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(floors: u32, rows: u32, columns: u32) -> Args {
        Args {
            catalog: PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../assets/catalog.toml"
            )),
            name: "test".to_owned(),
            floors,
            rows,
            columns,
            mode: ModeArg::Play,
            max_ticks: 10_000,
        }
    }

    #[test]
    fn shipped_catalog_builds_the_default_map() {
        let summary = run(&args(3, 5, 5)).expect("default map should build");

        assert_eq!(summary.map, "test");
        assert_eq!(summary.tiles, 9);
        assert_eq!(summary.prefabs, 4);
        assert_eq!(summary.ticks, 75, "one cell per tick on a 3x5x5 grid");
        assert!(summary.rejected.is_empty(), "{:?}", summary.rejected);
        assert_eq!(
            summary.instantiated, 21,
            "prewarmed entries are reused before new ones are created"
        );
    }

    #[test]
    fn grids_smaller_than_the_seed_block_are_refused() {
        let error = run(&args(1, 2, 5)).expect_err("2 rows cannot hold the seed");
        assert!(format!("{error:#}").contains("3x3"));
    }

    #[test]
    fn tick_limit_aborts_long_builds() {
        let mut args = args(3, 5, 5);
        args.max_ticks = 10;
        assert!(run(&args).is_err());
    }

    #[test]
    fn summary_lists_rejections() {
        let summary = Summary {
            map: "m".to_owned(),
            ticks: 3,
            tiles: 1,
            prefabs: 0,
            rejected: vec!["prefab #0: prototype `x` was not found".to_owned()],
            instantiated: 1,
        };

        assert_eq!(
            summary.to_string(),
            "map `m` built in 3 ticks: 1 tiles, 0 placed objects, 1 pooled instances\n  rejected prefab #0: prototype `x` was not found"
        );
    }
}
