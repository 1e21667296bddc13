//! Grid planning command.

use anyhow::{ensure, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Coordinate, LocationStep};
use crate::services::step_generator::{HexGrid, DEFAULT_DETECTION_RADIUS_KM, MAX_STEP_LIMIT};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Origin latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Origin longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Number of rings, counting the origin as the first
    #[arg(short, long, default_value = "12")]
    pub steps: u32,

    /// Detection radius of a single query in kilometres
    #[arg(long, default_value_t = DEFAULT_DETECTION_RADIUS_KM)]
    pub radius_km: f64,
}

#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub origin: Coordinate,
    pub step_limit: u32,
    pub step_km: f64,
    pub total: usize,
    pub points: Vec<LocationStep>,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        format!(
            "Grid around {} with {} ring(s), {:.4} km apart: {} point(s)\n{}",
            self.origin,
            self.step_limit,
            self.step_km,
            self.total,
            TableFormatter::new().format_steps(&self.points)
        )
    }
}

pub fn plan(args: &PlanArgs) -> Result<PlanOutput> {
    ensure!((-90.0..=90.0).contains(&args.lat), "Latitude {} out of range", args.lat);
    ensure!((-180.0..=180.0).contains(&args.lon), "Longitude {} out of range", args.lon);
    ensure!(args.radius_km > 0.0, "Radius must be positive");
    ensure!(
        args.steps <= MAX_STEP_LIMIT,
        "Step limit {} exceeds the maximum of {MAX_STEP_LIMIT}",
        args.steps
    );

    let origin = Coordinate::new(args.lat, args.lon);
    let grid = HexGrid::new(args.radius_km);
    let points: Vec<_> = grid.steps(origin, args.steps).collect();

    Ok(PlanOutput {
        origin,
        step_limit: args.steps,
        step_km: grid.step_km(),
        total: points.len(),
        points,
    })
}

pub async fn execute(args: PlanArgs, json_mode: bool) -> Result<()> {
    let result = plan(&args)?;
    output(&result, json_mode);
    Ok(())
}
