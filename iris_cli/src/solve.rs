use std::{fs, path::PathBuf};

use clap::Args;
use comfy_table::Table;
use iris_matrix_providers::as_the_crow_flies::AsTheCrowFlies;
use iris_optimizer::{
    Solution, SolverParams, Threads,
    error::{InputError, SolverError},
    json::types::JsonProblem,
    routing::{RoutingWrapper, complete_matrices},
    solver::solver_params::DEFAULT_EXPLORATION_LEVEL,
};
use tracing::{info, warn};

use crate::parsers;

#[derive(Args)]
pub struct SolveArgs {
    /// Problem file in JSON
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the JSON solution, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of worker threads, 0 uses every available core
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Exploration level from 0 to 5
    #[arg(short = 'x', long, default_value_t = DEFAULT_EXPLORATION_LEVEL)]
    exploration: usize,

    /// Local search budget (e.g., "30s", "5m", "PT1M")
    #[arg(long, value_parser = parsers::parse_timeout)]
    timeout: Option<jiff::SignedDuration>,

    /// Speed used for straight-line matrices when the input has none
    #[arg(long, default_value_t = 50.0)]
    speed: f64,

    /// Add distances and geometries to the routes
    #[arg(short, long)]
    geometry: bool,
}

fn solve(args: &SolveArgs) -> Result<Solution, SolverError> {
    let content = fs::read_to_string(&args.input)
        .map_err(|error| InputError::Io(format!("{}: {error}", args.input.display())))?;

    let mut builder = JsonProblem::from_json(&content)?.into_builder()?;
    complete_matrices(&mut builder, |profile| AsTheCrowFlies::new(profile, args.speed))?;
    let problem = builder.build()?;

    let threads = match args.threads {
        0 => Threads::Auto,
        1 => Threads::Single,
        n => Threads::Multi(n),
    };
    let mut solution = iris_optimizer::solve(
        &problem,
        SolverParams {
            exploration_level: args.exploration,
            threads,
            timeout: args.timeout,
            ..SolverParams::default()
        },
    )?;

    if args.geometry {
        for route in &mut solution.routes {
            let vehicle = problem
                .vehicles()
                .iter()
                .find(|vehicle| vehicle.id() == route.vehicle);
            let profile = vehicle.map_or("car", |vehicle| vehicle.profile());
            RoutingWrapper::new(AsTheCrowFlies::new(profile, args.speed))
                .add_route_info(route)?;
        }
        solution.update_summary(problem.amount_size());
    }

    Ok(solution)
}

fn print_summary(solution: &Solution) {
    let mut table = Table::new();
    table.set_header(vec![
        "vehicle", "jobs", "cost", "duration", "service", "waiting", "distance",
    ]);
    for route in &solution.routes {
        let jobs = route.located_steps().filter(|step| step.id.is_some()).count();
        table.add_row(vec![
            route.vehicle.to_string(),
            jobs.to_string(),
            route.cost.to_string(),
            route.duration.to_string(),
            route.service.to_string(),
            route.waiting_time.to_string(),
            route.distance.map_or_else(|| "-".to_owned(), |d| d.to_string()),
        ]);
    }

    let summary = &solution.summary;
    table.add_row(vec![
        "total".to_owned(),
        format!("{} unassigned", summary.unassigned),
        summary.cost.to_string(),
        summary.duration.to_string(),
        summary.service.to_string(),
        summary.waiting_time.to_string(),
        summary.distance.map_or_else(|| "-".to_owned(), |d| d.to_string()),
    ]);

    println!("{table}");
}

pub fn run(args: SolveArgs) -> anyhow::Result<()> {
    info!("Solving {:?}", args.input);

    let solution = solve(&args).unwrap_or_else(|error| Solution::from_error(&error));
    let json = serde_json::to_string_pretty(&solution)?;

    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            info!("Solution written to {:?}", path);
            print_summary(&solution);
        }
        None => println!("{json}"),
    }

    if let Some(error) = &solution.error {
        warn!(code = solution.code, "{error}");
        anyhow::bail!("solve failed: {error}");
    }

    info!(
        cost = solution.summary.cost,
        routes = solution.summary.routes,
        unassigned = solution.summary.unassigned,
        "Finished"
    );
    Ok(())
}
