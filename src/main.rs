use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use gpsize::aircraft::{Mission, Objective, WingMode};
use gpsize::config::{RunConfig, SweepAxis};
use gpsize::logging::init_tracing;
use gpsize::model::Substitutions;
use gpsize::report::{self, ReportLine};
use gpsize::sensitivity::SensitivityReport;
use gpsize::sweep::{sweep_parallel, SweepSpec};
use gpsize::SpSolver;

#[derive(Parser, Debug)]
#[command(name = "gpsize")]
#[command(about = "Size a battery-electric aircraft for range or mass")]
struct Args {
    /// TOML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wing configuration (conventional, blown)
    #[arg(short, long)]
    wing: Option<WingMode>,

    /// What to optimize (range, mass)
    #[arg(short, long)]
    objective: Option<Objective>,

    /// Fix a constant, e.g. `Aircraft.Battery.Estar=250Wh/kg` (repeatable)
    #[arg(long = "sub", value_parser = parse_substitution)]
    subs: Vec<(String, String)>,

    /// Sweep a constant, e.g. `Takeoff.S_runway=100:400:4` (repeatable)
    #[arg(long = "sweep", value_parser = parse_sweep_axis)]
    sweeps: Vec<SweepAxis>,

    /// Record failing sweep points instead of stopping
    #[arg(long)]
    skip_failures: bool,

    /// Number of sensitivities to print
    #[arg(long)]
    top: Option<usize>,

    /// Directory for report files
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    /// Command-line values override the loaded configuration.
    fn apply(self, cfg: &mut RunConfig) {
        if let Some(wing) = self.wing {
            cfg.wing = wing;
        }
        if let Some(objective) = self.objective {
            cfg.objective = objective;
        }
        cfg.substitutions.extend(self.subs);
        if !self.sweeps.is_empty() {
            cfg.sweep = self.sweeps;
        }
        cfg.skip_failures |= self.skip_failures;
        if let Some(top) = self.top {
            cfg.report.top = top;
        }
        if let Some(dir) = self.report_dir {
            cfg.report.dir = Some(dir);
        }
        if let Some(level) = self.log_level {
            cfg.log_level = level;
        }
    }
}

fn parse_substitution(s: &str) -> Result<(String, String), String> {
    let (path, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=VALUE[UNIT], got '{s}'"))?;
    if path.trim().is_empty() || value.trim().is_empty() {
        return Err(format!("expected PATH=VALUE[UNIT], got '{s}'"));
    }
    Ok((path.trim().to_string(), value.trim().to_string()))
}

fn parse_sweep_axis(s: &str) -> Result<SweepAxis, String> {
    let usage = || format!("expected PATH=START:STOP:COUNT, got '{s}'");
    let (path, range) = s.split_once('=').ok_or_else(usage)?;
    let parts: Vec<&str> = range.split(':').collect();
    let [start, stop, count] = parts.as_slice() else {
        return Err(usage());
    };
    let start: f64 = start.trim().parse().map_err(|_| usage())?;
    let stop: f64 = stop.trim().parse().map_err(|_| usage())?;
    let count: usize = count.trim().parse().map_err(|_| usage())?;
    if count == 0 {
        return Err(format!("sweep of {path} needs at least one point"));
    }
    Ok(SweepAxis::linspace(path.trim(), start, stop, count))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut cfg = RunConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut cfg);
    init_tracing(&cfg.log_level);

    let mission = Mission::build(cfg.wing, cfg.objective)?;
    let subs = cfg.substitutions_for(&mission.root)?;
    let solver = SpSolver::new(cfg.solve.clone());
    info!(wing = %cfg.wing, objective = %cfg.objective, substitutions = subs.len(), "mission built");

    match cfg.sweep_for(&mission.root)? {
        None => run_single(&cfg, &solver, &mission, &subs),
        Some(spec) => run_sweep(&cfg, &solver, &mission, &subs, &spec),
    }
}

fn run_single(
    cfg: &RunConfig,
    solver: &SpSolver,
    mission: &Mission,
    subs: &Substitutions,
) -> anyhow::Result<()> {
    let solution = solver
        .solve_model(&mission.root, subs)
        .context("mission solve failed")?;

    let cost = match mission.objective {
        Objective::Range => ReportLine::new("Cost (1/R)", solution.cost, "1/km"),
        Objective::Mass => ReportLine::new("Cost (mass)", solution.cost, "kg"),
    };
    let mut headline = vec![cost];
    headline.extend(ReportLine::of(&solution, "Range", &mission.cruise.r));
    headline.push(ReportLine::new("Iterations", solution.iterations as f64, "-"));
    let mut out = io::stdout().lock();
    report::write_report(&mut out, "Mission", &headline)?;
    report::write_report(&mut out, "Mass breakdown", &report::mass_breakdown(mission, &solution))?;
    writeln!(out, "Segments")?;
    report::write_segments(&mut out, &report::segment_rows(mission, &solution)?)?;
    writeln!(out)?;

    let sensitivities = SensitivityReport::new(&solution, cfg.report.top);
    println!("Sensitivities");
    println!("-------------");
    print!("{sensitivities}");

    if let Some(dir) = &cfg.report.dir {
        let written =
            report::write_reports(dir, mission, Some(&solution), Some(&sensitivities), None)?;
        info!(files = written.len(), dir = %dir.display(), "reports written");
    }
    Ok(())
}

fn run_sweep(
    cfg: &RunConfig,
    solver: &SpSolver,
    mission: &Mission,
    subs: &Substitutions,
    spec: &SweepSpec,
) -> anyhow::Result<()> {
    info!(points = spec.len(), "starting sweep");
    let results = sweep_parallel(solver, &mission.root, subs, spec, cfg.skip_failures)
        .context("sweep failed")?;
    let failures = results.failures().count();
    if failures > 0 {
        warn!(failures, points = results.len(), "some sweep points failed");
    }

    report::sweep_table(&mut io::stdout().lock(), results.points())?;

    if let Some(dir) = &cfg.report.dir {
        let written = report::write_reports(dir, mission, None, None, Some(results.points()))?;
        info!(files = written.len(), dir = %dir.display(), "reports written");
    }
    Ok(())
}
