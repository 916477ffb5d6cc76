//! Plain-text reports: one labeled value per line.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::aircraft::{AircraftPerf, Mission};
use crate::error::{Result, SizingError};
use crate::expr::VarKey;
use crate::sensitivity::SensitivityReport;
use crate::solution::Solution;
use crate::sweep::SweepPoint;
use crate::units::KG_PER_LBF;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

impl ReportLine {
    pub fn new(label: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        ReportLine {
            label: label.into(),
            value,
            unit: unit.into(),
        }
    }

    /// The solved value of `key` in its declared unit.
    pub fn of(solution: &Solution, label: impl Into<String>, key: &VarKey) -> Option<Self> {
        let value = solution.raw(key)?;
        Some(ReportLine::new(label, value, key.unit().symbol()))
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<28} {:>14.4}", self.label, self.value)?;
        if !self.unit.is_empty() && self.unit != "-" {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

/// Write a titled block of lines.
pub fn write_report<W: Write>(out: &mut W, title: &str, lines: &[ReportLine]) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.len()))?;
    for line in lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out)
}

/// Gross mass and where it goes, in kg. Structural weights declared in lbf
/// are converted with [`KG_PER_LBF`].
pub fn mass_breakdown(mission: &Mission, solution: &Solution) -> Vec<ReportLine> {
    let a = &mission.aircraft;
    // (label, variable, declared in lbf)
    [
        ("Battery", &a.battery.m, false),
        ("Wing (structure + motors)", &a.wing.m, false),
        ("Wing structure", &a.wing.w, true),
        ("Horizontal tail", &a.htail.surface.w, true),
        ("Vertical tail", &a.vtail.surface.w, true),
        ("Tail boom", &a.boom.w, true),
        ("Fuselage", &a.fuselage.m, false),
        ("Gear", &a.gear.m, false),
        ("Equipment", &a.equipment.m, false),
        ("Payload", &a.payload, false),
        ("Gross mass", &a.mass, false),
    ]
    .into_iter()
    .filter_map(|(label, key, lbf)| match lbf {
        true => Some(ReportLine::new(label, solution.raw(key)? * KG_PER_LBF, "kg")),
        false => ReportLine::of(solution, label, key),
    })
    .collect()
}

/// Performance of one flight segment in fixed report units.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRow {
    pub name: String,
    /// N
    pub thrust: f64,
    /// m/s
    pub speed: f64,
    /// Electrical power demanded, kW.
    pub power: f64,
    /// Pack output, kW.
    pub battery_power: f64,
    /// m
    pub distance: f64,
    /// s
    pub time: f64,
    /// Wh
    pub energy: f64,
}

fn segment_row(
    solution: &Solution,
    name: &str,
    perf: &AircraftPerf,
    speed: &VarKey,
    distance: &VarKey,
    time: &VarKey,
    energy: &VarKey,
) -> Result<SegmentRow> {
    Ok(SegmentRow {
        name: name.to_string(),
        thrust: solution.value_in(&perf.wing.t, "N")?,
        speed: solution.value_in(speed, "m/s")?,
        power: solution.value_in(&perf.p, "kW")?,
        battery_power: solution.value_in(&perf.battery.p, "kW")?,
        distance: solution.value_in(distance, "m")?,
        time: solution.value_in(time, "s")?,
        energy: solution.value_in(energy, "Wh")?,
    })
}

/// One row per segment in flight order: the takeoff stations, both climbs,
/// cruise and landing.
pub fn segment_rows(mission: &Mission, solution: &Solution) -> Result<Vec<SegmentRow>> {
    let to = &mission.takeoff;
    let mut rows = Vec::with_capacity(to.stations.len() + 4);
    for (i, station) in to.stations.iter().enumerate() {
        rows.push(segment_row(
            solution,
            &format!("TO{}", i + 1),
            &station.perf,
            &to.v[i],
            &to.s[i],
            &to.t[i],
            &to.e[i],
        )?);
    }
    for (name, climb) in [
        ("ObstacleClimb", &mission.obstacle_climb),
        ("Climb", &mission.climb),
    ] {
        rows.push(segment_row(
            solution,
            name,
            &climb.perf,
            &climb.state.v,
            &climb.s,
            &climb.t,
            &climb.e,
        )?);
    }
    let cr = &mission.cruise;
    rows.push(segment_row(solution, "Cruise", &cr.perf, &cr.state.v, &cr.r, &cr.t, &cr.e)?);
    let la = &mission.landing;
    rows.push(segment_row(
        solution,
        "Landing",
        &la.perf,
        &la.state.v,
        &la.s_gr,
        &la.t,
        &la.e,
    )?);
    Ok(rows)
}

/// Segment table with running totals of distance and time.
pub fn write_segments<W: Write>(out: &mut W, rows: &[SegmentRow]) -> io::Result<()> {
    writeln!(
        out,
        "{:<14} {:>9} {:>8} {:>8} {:>9} {:>10} {:>8} {:>9} {:>10} {:>10}",
        "segment", "T [N]", "V [m/s]", "P [kW]", "Pbat [kW]", "d [m]", "t [s]", "E [Wh]", "sum [km]",
        "sum [min]"
    )?;
    let (mut distance, mut time) = (0.0, 0.0);
    for row in rows {
        distance += row.distance;
        time += row.time;
        writeln!(
            out,
            "{:<14} {:>9.1} {:>8.2} {:>8.2} {:>9.2} {:>10.1} {:>8.1} {:>9.1} {:>10.3} {:>10.2}",
            row.name,
            row.thrust,
            row.speed,
            row.power,
            row.battery_power,
            row.distance,
            row.time,
            row.energy,
            distance / 1000.0,
            time / 60.0
        )?;
    }
    Ok(())
}

fn failure_kind(err: &SizingError) -> &'static str {
    match err {
        SizingError::SweepPointFailure { source, .. } => source.kind(),
        other => other.kind(),
    }
}

/// One row per grid point: the swept values, then the cost or the failure
/// kind.
pub fn sweep_table<W: Write>(out: &mut W, points: &[SweepPoint]) -> io::Result<()> {
    let Some(first) = points.first() else {
        return Ok(());
    };
    write!(out, "{:>6}", "point")?;
    for (label, _) in first.point.labeled() {
        write!(out, " {label:>20}")?;
    }
    writeln!(out, " {:>14}", "cost")?;
    for p in points {
        write!(out, "{:>6}", p.point.index)?;
        for (_, value) in &p.point.values {
            write!(out, " {value:>20.4}")?;
        }
        match &p.outcome {
            Ok(solution) => writeln!(out, " {:>14.6}", solution.cost)?,
            Err(err) => writeln!(out, " {:>14}", failure_kind(err))?,
        }
    }
    Ok(())
}

/// Write the mission, sensitivity and sweep reports into `dir`.
pub fn write_reports(
    dir: &Path,
    mission: &Mission,
    solution: Option<&Solution>,
    sensitivities: Option<&SensitivityReport>,
    sweep: Option<&[SweepPoint]>,
) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;
    let mut written = Vec::new();

    if let Some(solution) = solution {
        let path = dir.join("mission.txt");
        let mut file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writeln!(file, "wing: {}", mission.mode)?;
        writeln!(file, "objective: {}", mission.objective)?;
        writeln!(file, "cost: {:.6}", solution.cost)?;
        writeln!(file, "iterations: {}", solution.iterations)?;
        writeln!(file)?;
        write_report(&mut file, "Mass breakdown", &mass_breakdown(mission, solution))?;
        writeln!(file, "Segments")?;
        write_segments(&mut file, &segment_rows(mission, solution)?)?;
        written.push(path);
    }

    if let Some(report) = sensitivities {
        let path = dir.join("sensitivities.txt");
        fs::write(&path, report.to_string())
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }

    if let Some(points) = sweep {
        let path = dir.join("sweep.txt");
        let mut file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        sweep_table(&mut file, points)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;
    use crate::solution::{SolveStatus, SolvedVariable};
    use crate::sweep::GridPoint;

    fn solution_with(key: &VarKey, value: f64, cost: f64) -> Solution {
        Solution {
            status: SolveStatus::Optimal,
            cost,
            variables: vec![SolvedVariable {
                key: key.clone(),
                label: key.name().to_string(),
                value,
                fixed: false,
            }],
            sensitivities: vec![],
            iterations: 1,
            cost_history: vec![cost],
        }
    }

    #[test]
    fn test_write_report() {
        let lines = vec![
            ReportLine::new("Range", 123.456, "km"),
            ReportLine::new("Cruise L/D", 15.0, "-"),
        ];
        let mut out = Vec::new();
        write_report(&mut out, "Segments", &lines).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<_> = text.lines().collect();
        assert_eq!(rows[0], "Segments");
        assert_eq!(rows[1], "--------");
        assert!(rows[2].starts_with("Range"));
        assert!(rows[2].ends_with("123.4560 km"));
        assert!(rows[3].ends_with("15.0000"));
    }

    #[test]
    fn test_line_of_missing_variable() {
        let r = var("R", "km").build().unwrap();
        let other = var("V", "m/s").build().unwrap();
        let solution = solution_with(&r, 200.0, 0.005);
        assert_eq!(
            ReportLine::of(&solution, "Range", &r),
            Some(ReportLine::new("Range", 200.0, "km"))
        );
        assert!(ReportLine::of(&solution, "Speed", &other).is_none());
    }

    #[test]
    fn test_sweep_table_marks_failures() {
        let r = var("S_runway", "m").owned_by("Takeoff").build().unwrap();
        let ok = SweepPoint {
            point: GridPoint {
                index: 0,
                values: vec![(r.clone(), 200.0)],
            },
            outcome: Ok(solution_with(&r, 200.0, 0.0125)),
        };
        let failed = SweepPoint {
            point: GridPoint {
                index: 1,
                values: vec![(r.clone(), 50.0)],
            },
            outcome: Err(SizingError::SweepPointFailure {
                index: 1,
                values: vec![("Takeoff.S_runway".into(), 50.0)],
                source: Box::new(SizingError::Infeasible {
                    iteration: 0,
                    constraints: vec![],
                }),
            }),
        };
        let mut out = Vec::new();
        sweep_table(&mut out, &[ok, failed]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<_> = text.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains("Takeoff.S_runway"));
        assert!(rows[1].ends_with("0.012500"));
        assert!(rows[2].ends_with("Infeasible"));
    }

    fn row(name: &str, distance: f64, time: f64) -> SegmentRow {
        SegmentRow {
            name: name.into(),
            thrust: 1200.0,
            speed: 50.0,
            power: 80.0,
            battery_power: 82.0,
            distance,
            time,
            energy: 100.0,
        }
    }

    #[test]
    fn test_write_segments_running_totals() {
        let rows = vec![row("TO1", 100.0, 10.0), row("Cruise", 100_000.0, 3600.0)];
        let mut out = Vec::new();
        write_segments(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("segment"));
        let first: Vec<_> = lines[1].split_whitespace().collect();
        assert_eq!(first[0], "TO1");
        assert_eq!(&first[first.len() - 2..], ["0.100", "0.17"]);
        let last: Vec<_> = lines[2].split_whitespace().collect();
        assert_eq!(&last[last.len() - 2..], ["100.100", "60.17"]);
    }

    #[test]
    fn test_structure_weights_reported_in_kg() {
        use crate::aircraft::{Objective, WingMode};

        let mission = Mission::build(WingMode::Conventional, Objective::Range).unwrap();
        let solution = solution_with(&mission.aircraft.wing.w, 100.0, 0.01);
        let lines = mass_breakdown(&mission, &solution);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label, "Wing structure");
        assert_eq!(lines[0].unit, "kg");
        assert!((lines[0].value - 100.0 * KG_PER_LBF).abs() < 1e-12);
    }
}
