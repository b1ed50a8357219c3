use anyhow::{Context, Result};
use gam3arch_core::{BridgeMatrix, State, ZoneVisit};
use gam3arch_sim::{RepetitionRecord, ScenarioSummary, StepSnapshot};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use std::io::{Read, Write};

#[derive(Serialize)]
struct RunRow<'a> {
    scenario: &'a str,
    run: usize,
    seed: u64,
    burnout: f64,
    resonance: f64,
    mean_resonance_over_run: f64,
}

#[derive(Serialize)]
struct HistoryEntry<'a> {
    run: usize,
    seed: u64,
    steps: &'a [StepSnapshot],
}

fn plus_minus(mean: f64, std_err: Option<f64>) -> String {
    match std_err {
        Some(se) => format!("{mean:.4} ± {se:.4}"),
        None => format!("{mean:.4}"),
    }
}

pub fn print_summary_table<W: Write>(out: &mut W, summaries: &[ScenarioSummary]) -> Result<()> {
    writeln!(out, "{:<16} {:>5} {:>20} {:>20}", "scenario", "runs", "burnout", "resonance")?;
    for s in summaries {
        writeln!(
            out,
            "{:<16} {:>5} {:>20} {:>20}",
            s.scenario,
            s.repetitions,
            plus_minus(s.burnout_mean, s.burnout_std_err),
            plus_minus(s.resonance_mean, s.resonance_std_err),
        )?;
    }
    Ok(())
}

/// One row per scenario; unavailable standard errors are left empty.
pub fn write_summary_csv<W: Write>(out: W, summaries: &[ScenarioSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_runs_csv<W: Write>(out: W, runs: &[RepetitionRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for r in runs {
        writer.serialize(RunRow {
            scenario: &r.scenario,
            run: r.run,
            seed: r.seed,
            burnout: r.burnout,
            resonance: r.resonance,
            mean_resonance_over_run: r.mean_resonance_over_run,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_history_json<'a, W: Write>(
    out: W,
    runs: impl Iterator<Item = &'a RepetitionRecord>,
) -> Result<()> {
    let entries: Vec<HistoryEntry<'_>> = runs
        .filter_map(|r| {
            r.history.as_deref().map(|steps| HistoryEntry {
                run: r.run,
                seed: r.seed,
                steps,
            })
        })
        .collect();
    serde_json::to_writer_pretty(out, &entries)?;
    Ok(())
}

pub fn write_exposition<W: Write>(out: &mut W, registry: &Registry) -> Result<()> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    out.write_all(&buf)?;
    Ok(())
}

/// Parses a `player_id,timestamp,zone` CSV with a header row. Errors name
/// the 1-based record, the same numbering as [`SimulationError::Telemetry`].
///
/// [`SimulationError::Telemetry`]: gam3arch_core::SimulationError::Telemetry
pub fn read_visits<R: Read>(input: R) -> Result<Vec<ZoneVisit>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut visits = Vec::new();
    for (i, row) in reader.deserialize::<ZoneVisit>().enumerate() {
        visits.push(row.with_context(|| format!("telemetry record {}", i + 1))?);
    }
    Ok(visits)
}

pub fn print_bridge<W: Write>(out: &mut W, bridge: &BridgeMatrix) -> Result<()> {
    write!(out, "{:<8}", "")?;
    for to in State::ALL {
        write!(out, " {:>8}", to.name())?;
    }
    writeln!(out)?;
    for from in State::ALL {
        write!(out, "{:<8}", from.name())?;
        for to in State::ALL {
            write!(out, " {:>8.3}", bridge.get(from, to))?;
        }
        writeln!(out)?;
    }
    Ok(())
}
