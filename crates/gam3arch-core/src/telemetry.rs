//! Empirical bridge matrices from zone-visit telemetry.
//!
//! A player moving from zone `a` to zone `b` after a long stay weakens the
//! `a -> b` bridge: the bridge value is `1 / (1 + median_minutes / t0)`.

use crate::error::{Result, SimulationError};
use crate::matrix::BridgeMatrix;
use crate::state::{State, STATE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default healthy interval between zone changes, in minutes.
pub const DEFAULT_T0_MINUTES: f64 = 60.0;

/// One telemetry row: a player observed in a zone at a unix timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneVisit {
    pub player_id: String,
    pub timestamp: f64,
    pub zone: String,
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Minutes between consecutive zone changes, keyed by (from, to) zone name.
pub fn transition_intervals(visits: &[ZoneVisit]) -> Result<BTreeMap<(String, String), Vec<f64>>> {
    if let Some((index, visit)) = visits.iter().enumerate().find(|(_, v)| !v.timestamp.is_finite()) {
        return Err(SimulationError::Telemetry {
            record: index + 1,
            reason: format!("timestamp {} for player {} is not finite", visit.timestamp, visit.player_id),
        });
    }

    let mut ordered: Vec<&ZoneVisit> = visits.iter().collect();
    ordered.sort_by(|a, b| {
        a.player_id
            .cmp(&b.player_id)
            .then(a.timestamp.total_cmp(&b.timestamp))
    });

    let mut intervals: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for pair in ordered.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.player_id != b.player_id || a.zone == b.zone {
            continue;
        }
        intervals
            .entry((a.zone.clone(), b.zone.clone()))
            .or_default()
            .push((b.timestamp - a.timestamp) / 60.0);
    }
    Ok(intervals)
}

/// Infers a bridge matrix from telemetry. Unobserved transitions keep a
/// bridge of 1; zones that are not one of the four states are ignored.
pub fn extract_bridges(visits: &[ZoneVisit], t0_minutes: f64) -> Result<BridgeMatrix> {
    if !(t0_minutes > 0.0) || !t0_minutes.is_finite() {
        return Err(SimulationError::config(
            "t0_minutes",
            format!("must be positive, got {t0_minutes}"),
        ));
    }

    let mut rows = [[1.0; STATE_COUNT]; STATE_COUNT];
    for ((from, to), mut minutes) in transition_intervals(visits)? {
        let (Ok(from), Ok(to)) = (from.parse::<State>(), to.parse::<State>()) else {
            continue;
        };
        let typical = median(&mut minutes);
        rows[from.index()][to.index()] = 1.0 / (1.0 + typical / t0_minutes);
    }
    BridgeMatrix::new(rows)
}
