use crate::activity::ActivityId;
use crate::simulation::output::SimulationOutput;
use serde::{Deserialize, Serialize};

/// One bar of a tornado chart: the swing in project duration attributed to
/// an activity's uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TornadoBar {
    pub activity_id: ActivityId,
    pub correlation: f64,
    pub low: f64,
    pub high: f64,
    pub impact: f64,
}

/// Bars ranked by |correlation| (ties by id), optionally keeping the top `limit`.
pub fn tornado(output: &SimulationOutput, limit: Option<usize>) -> Vec<TornadoBar> {
    let mut bars: Vec<TornadoBar> = output
        .sensitivity
        .iter()
        .map(|(&activity_id, &correlation)| {
            let range = output
                .duration_ranges
                .get(&activity_id)
                .copied()
                .unwrap_or_default();
            let impact = correlation.abs() * (range.max - range.min) / 2.0;
            TornadoBar {
                activity_id,
                correlation,
                low: output.mean - impact,
                high: output.mean + impact,
                impact,
            }
        })
        .collect();

    bars.sort_by(|a, b| {
        b.correlation
            .abs()
            .total_cmp(&a.correlation.abs())
            .then(a.activity_id.cmp(&b.activity_id))
    });
    if let Some(limit) = limit {
        bars.truncate(limit);
    }
    bars
}
