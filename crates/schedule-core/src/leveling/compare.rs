use crate::leveling::{
    LevelingAlgorithm, LevelingError, LevelingInput, LevelingOptions, LevelingResult,
    PriorityWeights, level_resources_with,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingComparison {
    pub serial: LevelingResult,
    pub parallel: LevelingResult,
    pub recommended: LevelingAlgorithm,
    pub reason: String,
}

impl LevelingComparison {
    pub fn recommended_result(&self) -> &LevelingResult {
        match self.recommended {
            LevelingAlgorithm::Serial => &self.serial,
            LevelingAlgorithm::Parallel => &self.parallel,
        }
    }
}

/// Runs both strategies on the same input concurrently and picks one.
pub fn compare_leveling(
    input: &LevelingInput<'_>,
    options: &LevelingOptions,
    weights: &PriorityWeights,
) -> Result<LevelingComparison, LevelingError> {
    let (serial, parallel) = rayon::join(
        || level_resources_with(input, options, weights, LevelingAlgorithm::Serial),
        || level_resources_with(input, options, weights, LevelingAlgorithm::Parallel),
    );
    let (serial, parallel) = (serial?, parallel?);
    let (recommended, reason) = recommend(&serial, &parallel);
    Ok(LevelingComparison {
        serial,
        parallel,
        recommended,
        reason,
    })
}

/// Picks the better of two leveling results. Full ties go to parallel.
pub fn recommend(serial: &LevelingResult, parallel: &LevelingResult) -> (LevelingAlgorithm, String) {
    match (serial.success, parallel.success) {
        (true, false) => (
            LevelingAlgorithm::Serial,
            "only serial leveling resolved every over-allocation".to_string(),
        ),
        (false, true) => (
            LevelingAlgorithm::Parallel,
            "only parallel leveling resolved every over-allocation".to_string(),
        ),
        (true, true) => {
            let by_extension = pick_smaller(
                serial.schedule_extension_days(),
                parallel.schedule_extension_days(),
                "shorter schedule extension",
            );
            by_extension
                .or_else(|| {
                    pick_smaller(
                        serial.activities_shifted as i64,
                        parallel.activities_shifted as i64,
                        "fewer activities shifted",
                    )
                })
                .unwrap_or_else(tie)
        }
        (false, false) => pick_smaller(
            serial.remaining_over_allocations.len() as i64,
            parallel.remaining_over_allocations.len() as i64,
            "fewer remaining over-allocations",
        )
        .or_else(|| {
            pick_smaller(
                serial.schedule_extension_days(),
                parallel.schedule_extension_days(),
                "shorter schedule extension",
            )
        })
        .unwrap_or_else(tie),
    }
}

fn pick_smaller(serial: i64, parallel: i64, criterion: &str) -> Option<(LevelingAlgorithm, String)> {
    match serial.cmp(&parallel) {
        Ordering::Less => Some((
            LevelingAlgorithm::Serial,
            format!("serial leveling has {criterion} ({serial} vs {parallel})"),
        )),
        Ordering::Greater => Some((
            LevelingAlgorithm::Parallel,
            format!("parallel leveling has {criterion} ({parallel} vs {serial})"),
        )),
        Ordering::Equal => None,
    }
}

fn tie() -> (LevelingAlgorithm, String) {
    (
        LevelingAlgorithm::Parallel,
        "both strategies performed equally; parallel preferred".to_string(),
    )
}
