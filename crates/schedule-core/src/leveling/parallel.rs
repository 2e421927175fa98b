//! Parallel leveling: sweep the whole conflict matrix, earliest day first,
//! delaying the lowest scoring activities of each conflict into the earliest
//! slot with room.

use crate::leveling::priority::{PriorityWeights, priority_score};
use crate::leveling::state::LevelingState;
use crate::leveling::usage::earliest_first;
use crate::leveling::LevelingOptions;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

pub(super) fn run(
    state: &mut LevelingState<'_>,
    options: &LevelingOptions,
    weights: &PriorityWeights,
) -> usize {
    let mut iterations = 0;
    let mut parked: BTreeSet<(String, i64)> = BTreeSet::new();

    'sweep: loop {
        let all = state.conflicts();
        let over_allocated: HashSet<usize> = all
            .iter()
            .filter_map(|conflict| state.resource_index(&conflict.resource_id))
            .collect();
        let mut matrix: Vec<_> = all
            .into_iter()
            .filter(|conflict| !parked.contains(&conflict.key()))
            .collect();
        if matrix.is_empty() {
            break;
        }
        matrix.sort_by(earliest_first);
        debug!(conflicts = matrix.len(), "parallel leveling sweep");

        for conflict in &matrix {
            let Some(resource) = state.resource_index(&conflict.resource_id) else {
                parked.insert(conflict.key());
                continue;
            };
            if !state.is_over_allocated(resource, conflict.offset) {
                continue;
            }
            if iterations >= options.max_iterations {
                state.warn(format!(
                    "iteration cap of {} reached with over-allocations remaining",
                    options.max_iterations
                ));
                break 'sweep;
            }
            iterations += 1;

            let mut scored: Vec<(f64, usize)> = state
                .contributors(resource, conflict.offset)
                .into_iter()
                .map(|node| {
                    let score = priority_score(
                        weights,
                        state.is_critical(node),
                        state.resource_criticality(node, &over_allocated),
                        state.total_float(node),
                    );
                    (score, node)
                })
                .collect();
            scored.sort_by(|(score_a, a), (score_b, b)| {
                score_a
                    .total_cmp(score_b)
                    .then(state.early_start(*b).cmp(&state.early_start(*a)))
                    .then(state.activity_id(*b).cmp(&state.activity_id(*a)))
            });

            let mut rejections = Vec::new();
            for (_, node) in scored {
                if !state.is_over_allocated(resource, conflict.offset) {
                    break;
                }
                if state.exceeds_standard_capacity(node, resource) {
                    rejections.push(format!(
                        "activity {} alone exceeds the capacity of {}",
                        state.activity_id(node),
                        conflict.resource_id
                    ));
                    continue;
                }
                let vacate =
                    state.early_start(node) + state.delay_to_vacate(node, resource, conflict.offset);
                let target = state.earliest_fit(node, resource, vacate).unwrap_or(vacate);
                let mut outcome = state.try_shift(node, resource, target, conflict.shift_reason());
                if outcome.is_err() && target != vacate {
                    outcome = state.try_shift(node, resource, vacate, conflict.shift_reason());
                }
                if let Err(rejection) = outcome {
                    rejections.push(rejection.to_string());
                }
            }

            if state.is_over_allocated(resource, conflict.offset) {
                state.warn(format!(
                    "over-allocation of {} on {} left unresolved: {}",
                    conflict.resource_id,
                    conflict.date,
                    rejections.join("; ")
                ));
                parked.insert(conflict.key());
            }
        }
    }

    iterations
}
