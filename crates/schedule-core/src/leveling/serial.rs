//! Serial leveling: fix the single worst over-allocation, recompute, repeat.

use crate::leveling::LevelingOptions;
use crate::leveling::state::LevelingState;
use crate::leveling::usage::worst_first;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

pub(super) fn run(state: &mut LevelingState<'_>, options: &LevelingOptions) -> usize {
    let mut iterations = 0;
    let mut parked: BTreeSet<(String, i64)> = BTreeSet::new();

    loop {
        let worst = state
            .conflicts()
            .into_iter()
            .filter(|conflict| !parked.contains(&conflict.key()))
            .min_by(worst_first);
        let Some(conflict) = worst else {
            break;
        };
        if iterations >= options.max_iterations {
            state.warn(format!(
                "iteration cap of {} reached with over-allocations remaining",
                options.max_iterations
            ));
            break;
        }
        iterations += 1;

        let Some(resource) = state.resource_index(&conflict.resource_id) else {
            parked.insert(conflict.key());
            continue;
        };
        debug!(
            resource = %conflict.resource_id,
            date = %conflict.date,
            excess = conflict.excess(),
            "serial leveling conflict"
        );

        let mut candidates = state.contributors(resource, conflict.offset);
        candidates.sort_by(|&a, &b| lowest_priority_first(state, a, b));

        let mut rejections = Vec::new();
        let mut resolved = false;
        for node in candidates {
            if state.exceeds_standard_capacity(node, resource) {
                rejections.push(format!(
                    "activity {} alone exceeds the capacity of {}",
                    state.activity_id(node),
                    conflict.resource_id
                ));
                continue;
            }
            let new_start =
                state.early_start(node) + state.delay_to_vacate(node, resource, conflict.offset);
            match state.try_shift(node, resource, new_start, conflict.shift_reason()) {
                Ok(()) => {
                    resolved = true;
                    break;
                }
                Err(rejection) => rejections.push(rejection.to_string()),
            }
        }

        if !resolved {
            state.warn(format!(
                "over-allocation of {} on {} left unresolved: {}",
                conflict.resource_id,
                conflict.date,
                rejections.join("; ")
            ));
            parked.insert(conflict.key());
        }
    }

    iterations
}

/// Largest total float, then latest start, then largest id.
fn lowest_priority_first(state: &LevelingState<'_>, a: usize, b: usize) -> Ordering {
    state
        .total_float(b)
        .cmp(&state.total_float(a))
        .then(state.early_start(b).cmp(&state.early_start(a)))
        .then(state.activity_id(b).cmp(&state.activity_id(a)))
}
