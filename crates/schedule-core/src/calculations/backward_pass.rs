use crate::activity::DependencyType;
use crate::calculations::forward_pass::EarlyDates;
use crate::graph::ScheduleDag;
use petgraph::graph::NodeIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LateDates {
    pub late_start: Vec<i64>,
    pub late_finish: Vec<i64>,
}

pub struct BackwardPass<'a> {
    dag: &'a ScheduleDag,
    order: &'a [NodeIndex],
}

impl<'a> BackwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag, order: &'a [NodeIndex]) -> Self {
        Self { dag, order }
    }

    pub fn execute(&self, durations: &[i64], early: &EarlyDates) -> LateDates {
        let n = self.dag.len();
        let project_end = early.project_finish();
        let mut late_start = vec![0_i64; n];
        let mut late_finish = vec![0_i64; n];

        // Reverse topological order
        for &node in self.order.iter().rev() {
            let idx = node.index();
            let duration = durations[idx];

            // Determine allowed late finish from successors
            let lf = self
                .dag
                .successors(node)
                .map(|(succ, link)| {
                    let s = succ.index();
                    match link.kind {
                        DependencyType::FinishToStart => late_start[s] - link.lag,
                        DependencyType::StartToStart => late_start[s] - link.lag + duration,
                        DependencyType::FinishToFinish => late_finish[s] - link.lag,
                        DependencyType::StartToFinish => late_finish[s] - link.lag + duration,
                    }
                })
                .min()
                .unwrap_or(project_end);

            late_finish[idx] = lf;
            late_start[idx] = lf - duration;
        }

        LateDates {
            late_start,
            late_finish,
        }
    }
}
