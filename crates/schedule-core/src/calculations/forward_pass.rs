use crate::activity::DependencyType;
use crate::graph::ScheduleDag;
use petgraph::graph::NodeIndex;

/// Early dates per node, indexed by `NodeIndex::index()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyDates {
    pub early_start: Vec<i64>,
    pub early_finish: Vec<i64>,
}

impl EarlyDates {
    pub fn project_finish(&self) -> i64 {
        self.early_finish.iter().copied().max().unwrap_or(0)
    }
}

pub struct ForwardPass<'a> {
    dag: &'a ScheduleDag,
    order: &'a [NodeIndex],
}

impl<'a> ForwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag, order: &'a [NodeIndex]) -> Self {
        Self { dag, order }
    }

    /// `start_floors`, when given, holds a start-no-earlier-than offset per node.
    pub fn execute(&self, durations: &[i64], start_floors: Option<&[i64]>) -> EarlyDates {
        let n = self.dag.len();
        let mut early_start = vec![0_i64; n];
        let mut early_finish = vec![0_i64; n];

        for &node in self.order {
            let idx = node.index();
            let duration = durations[idx];

            // Predecessors precede `node` in the order, so their dates are final.
            let mut es = self
                .dag
                .predecessors(node)
                .map(|(pred, link)| {
                    let p = pred.index();
                    match link.kind {
                        DependencyType::FinishToStart => early_finish[p] + link.lag,
                        DependencyType::StartToStart => early_start[p] + link.lag,
                        DependencyType::FinishToFinish => early_finish[p] + link.lag - duration,
                        DependencyType::StartToFinish => early_start[p] + link.lag - duration,
                    }
                })
                .fold(0_i64, i64::max);

            if let Some(floors) = start_floors {
                es = es.max(floors[idx]);
            }

            early_start[idx] = es;
            early_finish[idx] = es + duration;
        }

        EarlyDates {
            early_start,
            early_finish,
        }
    }
}
