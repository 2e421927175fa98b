use crate::activity::DependencyType;
use crate::calculations::backward_pass::LateDates;
use crate::calculations::forward_pass::EarlyDates;
use crate::graph::ScheduleDag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatAnalysis {
    pub total_float: Vec<i64>,
    pub free_float: Vec<i64>,
}

impl FloatAnalysis {
    pub fn is_critical(&self, idx: usize) -> bool {
        self.total_float[idx] == 0
    }
}

/// Free float only looks at finish-to-start successors; activities without
/// one report their total float.
pub fn analyze(dag: &ScheduleDag, early: &EarlyDates, late: &LateDates) -> FloatAnalysis {
    let n = dag.len();
    let mut total_float = Vec::with_capacity(n);
    let mut free_float = Vec::with_capacity(n);

    for node in dag.graph.node_indices() {
        let idx = node.index();
        let tf = late.late_start[idx] - early.early_start[idx];

        let ff = dag
            .successors(node)
            .filter(|(_, link)| link.kind == DependencyType::FinishToStart)
            .map(|(succ, link)| early.early_start[succ.index()] - link.lag)
            .min()
            .map(|earliest_successor_start| earliest_successor_start - early.early_finish[idx])
            .unwrap_or(tf);

        total_float.push(tf);
        free_float.push(ff);
    }

    FloatAnalysis {
        total_float,
        free_float,
    }
}
