use crate::activity::{Activity, ActivityId, Dependency, DependencyType};
use crate::error::{ScheduleCalculationReason, ScheduleError};
use crate::validation;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Edge payload: how the successor is tied to the predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub kind: DependencyType,
    pub lag: i64,
}

/// Arena of activities keyed by `NodeIndex`. Node weights are activity ids,
/// `durations` is indexed by `NodeIndex::index()`.
#[derive(Debug, Clone)]
pub struct ScheduleDag {
    pub graph: DiGraph<ActivityId, Link>,
    pub id_to_index: HashMap<ActivityId, NodeIndex>,
    pub durations: Vec<i64>,
}

impl ScheduleDag {
    pub fn build(activities: &[Activity], dependencies: &[Dependency]) -> Result<Self, ScheduleError> {
        validation::validate_activity_collection(activities)?;
        validation::validate_dependencies(activities, dependencies)?;

        let mut graph: DiGraph<ActivityId, Link> =
            DiGraph::with_capacity(activities.len(), dependencies.len());
        let mut id_to_index: HashMap<ActivityId, NodeIndex> =
            HashMap::with_capacity(activities.len());
        let mut durations = Vec::with_capacity(activities.len());

        // Add nodes first
        for activity in activities {
            let node_ix = graph.add_node(activity.id);
            id_to_index.insert(activity.id, node_ix);
            durations.push(activity.duration_days);
        }

        // Add edges: pred -> succ
        for dependency in dependencies {
            let (Some(&u), Some(&v)) = (
                id_to_index.get(&dependency.predecessor_id),
                id_to_index.get(&dependency.successor_id),
            ) else {
                continue;
            };
            graph.add_edge(
                u,
                v,
                Link {
                    kind: dependency.dependency_type,
                    lag: dependency.lag_days,
                },
            );
        }

        Ok(Self {
            graph,
            id_to_index,
            durations,
        })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn activity_id(&self, node: NodeIndex) -> ActivityId {
        self.graph[node]
    }

    pub fn index_of(&self, activity_id: ActivityId) -> Option<NodeIndex> {
        self.id_to_index.get(&activity_id).copied()
    }

    pub fn predecessors(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, Link)> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (edge.source(), *edge.weight()))
    }

    pub fn successors(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, Link)> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
    }

    pub fn has_successors(&self, node: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .next()
            .is_some()
    }

    /// Returns the first directed cycle found by depth-first search, as
    /// activity ids with the starting id repeated at the end.
    pub fn find_cycle(&self) -> Option<Vec<ActivityId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            OnPath,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        for root in self.graph.node_indices() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }
            marks[root.index()] = Mark::OnPath;
            let mut path: Vec<NodeIndex> = vec![root];
            let mut pending: Vec<Vec<NodeIndex>> = vec![self.successor_stack(root)];

            loop {
                let step = pending.last_mut().map(|frame| frame.pop());
                match step {
                    None => break,
                    Some(Some(next)) => match marks[next.index()] {
                        Mark::Unvisited => {
                            marks[next.index()] = Mark::OnPath;
                            path.push(next);
                            pending.push(self.successor_stack(next));
                        }
                        Mark::OnPath => {
                            let start = path.iter().position(|&node| node == next)?;
                            let mut cycle: Vec<ActivityId> =
                                path[start..].iter().map(|&node| self.graph[node]).collect();
                            cycle.push(self.graph[next]);
                            return Some(cycle);
                        }
                        Mark::Done => {}
                    },
                    Some(None) => {
                        pending.pop();
                        if let Some(done) = path.pop() {
                            marks[done.index()] = Mark::Done;
                        }
                    }
                }
            }
        }
        None
    }

    // neighbors come back newest-edge first; popping restores insertion order
    fn successor_stack(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect()
    }

    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, ScheduleError> {
        if let Some(cycle) = self.find_cycle() {
            return Err(ScheduleError::CircularDependency { cycle });
        }
        toposort(&self.graph, None).map_err(|cycle| {
            ScheduleError::calculation(
                ScheduleCalculationReason::NoTopologicalOrder,
                format!(
                    "no topological order exists (blocked at activity {})",
                    self.graph[cycle.node_id()]
                ),
            )
        })
    }
}
