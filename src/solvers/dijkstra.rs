//! # Multi-stage graph search
//!
//! A Dijkstra variant over nodes `(stage, index)`. Edges are produced lazily by a callback
//! when a node leaves the frontier, and only ever lead from stage `s` to stage `s + 1`, so
//! every complete path from stage 0 to stage `N − 1` has exactly `N − 1` edges.
//!
//! ## Overview
//!
//! * [`Dijkstra`] – the frontier (a binary heap) plus the edge map recording, for every node
//!   ever reached, its best parent and accumulated cost.
//! * [`NavDijkstra`] – the staged driver: runs the frontier until a final-stage node pops,
//!   then backtracks the parent links into a `solution[stage] = index` table.
//!
//! ## Maximisation
//!
//! [`SearchOrder::Maximize`] turns each edge weight `w` into the non-negative cost
//! `MAX_EDGE_WEIGHT − w`. Because all complete paths have the same number of edges the
//! cheapest one is the one with the largest total weight. Costs are accumulated in `u64` and
//! `w` is bounded by [`MAX_EDGE_WEIGHT`], so nothing can overflow.
//!
//! ## Resumption
//!
//! [`NavDijkstra::distance_general`] takes an optional budget of node expansions. When the
//! budget runs out the frontier is left untouched and [`SolverResult::Incomplete`] is
//! returned; the next call continues where this one stopped.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use tracing::trace;

use crate::constants::MAX_STAGES;

use super::SolverResult;

/// Largest edge weight accepted by [`Dijkstra::link`].
pub const MAX_EDGE_WEIGHT: u64 = 1 << 32;

/// Node of the staged graph, ordered by stage then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanTaskPoint {
    pub stage: usize,
    pub index: usize,
}

impl ScanTaskPoint {
    pub fn new(stage: usize, index: usize) -> Self {
        ScanTaskPoint { stage, index }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub parent: ScanTaskPoint,
    pub cost: u64,
}

/// Frontier and edge map of a single search.
#[derive(Debug, Clone)]
pub struct Dijkstra {
    order: SearchOrder,
    edges: BTreeMap<ScanTaskPoint, Edge>,
    queue: BinaryHeap<Reverse<(u64, u64, ScanTaskPoint)>>,
    sequence: u64,
    current_value: u64,
}

impl Dijkstra {
    pub fn new(order: SearchOrder) -> Self {
        Dijkstra {
            order,
            edges: BTreeMap::new(),
            queue: BinaryHeap::new(),
            sequence: 0,
            current_value: 0,
        }
    }

    pub fn order(&self) -> SearchOrder {
        self.order
    }

    /// Forget every node and empty the frontier.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.queue.clear();
        self.sequence = 0;
        self.current_value = 0;
    }

    /// `true` when the frontier holds no node.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn edges(&self) -> &BTreeMap<ScanTaskPoint, Edge> {
        &self.edges
    }

    pub fn parent(&self, node: ScanTaskPoint) -> Option<ScanTaskPoint> {
        self.edges.get(&node).map(|edge| edge.parent)
    }

    /// Accumulated cost of the node popped last.
    pub fn current_value(&self) -> u64 {
        self.current_value
    }

    /// Pretend the node with accumulated cost `value` was popped last.
    ///
    /// Used to link further edges from a node that left the frontier in an earlier search.
    pub fn set_current_value(&mut self, value: u64) {
        self.current_value = value;
    }

    fn edge_cost(&self, weight: u64) -> u64 {
        debug_assert!(weight <= MAX_EDGE_WEIGHT);
        match self.order {
            SearchOrder::Minimize => weight,
            SearchOrder::Maximize => MAX_EDGE_WEIGHT - weight.min(MAX_EDGE_WEIGHT),
        }
    }

    fn push(&mut self, node: ScanTaskPoint, cost: u64) {
        self.queue.push(Reverse((cost, self.sequence, node)));
        self.sequence += 1;
    }

    /// Add a start node; its parent is itself.
    ///
    /// Return
    /// ----------
    /// * `false` if the node was already known.
    pub fn link_start(&mut self, node: ScanTaskPoint) -> bool {
        if self.edges.contains_key(&node) {
            return false;
        }
        self.edges.insert(node, Edge { parent: node, cost: 0 });
        self.push(node, 0);
        true
    }

    /// Reach `node` from `parent`, the node popped last, through an edge of weight `weight`.
    ///
    /// Return
    /// ----------
    /// * `true` if this improved the node's recorded cost.
    pub fn link(&mut self, node: ScanTaskPoint, parent: ScanTaskPoint, weight: u64) -> bool {
        let cost = self.current_value + self.edge_cost(weight);

        match self.edges.get_mut(&node) {
            Some(edge) if edge.cost <= cost => return false,
            Some(edge) => *edge = Edge { parent, cost },
            None => {
                self.edges.insert(node, Edge { parent, cost });
            }
        }
        self.push(node, cost);
        true
    }

    /// Remove the cheapest node from the frontier.
    ///
    /// Entries superseded by a cheaper link are skipped.
    pub fn pop(&mut self) -> Option<ScanTaskPoint> {
        while let Some(Reverse((cost, _, node))) = self.queue.pop() {
            if self.edges.get(&node).is_some_and(|edge| edge.cost == cost) {
                self.current_value = cost;
                return Some(node);
            }
        }
        None
    }

    /// Follow the parent links from `node` down to its start node.
    pub fn find_start(&self, node: ScanTaskPoint) -> ScanTaskPoint {
        let mut node = node;
        while let Some(parent) = self.parent(node) {
            if parent.stage >= node.stage {
                break;
            }
            node = parent;
        }
        node
    }

    /// Weight of the path ending at `node`, in the units passed to [`Dijkstra::link`].
    pub fn path_weight(&self, node: ScanTaskPoint) -> Option<u64> {
        let edge = self.edges.get(&node)?;
        Some(match self.order {
            SearchOrder::Minimize => edge.cost,
            SearchOrder::Maximize => MAX_EDGE_WEIGHT * node.stage as u64 - edge.cost,
        })
    }
}

/// Staged driver around [`Dijkstra`].
#[derive(Debug, Clone)]
pub struct NavDijkstra {
    num_stages: usize,
    solution: [usize; MAX_STAGES],
    pub dijkstra: Dijkstra,
}

impl NavDijkstra {
    /// Panics
    /// ----------
    /// * If `num_stages` is zero or larger than [`MAX_STAGES`].
    pub fn new(num_stages: usize, order: SearchOrder) -> Self {
        assert!(
            num_stages > 0 && num_stages <= MAX_STAGES,
            "stage count {num_stages} outside 1..={MAX_STAGES}"
        );
        NavDijkstra {
            num_stages,
            solution: [0; MAX_STAGES],
            dijkstra: Dijkstra::new(order),
        }
    }

    pub fn num_stages(&self) -> usize {
        self.num_stages
    }

    pub fn is_final(&self, node: ScanTaskPoint) -> bool {
        node.stage + 1 == self.num_stages
    }

    /// Point index chosen for each stage by the last successful search.
    pub fn solution(&self) -> &[usize] {
        &self.solution[..self.num_stages]
    }

    fn backtrack(&mut self, destination: ScanTaskPoint) {
        let mut node = destination;
        loop {
            self.solution[node.stage] = node.index;
            match self.dijkstra.parent(node) {
                Some(parent) if parent.stage < node.stage => node = parent,
                _ => break,
            }
        }
    }

    /// Run the search.
    ///
    /// Arguments
    /// -----------------
    /// * `budget` – Maximum number of node expansions, or `None` for no limit.
    /// * `add_edges` – Called for each popped non-final node; links its successors.
    ///
    /// Return
    /// ----------
    /// * [`SolverResult::Valid`] when a final-stage node popped; [`NavDijkstra::solution`]
    ///   then holds the path.
    /// * [`SolverResult::Incomplete`] when the budget ran out with a non-empty frontier.
    /// * [`SolverResult::Failed`] when the frontier emptied without reaching the last stage.
    ///
    /// The second element is the number of expansions performed.
    pub fn distance_general<F>(&mut self, budget: Option<usize>, mut add_edges: F) -> (SolverResult, usize)
    where
        F: FnMut(&mut Dijkstra, ScanTaskPoint),
    {
        let mut expansions = 0;

        while let Some(node) = self.dijkstra.pop() {
            if self.is_final(node) {
                self.backtrack(node);
                trace!(expansions, stage = node.stage, index = node.index, "search reached final stage");
                return (SolverResult::Valid, expansions);
            }

            add_edges(&mut self.dijkstra, node);
            expansions += 1;

            if self.dijkstra.is_empty() {
                break;
            }
            if budget.is_some_and(|budget| expansions >= budget) {
                return (SolverResult::Incomplete, expansions);
            }
        }

        (SolverResult::Failed, expansions)
    }
}

#[cfg(test)]
mod dijkstra_test {
    use super::*;

    /// Weights of a complete layered graph: `w(i, j) = |values[j] - values[i]|`.
    fn layered_edges(values: &'static [u64]) -> impl FnMut(&mut Dijkstra, ScanTaskPoint) {
        move |dijkstra: &mut Dijkstra, origin: ScanTaskPoint| {
            for j in origin.index..values.len() {
                let w = values[j].abs_diff(values[origin.index]);
                dijkstra.link(ScanTaskPoint::new(origin.stage + 1, j), origin, w);
            }
        }
    }

    fn start_all(nav: &mut NavDijkstra, n: usize) {
        for i in 0..n {
            nav.dijkstra.link_start(ScanTaskPoint::new(0, i));
        }
    }

    #[test]
    fn test_maximize_picks_longest_path() {
        static VALUES: [u64; 5] = [0, 10, 3, 20, 1];
        let mut nav = NavDijkstra::new(3, SearchOrder::Maximize);
        start_all(&mut nav, VALUES.len());

        let (result, _) = nav.distance_general(None, layered_edges(&VALUES));
        assert_eq!(result, SolverResult::Valid);
        // 0 -> 20 -> 1 gives 20 + 19
        assert_eq!(nav.solution(), &[0, 3, 4]);
        let weight = nav.dijkstra.path_weight(ScanTaskPoint::new(2, 4)).unwrap();
        assert_eq!(weight, 39);
    }

    #[test]
    fn test_minimize_picks_shortest_path() {
        static VALUES: [u64; 4] = [5, 9, 7, 8];
        let mut nav = NavDijkstra::new(3, SearchOrder::Minimize);
        nav.dijkstra.link_start(ScanTaskPoint::new(0, 0));
        let (result, _) = nav.distance_general(None, |dijkstra, origin| {
            // forbid staying on the same point
            for j in origin.index + 1..VALUES.len() {
                let w = VALUES[j].abs_diff(VALUES[origin.index]);
                dijkstra.link(ScanTaskPoint::new(origin.stage + 1, j), origin, w);
            }
        });
        assert_eq!(result, SolverResult::Valid);
        assert_eq!(nav.solution()[0], 0);
        let end = ScanTaskPoint::new(2, nav.solution()[2]);
        assert_eq!(nav.dijkstra.path_weight(end), Some(3));
    }

    #[test]
    fn test_budget_resumes_to_same_answer() {
        static VALUES: [u64; 8] = [4, 17, 2, 30, 11, 0, 25, 9];

        let mut full = NavDijkstra::new(4, SearchOrder::Maximize);
        start_all(&mut full, VALUES.len());
        let (result, _) = full.distance_general(None, layered_edges(&VALUES));
        assert_eq!(result, SolverResult::Valid);

        let mut stepped = NavDijkstra::new(4, SearchOrder::Maximize);
        start_all(&mut stepped, VALUES.len());
        let mut incomplete = 0;
        loop {
            match stepped.distance_general(Some(3), layered_edges(&VALUES)).0 {
                SolverResult::Incomplete => incomplete += 1,
                SolverResult::Valid => break,
                SolverResult::Failed => panic!("search failed"),
            }
        }
        assert!(incomplete >= 2);
        assert_eq!(stepped.solution(), full.solution());
    }

    #[test]
    fn test_empty_frontier_fails() {
        let mut nav = NavDijkstra::new(3, SearchOrder::Maximize);
        nav.dijkstra.link_start(ScanTaskPoint::new(0, 0));
        let (result, expansions) = nav.distance_general(None, |_, _| {});
        assert_eq!(result, SolverResult::Failed);
        assert_eq!(expansions, 1);
    }

    #[test]
    fn test_link_keeps_cheaper_edge() {
        let mut dijkstra = Dijkstra::new(SearchOrder::Minimize);
        let a = ScanTaskPoint::new(0, 0);
        let b = ScanTaskPoint::new(0, 1);
        let target = ScanTaskPoint::new(1, 2);
        assert!(dijkstra.link_start(a));
        assert!(!dijkstra.link_start(a));
        dijkstra.link_start(b);

        assert!(dijkstra.link(target, a, 10));
        assert!(dijkstra.link(target, b, 4));
        assert!(!dijkstra.link(target, a, 7));
        assert_eq!(dijkstra.parent(target), Some(b));

        assert_eq!(dijkstra.pop(), Some(a));
        assert_eq!(dijkstra.pop(), Some(b));
        assert_eq!(dijkstra.pop(), Some(target));
        assert_eq!(dijkstra.current_value(), 4);
        assert_eq!(dijkstra.pop(), None);
    }

    #[test]
    #[should_panic]
    fn test_too_many_stages_panics() {
        let _ = NavDijkstra::new(MAX_STAGES + 1, SearchOrder::Maximize);
    }
}
