//! Min-cost flow on small directed networks.
//!
//! The network is given as a flat arc list; the solver answers with the flow
//! carried by every arc, so callers can rebuild the paths it chose.

use std::collections::VecDeque;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowArc {
    pub from: usize,
    pub to: usize,
    pub capacity: i64,
    pub cost: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNetwork {
    nb_nodes: usize,
    source: usize,
    sink: usize,
    arcs: Vec<FlowArc>,
    /// Cap on the total flow leaving the source.
    source_cap: Option<i64>,
    /// Cap on the total flow entering the sink.
    sink_cap: Option<i64>,
}

impl FlowNetwork {
    pub fn new(nb_nodes: usize, source: usize, sink: usize) -> Self {
        Self { nb_nodes, source, sink, arcs: vec![], source_cap: None, sink_cap: None }
    }

    pub fn add_arc(&mut self, from: usize, to: usize, capacity: i64, cost: i64) -> usize {
        debug_assert!(from < self.nb_nodes && to < self.nb_nodes);
        self.arcs.push(FlowArc { from, to, capacity, cost });
        self.arcs.len() - 1
    }

    pub fn with_source_cap(mut self, cap: i64) -> Self {
        self.source_cap = Some(cap);
        self
    }

    pub fn with_sink_cap(mut self, cap: i64) -> Self {
        self.sink_cap = Some(cap);
        self
    }

    pub fn nb_nodes(&self) -> usize {
        self.nb_nodes
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn sink(&self) -> usize {
        self.sink
    }

    pub fn arcs(&self) -> &[FlowArc] {
        &self.arcs
    }

    /// The tighter of the two degree caps, if any.
    pub fn flow_cap(&self) -> Option<i64> {
        match (self.source_cap, self.sink_cap) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Optimal,
    /// The augmentation budget ran out before optimality was proven.
    IterationLimit,
    /// The residual network contains a negative cycle.
    NegativeCycle,
}

impl Display for FlowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowStatus::Optimal => write!(f, "optimal"),
            FlowStatus::IterationLimit => write!(f, "iteration-limit"),
            FlowStatus::NegativeCycle => write!(f, "negative-cycle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSolution {
    pub status: FlowStatus,
    /// Total flow sent from source to sink.
    pub value: i64,
    pub cost: i64,
    /// Flow on each arc, in the order the arcs were added.
    pub arc_flows: Vec<i64>,
}

/// Computes a maximum flow of minimum cost, honouring the network's degree caps.
pub trait FlowSolver {
    fn solve(&self, network: &FlowNetwork) -> FlowSolution;
}

/// Successive shortest augmenting paths, with Bellman-Ford (queue based)
/// shortest paths so negative arc costs are allowed as long as the input
/// network has no negative cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessiveShortestPaths {
    max_augmentations: Option<usize>,
}

const INF: i64 = i64::MAX / 4;

struct Residual {
    head: Vec<usize>,
    cap: Vec<i64>,
    cost: Vec<i64>,
    adj: Vec<Vec<usize>>,
}

impl Residual {
    fn new(network: &FlowNetwork) -> Self {
        let m = network.arcs.len();
        let mut res = Residual {
            head: Vec::with_capacity(2 * m),
            cap: Vec::with_capacity(2 * m),
            cost: Vec::with_capacity(2 * m),
            adj: vec![vec![]; network.nb_nodes()],
        };
        for arc in network.arcs.iter() {
            // edge 2i is the arc itself, 2i+1 its reverse
            res.adj[arc.from].push(res.head.len());
            res.head.push(arc.to);
            res.cap.push(arc.capacity);
            res.cost.push(arc.cost);

            res.adj[arc.to].push(res.head.len());
            res.head.push(arc.from);
            res.cap.push(0);
            res.cost.push(-arc.cost);
        }
        res
    }

    /// Shortest path tree from `source`; `Err(())` on a negative cycle.
    fn shortest_paths(&self, source: usize) -> Result<(Vec<i64>, Vec<Option<usize>>), ()> {
        let n = self.adj.len();
        let mut dist = vec![INF; n];
        let mut prev = vec![None; n];
        let mut queued = vec![false; n];
        let mut visits = vec![0_usize; n];
        let mut queue = VecDeque::new();

        dist[source] = 0;
        queue.push_back(source);
        queued[source] = true;

        while let Some(u) = queue.pop_front() {
            queued[u] = false;
            visits[u] += 1;
            if visits[u] > n {
                return Err(());
            }
            for &e in self.adj[u].iter() {
                if self.cap[e] <= 0 {
                    continue;
                }
                let v = self.head[e];
                let candidate = dist[u] + self.cost[e];
                if candidate < dist[v] {
                    dist[v] = candidate;
                    prev[v] = Some(e);
                    if !queued[v] {
                        queued[v] = true;
                        queue.push_back(v);
                    }
                }
            }
        }

        Ok((dist, prev))
    }

    fn tail(&self, e: usize) -> usize {
        self.head[e ^ 1]
    }
}

impl SuccessiveShortestPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_augmentations(max_augmentations: usize) -> Self {
        Self { max_augmentations: Some(max_augmentations) }
    }
}

impl FlowSolver for SuccessiveShortestPaths {
    fn solve(&self, network: &FlowNetwork) -> FlowSolution {
        let mut res = Residual::new(network);
        let cap = network.flow_cap().unwrap_or(INF);
        let mut value = 0_i64;
        let mut cost = 0_i64;
        let mut augmentations = 0_usize;

        let status = loop {
            if value >= cap {
                break FlowStatus::Optimal;
            }
            if self.max_augmentations.is_some_and(|max| augmentations >= max) {
                break FlowStatus::IterationLimit;
            }

            let Ok((dist, prev)) = res.shortest_paths(network.source) else {
                break FlowStatus::NegativeCycle;
            };
            if dist[network.sink] >= INF {
                break FlowStatus::Optimal;
            }

            let mut push = cap - value;
            let mut v = network.sink;
            while let Some(e) = prev[v] {
                push = push.min(res.cap[e]);
                v = res.tail(e);
            }

            let mut v = network.sink;
            while let Some(e) = prev[v] {
                res.cap[e] -= push;
                res.cap[e ^ 1] += push;
                v = res.tail(e);
            }

            value += push;
            cost += push * dist[network.sink];
            augmentations += 1;
        };

        let arc_flows = network.arcs.iter()
            .enumerate()
            .map(|(i, arc)| arc.capacity - res.cap[2 * i])
            .collect();

        FlowSolution { status, value, cost, arc_flows }
    }
}
