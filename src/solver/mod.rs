//! Flow solvers.
//!
//! A [`FlowProblem`] is index-based: node `i` has delta `deltas[i]` and may
//! exchange flow with node `j` iff the admissibility matrix allows it.
//! Every solver returns a [`FlowAssignment`] satisfying, for every node,
//! `incoming - outgoing = delta`, and minimizing the total flow.

pub mod continuous;
pub mod exact;

use crate::config::{ReconstructorConfig, StrategyKind};
use crate::core::transaction::Node;
use crate::graph::admissibility::AdmissibilityMatrix;
use crate::graph::components::Components;
use good_lp::ResolutionError;
use rust_decimal::Decimal;
use thiserror::Error;

pub use continuous::ContinuousSolver;
pub use exact::ExactSolver;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("no flow assignment satisfies conservation under the admissible pairs")]
    Infeasible,
    #[error("delta of node {node} does not fit the solver's number domain")]
    Unrepresentable { node: usize },
    #[error("minor-unit rounding leaves a residual of {residual}")]
    UnitResidual { residual: Decimal },
    #[error("solver backend failed: {0}")]
    Backend(String),
}

impl From<ResolutionError> for SolveError {
    fn from(e: ResolutionError) -> Self {
        match e {
            ResolutionError::Infeasible => SolveError::Infeasible,
            other => SolveError::Backend(format!("{:?}", other)),
        }
    }
}

/// Why a [`FlowProblem`] could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProblemError {
    #[error("{deltas} deltas for an admissibility matrix of size {size}")]
    SizeMismatch { deltas: usize, size: usize },
    /// Members of a connected component whose deltas do not balance.
    #[error("component {0:?} does not balance")]
    Unbalanced(Vec<usize>),
}

/// The per-transaction conservation problem for three or more nodes.
#[derive(Debug, Clone)]
pub struct FlowProblem {
    deltas: Vec<Decimal>,
    matrix: AdmissibilityMatrix,
    components: Components,
}

impl FlowProblem {
    /// Build a problem whose connected components each sum to exactly zero.
    ///
    /// Residuals up to `tolerance` are absorbed; a component with a larger
    /// residual cannot carry a feasible flow and its members are returned.
    pub fn new(
        mut deltas: Vec<Decimal>,
        matrix: AdmissibilityMatrix,
        tolerance: Decimal,
    ) -> Result<Self, ProblemError> {
        if deltas.len() != matrix.size() {
            return Err(ProblemError::SizeMismatch {
                deltas: deltas.len(),
                size: matrix.size(),
            });
        }
        let components = Components::of(&matrix);
        components
            .settle(&mut deltas, tolerance)
            .map_err(ProblemError::Unbalanced)?;
        Ok(Self {
            deltas,
            matrix,
            components,
        })
    }

    pub fn size(&self) -> usize {
        self.deltas.len()
    }

    /// Per-node deltas after residual settling.
    pub fn deltas(&self) -> &[Decimal] {
        &self.deltas
    }

    pub fn matrix(&self) -> &AdmissibilityMatrix {
        &self.matrix
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Directed flow variables the problem needs: two per admissible pair.
    pub fn edge_count(&self) -> usize {
        2 * self.matrix.pair_count()
    }
}

/// Nonnegative flow per ordered node pair, row-major `size * size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowAssignment {
    size: usize,
    flows: Vec<Decimal>,
}

impl FlowAssignment {
    /// An assignment with no flow between `size` nodes.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            flows: vec![Decimal::ZERO; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Flow from node `from` to node `to`.
    pub fn flow(&self, from: usize, to: usize) -> Decimal {
        self.flows[from * self.size + to]
    }

    /// Set the flow from node `from` to node `to`.
    pub fn set(&mut self, from: usize, to: usize, value: Decimal) {
        self.flows[from * self.size + to] = value;
    }

    /// Incoming minus outgoing flow of a node.
    pub fn net_flow(&self, node: usize) -> Decimal {
        (0..self.size)
            .map(|other| self.flow(other, node) - self.flow(node, other))
            .sum()
    }

    /// Sum of all flows.
    pub fn total(&self) -> Decimal {
        self.flows.iter().copied().sum()
    }

    /// Ordered pairs with strictly positive flow, row-major.
    pub fn positive(&self) -> impl Iterator<Item = (usize, usize, Decimal)> + '_ {
        self.flows
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_sign_positive() && !v.is_zero())
            .map(move |(k, &v)| (k / self.size, k % self.size, v))
    }
}

/// Solver-free assignment for transactions with at most two nodes.
///
/// With two parties the flow is unambiguous: the negative node pays the
/// positive one the positive node's delta. Returns `None` for three or
/// more nodes. Admissibility is not consulted.
pub fn fast_path(nodes: &[Node]) -> Option<FlowAssignment> {
    match nodes {
        [] | [_] => Some(FlowAssignment::zeros(nodes.len())),
        [a, b] => {
            let mut assignment = FlowAssignment::zeros(2);
            if a.delta < Decimal::ZERO && b.delta > Decimal::ZERO {
                assignment.set(0, 1, b.delta);
            } else if b.delta < Decimal::ZERO && a.delta > Decimal::ZERO {
                assignment.set(1, 0, a.delta);
            }
            Some(assignment)
        }
        _ => None,
    }
}

/// Capability shared by all general-path strategies.
pub trait FlowSolver {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Solve a problem with three or more nodes.
    fn solve(&self, problem: &FlowProblem) -> Result<FlowAssignment, SolveError>;
}

/// The configured general-path strategy, chosen once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Continuous(ContinuousSolver),
    Exact(ExactSolver),
}

impl Strategy {
    /// Build the strategy named by the configuration.
    pub fn from_config(config: &ReconstructorConfig) -> Self {
        match config.strategy {
            StrategyKind::Continuous => Strategy::Continuous(ContinuousSolver::default()),
            StrategyKind::Exact => Strategy::Exact(
                ExactSolver::new(config.denomination).with_tolerance(config.balance_tolerance),
            ),
        }
    }

    /// Returns the configured strategy kind.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Continuous(_) => StrategyKind::Continuous,
            Strategy::Exact(_) => StrategyKind::Exact,
        }
    }
}

impl FlowSolver for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Continuous(s) => s.name(),
            Strategy::Exact(s) => s.name(),
        }
    }

    fn solve(&self, problem: &FlowProblem) -> Result<FlowAssignment, SolveError> {
        match self {
            Strategy::Continuous(s) => s.solve(problem),
            Strategy::Exact(s) => s.solve(problem),
        }
    }
}
