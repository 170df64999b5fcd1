//! Per-transaction link reconstruction.
//!
//! Pipeline for one transaction: validate and merge splits into nodes,
//! take the fast path for two nodes, otherwise build the admissibility
//! matrix, check feasibility per connected component, run the configured
//! strategy and extract links.

pub mod batch;
pub mod extractor;

use crate::config::{ConfigError, ReconstructorConfig, StrategyKind};
use crate::core::account::AccountId;
use crate::core::link::LinkSet;
use crate::core::transaction::{Node, Transaction, TransactionId, ValidationError};
use crate::graph::admissibility::AdmissibilityMatrix;
use crate::solver::{
    fast_path, FlowAssignment, FlowProblem, FlowSolver, ProblemError, SolveError, Strategy,
};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

pub use batch::{BatchReport, TransactionOutcome};
pub use extractor::LinkExtractor;

/// Per-transaction failures. None of them aborts a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconstructionError {
    #[error("transaction {transaction}: {source}")]
    Validation {
        transaction: TransactionId,
        source: ValidationError,
    },
    #[error("transaction {transaction}: no flow assignment balances accounts {}", join_ids(.accounts))]
    Infeasible {
        transaction: TransactionId,
        accounts: Vec<AccountId>,
    },
    #[error("transaction {transaction}: solve exceeded the {}ms budget", .budget.as_millis())]
    Timeout {
        transaction: TransactionId,
        budget: Duration,
    },
    #[error("transaction {transaction}: {message}")]
    Solver {
        transaction: TransactionId,
        message: String,
    },
}

fn join_ids(ids: &[AccountId]) -> String {
    ids.iter().map(AccountId::as_str).collect::<Vec<_>>().join(", ")
}

impl ReconstructionError {
    /// The transaction that failed.
    pub fn transaction(&self) -> &TransactionId {
        match self {
            ReconstructionError::Validation { transaction, .. }
            | ReconstructionError::Infeasible { transaction, .. }
            | ReconstructionError::Timeout { transaction, .. }
            | ReconstructionError::Solver { transaction, .. } => transaction,
        }
    }

    /// Short machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ReconstructionError::Validation { .. } => "validation",
            ReconstructionError::Infeasible { .. } => "infeasible",
            ReconstructionError::Timeout { .. } => "timeout",
            ReconstructionError::Solver { .. } => "solver",
        }
    }
}

/// Reconstructs the links of single transactions with a fixed strategy.
///
/// Holds only read-only configuration; every call builds and solves its
/// own problem, so one instance may be cloned per worker.
///
/// # Examples
///
/// ```
/// use flow_reconstructor::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let reconstructor = LinkReconstructor::new(ReconstructorConfig::default()).unwrap();
/// let tx = Transaction::new("t1")
///     .with_split(Split::new("checking", AccountType::Bank, dec!(-10.25)))
///     .with_split(Split::new("food", AccountType::Expense, dec!(8.66)))
///     .with_split(Split::new("soap", AccountType::Expense, dec!(1.59)));
///
/// let links = reconstructor.reconstruct(&tx).unwrap();
/// assert_eq!(links.len(), 2);
/// assert_eq!(links.net_flow(&AccountId::new("checking")), dec!(-10.25));
/// ```
#[derive(Debug, Clone)]
pub struct LinkReconstructor {
    config: ReconstructorConfig,
    strategy: Strategy,
}

impl LinkReconstructor {
    /// Validate the configuration and select its strategy.
    pub fn new(config: ReconstructorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = Strategy::from_config(&config);
        log::debug!(
            "link reconstructor: strategy={}, denomination={}, timeout={:?}",
            strategy.name(),
            config.denomination,
            config.timeout()
        );
        Ok(Self { config, strategy })
    }

    /// Reconstructor with default settings and the named strategy.
    pub fn with_strategy(strategy: &str) -> Result<Self, ConfigError> {
        Self::new(ReconstructorConfig {
            strategy: strategy.parse()?,
            ..Default::default()
        })
    }

    /// Returns the configuration this reconstructor was built with.
    pub fn config(&self) -> &ReconstructorConfig {
        &self.config
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Reconstruct the links of one transaction.
    pub fn reconstruct(&self, transaction: &Transaction) -> Result<LinkSet, ReconstructionError> {
        let id = transaction.id();
        let nodes = transaction
            .nodes(self.config.balance_tolerance)
            .map_err(|source| ReconstructionError::Validation {
                transaction: id.clone(),
                source,
            })?;

        if let Some(assignment) = fast_path(&nodes) {
            return Ok(LinkExtractor::exact().extract(&nodes, &assignment));
        }

        let matrix = AdmissibilityMatrix::for_nodes(&nodes).ok_or_else(|| {
            let account = nodes
                .iter()
                .find(|n| n.account_type.category().is_none())
                .map(|n| n.account.clone())
                .unwrap_or_else(|| nodes[0].account.clone());
            ReconstructionError::Validation {
                transaction: id.clone(),
                source: ValidationError::EquityAccount { account },
            }
        })?;

        let deltas = nodes.iter().map(|n| n.delta).collect();
        let problem = FlowProblem::new(deltas, matrix, self.config.balance_tolerance).map_err(
            |e| match e {
                ProblemError::Unbalanced(members) => ReconstructionError::Infeasible {
                    transaction: id.clone(),
                    accounts: members.iter().map(|&m| nodes[m].account.clone()).collect(),
                },
                other => ReconstructionError::Solver {
                    transaction: id.clone(),
                    message: other.to_string(),
                },
            },
        )?;

        log::debug!(
            "transaction {}: {} nodes, {} flow variables, strategy {}",
            id,
            problem.size(),
            problem.edge_count(),
            self.strategy.name()
        );

        let assignment = self
            .solve(problem)
            .map_err(|failure| self.solve_error(id, &nodes, failure))?;
        Ok(self.extractor().extract(&nodes, &assignment))
    }

    fn extractor(&self) -> LinkExtractor {
        match &self.strategy {
            Strategy::Continuous(solver) => LinkExtractor::rounded(solver.decimals()),
            Strategy::Exact(_) => LinkExtractor::exact(),
        }
    }

    /// Run the strategy, on a helper thread when a budget is configured.
    fn solve(&self, problem: FlowProblem) -> Result<FlowAssignment, SolveFailure> {
        let Some(budget) = self.config.timeout() else {
            return self.strategy.solve(&problem).map_err(SolveFailure::Solver);
        };

        let (sender, receiver) = mpsc::channel();
        let strategy = self.strategy.clone();
        thread::Builder::new()
            .name("flow-solve".to_string())
            .spawn(move || {
                // The receiver is gone when the budget expired.
                let _ = sender.send(strategy.solve(&problem));
            })
            .map_err(|e| SolveFailure::Solver(SolveError::Backend(e.to_string())))?;

        match receiver.recv_timeout(budget) {
            Ok(result) => result.map_err(SolveFailure::Solver),
            Err(RecvTimeoutError::Timeout) => Err(SolveFailure::Timeout(budget)),
            Err(RecvTimeoutError::Disconnected) => Err(SolveFailure::Solver(SolveError::Backend(
                "solver thread terminated without a result".to_string(),
            ))),
        }
    }

    fn solve_error(&self, id: &TransactionId, nodes: &[Node], failure: SolveFailure) -> ReconstructionError {
        let transaction = id.clone();
        match failure {
            SolveFailure::Timeout(budget) => ReconstructionError::Timeout { transaction, budget },
            SolveFailure::Solver(SolveError::Infeasible) => ReconstructionError::Infeasible {
                transaction,
                accounts: nodes.iter().map(|n| n.account.clone()).collect(),
            },
            SolveFailure::Solver(SolveError::Unrepresentable { node }) => {
                ReconstructionError::Validation {
                    transaction,
                    source: ValidationError::NotRepresentable {
                        account: nodes[node].account.clone(),
                        value: nodes[node].delta,
                        denomination: self.config.denomination,
                    },
                }
            }
            SolveFailure::Solver(SolveError::UnitResidual { residual }) => {
                ReconstructionError::Validation {
                    transaction,
                    source: ValidationError::Unbalanced {
                        sum: residual,
                        tolerance: self.config.balance_tolerance,
                    },
                }
            }
            SolveFailure::Solver(SolveError::Backend(message)) => {
                ReconstructionError::Solver { transaction, message }
            }
        }
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }
}

enum SolveFailure {
    Solver(SolveError),
    Timeout(Duration),
}
