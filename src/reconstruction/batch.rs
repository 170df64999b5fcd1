use crate::core::link::{Link, LinkSet};
use crate::core::transaction::{Transaction, TransactionId};
use crate::reconstruction::{LinkReconstructor, ReconstructionError};
use serde::Serialize;
use std::thread;

/// Result of reconstructing one transaction of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub transaction: TransactionId,
    pub result: Result<LinkSet, ReconstructionError>,
}

impl TransactionOutcome {
    /// Whether the transaction was reconstructed.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    outcomes: Vec<TransactionOutcome>,
}

/// Counts for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub transactions: usize,
    pub reconstructed: usize,
    pub failed: usize,
    pub links: usize,
}

impl BatchReport {
    /// Outcomes in input order.
    pub fn outcomes(&self) -> &[TransactionOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Reconstructed transactions with their links.
    pub fn succeeded(&self) -> impl Iterator<Item = (&TransactionId, &LinkSet)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|links| (&o.transaction, links)))
    }

    /// Errors of the transactions that failed.
    pub fn failed(&self) -> impl Iterator<Item = &ReconstructionError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Every link of every reconstructed transaction.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.succeeded().flat_map(|(_, links)| links.iter())
    }

    /// Count transactions, failures and links.
    pub fn summary(&self) -> BatchSummary {
        let reconstructed = self.succeeded().count();
        BatchSummary {
            transactions: self.outcomes.len(),
            reconstructed,
            failed: self.outcomes.len() - reconstructed,
            links: self.links().count(),
        }
    }
}

impl LinkReconstructor {
    /// Reconstruct many transactions independently.
    ///
    /// Failures are logged and recorded in the report; they never stop the
    /// rest of the batch. With `workers > 1` the batch is split into
    /// contiguous chunks, each handled by a worker with its own clone of
    /// this reconstructor.
    pub fn reconstruct_batch(&self, transactions: &[Transaction]) -> BatchReport {
        let workers = self.config().workers.clamp(1, transactions.len().max(1));

        let outcomes: Vec<TransactionOutcome> = if workers == 1 {
            transactions.iter().map(|t| self.outcome(t)).collect()
        } else {
            let chunk = transactions.len().div_ceil(workers);
            thread::scope(|scope| {
                let handles: Vec<_> = transactions
                    .chunks(chunk)
                    .map(|part| {
                        let worker = self.clone();
                        scope.spawn(move || {
                            part.iter().map(|t| worker.outcome(t)).collect::<Vec<_>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                    .collect()
            })
        };

        let report = BatchReport { outcomes };
        let summary = report.summary();
        log::info!(
            "reconstructed {}/{} transactions ({} failed, {} links, {} worker(s))",
            summary.reconstructed,
            summary.transactions,
            summary.failed,
            summary.links,
            workers
        );
        report
    }

    fn outcome(&self, transaction: &Transaction) -> TransactionOutcome {
        let result = self.reconstruct(transaction);
        if let Err(e) = &result {
            log::warn!("skipping {}", e);
        }
        TransactionOutcome {
            transaction: transaction.id().clone(),
            result,
        }
    }
}
