use crate::solver::{FlowAssignment, FlowProblem, FlowSolver, SolveError};
use good_lp::solvers::microlp::microlp;
use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Integer flow in minor currency units with hard unidirectionality.
///
/// Deltas are scaled by `denomination` and rounded to whole units, so no
/// floating-point drift reaches the links. Every admissible pair gets a
/// binary direction variable `z` with `f(i,j) <= M*z` and
/// `f(j,i) <= M*(1-z)`, where `M` is the sum of absolute scaled deltas.
/// The backend is deterministic, so identical input yields identical links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactSolver {
    denomination: u32,
    /// Largest rounding residual per component, in minor units, that may
    /// be absorbed after scaling.
    slack_units: i64,
}

impl Default for ExactSolver {
    fn default() -> Self {
        Self::new(100)
    }
}

struct PairFlow {
    i: usize,
    j: usize,
    forward: Variable,
    backward: Variable,
}

impl ExactSolver {
    /// Create a solver for `denomination` minor units per currency unit,
    /// tolerating the default balance tolerance of 0.005.
    ///
    /// # Panics
    ///
    /// Panics if `denomination` is zero; configuration validation rejects
    /// that before a solver is built.
    pub fn new(denomination: u32) -> Self {
        assert!(denomination > 0, "denomination must be positive");
        Self {
            denomination,
            slack_units: 0,
        }
        .with_tolerance(Decimal::new(5, 3))
    }

    /// Set the balance tolerance that bounds post-rounding residuals.
    ///
    /// The tolerance is converted to minor units and rounded up, so a
    /// tolerance of 0.005 at denomination 100 absorbs one unit.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.slack_units = tolerance
            .abs()
            .checked_mul(Decimal::from(self.denomination))
            .and_then(|scaled| scaled.ceil().to_i64())
            .unwrap_or(i64::MAX);
        self
    }

    /// Minor units per currency unit.
    pub fn denomination(&self) -> u32 {
        self.denomination
    }

    /// Residual, in minor units, a component may absorb after rounding.
    pub fn slack_units(&self) -> i64 {
        self.slack_units
    }

    /// Scale deltas to whole minor units.
    ///
    /// Each component is re-balanced after rounding so conservation stays
    /// exactly solvable. A residual above the slack means the deltas are
    /// finer than the minor unit in a way that cannot balance, and yields
    /// [`SolveError::UnitResidual`].
    pub fn to_units(&self, problem: &FlowProblem) -> Result<Vec<i64>, SolveError> {
        let factor = Decimal::from(self.denomination);
        let mut units = problem
            .deltas()
            .iter()
            .enumerate()
            .map(|(node, delta)| {
                delta
                    .checked_mul(factor)
                    .and_then(|scaled| scaled.round().to_i64())
                    .ok_or(SolveError::Unrepresentable { node })
            })
            .collect::<Result<Vec<_>, _>>()?;
        problem
            .components()
            .settle_units(&mut units, self.slack_units)
            .map_err(|residual| SolveError::UnitResidual {
                residual: self.from_units(residual),
            })?;
        Ok(units)
    }

    fn from_units(&self, units: i64) -> Decimal {
        Decimal::from(units) / Decimal::from(self.denomination)
    }
}

impl FlowSolver for ExactSolver {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn solve(&self, problem: &FlowProblem) -> Result<FlowAssignment, SolveError> {
        let size = problem.size();
        let units = self.to_units(problem)?;
        if problem.matrix().pair_count() == 0 {
            return Ok(FlowAssignment::zeros(size));
        }
        let capacity = units.iter().map(|u| u.unsigned_abs()).sum::<u64>() as f64;

        let mut vars = ProblemVariables::new();
        let mut pairs: Vec<PairFlow> = Vec::with_capacity(problem.matrix().pair_count());
        let mut directions: Vec<Variable> = Vec::with_capacity(pairs.capacity());
        for (i, j) in problem.matrix().pairs() {
            pairs.push(PairFlow {
                i,
                j,
                forward: vars.add(variable().integer().min(0).max(capacity)),
                backward: vars.add(variable().integer().min(0).max(capacity)),
            });
            directions.push(vars.add(variable().binary()));
        }

        let objective: Expression = pairs
            .iter()
            .flat_map(|p| [p.forward, p.backward])
            .sum();
        let mut model = vars.minimise(objective).using(microlp);

        for (node, &delta) in units.iter().enumerate() {
            if problem.components().is_isolated(node) {
                continue;
            }
            let inflow: Expression = pairs
                .iter()
                .filter_map(|p| {
                    if p.j == node {
                        Some(p.forward)
                    } else if p.i == node {
                        Some(p.backward)
                    } else {
                        None
                    }
                })
                .sum();
            let outflow: Expression = pairs
                .iter()
                .filter_map(|p| {
                    if p.i == node {
                        Some(p.forward)
                    } else if p.j == node {
                        Some(p.backward)
                    } else {
                        None
                    }
                })
                .sum();
            model = model.with(constraint!(inflow - outflow == delta as f64));
        }

        for (pair, &direction) in pairs.iter().zip(&directions) {
            model = model.with(constraint!(pair.forward <= capacity * direction));
            model = model.with(constraint!(capacity * direction + pair.backward <= capacity));
        }

        log::trace!(
            "exact: solving {} nodes, {} pairs, capacity {} units",
            size,
            pairs.len(),
            capacity
        );
        let solution = model.solve()?;

        let mut assignment = FlowAssignment::zeros(size);
        for pair in &pairs {
            let forward = solution.value(pair.forward).round() as i64;
            let backward = solution.value(pair.backward).round() as i64;
            if forward > 0 {
                assignment.set(pair.i, pair.j, self.from_units(forward));
            }
            if backward > 0 {
                assignment.set(pair.j, pair.i, self.from_units(backward));
            }
        }
        Ok(assignment)
    }
}
