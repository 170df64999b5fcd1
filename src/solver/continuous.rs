use crate::solver::{FlowAssignment, FlowProblem, FlowSolver, SolveError};
use good_lp::solvers::microlp::microlp;
use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Linear-programming relaxation of the flow problem.
///
/// Flows are nonnegative reals and the objective minimizes total flow.
/// At most one direction per pair carrying flow is not enforced here: it
/// usually falls out of the minimization, but when many optima tie the
/// backend may pick one with flow both ways. Results are rounded to
/// `decimals` places and tie-breaking is backend-dependent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuousSolver {
    decimals: u32,
}

impl Default for ContinuousSolver {
    fn default() -> Self {
        Self { decimals: 2 }
    }
}

impl ContinuousSolver {
    /// Create a solver that rounds flows to `decimals` places.
    pub fn with_decimals(decimals: u32) -> Self {
        Self { decimals }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }
}

impl FlowSolver for ContinuousSolver {
    fn name(&self) -> &'static str {
        "continuous"
    }

    fn solve(&self, problem: &FlowProblem) -> Result<FlowAssignment, SolveError> {
        let size = problem.size();
        if problem.matrix().pair_count() == 0 {
            // every component is a settled singleton with zero delta
            return Ok(FlowAssignment::zeros(size));
        }
        let mut vars = ProblemVariables::new();

        // (from, to, flow) for both directions of every admissible pair
        let mut edges: Vec<(usize, usize, Variable)> = Vec::with_capacity(problem.edge_count());
        for (i, j) in problem.matrix().pairs() {
            edges.push((i, j, vars.add(variable().min(0))));
            edges.push((j, i, vars.add(variable().min(0))));
        }

        let objective: Expression = edges.iter().map(|&(_, _, flow)| flow).sum();
        let mut model = vars.minimise(objective).using(microlp);

        for (node, delta) in problem.deltas().iter().enumerate() {
            if problem.components().is_isolated(node) {
                continue;
            }
            let delta = delta
                .to_f64()
                .ok_or(SolveError::Unrepresentable { node })?;
            let inflow: Expression = edges
                .iter()
                .filter(|&&(_, to, _)| to == node)
                .map(|&(_, _, flow)| flow)
                .sum();
            let outflow: Expression = edges
                .iter()
                .filter(|&&(from, _, _)| from == node)
                .map(|&(_, _, flow)| flow)
                .sum();
            model = model.with(constraint!(inflow - outflow == delta));
        }

        log::trace!(
            "continuous: solving {} nodes, {} flow variables",
            size,
            edges.len()
        );
        let solution = model.solve()?;

        let mut assignment = FlowAssignment::zeros(size);
        for &(from, to, flow) in &edges {
            let raw = solution.value(flow);
            let value = Decimal::from_f64(raw)
                .ok_or_else(|| {
                    SolveError::Backend(format!("flow {} -> {} has no decimal value: {}", from, to, raw))
                })?
                .round_dp(self.decimals);
            if value > Decimal::ZERO {
                assignment.set(from, to, value);
            }
        }
        Ok(assignment)
    }
}
