use crate::graph::admissibility::AdmissibilityMatrix;
use petgraph::unionfind::UnionFind;
use rust_decimal::Decimal;

/// Connected components of the undirected graph of admissible pairs.
///
/// Flow can only move inside a component, so a flow assignment exists
/// exactly when every component's deltas sum to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    /// Node indices per component, ascending; components ordered by their
    /// smallest member.
    groups: Vec<Vec<usize>>,
}

impl Components {
    /// Group the nodes of a matrix into connected components.
    pub fn of(matrix: &AdmissibilityMatrix) -> Self {
        let size = matrix.size();
        let mut sets = UnionFind::<usize>::new(size);
        for (i, j) in matrix.pairs() {
            sets.union(i, j);
        }

        let labels = sets.into_labeling();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut slot: Vec<Option<usize>> = vec![None; size];
        for (node, &label) in labels.iter().enumerate() {
            match slot[label] {
                Some(g) => groups[g].push(node),
                None => {
                    slot[label] = Some(groups.len());
                    groups.push(vec![node]);
                }
            }
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Node indices of each component, in ascending order.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Whether `node` has no admissible partner at all.
    pub fn is_isolated(&self, node: usize) -> bool {
        self.groups.iter().any(|g| g.len() == 1 && g[0] == node)
    }

    /// Make every component's deltas sum to exactly zero.
    ///
    /// A residual within `tolerance` is absorbed by the member with the
    /// largest magnitude. Returns the members of the first component whose
    /// residual exceeds `tolerance`.
    pub fn settle(&self, deltas: &mut [Decimal], tolerance: Decimal) -> Result<(), Vec<usize>> {
        for group in &self.groups {
            let residual: Decimal = group.iter().map(|&n| deltas[n]).sum();
            if residual.is_zero() {
                continue;
            }
            if residual.abs() > tolerance {
                return Err(group.clone());
            }
            let anchor = largest(group, |n| deltas[n].abs());
            deltas[anchor] -= residual;
        }
        Ok(())
    }

    /// Integer counterpart of [`Components::settle`] for minor-unit deltas.
    ///
    /// Residuals of at most `slack` units are absorbed. Returns the residual
    /// of the first component that exceeds it.
    pub fn settle_units(&self, units: &mut [i64], slack: i64) -> Result<(), i64> {
        for group in &self.groups {
            let residual: i64 = group.iter().map(|&n| units[n]).sum();
            if residual == 0 {
                continue;
            }
            if residual.abs() > slack {
                return Err(residual);
            }
            let anchor = largest(group, |n| units[n].unsigned_abs());
            units[anchor] -= residual;
        }
        Ok(())
    }
}

/// First member with the largest key.
fn largest<K: PartialOrd>(group: &[usize], key: impl Fn(usize) -> K) -> usize {
    let mut best = group[0];
    for &n in &group[1..] {
        if key(n) > key(best) {
            best = n;
        }
    }
    best
}
