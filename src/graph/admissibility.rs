use crate::core::account::Category;
use crate::core::transaction::Node;

/// Category pairs (sorted) that may always carry flow.
const ALWAYS_ADMISSIBLE: [(Category, Category); 3] = [
    (Category::AssetLike, Category::AssetLike),
    (Category::AssetLike, Category::Expense),
    (Category::AssetLike, Category::Income),
];

/// Admissible only when no asset-like account takes part.
const WITHOUT_ASSETS: (Category, Category) = (Category::Expense, Category::Income);

/// Whether flow may run between two categories.
pub fn is_admissible(a: Category, b: Category, has_asset_like: bool) -> bool {
    let pair = if a <= b { (a, b) } else { (b, a) };
    ALWAYS_ADMISSIBLE.contains(&pair) || (!has_asset_like && pair == WITHOUT_ASSETS)
}

/// Symmetric relation over the nodes of one transaction stating which
/// pairs may carry flow.
///
/// Expense and income flow is mediated by an asset-like account. Only
/// when the transaction has no asset-like account at all may income
/// flow straight into expenses. The diagonal is always false.
///
/// # Examples
///
/// ```
/// use flow_reconstructor::core::account::Category;
/// use flow_reconstructor::graph::admissibility::AdmissibilityMatrix;
///
/// let m = AdmissibilityMatrix::from_categories(&[
///     Category::AssetLike,
///     Category::Expense,
///     Category::Expense,
/// ]);
/// assert!(m.allowed(0, 1));
/// assert!(!m.allowed(1, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissibilityMatrix {
    size: usize,
    /// Row-major, `size * size`.
    cells: Vec<bool>,
}

impl AdmissibilityMatrix {
    /// Build the matrix for nodes of the given categories.
    pub fn from_categories(categories: &[Category]) -> Self {
        let size = categories.len();
        let has_asset_like = categories.contains(&Category::AssetLike);
        let mut cells = vec![false; size * size];

        for i in 0..size {
            for j in (i + 1)..size {
                if is_admissible(categories[i], categories[j], has_asset_like) {
                    cells[i * size + j] = true;
                    cells[j * size + i] = true;
                }
            }
        }
        Self { size, cells }
    }

    /// Build the matrix for validated transaction nodes.
    ///
    /// Returns `None` if a node has no category (an equity account).
    pub fn for_nodes(nodes: &[Node]) -> Option<Self> {
        let categories = nodes
            .iter()
            .map(|n| n.account_type.category())
            .collect::<Option<Vec<_>>>()?;
        Some(Self::from_categories(&categories))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether flow may run between nodes `i` and `j`. Out-of-range indices
    /// are never allowed.
    pub fn allowed(&self, i: usize, j: usize) -> bool {
        i < self.size && j < self.size && self.cells[i * self.size + j]
    }

    /// Admissible unordered pairs `(i, j)` with `i < j`, row-major.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).flat_map(move |i| {
            ((i + 1)..self.size)
                .filter(move |&j| self.cells[i * self.size + j])
                .map(move |j| (i, j))
        })
    }

    pub fn pair_count(&self) -> usize {
        self.pairs().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountType;
    use rust_decimal_macros::dec;
    use Category::*;

    #[test]
    fn test_asset_mediates_income_and_expense() {
        let m = AdmissibilityMatrix::from_categories(&[Income, AssetLike, Expense]);
        assert!(m.allowed(0, 1));
        assert!(m.allowed(1, 2));
        assert!(!m.allowed(0, 2));
        assert!(!m.allowed(2, 0));
    }

    #[test]
    fn test_income_to_expense_without_assets() {
        let m = AdmissibilityMatrix::from_categories(&[Income, Expense, Expense]);
        assert!(m.allowed(0, 1));
        assert!(m.allowed(2, 0));
        assert!(!m.allowed(1, 2));
    }

    #[test]
    fn test_same_category_non_asset_disallowed() {
        let m = AdmissibilityMatrix::from_categories(&[Income, Income, AssetLike]);
        assert!(!m.allowed(0, 1));
        let m = AdmissibilityMatrix::from_categories(&[AssetLike, AssetLike]);
        assert!(m.allowed(0, 1));
    }

    #[test]
    fn test_diagonal_and_symmetry() {
        let cats = [AssetLike, Income, Expense, AssetLike, Expense];
        let m = AdmissibilityMatrix::from_categories(&cats);
        for i in 0..cats.len() {
            assert!(!m.allowed(i, i));
            for j in 0..cats.len() {
                assert_eq!(m.allowed(i, j), m.allowed(j, i));
            }
        }
        assert!(!m.allowed(0, 99));
    }

    #[test]
    fn test_pairs_row_major() {
        let m = AdmissibilityMatrix::from_categories(&[AssetLike, Expense, Expense]);
        let pairs: Vec<_> = m.pairs().collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2)]);
        assert_eq!(m.pair_count(), 2);
    }

    #[test]
    fn test_for_nodes_rejects_equity() {
        let node = |t| Node {
            account: "x".into(),
            account_type: t,
            delta: dec!(0),
        };
        assert!(AdmissibilityMatrix::for_nodes(&[node(AccountType::Bank), node(AccountType::Expense)]).is_some());
        assert!(AdmissibilityMatrix::for_nodes(&[node(AccountType::Equity)]).is_none());
    }
}
