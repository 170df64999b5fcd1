use crate::core::link::{Link, LinkSet};
use crate::core::transaction::Node;
use crate::solver::FlowAssignment;

/// Turns a solved assignment into the transaction's link list.
///
/// Every ordered pair with strictly positive flow after rounding becomes
/// one link, in row-major node order. Pairs are unique by construction
/// and the diagonal never carries flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkExtractor {
    /// Decimal places to round to, or `None` to keep solver values as is.
    decimals: Option<u32>,
}

impl LinkExtractor {
    /// Keep solver values unchanged.
    pub fn exact() -> Self {
        Self { decimals: None }
    }

    /// Round every value to `decimals` places before filtering.
    pub fn rounded(decimals: u32) -> Self {
        Self {
            decimals: Some(decimals),
        }
    }

    /// Turn an assignment into positive links between the nodes' accounts,
    /// in row-major node order.
    pub fn extract(&self, nodes: &[Node], assignment: &FlowAssignment) -> LinkSet {
        debug_assert_eq!(nodes.len(), assignment.size());
        let links = assignment
            .positive()
            .filter(|&(from, to, _)| from != to)
            .filter_map(|(from, to, value)| {
                let value = match self.decimals {
                    Some(dp) => value.round_dp(dp),
                    None => value,
                };
                (!value.is_zero()).then(|| {
                    Link::new(nodes[from].account.clone(), nodes[to].account.clone(), value)
                })
            })
            .collect();
        LinkSet::from_links(links)
    }
}
