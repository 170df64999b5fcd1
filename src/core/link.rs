use crate::core::account::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One directed, positive-valued edge of a reconstructed flow graph.
///
/// `value` of money moved from `source` to `target` within one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: AccountId,
    pub target: AccountId,
    pub value: Decimal,
}

impl Link {
    /// Create a new link.
    pub fn new(source: impl Into<AccountId>, target: impl Into<AccountId>, value: Decimal) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

/// The links reconstructed for a single transaction.
///
/// Order is stable for a fixed input and strategy. No two links share a
/// `(source, target)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSet {
    links: Vec<Link>,
}

impl LinkSet {
    /// Create an empty link set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_links(links: Vec<Link>) -> Self {
        Self { links }
    }

    /// Links in the order they were extracted.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    /// Value of the link from `source` to `target`, zero if absent.
    pub fn value(&self, source: &AccountId, target: &AccountId) -> Decimal {
        self.links
            .iter()
            .find(|l| &l.source == source && &l.target == target)
            .map(|l| l.value)
            .unwrap_or(Decimal::ZERO)
    }

    /// Incoming minus outgoing value for an account. Reproduces the
    /// account's delta when the reconstruction conserves flow.
    pub fn net_flow(&self, account: &AccountId) -> Decimal {
        self.links.iter().fold(Decimal::ZERO, |acc, l| {
            if &l.target == account {
                acc + l.value
            } else if &l.source == account {
                acc - l.value
            } else {
                acc
            }
        })
    }

    /// Net flow of every account touched by a link.
    pub fn net_flows(&self) -> HashMap<AccountId, Decimal> {
        let mut flows: HashMap<AccountId, Decimal> = HashMap::new();
        for link in &self.links {
            *flows.entry(link.source.clone()).or_insert(Decimal::ZERO) -= link.value;
            *flows.entry(link.target.clone()).or_insert(Decimal::ZERO) += link.value;
        }
        flows
    }

    /// Sum of all link values.
    pub fn total_value(&self) -> Decimal {
        self.links.iter().map(|l| l.value).sum()
    }

    /// Links with `account` at either end.
    pub fn touching<'a>(&'a self, account: &'a AccountId) -> impl Iterator<Item = &'a Link> + 'a {
        self.links
            .iter()
            .filter(move |l| &l.source == account || &l.target == account)
    }
}

impl IntoIterator for LinkSet {
    type Item = Link;
    type IntoIter = std::vec::IntoIter<Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

impl<'a> IntoIterator for &'a LinkSet {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn paycheck() -> LinkSet {
        LinkSet::from_links(vec![
            Link::new("salary", "checking", dec!(13.8)),
            Link::new("checking", "rent", dec!(27.32)),
            Link::new("checking", "food", dec!(9.9)),
        ])
    }

    #[test]
    fn test_net_flow_matches_deltas() {
        let links = paycheck();
        assert_eq!(links.net_flow(&AccountId::new("salary")), dec!(-13.8));
        assert_eq!(links.net_flow(&AccountId::new("checking")), dec!(-23.42));
        assert_eq!(links.net_flow(&AccountId::new("rent")), dec!(27.32));
        let flows = links.net_flows();
        assert_eq!(flows.values().copied().sum::<Decimal>(), Decimal::ZERO);
    }

    #[test]
    fn test_value_lookup() {
        let links = paycheck();
        assert_eq!(
            links.value(&AccountId::new("checking"), &AccountId::new("food")),
            dec!(9.9)
        );
        assert_eq!(
            links.value(&AccountId::new("food"), &AccountId::new("checking")),
            Decimal::ZERO
        );
        assert_eq!(links.total_value(), dec!(51.02));
        assert_eq!(links.touching(&AccountId::new("checking")).count(), 3);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let links = LinkSet::from_links(vec![Link::new("a", "b", dec!(1.50))]);
        let json = serde_json::to_string(&links).unwrap();
        assert_eq!(json, r#"[{"source":"a","target":"b","value":"1.50"}]"#);
    }
}
