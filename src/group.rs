use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::amount::Money;
use crate::currency::Currency;
use crate::error::{Error, Result};

/// A record carrying a signed balance in one currency.
pub trait Balanced {
    fn balance(&self) -> Decimal;
    fn currency(&self) -> Currency;
}

/// The records sharing one key, in the order they were seen.
///
/// Groups are derived from the record list every time they are needed and
/// are never edited directly.
#[derive(Debug)]
pub struct Group<'a, K, R> {
    key: K,
    members: Vec<&'a R>,
}

impl<'a, K, R> Group<'a, K, R> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn members(&self) -> &[&'a R] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<K: Display, R: Balanced> Group<'_, K, R> {
    /// Sum of the absolute balances of the members, in the currency of the
    /// first member.
    ///
    /// Fails with `MixedCurrency` when members do not share a currency.
    pub fn total(&self) -> Result<Money> {
        let Some(first) = self.members.first() else {
            return Ok(Money::new(Decimal::ZERO, Currency::default()));
        };
        let currency = first.currency();

        if let Some(other) = self.members.iter().find(|r| r.currency() != currency) {
            return Err(Error::MixedCurrency {
                key: self.key.to_string(),
                first: currency,
                other: other.currency(),
            });
        }

        let amount = self.members.iter().map(|r| r.balance().abs()).sum();
        Ok(Money::new(amount, currency))
    }
}

/// Partitions `records` by `key`.
///
/// Groups come out in first-seen key order and members keep their
/// relative order, so flattening the result gives back the input.
pub fn group_by<'a, K, R, F>(records: impl IntoIterator<Item = &'a R>, key: F) -> Vec<Group<'a, K, R>>
where
    K: Eq + Hash + Clone,
    F: Fn(&R) -> K,
    R: 'a,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Group<K, R>> = Vec::new();

    for r in records {
        let k = key(r);
        match index.get(&k) {
            Some(&i) => groups[i].members.push(r),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push(Group {
                    key: k,
                    members: vec![r],
                });
            }
        }
    }

    groups
}

/// Concatenates the members of `groups` in group order.
pub fn flatten<'a, K, R>(groups: &[Group<'a, K, R>]) -> Vec<&'a R> {
    groups
        .iter()
        .flat_map(|g| g.members.iter().copied())
        .collect()
}

/// The set of expanded keys of a grouped list or tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expansion<K: Ord> {
    expanded: BTreeSet<K>,
}

impl<K: Ord> Default for Expansion<K> {
    fn default() -> Self {
        Expansion {
            expanded: BTreeSet::new(),
        }
    }
}

impl<K: Ord> FromIterator<K> for Expansion<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Expansion {
            expanded: iter.into_iter().collect(),
        }
    }
}

impl<K: Ord> Expansion<K> {
    /// Everything collapsed.
    pub fn new() -> Expansion<K> {
        Expansion::default()
    }

    pub fn is_expanded(&self, key: &K) -> bool {
        self.expanded.contains(key)
    }

    /// Expands `key` if it is collapsed and collapses it otherwise.
    /// Returns whether `key` ends up expanded.
    pub fn toggle(&mut self, key: K) -> bool {
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn expand(&mut self, key: K) {
        self.expanded.insert(key);
    }

    pub fn collapse(&mut self, key: &K) {
        self.expanded.remove(key);
    }

    pub fn expand_all(&mut self, keys: impl IntoIterator<Item = K>) {
        self.expanded.extend(keys);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
