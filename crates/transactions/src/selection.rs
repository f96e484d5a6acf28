use crate::models::Transaction;
use std::collections::BTreeSet;

/// Multi-select state for a transaction list, keyed by id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<i64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `id` and returns whether it is now selected.
    pub fn toggle(&mut self, id: i64) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn select(&mut self, id: i64) {
        self.ids.insert(id);
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// The id to open in the edit dialog; only defined for a single selection.
    pub fn edit_target(&self) -> Option<i64> {
        match self.ids.len() {
            1 => self.ids.first().copied(),
            _ => None,
        }
    }

    /// Drops ids that are no longer present in `transactions`, e.g. after a reload.
    pub fn retain_present(&mut self, transactions: &[Transaction]) {
        self.ids
            .retain(|id| transactions.iter().any(|t| t.id == *id));
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<i64> for Selection {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
