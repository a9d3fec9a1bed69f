use std::collections::HashMap;
use std::hash::Hash;

/// Occurrence counter that remembers first-seen order.
///
/// `most_common` orders by count descending and, among equal counts, by the
/// order keys were first added.
#[derive(Debug)]
pub(crate) struct Counter<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> Counter<K> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub(crate) fn get(&self, key: &K) -> usize {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    pub(crate) fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in first-seen order.
    pub(crate) fn entries(&self) -> &[(K, usize)] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<(K, usize)> {
        self.entries
    }

    pub(crate) fn most_common(self, n: usize) -> Vec<(K, usize)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}
