//! Name-indexed heuristic collections.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::problem::Problem;

use super::Heuristic;

/// An ordered, cloneable set of heuristics addressed by name.
///
/// Cloning is cheap; heuristics are shared behind `Arc`. Adding a heuristic
/// whose name is already present replaces the earlier one in place.
pub struct HeuristicPool<P: Problem> {
    heuristics: Vec<Arc<dyn Heuristic<P>>>,
}

impl<P: Problem> HeuristicPool<P> {
    pub fn new() -> Self {
        Self {
            heuristics: Vec::new(),
        }
    }

    pub fn with<H: Heuristic<P> + 'static>(mut self, heuristic: H) -> Self {
        self.push(Arc::new(heuristic));
        self
    }

    pub fn push(&mut self, heuristic: Arc<dyn Heuristic<P>>) {
        match self
            .heuristics
            .iter()
            .position(|h| h.name() == heuristic.name())
        {
            Some(i) => self.heuristics[i] = heuristic,
            None => self.heuristics.push(heuristic),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Heuristic<P>>> {
        self.heuristics.iter().find(|h| h.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.heuristics.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Heuristic<P>>> {
        self.heuristics.iter()
    }

    /// Picks a heuristic uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Arc<dyn Heuristic<P>>> {
        if self.heuristics.is_empty() {
            return None;
        }
        let i = rng.random_range(0..self.heuristics.len());
        Some(&self.heuristics[i])
    }

    /// Returns a pool holding only the named heuristics, in the given order.
    ///
    /// Unknown names are returned as the error.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, String> {
        let mut subset = Self::new();
        for name in names {
            let heuristic = self
                .get(name.as_ref())
                .ok_or_else(|| name.as_ref().to_string())?;
            subset.push(Arc::clone(heuristic));
        }
        Ok(subset)
    }

    /// One line per heuristic: `- name: description`.
    pub fn documentation(&self) -> String {
        let mut doc = String::new();
        for h in &self.heuristics {
            doc.push_str("- ");
            doc.push_str(h.name());
            if !h.description().is_empty() {
                doc.push_str(": ");
                doc.push_str(h.description());
            }
            doc.push('\n');
        }
        doc
    }
}

impl<P: Problem> Default for HeuristicPool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Problem> Clone for HeuristicPool<P> {
    fn clone(&self) -> Self {
        Self {
            heuristics: self.heuristics.clone(),
        }
    }
}

impl<P: Problem> fmt::Debug for HeuristicPool<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicPool")
            .field("heuristics", &self.names())
            .finish()
    }
}
