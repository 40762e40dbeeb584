//! Aggregated outcome of a process run.

use std::collections::BTreeSet;

use crate::element::Element;
use crate::kind::DataKind;
use crate::notice::{Level, Notice};

/// The transformed elements of a run plus its process-level notices.
///
/// Element order is stage/worker completion order, not necessarily input
/// order; callers needing the original order track it via [`Element::id`].
#[derive(Debug, Clone)]
pub struct RunResult<V: DataKind> {
    pub elements: Vec<Element<V>>,
    pub notices: BTreeSet<Notice>,
}

impl<V: DataKind> Default for RunResult<V> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            notices: BTreeSet::new(),
        }
    }
}

impl<V: DataKind> RunResult<V> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.insert(notice);
    }

    /// Elements carrying at least one notice of any of the given levels.
    pub fn elements_with(&self, levels: &[Level]) -> Vec<&Element<V>> {
        self.elements.iter().filter(|e| e.has_any(levels)).collect()
    }

    /// Element inputs passing the filter.
    pub fn inputs(&self, filter: impl Fn(&V) -> bool) -> Vec<&V> {
        self.elements
            .iter()
            .map(|e| &e.input)
            .filter(|input| filter(input))
            .collect()
    }

    /// Element outputs passing the filter. Absent outputs are kept so callers
    /// can select untransformed elements.
    pub fn outputs(&self, filter: impl Fn(Option<&V>) -> bool) -> Vec<Option<&V>> {
        self.elements
            .iter()
            .map(|e| e.output.as_ref())
            .filter(|output| filter(*output))
            .collect()
    }

    /// Elements passing an arbitrary predicate.
    pub fn filter(&self, predicate: impl Fn(&Element<V>) -> bool) -> Vec<&Element<V>> {
        self.elements.iter().filter(|e| predicate(e)).collect()
    }

    /// Merge many results: element sequences are appended in the order the
    /// results arrive, notice sets are unioned (duplicates collapse).
    pub fn concatenate(results: impl IntoIterator<Item = Self>) -> Self {
        let mut merged = Self::empty();
        for result in results {
            merged.elements.extend(result.elements);
            merged.notices.extend(result.notices);
        }
        merged
    }
}
