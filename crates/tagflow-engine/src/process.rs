//! Process orchestration: running a selector over element collections.
//!
//! A process owns one selector, an ordered list of subsequent stages, the
//! meta value shared with every step, and a minimum notice level of
//! interest. Sequential execution lives here; the parallel batch mode is in
//! [`crate::parallel`].

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tagflow_model::{DataKind, Element, Level, Notice, RunResult};

use crate::error::EngineError;
use crate::selector::Selector;
use crate::step::Step;

/// Runs elements over chains, linked by a selector and optional subsequent
/// stages.
pub struct Process<V: DataKind, M> {
    pub(crate) id: Option<String>,
    pub(crate) selector: Selector<V, M>,
    pub(crate) stages: Vec<Process<V, M>>,
    /// Read-only, shared by reference with every step and worker.
    pub(crate) meta: Arc<M>,
    pub(crate) notice_level: Level,
}

impl<V: DataKind, M> Clone for Process<V, M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            selector: self.selector.clone(),
            stages: self.stages.clone(),
            meta: Arc::clone(&self.meta),
            notice_level: self.notice_level,
        }
    }
}

impl<V: DataKind, M> Process<V, M> {
    pub fn new(selector: Selector<V, M>, meta: M) -> Self {
        Self {
            id: None,
            selector,
            stages: Vec::new(),
            meta: Arc::new(meta),
            notice_level: Level::Error,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a subsequent stage; its elements are the output elements of the
    /// stage before it.
    pub fn with_stage(mut self, stage: Process<V, M>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Minimum notice level reported in stage-end logs. Defaults to ERROR.
    pub fn with_notice_level(mut self, level: Level) -> Self {
        self.notice_level = level;
        self
    }

    pub(crate) fn stage_name(&self) -> &str {
        self.id.as_deref().unwrap_or("process")
    }

    /// Run the whole pipeline sequentially, in element supply order.
    ///
    /// Stage results feed the next stage in declaration order; stage-level
    /// notices are carried forward into the final result. A stage whose batch
    /// application fails wholesale yields zero elements, which truncates the
    /// remaining pipeline for this batch.
    pub fn run(&self, elements: Vec<Element<V>>) -> RunResult<V> {
        let mut result = self.run_stage(elements);
        for stage in &self.stages {
            let elements = std::mem::take(&mut result.elements);
            let carried = std::mem::take(&mut result.notices);
            result = stage.run_stage(elements);
            result.notices.extend(carried);
        }
        result
    }

    /// Apply the selector to one batch of elements.
    ///
    /// Per-element failures have already been downgraded to notices by the
    /// selector; anything escaping it here, including a panic out of user
    /// code, aborts the stage: the result is emptied and a single
    /// stage-failure notice is recorded.
    fn run_stage(&self, elements: Vec<Element<V>>) -> RunResult<V> {
        let supplied = elements.len();
        let outcome = catch_unwind(AssertUnwindSafe(
            move || -> Result<Vec<Element<V>>, EngineError> {
                let mut out = Vec::with_capacity(elements.len());
                for mut element in elements {
                    self.selector.apply(&mut element, &self.meta)?;
                    out.push(element);
                }
                Ok(out)
            },
        ));

        match outcome {
            Ok(Ok(elements)) => {
                self.report_stage(&elements, supplied);
                RunResult {
                    elements,
                    notices: BTreeSet::new(),
                }
            }
            Ok(Err(err)) => self.stage_failure(err.to_string()),
            Err(panic) => self.stage_failure(panic_message(panic.as_ref())),
        }
    }

    fn stage_failure(&self, message: String) -> RunResult<V> {
        tracing::error!(stage = self.stage_name(), message, "stage aborted");
        let mut result = RunResult::empty();
        result.push_notice(Notice::error(format!(
            "process '{}' could not run: {message}",
            self.stage_name()
        )));
        result
    }

    fn report_stage(&self, elements: &[Element<V>], supplied: usize) {
        let flagged = elements
            .iter()
            .filter(|e| e.has_at_least(self.notice_level))
            .count();
        tracing::debug!(
            stage = self.stage_name(),
            supplied,
            flagged,
            min_level = %self.notice_level,
            "stage complete"
        );
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
