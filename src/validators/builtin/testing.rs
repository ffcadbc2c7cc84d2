//! Scripted validator for exercising the executor

use crate::validators::text::find_phrase;
use crate::validators::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Behavior {
    Pass,
    Fail,
    /// Fail with a corrected value that replaces the whole input
    FailWithFix(String),
    Sleep(Duration),
    Panic,
    Error(ValidationError),
    /// Fail when the input contains the needle, localizing every occurrence
    FailOn(String),
}

/// Validator whose outcome is fixed up front. Counts its invocations.
pub struct Scripted {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `evaluate` calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Validator for Scripted {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        _config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = "scripted";
        match &self.behavior {
            Behavior::Pass => Ok(Verdict::pass(name)),
            Behavior::Fail => Ok(Verdict::fail(name)),
            Behavior::FailWithFix(fixed) => Ok(Verdict::fail(name).with_corrected_value(fixed)),
            Behavior::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(Verdict::pass(name))
            }
            Behavior::Panic => panic!("scripted validator panic"),
            Behavior::Error(e) => Err(e.clone()),
            Behavior::FailOn(needle) => {
                let text = input.text();
                let spans = find_phrase(&text, needle);
                Ok(Verdict::from_outcome(name, spans.is_empty()).with_spans(spans))
            }
        }
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::RegexMatch
    }
}
