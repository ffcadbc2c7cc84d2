//! Execution reports

use serde::Serialize;
use std::time::Duration;

use crate::validators::Verdict;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every applicable step ran
    Completed,
    /// A REFRAIN step failed; finalText is the refusal marker
    Refrained,
    /// A REASK step failed; the caller should regenerate the input
    ReaskRequired,
    /// An EXCEPTION step failed
    Aborted,
}

/// What the executor did with a step's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Passed,
    /// FIX applied the corrected value
    Fixed,
    /// FILTER removed the localized segments
    Filtered,
    /// FIX/FILTER failure the validator could not correct or localize
    Unresolved,
    /// NOOP failure, recorded only
    Ignored,
    Refrained,
    Reasked,
    Raised,
}

/// One executed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub verdict: Verdict,
    pub action: StepAction,
}

/// Wall-clock timings of a run. Not part of report equality.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunTimings {
    pub total: Duration,
    /// One entry per executed step
    pub steps: Vec<Duration>,
}

/// Outcome of one pipeline run, owned by the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub overall_passed: bool,
    pub outcome: RunOutcome,
    pub steps: Vec<StepRecord>,
    pub final_text: String,
    /// Message of the EXCEPTION-policy failure that aborted the run
    pub raised_exception: Option<String>,
    #[serde(skip)]
    pub timings: RunTimings,
}

impl ExecutionReport {
    pub fn reask(&self) -> bool {
        self.outcome == RunOutcome::ReaskRequired
    }
}

impl PartialEq for ExecutionReport {
    fn eq(&self, other: &Self) -> bool {
        self.overall_passed == other.overall_passed
            && self.outcome == other.outcome
            && self.steps == other.steps
            && self.final_text == other.final_text
            && self.raised_exception == other.raised_exception
    }
}
