//! Request/response boundary
//!
//! Input:
//! ```json
//! {"text": "...", "pipeline": [{"validator": "pii_detector", "config": {}, "onFail": "FIX"}]}
//! ```
//! Output:
//! ```json
//! {"passed": true, "finalText": "...", "verdicts": [...], "error": null,
//!  "reask": false, "outcome": "completed", "requestId": "1a2b3c4d"}
//! ```
//!
//! | status | when |
//! |---|---|
//! | 200 | the pipeline ran (any outcome other than EXCEPTION) |
//! | 400 | unknown validator, invalid config, empty pipeline, oversized text, malformed body |
//! | 422 | a step with the EXCEPTION policy failed |
//! | 499 | the run was cancelled |

mod service;
mod types;

pub use service::{
    GuardrailService, ServiceStats, STATUS_BAD_REQUEST, STATUS_CANCELLED, STATUS_INTERNAL,
    STATUS_OK, STATUS_VALIDATION_FAILED,
};
pub use types::{ServiceResponse, StepRequest, ValidateRequest, ValidateResponse, VerdictView};
