//! Structured output records.
//!
//! JSON mode emits exactly one top-level [`RunReport`] per invocation with the
//! outcome, any errors, buffered logs, and (when tracing) per-step trace
//! records. Text mode renders the same data as human-readable lines.

use serde::{Deserialize, Serialize};

use crate::error::{CodeLoc, RunError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Trace,
}

/// The step kinds recorded by the tracing evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStep {
    Call,
    Return,
    Let,
    Expr,
    Match,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "errorType")]
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CodeLoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&RunError> for ErrorRecord {
    fn from(err: &RunError) -> Self {
        let error_type: &'static str = err.kind.into();
        Self {
            error_type: error_type.to_owned(),
            message: err.message.clone(),
            location: err.location.clone(),
            hint: err.hint.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CodeLoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(rename = "stepType")]
    pub step_type: TraceStep,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub depth: u32,
}

/// The single top-level record of one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<TraceRecord>,
}

impl RunReport {
    #[must_use]
    pub fn success(result: Option<serde_json::Value>) -> Self {
        Self {
            status: RunStatus::Success,
            result,
            errors: Vec::new(),
            logs: Vec::new(),
            traces: Vec::new(),
        }
    }

    #[must_use]
    pub fn failure(errors: Vec<ErrorRecord>) -> Self {
        Self {
            status: RunStatus::Error,
            result: None,
            errors,
            logs: Vec::new(),
            traces: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
