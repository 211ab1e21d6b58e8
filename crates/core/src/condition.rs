//! Named condition predicates attached to a policy.
//!
//! Each key in `Policy::conditions` is both the condition's name *and* the
//! context field it inspects (e.g. a `"remoteIPAddress"` condition reads
//! `request.context["remoteIPAddress"]`). Conditions compile once, at
//! snapshot install time; a condition that fails to compile or evaluate
//! degrades to "does not match" rather than panicking or erroring the
//! request (per the evaluator's edge-case rules).

use std::net::IpAddr;

use chrono::{NaiveTime, Timelike, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw, uncompiled condition as it appears in a stored `Policy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConditionSpec {
    /// Discriminator, e.g. `"CIDRCondition"`, `"TimeWindowCondition"`,
    /// `"BoolEqualsCondition"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific options, interpreted by [`compile_condition`].
    #[serde(default)]
    pub options: Value,
}

/// A compiled, ready-to-evaluate condition.
#[derive(Debug, Clone)]
pub enum CompiledCondition {
    /// `context[name]` must parse as an IP address inside this network.
    Cidr(IpNetwork),
    /// The current UTC time-of-day must fall within `[start, end)`.
    TimeWindow {
        /// Inclusive start of the window.
        start: NaiveTime,
        /// Exclusive end of the window.
        end: NaiveTime,
    },
    /// `context[name]` must equal this boolean exactly.
    BoolEquals(bool),
    /// A condition whose type or options could not be understood; always
    /// evaluates false rather than aborting evaluation.
    Unknown,
}

/// Compile a raw condition. Never fails: a malformed spec compiles to
/// [`CompiledCondition::Unknown`], matching the spec's "condition evaluation
/// errors produce condition-false, not a panic" rule.
pub fn compile_condition(spec: &ConditionSpec) -> CompiledCondition {
    match spec.kind.as_str() {
        "CIDRCondition" => spec
            .options
            .get("cidr")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<IpNetwork>().ok())
            .map_or(CompiledCondition::Unknown, CompiledCondition::Cidr),
        "TimeWindowCondition" => {
            let start = spec
                .options
                .get("start")
                .and_then(Value::as_str)
                .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M:%S").ok());
            let end = spec
                .options
                .get("end")
                .and_then(Value::as_str)
                .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M:%S").ok());
            match (start, end) {
                (Some(start), Some(end)) => CompiledCondition::TimeWindow { start, end },
                _ => CompiledCondition::Unknown,
            }
        }
        "BoolEqualsCondition" => spec
            .options
            .get("value")
            .and_then(Value::as_bool)
            .map_or(CompiledCondition::Unknown, CompiledCondition::BoolEquals),
        _ => CompiledCondition::Unknown,
    }
}

impl CompiledCondition {
    /// Evaluate against the context value registered under this condition's
    /// name (`None` if the request's context omitted that key).
    pub fn evaluate(&self, context_value: Option<&Value>) -> bool {
        match self {
            CompiledCondition::Cidr(network) => context_value
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<IpAddr>().ok())
                .is_some_and(|addr| network.contains(addr)),
            CompiledCondition::TimeWindow { start, end } => {
                let now = Utc::now().time().with_nanosecond(0).unwrap_or_default();
                if start <= end {
                    now >= *start && now < *end
                } else {
                    // Window wraps past midnight.
                    now >= *start || now < *end
                }
            }
            CompiledCondition::BoolEquals(expected) => {
                context_value.and_then(Value::as_bool) == Some(*expected)
            }
            CompiledCondition::Unknown => false,
        }
    }
}
