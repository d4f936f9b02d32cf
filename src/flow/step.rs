//! Plumbing shared by flow steps.
//!
//! A step receives the per-node `kwargs`, the flow-wide `global_data` and the
//! flow's transient `trans_data`, reports through a [`StepLog`] that is shown
//! on the node, and answers with a plain success flag. Retries belong to the
//! engine that scheduled the step.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInputs {
    #[serde(default)]
    pub kwargs: JsonValue,
    #[serde(default)]
    pub global_data: JsonValue,
    #[serde(default = "empty_object")]
    pub trans_data: JsonValue,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(JsonMap::new())
}

impl StepInputs {
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        let value = match key {
            "kwargs" => &self.kwargs,
            "global_data" => &self.global_data,
            "trans_data" => &self.trans_data,
            _ => return None,
        };
        if value.is_null() { None } else { Some(value) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputItem {
    pub name: &'static str,
    pub key: &'static str,
    pub required: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepLogLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepLogEntry {
    pub level: StepLogLevel,
    pub message: String,
}

/// Node-scoped log; every entry is also emitted through `tracing`.
#[derive(Clone, Debug)]
pub struct StepLog {
    step: String,
    entries: Vec<StepLogEntry>,
}

impl StepLog {
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            entries: Vec::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(step = %self.step, "{message}");
        self.push(StepLogLevel::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(step = %self.step, "{message}");
        self.push(StepLogLevel::Error, message);
    }

    fn push(&mut self, level: StepLogLevel, message: String) {
        self.entries.push(StepLogEntry { level, message });
    }

    pub fn entries(&self) -> &[StepLogEntry] {
        &self.entries
    }

    pub fn count(&self, level: StepLogLevel) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }
}

pub trait FlowStep {
    fn code(&self) -> &'static str;

    fn inputs_format(&self) -> &'static [InputItem];

    fn execute(&self, inputs: &StepInputs, log: &mut StepLog) -> bool;

    /// Check declared inputs, then execute.
    fn run(&self, inputs: &StepInputs, log: &mut StepLog) -> bool {
        let missing = self
            .inputs_format()
            .iter()
            .filter(|item| item.required && inputs.get(item.key).is_none())
            .map(|item| item.key)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            log.error(format!(
                "{} is missing required inputs: {}",
                self.code(),
                missing.join(", ")
            ));
            return false;
        }
        self.execute(inputs, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl FlowStep for Echo {
        fn code(&self) -> &'static str {
            "echo"
        }

        fn inputs_format(&self) -> &'static [InputItem] {
            &[InputItem {
                name: "kwargs",
                key: "kwargs",
                required: true,
            }]
        }

        fn execute(&self, _: &StepInputs, log: &mut StepLog) -> bool {
            log.info("ran");
            true
        }
    }

    #[test]
    fn run_refuses_missing_required_inputs() {
        let mut log = StepLog::new("echo");
        assert!(!Echo.run(&StepInputs::default(), &mut log));
        assert_eq!(log.count(StepLogLevel::Error), 1);
        assert!(log.entries()[0].message.contains("kwargs"));
    }

    #[test]
    fn trans_data_defaults_to_empty_object() {
        let inputs: StepInputs =
            serde_json::from_value(json!({"kwargs": {}, "global_data": {}})).unwrap();
        assert_eq!(inputs.trans_data, json!({}));
        let mut log = StepLog::new("echo");
        assert!(Echo.run(&inputs, &mut log));
        assert_eq!(log.count(StepLogLevel::Info), 1);
    }
}
