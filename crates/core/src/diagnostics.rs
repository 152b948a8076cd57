use serde_json::Value;

use crate::error::InvalidValue;

/// A rejected value, kept for inspection after it was logged.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub property: String,
    pub value: Value,
    pub message: String,
}

impl From<InvalidValue> for Diagnostic {
    fn from(err: InvalidValue) -> Self {
        let message = err.to_string();
        Self {
            property: err.property,
            value: err.value,
            message,
        }
    }
}

/// Sink for non-fatal validation failures.
///
/// Every report is logged at `warn`; when recording is on it is also kept
/// until drained.
#[derive(Debug, Default)]
pub struct Diagnostics {
    record: bool,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(record: bool) -> Self {
        Self {
            record,
            entries: Vec::new(),
        }
    }

    pub fn report(&mut self, err: InvalidValue) {
        let diagnostic = Diagnostic::from(err);
        log::warn!("{}", diagnostic.message);
        if self.record {
            self.entries.push(diagnostic);
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_records_message() {
        let mut diagnostics = Diagnostics::new(true);
        diagnostics.report(InvalidValue::new("fillStyle", json!("no-such-color")));
        assert_eq!(diagnostics.entries().len(), 1);
        assert_eq!(
            diagnostics.entries()[0].message,
            "Unsupported value for fillStyle: no-such-color"
        );
        assert_eq!(diagnostics.take().len(), 1);
        assert!(diagnostics.entries().is_empty());
    }

    #[test]
    fn recording_can_be_disabled() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.report(InvalidValue::new("lineWidth", json!(0)));
        assert!(diagnostics.entries().is_empty());
    }
}
