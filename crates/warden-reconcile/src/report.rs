//! Reporter: accumulated events and the final severity.
//!
//! Severity only ever goes up: ok → warning → disaster. The invoking
//! scheduler reads it from the exit code (0 / 1 / 2), a monitoring
//! convention that must not change.

use std::fmt;

/// Overall outcome of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Severity {
    /// Everything consistent
    #[default]
    Ok,
    /// Manual attention recommended, not urgent
    Warning,
    /// Fatal condition, the run was aborted
    Disaster,
}

impl Severity {
    /// Process exit code for the scheduler.
    pub const fn exit_code(self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Disaster => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => f.write_str("ok"),
            Severity::Warning => f.write_str("warning"),
            Severity::Disaster => f.write_str("disaster"),
        }
    }
}

/// Level of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Fatal,
}

impl EventLevel {
    /// Severity an event at this level raises the report to.
    pub const fn severity(self) -> Severity {
        match self {
            EventLevel::Info => Severity::Ok,
            EventLevel::Warn => Severity::Warning,
            EventLevel::Fatal => Severity::Disaster,
        }
    }
}

/// One diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: EventLevel,
    pub message: String,
}

impl Event {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Warn,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Fatal,
            message: message.into(),
        }
    }
}

/// Events of one invocation plus the severity they add up to.
#[derive(Debug, Default)]
pub struct Report {
    events: Vec<Event>,
    severity: Severity,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and log it.
    ///
    /// Convergence passes re-run every check, so a warning identical to one
    /// already recorded is dropped. Info lines describe applied writes and
    /// are always kept.
    pub fn record(&mut self, event: Event) {
        if event.level == EventLevel::Warn && self.events.contains(&event) {
            return;
        }
        match event.level {
            EventLevel::Info => tracing::info!("{}", event.message),
            EventLevel::Warn => tracing::warn!("{}", event.message),
            EventLevel::Fatal => tracing::error!("{}", event.message),
        }
        self.severity = self.severity.max(event.level.severity());
        self.events.push(event);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Event::info(message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Event::warn(message));
    }

    pub fn fatal(&mut self, message: impl Into<String>) {
        self.record(Event::fatal(message));
    }

    /// Record a batch of events in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.record(event);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events at one level, in recording order.
    pub fn messages(&self, level: EventLevel) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .filter(move |e| e.level == level)
            .map(|e| e.message.as_str())
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn exit_code(&self) -> u8 {
        self.severity.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_monitoring_convention() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Disaster.exit_code(), 2);
    }

    #[test]
    fn starts_ok_and_info_keeps_it_ok() {
        let mut report = Report::new();
        assert_eq!(report.severity(), Severity::Ok);
        report.info("tagging member");
        assert_eq!(report.severity(), Severity::Ok);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn severity_never_downgrades() {
        let mut report = Report::new();
        report.warn("dead member");
        assert_eq!(report.severity(), Severity::Warning);
        report.fatal("inventory corrupt");
        assert_eq!(report.severity(), Severity::Disaster);
        report.warn("another warning");
        report.info("and some info");
        assert_eq!(report.severity(), Severity::Disaster);
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn repeated_warnings_are_recorded_once() {
        let mut report = Report::new();
        report.warn("member 10.0.0.9:27017 seems to be dead");
        report.warn("member 10.0.0.9:27017 seems to be dead");
        report.info("member 10.0.0.9:27017 seems to be dead");
        assert_eq!(report.events().len(), 2);
        assert_eq!(report.messages(EventLevel::Warn).count(), 1);
    }

    #[test]
    fn repeated_info_lines_are_all_kept() {
        let mut report = Report::new();
        report.info("c.members[0].tags={\"all\":\"all\",\"az\":\"us-east-1a\"}");
        report.info("c.members[0].tags={\"all\":\"all\",\"az\":\"us-east-1a\"}");
        assert_eq!(report.messages(EventLevel::Info).count(), 2);
        assert_eq!(report.severity(), Severity::Ok);
    }

    #[test]
    fn extend_preserves_order() {
        let mut report = Report::new();
        report.extend(vec![Event::info("a"), Event::warn("b"), Event::info("c")]);
        let all: Vec<_> = report.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(all, ["a", "b", "c"]);
        assert_eq!(report.severity(), Severity::Warning);
    }
}
