//! Narrow notification sink the world reports notable moments to.
//!
//! Simulation logic never reads a sink back; it is purely an outlet for
//! surrounding UI and logs.

/// Tag attached to a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Neutral information.
    Info,
    /// Something the player should look at.
    Warning,
    /// A favourable outcome.
    Success,
}

/// Receiver of player-facing notices.
pub trait NotificationSink {
    /// Reports a tagged, short message.
    fn notify(&mut self, level: NoticeLevel, message: &str);

    /// Appends a line to the append-only log.
    fn append_log(&mut self, line: &str);
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _level: NoticeLevel, _message: &str) {}

    fn append_log(&mut self, _line: &str) {}
}

/// Sink that keeps every notice in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingSink {
    notices: Vec<(NoticeLevel, String)>,
    log: Vec<String>,
}

impl RecordingSink {
    /// Notices in the order they were reported.
    #[must_use]
    pub fn notices(&self) -> &[(NoticeLevel, String)] {
        &self.notices
    }

    /// Log lines in the order they were appended.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Number of notices carrying the given level.
    #[must_use]
    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .iter()
            .filter(|(notice, _)| *notice == level)
            .count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push((level, message.to_owned()));
    }

    fn append_log(&mut self, line: &str) {
        self.log.push(line.to_owned());
    }
}
