//! Routing of core diagnostics into channels.
//!
//! The core only talks to the `log` facade. [`ChannelLogger`] is a `log::Log` implementation that
//! forwards every record into a `crossbeam` channel, so an embedder (an editor console, a test)
//! can drain them on its own schedule.
//!
//! [`capture`] installs a process wide `ChannelLogger` once, and routes the records emitted by the
//! *calling thread* into the returned [`Capture`]. Tests running on parallel threads therefore
//! only ever see their own records.

use std::{cell::RefCell, sync::Once};

use crossbeam::channel::{Receiver, Sender, unbounded};
use log::{Level, LevelFilter, Metadata, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// A logger that sends each record into a channel.
///
/// Records are sent to the calling thread's capture sink if one is set (see [`capture`]),
/// otherwise to the logger's own sender, if any.
pub struct ChannelLogger {
    sender: Option<Sender<LogMessage>>,
    level: LevelFilter,
}

thread_local! {
    static THREAD_SINK: RefCell<Option<Sender<LogMessage>>> = const { RefCell::new(None) };
}

static CAPTURE_LOGGER: ChannelLogger = ChannelLogger {
    sender: None,
    level: LevelFilter::Trace,
};

static INSTALL: Once = Once::new();

impl ChannelLogger {
    pub fn new(sender: Sender<LogMessage>) -> Self {
        Self {
            sender: Some(sender),
            level: LevelFilter::Info,
        }
    }

    pub fn with_receiver() -> (Self, Receiver<LogMessage>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }
}

impl log::Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = LogMessage {
            level: record.level(),
            target: record.target().to_string(),
            message: format!("{}", record.args()),
        };
        let routed = THREAD_SINK.with(|sink| match sink.borrow().as_ref() {
            Some(sender) => {
                let _ = sender.try_send(message.clone());
                true
            }
            None => false,
        });
        if !routed && let Some(sender) = &self.sender {
            let _ = sender.try_send(message);
        }
    }

    fn flush(&self) {}
}

/// Records logged by one thread while the capture is alive.
pub struct Capture {
    receiver: Receiver<LogMessage>,
    seen: RefCell<Vec<LogMessage>>,
}

impl Capture {
    /// Every record captured so far.
    pub fn messages(&self) -> Vec<LogMessage> {
        let mut seen = self.seen.borrow_mut();
        seen.extend(self.receiver.try_iter());
        seen.clone()
    }

    /// Whether a record at `level` containing `needle` was captured.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|message| message.level == level && message.message.contains(needle))
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        THREAD_SINK.with(|sink| sink.borrow_mut().take());
    }
}

/// Capture the calling thread's log records.
///
/// The first call installs the process logger. If another logger was installed first, captures
/// stay empty.
pub fn capture() -> Capture {
    INSTALL.call_once(|| {
        if log::set_logger(&CAPTURE_LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    let (sender, receiver) = unbounded();
    THREAD_SINK.with(|sink| *sink.borrow_mut() = Some(sender));
    Capture {
        receiver,
        seen: RefCell::new(Vec::new()),
    }
}
