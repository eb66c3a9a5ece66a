//! The message channel between running filters and any interested listener.
//!
//! Filters never talk to a concrete listener type. They emit through a
//! `MessageSink` that stamps every message with the emitting filter's
//! identity and pipeline position, then relays it synchronously, in emission
//! order, to every registered observer.

use std::cell::RefCell;
use std::rc::Rc;

use colored::Colorize;

/// The severity class of a pipeline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Status,
    Warning,
    Error,
}

/// One message emitted by a filter during data-check or execute.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineMessage {
    pub filter_name: String,
    pub filter_human_label: String,
    /// The emitting filter's position in the pipeline. `usize::MAX` when the
    /// filter runs standalone, outside any pipeline.
    pub filter_index: usize,
    pub kind: MessageKind,
    /// The filter's error code for warnings/errors; 0 for status messages.
    pub code: i32,
    pub text: String,
}

/// A listener for pipeline messages. Implemented by UIs, logs, and test
/// harnesses alike; the pipeline only knows this trait.
pub trait PipelineObserver {
    fn on_message(&mut self, message: &PipelineMessage);
}

/// Stamps and relays messages for exactly one filter invocation.
pub struct MessageSink<'a> {
    filter_name: &'a str,
    filter_human_label: &'a str,
    filter_index: usize,
    progress_interval: usize,
    observers: &'a mut [Box<dyn PipelineObserver>],
}

impl<'a> MessageSink<'a> {
    pub fn new(
        filter_name: &'a str,
        filter_human_label: &'a str,
        filter_index: usize,
        progress_interval: usize,
        observers: &'a mut [Box<dyn PipelineObserver>],
    ) -> Self {
        Self {
            filter_name,
            filter_human_label,
            filter_index,
            progress_interval,
            observers,
        }
    }

    /// A sink with no listeners, for filters invoked outside a pipeline.
    pub fn detached(filter_name: &'a str, filter_human_label: &'a str) -> Self {
        Self::new(filter_name, filter_human_label, usize::MAX, 100, &mut [])
    }

    /// How many units of work to process between status messages.
    pub fn progress_interval(&self) -> usize {
        self.progress_interval
    }

    pub fn status(&mut self, text: impl Into<String>) {
        self.emit(MessageKind::Status, 0, text.into());
    }

    pub fn warning(&mut self, code: i32, text: impl Into<String>) {
        self.emit(MessageKind::Warning, code, text.into());
    }

    pub fn error(&mut self, code: i32, text: impl Into<String>) {
        self.emit(MessageKind::Error, code, text.into());
    }

    fn emit(&mut self, kind: MessageKind, code: i32, text: String) {
        let message = PipelineMessage {
            filter_name: self.filter_name.to_string(),
            filter_human_label: self.filter_human_label.to_string(),
            filter_index: self.filter_index,
            kind,
            code,
            text,
        };
        for observer in self.observers.iter_mut() {
            observer.on_message(&message);
        }
    }
}

//==================================================================================
// Built-in Observers
//==================================================================================

/// Prints messages to stderr, colorized by severity.
#[derive(Default)]
pub struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn on_message(&mut self, message: &PipelineMessage) {
        let tag = format!("[{}:{}]", message.filter_index, message.filter_name);
        match message.kind {
            MessageKind::Status => eprintln!("{} {}", tag.as_str().dimmed(), message.text),
            MessageKind::Warning => {
                eprintln!("{} {} {}", tag, "warning".yellow(), message.text)
            }
            MessageKind::Error => eprintln!(
                "{} {} ({}) {}",
                tag,
                "error".red().bold(),
                message.code,
                message.text
            ),
        }
    }
}

/// Records every message behind a shared handle so a caller can hand the
/// observer to a pipeline and still read the transcript afterwards. Used by
/// tests and by any surface that re-attributes failures to positions.
#[derive(Default, Clone)]
pub struct RecordingObserver {
    messages: Rc<RefCell<Vec<PipelineMessage>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything recorded so far, in emission order.
    pub fn messages(&self) -> Vec<PipelineMessage> {
        self.messages.borrow().clone()
    }

    pub fn errors(&self) -> Vec<PipelineMessage> {
        self.messages
            .borrow()
            .iter()
            .filter(|m| m.kind == MessageKind::Error)
            .cloned()
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_message(&mut self, message: &PipelineMessage) {
        self.messages.borrow_mut().push(message.clone());
    }
}
