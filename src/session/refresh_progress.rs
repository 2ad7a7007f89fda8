//! Progress reporting for [`Session::refresh_all`](super::Session::refresh_all)
//!
//! A front-end that wants a progress bar creates a [`feedback_channel`], hands the sender to `refresh_all` and
//! watches the receiver. Only the latest [`RefreshEvent`] is kept.

use std::fmt::{Display, Error, Formatter};

use crate::resource::Resource;

/// Where a batch refresh stands
#[derive(Clone, Debug, PartialEq)]
pub enum RefreshEvent {
    NotStarted,
    Started,
    /// `resource` is being fetched, `done_already` of the `total` resources have been handled before it
    InProgress{ resource: Resource, done_already: usize, total: usize },
    /// `success` is false when at least one resource could not be refreshed
    Finished{ success: bool },
}

impl Display for RefreshEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            RefreshEvent::NotStarted => write!(f, "Waiting to refresh"),
            RefreshEvent::Started => write!(f, "Contacting the portal..."),
            RefreshEvent::InProgress{resource, done_already, total} => write!(f, "[{}/{}] {}...", done_already, total, resource),
            RefreshEvent::Finished{success: true} => write!(f, "Everything is up to date"),
            RefreshEvent::Finished{success: false} => write!(f, "Some resources could not be refreshed"),
        }
    }
}

impl Default for RefreshEvent {
    fn default() -> Self {
        Self::NotStarted
    }
}

pub type FeedbackSender = tokio::sync::watch::Sender<RefreshEvent>;
pub type FeedbackReceiver = tokio::sync::watch::Receiver<RefreshEvent>;

/// Create the channel `refresh_all` publishes its [`RefreshEvent`]s on
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(RefreshEvent::default())
}

/// Counts the resources that failed during a batch refresh, and forwards events to the listener if there is one
pub struct RefreshProgress {
    failures: u32,
    listener: Option<FeedbackSender>,
}

impl RefreshProgress {
    pub fn new() -> Self {
        Self { failures: 0, listener: None }
    }

    pub fn new_with_feedback_channel(listener: FeedbackSender) -> Self {
        Self { failures: 0, listener: Some(listener) }
    }

    pub fn is_success(&self) -> bool {
        self.failures == 0
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// A failure that stops the batch
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
        self.failures += 1;
    }

    /// A resource that could not be refreshed, its cached copy is still usable
    pub fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.failures += 1;
    }

    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }

    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }

    pub fn feedback(&mut self, event: RefreshEvent) {
        if let Some(sender) = &self.listener {
            // The front-end may have dropped its receiver
            let _ = sender.send(event);
        }
    }
}

impl Default for RefreshProgress {
    fn default() -> Self {
        Self::new()
    }
}
