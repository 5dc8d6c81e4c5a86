//! User-visible outcome reporting.
//!
//! Every operation outcome the console surfaces to the user flows
//! through a notice channel. The channel is unbounded and send failures
//! are ignored, so an outcome arriving after the consumer has gone away
//! is safely dropped.

use tokio::sync::mpsc;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    /// A successful outcome.
    Info,
    /// A failure the user should see.
    Error,
}

/// A user-visible outcome report.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
}

/// Receiving end of the notice channel.
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Sending end of the notice channel.
///
/// Cheap to clone; one sender is shared by every synchronizer and the
/// session manager. Sends to a dropped receiver are no-ops.
#[derive(Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    /// Reports a success.
    pub fn info(&self, message: impl Into<String>) {
        self.send(NoticeSeverity::Info, message.into());
    }

    /// Reports a failure.
    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeSeverity::Error, message.into());
    }

    fn send(&self, severity: NoticeSeverity, message: String) {
        let _ = self.tx.send(Notice { severity, message });
    }
}

/// Creates a notice channel.
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}
