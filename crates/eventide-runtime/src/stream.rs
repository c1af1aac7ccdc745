//! Stream plumbing between operators.
//!
//! A stream is a named, bounded mpsc channel of events. The sending half is
//! an operator's output destination; the receiving half is the next
//! operator's input subscription. Sends are asynchronous and preserve the
//! order of emissions within one handler invocation.

use tokio::sync::mpsc;

use eventide_core::{EngineError, Event};

/// Receiving half of a stream: an operator's input subscription.
pub struct Stream {
    pub name: String,
    receiver: mpsc::Receiver<Event>,
}

impl Stream {
    pub fn new(name: impl Into<String>, receiver: mpsc::Receiver<Event>) -> Self {
        Self {
            name: name.into(),
            receiver,
        }
    }

    /// Next event, or `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

/// Sending half of a stream: an operator's output destination.
#[derive(Clone)]
pub struct StreamSender {
    pub name: String,
    sender: mpsc::Sender<Event>,
}

impl StreamSender {
    pub fn new(name: impl Into<String>, sender: mpsc::Sender<Event>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    pub async fn send(&self, event: Event) -> Result<(), EngineError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| EngineError::OutputClosed)
    }
}

/// Create a named stream channel pair.
pub fn channel(name: impl Into<String>, capacity: usize) -> (StreamSender, Stream) {
    let name = name.into();
    let (tx, rx) = mpsc::channel(capacity);
    (StreamSender::new(name.clone(), tx), Stream::new(name, rx))
}
