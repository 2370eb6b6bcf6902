use std::fmt;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::event::Record;

/// Error returned when the receiving side of a [`SourceSender`] has gone away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClosedError;

impl fmt::Display for ClosedError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str("Sender is closed.")
    }
}

impl std::error::Error for ClosedError {}

/// The output half of a source: records pushed here are owned by whoever holds the receiver.
///
/// Sends never wait on the consumer. There is no backpressure between a poll cycle and the
/// downstream pipeline.
#[derive(Clone, Debug)]
pub struct SourceSender {
    inner: mpsc::UnboundedSender<Record>,
}

impl SourceSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Record>) {
        let (inner, rx) = mpsc::unbounded_channel();
        (Self { inner }, rx)
    }

    #[cfg(test)]
    pub fn new_test() -> (Self, impl Stream<Item = Record> + Unpin) {
        let (sender, rx) = Self::new();
        (sender, UnboundedReceiverStream::new(rx))
    }

    pub fn into_stream(rx: mpsc::UnboundedReceiver<Record>) -> impl Stream<Item = Record> + Unpin {
        UnboundedReceiverStream::new(rx)
    }

    pub fn send_event(&self, record: Record) -> Result<(), ClosedError> {
        self.inner.send(record).map_err(|_| ClosedError)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn delivers_in_send_order() {
        let (sender, mut rx) = SourceSender::new_test();
        let now = Utc::now();

        sender.send_event(Record::new("a", now)).unwrap();
        sender.send_event(Record::new("b", now)).unwrap();
        drop(sender);

        assert_eq!(rx.next().await.unwrap().measurement(), "a");
        assert_eq!(rx.next().await.unwrap().measurement(), "b");
        assert!(rx.next().await.is_none());
    }

    #[test]
    fn closed_receiver_is_an_error() {
        let (sender, rx) = SourceSender::new();
        drop(rx);

        assert_eq!(
            sender.send_event(Record::new("a", Utc::now())),
            Err(ClosedError)
        );
    }
}
