use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use stream_cancel::{Trigger, Tripwire};

/// Passed to each source to coordinate the global shutdown process.
///
/// Resolves once shutdown has begun. A `noop` signal never resolves.
pub struct ShutdownSignal {
    begin: Option<Pin<Box<Tripwire>>>,
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.begin.as_mut() {
            Some(tripwire) => tripwire.as_mut().poll(cx).map(|_| ()),
            None => Poll::Pending,
        }
    }
}

impl ShutdownSignal {
    pub fn new(tripwire: Tripwire) -> Self {
        Self {
            begin: Some(Box::pin(tripwire)),
        }
    }

    /// Creates a signal together with the trigger that fires it. Dropping the trigger also
    /// fires the signal.
    pub fn new_wired() -> (Trigger, Self) {
        let (trigger, tripwire) = Tripwire::new();
        (trigger, Self::new(tripwire))
    }

    pub const fn noop() -> Self {
        Self { begin: None }
    }
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("wired", &self.begin.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn resolves_on_cancel() {
        let (trigger, signal) = ShutdownSignal::new_wired();
        trigger.cancel();

        tokio::time::timeout(Duration::from_secs(1), signal)
            .await
            .expect("signal did not resolve");
    }

    #[test]
    fn noop_never_resolves() {
        assert!(ShutdownSignal::noop().now_or_never().is_none());
    }
}
