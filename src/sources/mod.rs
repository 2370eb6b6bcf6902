use futures::future::BoxFuture;

pub mod aws_cloudwatch_metrics;

/// A running source. Resolves once the source has shut down, or with `Err(())` when it had to
/// stop because its output went away.
pub type Source = BoxFuture<'static, Result<(), ()>>;
