use std::{
    io::IsTerminal,
    task::{Context, Poll},
};

use futures::{Stream, StreamExt, task::noop_waker_ref};
use serde::de::DeserializeOwned;

use crate::{config::GenerateConfig, trace};

pub fn trace_init() {
    let color = std::io::stdout().is_terminal();
    let levels = std::env::var("TEST_LOG").unwrap_or_else(|_| "error".to_string());

    trace::init(color, false, &levels);
}

/// Drains everything the stream has ready right now, without waiting for more.
pub fn collect_ready<S>(mut rx: S) -> Vec<S::Item>
where
    S: Stream + Unpin,
{
    let mut cx = Context::from_waker(noop_waker_ref());
    let mut items = Vec::new();
    while let Poll::Ready(Some(item)) = rx.poll_next_unpin(&mut cx) {
        items.push(item);
    }
    items
}

pub fn test_generate_config<T>()
where
    T: GenerateConfig + DeserializeOwned,
{
    let cfg = toml::to_string(&T::generate_config()).unwrap();
    toml::from_str::<T>(&cfg).expect("Invalid config generated");
}
