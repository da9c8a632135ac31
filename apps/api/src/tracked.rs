use std::fmt::Display;
use std::future::Future;

use serde::Serialize;

/// Caller-owned state of a remote-backed value: the data and the message of
/// the last failed call. A call in flight is the pending `track` future itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Tracked<T> {
    pub data: T,
    pub last_error: Option<String>,
}

impl<T> Tracked<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            last_error: None,
        }
    }

    /// Awaits `call` with the previous error cleared.
    /// A failure is recorded in `last_error` and handed back unchanged.
    pub async fn track<R, E, F>(&mut self, call: F) -> Result<R, E>
    where
        E: Display,
        F: Future<Output = Result<R, E>>,
    {
        self.last_error = None;
        let result = call.await;
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
