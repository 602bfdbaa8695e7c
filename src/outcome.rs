use std::fmt;
use std::future::Future;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

/// A value that settles later, or fails with the error of the step that produced it.
pub type Deferred = BoxFuture<'static, Result<Value>>;

pub enum Outcome {
    Ready(Value),
    Deferred(Deferred),
}

impl Outcome {
    pub fn ready(value: impl Into<Value>) -> Self {
        Outcome::Ready(value.into())
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Outcome::Deferred(future.boxed())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Outcome::Deferred(_))
    }

    pub fn into_ready(self) -> Option<Value> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Deferred(_) => None,
        }
    }

    pub async fn resolve(self) -> Result<Value> {
        match self {
            Outcome::Ready(value) => Ok(value),
            Outcome::Deferred(pending) => pending.await,
        }
    }

    /// Blocks the current thread until the outcome settles.
    pub fn wait(self) -> Result<Value> {
        futures::executor::block_on(self.resolve())
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Ready(value)
    }
}

impl From<Deferred> for Outcome {
    fn from(pending: Deferred) -> Self {
        Outcome::Deferred(pending)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Outcome::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}
