use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use serde_json::Value;

use crate::arg::Arg;
use crate::outcome::Outcome;

/// A leaf transform: called with the threaded value and the fixed trailing arguments.
pub trait Transform: Send + Sync {
    fn call(&self, input: Value, rest: &[Value]) -> Result<Outcome>;
}

impl<F, R> Transform for F
where
    F: Fn(Value, &[Value]) -> Result<R> + Send + Sync + 'static,
    R: Into<Outcome>,
{
    fn call(&self, input: Value, rest: &[Value]) -> Result<Outcome> {
        (self)(input, rest).map(Into::into)
    }
}

/// Adapts a closure returning a future into a transform whose result is always deferred.
pub fn deferred<F, Fut>(func: F) -> impl Transform
where
    F: Fn(Value, &[Value]) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    move |input: Value, rest: &[Value]| -> Result<Outcome> {
        Ok(Outcome::deferred(func(input, rest)))
    }
}

#[derive(Debug)]
pub struct TransformNotFoundError {
    name: String,
}

impl TransformNotFoundError {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TransformNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transform not found: {}", self.name)
    }
}

impl std::error::Error for TransformNotFoundError {}

#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn Transform>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, name: impl Into<String>, func: F)
    where
        F: Transform + 'static,
    {
        let func_arc: Arc<dyn Transform> = Arc::new(func);
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(name.into(), func_arc);
    }

    pub fn register_deferred<F, Fut>(&self, name: impl Into<String>, func: F)
    where
        F: Fn(Value, &[Value]) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.register(name, deferred(func));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = inner.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resolve(&self, name: &str) -> Result<Arg> {
        match self.get(name) {
            Some(func) => Ok(Arg::Func(func)),
            None => Err(TransformNotFoundError {
                name: name.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}
