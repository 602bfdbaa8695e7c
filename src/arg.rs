use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::compose::Composite;
use crate::outcome::Outcome;
use crate::registry::{self, Transform};

/// One composition argument, before normalization.
///
/// JSON values convert by shape: arrays become lists, objects become branch
/// mappings and every other value becomes a constant. Use [`Arg::constant`]
/// to pass an array or object through unchanged.
#[derive(Clone)]
pub enum Arg {
    Func(Arc<dyn Transform>),
    List(Vec<Arg>),
    Branch(BTreeMap<String, Arg>),
    Const(Value),
}

impl Arg {
    pub fn func<F, R>(func: F) -> Self
    where
        F: Fn(Value, &[Value]) -> Result<R> + Send + Sync + 'static,
        R: Into<Outcome>,
    {
        Arg::Func(Arc::new(func))
    }

    pub fn deferred<F, Fut>(func: F) -> Self
    where
        F: Fn(Value, &[Value]) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Arg::Func(Arc::new(registry::deferred(func)))
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Arg::Const(value.into())
    }

    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        Arg::List(items.into_iter().map(Into::into).collect())
    }

    pub fn branch<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Arg)>,
        K: Into<String>,
    {
        Arg::Branch(
            entries
                .into_iter()
                .map(|(key, arg)| (key.into(), arg))
                .collect(),
        )
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Arg::List(items.into_iter().map(Arg::from).collect()),
            Value::Object(map) => Arg::Branch(
                map.into_iter()
                    .map(|(key, value)| (key, Arg::from(value)))
                    .collect(),
            ),
            other => Arg::Const(other),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Const(Value::String(value.to_string()))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Const(Value::String(value))
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Arg::List(items)
    }
}

impl From<Composite> for Arg {
    fn from(composite: Composite) -> Self {
        Arg::Func(Arc::new(composite))
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Func(_) => f.write_str("Func(..)"),
            Arg::List(items) => f.debug_tuple("List").field(items).finish(),
            Arg::Branch(entries) => f.debug_tuple("Branch").field(entries).finish(),
            Arg::Const(value) => f.debug_tuple("Const").field(value).finish(),
        }
    }
}

/// Builds a [`Composite`](crate::Composite) from heterogeneous arguments,
/// converting each one with `Arg::from`.
///
/// ```
/// use freddies_rs::{compose, Arg};
/// use serde_json::{json, Value};
///
/// let add_one = Arg::func(|x: Value, _rest: &[Value]| Ok(json!(x.as_i64().unwrap_or(0) + 1)));
/// let composite = compose![add_one, "done"];
/// assert_eq!(composite.apply(json!(1)).unwrap().into_ready(), Some(json!("done")));
/// ```
#[macro_export]
macro_rules! compose {
    ($($arg:expr),* $(,)?) => {{
        let args: ::std::vec::Vec<$crate::Arg> = ::std::vec![$($crate::Arg::from($arg)),*];
        $crate::compose(args)
    }};
}
