use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use futures::future::try_join_all;
use futures::TryFutureExt;
use serde_json::{json, Map, Value};

use crate::arg::Arg;
use crate::config::ComposeOptions;
use crate::logging::Logger;
use crate::normalize::{normalize_all, Step};
use crate::outcome::{Deferred, Outcome};
use crate::registry::Transform;

#[derive(Clone, Debug, Default)]
pub struct Composer {
    logger: Logger,
}

impl Composer {
    pub fn new(options: &ComposeOptions) -> Self {
        Self {
            logger: options.logger(),
        }
    }

    pub fn with_logger(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn compose<I>(&self, args: I) -> Composite
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        let steps = normalize_all(args);
        self.logger.debug("composite built", || {
            json!({ "steps": Value::Array(steps.iter().map(Step::describe).collect()) })
        });
        Composite {
            steps,
            logger: self.logger.clone(),
        }
    }
}

pub fn compose<I>(args: I) -> Composite
where
    I: IntoIterator,
    I::Item: Into<Arg>,
{
    Composer::default().compose(args)
}

/// The callable produced by composing a list of steps.
///
/// With no steps it is the identity on its primary argument.
#[derive(Clone)]
pub struct Composite {
    steps: Arc<[Step]>,
    logger: Logger,
}

impl Composite {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn describe(&self) -> Value {
        Value::Array(self.steps.iter().map(Step::describe).collect())
    }

    /// Runs the chain on `primary`, passing `rest` unchanged to every step.
    pub fn call(&self, primary: Value, rest: &[Value]) -> Result<Outcome> {
        let invocation = Invocation {
            rest: Arc::from(rest),
            logger: self.logger.clone(),
        };
        match invocation.run_sequence(&self.steps, primary)? {
            Outcome::Deferred(pending) => {
                let logger = self.logger.clone();
                Ok(Outcome::deferred(pending.inspect_err(move |err| {
                    logger.debug("chain rejected", || json!({ "error": err.to_string() }));
                })))
            }
            ready => Ok(ready),
        }
    }

    pub fn apply(&self, primary: Value) -> Result<Outcome> {
        self.call(primary, &[])
    }

    pub async fn run(&self, primary: Value, rest: &[Value]) -> Result<Value> {
        self.call(primary, rest)?.resolve().await
    }
}

impl Transform for Composite {
    fn call(&self, input: Value, rest: &[Value]) -> Result<Outcome> {
        Composite::call(self, input, rest)
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("steps", &self.describe())
            .finish()
    }
}

#[derive(Clone)]
struct Invocation {
    rest: Arc<[Value]>,
    logger: Logger,
}

impl Invocation {
    fn invoke(&self, step: &Step, input: Value) -> Result<Outcome> {
        self.logger
            .trace("step invoked", || json!({ "kind": step.kind() }));
        match step {
            Step::Function(func) => func.call(input, &self.rest),
            Step::Constant(value) => Ok(Outcome::Ready(value.clone())),
            Step::Sequence(steps) => self.run_sequence(steps, input),
            Step::Branch(entries) => self.run_branch(entries, input),
        }
    }

    fn run_sequence(&self, steps: &Arc<[Step]>, input: Value) -> Result<Outcome> {
        let mut current = input;
        for (index, step) in steps.iter().enumerate() {
            match self.invoke(step, current)? {
                Outcome::Ready(value) => current = value,
                Outcome::Deferred(pending) => {
                    self.logger.debug("chain deferred", || {
                        json!({ "step": index, "remaining": steps.len() - index - 1 })
                    });
                    return Ok(self.clone().resume(steps.clone(), index + 1, pending));
                }
            }
        }
        Ok(Outcome::Ready(current))
    }

    fn resume(self, steps: Arc<[Step]>, next: usize, pending: Deferred) -> Outcome {
        Outcome::deferred(async move { self.settle(&steps[next..], pending).await })
    }

    async fn settle(&self, steps: &[Step], pending: Deferred) -> Result<Value> {
        let mut current = pending.await?;
        for step in steps {
            current = self.invoke(step, current)?.resolve().await?;
        }
        Ok(current)
    }

    fn run_branch(&self, entries: &Arc<[(String, Step)]>, input: Value) -> Result<Outcome> {
        let mut output = match input {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut pending = Vec::new();
        for (key, step) in entries.iter() {
            let field = output.get(key).cloned().unwrap_or(Value::Null);
            match self.invoke(step, field)? {
                Outcome::Ready(value) => {
                    output.insert(key.clone(), value);
                }
                Outcome::Deferred(future) => pending.push((key.clone(), future)),
            }
        }
        if pending.is_empty() {
            return Ok(Outcome::Ready(Value::Object(output)));
        }

        self.logger.debug("branch deferred", || {
            let keys: Vec<&str> = pending.iter().map(|(key, _)| key.as_str()).collect();
            json!({ "keys": keys })
        });
        let settling = pending
            .into_iter()
            .map(|(key, future)| future.map_ok(move |value| (key, value)));
        Ok(Outcome::deferred(async move {
            output.extend(try_join_all(settling).await?);
            Ok(Value::Object(output))
        }))
    }
}
