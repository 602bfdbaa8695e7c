use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::arg::Arg;
use crate::registry::Transform;

/// A classified composition unit. Built once, shared by every invocation.
#[derive(Clone)]
pub enum Step {
    Function(Arc<dyn Transform>),
    Sequence(Arc<[Step]>),
    Branch(Arc<[(String, Step)]>),
    Constant(Value),
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Function(_) => "function",
            Step::Sequence(_) => "sequence",
            Step::Branch(_) => "branch",
            Step::Constant(_) => "constant",
        }
    }

    pub fn describe(&self) -> Value {
        match self {
            Step::Function(_) => Value::String("function".to_string()),
            Step::Sequence(steps) => Value::Array(steps.iter().map(Step::describe).collect()),
            Step::Branch(entries) => {
                let mut shape = Map::new();
                for (key, step) in entries.iter() {
                    shape.insert(key.clone(), step.describe());
                }
                json!({ "branch": shape })
            }
            Step::Constant(value) => json!({ "constant": value }),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

pub fn normalize(arg: Arg) -> Step {
    match arg {
        Arg::Func(func) => Step::Function(func),
        Arg::List(items) => {
            let mut flat = Vec::new();
            flatten_into(items, &mut flat);
            Step::Sequence(flat.into_iter().map(normalize).collect())
        }
        Arg::Branch(entries) => Step::Branch(
            entries
                .into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .collect(),
        ),
        Arg::Const(value) => Step::Constant(value),
    }
}

/// Normalizes the top-level arguments of a composition, in call order. Each
/// argument stays one step; the result is the body of the top-level sequence.
pub fn normalize_all<I>(args: I) -> Arc<[Step]>
where
    I: IntoIterator,
    I::Item: Into<Arg>,
{
    args.into_iter().map(|arg| normalize(arg.into())).collect()
}

fn flatten_into(items: Vec<Arg>, out: &mut Vec<Arg>) {
    for item in items {
        match item {
            Arg::List(nested) => flatten_into(nested, out),
            other => out.push(other),
        }
    }
}
