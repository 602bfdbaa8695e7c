use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

use crate::arg::Arg;
use crate::compose::{Composer, Composite};
use crate::registry::Registry;

const CALL_KEY: &str = "$call";
const CONST_KEY: &str = "$const";

/// Converts a JSON pipeline description into composition arguments.
///
/// The description is an array of top-level arguments. `{"$call": "name"}`
/// refers to a registered transform and `{"$const": value}` keeps `value` as
/// a constant even when it is an array or an object.
pub fn parse_pipeline(value: &Value, registry: &Registry) -> Result<Vec<Arg>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("pipeline must be an array, got {value}"))?;
    items.iter().map(|item| parse_arg(item, registry)).collect()
}

pub fn compose_pipeline(value: &Value, registry: &Registry) -> Result<Composite> {
    compose_pipeline_with(&Composer::default(), value, registry)
}

pub fn compose_pipeline_with(
    composer: &Composer,
    value: &Value,
    registry: &Registry,
) -> Result<Composite> {
    let args = parse_pipeline(value, registry)?;
    Ok(composer.compose(args))
}

fn parse_arg(value: &Value, registry: &Registry) -> Result<Arg> {
    match value {
        Value::Array(items) => {
            let parsed = items
                .iter()
                .map(|item| parse_arg(item, registry))
                .collect::<Result<Vec<_>>>()?;
            Ok(Arg::List(parsed))
        }
        Value::Object(map) => {
            if let Some(directive) = parse_directive(map, registry) {
                return directive;
            }
            let mut entries = Vec::with_capacity(map.len());
            for (key, entry) in map {
                entries.push((key.clone(), parse_arg(entry, registry)?));
            }
            Ok(Arg::branch(entries))
        }
        other => Ok(Arg::Const(other.clone())),
    }
}

fn parse_directive(map: &Map<String, Value>, registry: &Registry) -> Option<Result<Arg>> {
    if map.len() != 1 {
        return None;
    }
    if let Some(target) = map.get(CALL_KEY) {
        let resolved = match target.as_str() {
            Some(name) => registry.resolve(name),
            None => Err(anyhow!("`{CALL_KEY}` must be a string, got {target}")),
        };
        return Some(resolved);
    }
    map.get(CONST_KEY).map(|constant| Ok(Arg::Const(constant.clone())))
}
