use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use freddies_rs::{compose, Arg};
use serde_json::{json, Value};

fn concat(suffix: &str) -> Arg {
    let suffix = suffix.to_string();
    Arg::func(move |text: Value, _rest: &[Value]| {
        let prefix = text.as_str().unwrap_or("");
        Ok(Value::String(format!("{prefix}{suffix}")))
    })
}

fn add(amount: i64) -> Arg {
    Arg::func(move |x: Value, _rest: &[Value]| Ok(json!(x.as_i64().unwrap_or(0) + amount)))
}

fn times(factor: i64) -> Arg {
    Arg::func(move |x: Value, _rest: &[Value]| Ok(json!(x.as_i64().unwrap_or(0) * factor)))
}

fn run(args: Vec<Arg>, primary: Value) -> Result<Value> {
    compose(args)
        .apply(primary)?
        .into_ready()
        .ok_or_else(|| anyhow!("expected a ready value"))
}

#[test]
fn composes_from_left_to_right() -> Result<()> {
    let actual = run(vec![concat("Left"), concat("To"), concat("Right")], Value::Null)?;
    assert_eq!(actual, json!("LeftToRight"));
    Ok(())
}

#[test]
fn add_then_double() -> Result<()> {
    assert_eq!(run(vec![add(1), times(2)], json!(3))?, json!(8));
    Ok(())
}

#[test]
fn accepts_a_single_list_argument() -> Result<()> {
    let list = Arg::list(vec![concat("Left"), concat("To"), concat("Right")]);
    assert_eq!(run(vec![list], Value::Null)?, json!("LeftToRight"));
    Ok(())
}

#[test]
fn accepts_multiple_list_arguments() -> Result<()> {
    let first = Arg::list(vec![concat("freddies"), concat(" can")]);
    let second = Arg::list(vec![concat(" accept"), concat(" multiple"), concat(" array")]);
    let third = Arg::list(vec![concat(" arguments")]);
    assert_eq!(
        run(vec![first, second, third], Value::Null)?,
        json!("freddies can accept multiple array arguments")
    );
    Ok(())
}

#[test]
fn accepts_mixed_function_and_list_arguments() -> Result<()> {
    let a = concat("freddies");
    let b = Arg::list(vec![concat(" can"), concat(" accept"), concat(" mixed")]);
    let c = concat(" function");
    let d = Arg::list(vec![concat(" and"), concat(" array"), concat(" arguments")]);
    assert_eq!(
        run(vec![a, b, c, d], Value::Null)?,
        json!("freddies can accept mixed function and array arguments")
    );
    Ok(())
}

#[test]
fn accepts_arbitrarily_nested_lists() -> Result<()> {
    let nested = Arg::list(vec![
        concat("freddies"),
        Arg::list(vec![
            concat(" can"),
            Arg::list(vec![
                concat(" accept"),
                Arg::list(vec![
                    concat(" arbitrarily"),
                    Arg::list(vec![
                        concat(" nested"),
                        Arg::list(vec![concat(" array"), Arg::list(vec![concat(" arguments")])]),
                    ]),
                ]),
            ]),
        ]),
    ]);
    assert_eq!(
        run(vec![nested], Value::Null)?,
        json!("freddies can accept arbitrarily nested array arguments")
    );
    Ok(())
}

#[test]
fn nested_lists_behave_like_spliced_arguments() -> Result<()> {
    let nested = run(
        vec![add(1), Arg::list(vec![times(3), Arg::list(vec![add(-2)])])],
        json!(4),
    )?;
    let flat = run(vec![add(1), times(3), add(-2)], json!(4))?;
    assert_eq!(nested, flat);
    assert_eq!(flat, json!(13));
    Ok(())
}

#[test]
fn no_arguments_is_identity() -> Result<()> {
    let composite = compose(Vec::<Arg>::new());
    assert!(composite.is_identity());
    let outcome = composite.call(json!("whatever"), &[json!("ignored")])?;
    assert_eq!(outcome.into_ready(), Some(json!("whatever")));
    Ok(())
}

#[test]
fn empty_list_is_identity() -> Result<()> {
    assert_eq!(run(vec![Arg::List(Vec::new())], json!({ "a": 1 }))?, json!({ "a": 1 }));
    Ok(())
}

#[test]
fn constants_ignore_their_inputs() -> Result<()> {
    let composite = compose(vec![Arg::from("a constant value")]);
    let actual = composite
        .call(json!("ignored"), &[json!("parameters")])?
        .into_ready();
    assert_eq!(actual, Some(json!("a constant value")));

    assert_eq!(run(vec![Arg::from(json!(42)), add(1)], json!(0))?, json!(43));
    assert_eq!(run(vec![Arg::from(Value::Null)], json!(7))?, Value::Null);
    Ok(())
}

#[test]
fn explicit_constants_keep_arrays_whole() -> Result<()> {
    assert_eq!(run(vec![Arg::constant(json!([1, 2]))], json!(0))?, json!([1, 2]));
    Ok(())
}

#[test]
fn trailing_arguments_are_fixed_for_every_step() -> Result<()> {
    let seen: Arc<Mutex<Vec<Vec<Value>>>> = Arc::new(Mutex::new(Vec::new()));
    let record = |seen: Arc<Mutex<Vec<Vec<Value>>>>| {
        Arg::func(move |x: Value, rest: &[Value]| {
            seen.lock().unwrap().push(rest.to_vec());
            Ok(json!(x.as_i64().unwrap_or(0) * 10))
        })
    };

    let composite = compose(vec![record(seen.clone()), record(seen.clone())]);
    let actual = composite.call(json!(1), &[json!("y"), json!(2)])?.into_ready();

    assert_eq!(actual, Some(json!(100)));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    for rest in seen.iter() {
        assert_eq!(rest, &vec![json!("y"), json!(2)]);
    }
    Ok(())
}

#[test]
fn synchronous_errors_stop_the_chain() {
    let reached = Arc::new(Mutex::new(false));
    let reached_clone = reached.clone();
    let failing = Arg::func(|_x: Value, _rest: &[Value]| -> Result<Value> {
        Err(anyhow!("boom"))
    });
    let after = Arg::func(move |x: Value, _rest: &[Value]| {
        *reached_clone.lock().unwrap() = true;
        Ok(x)
    });

    let err = compose(vec![add(1), failing, after])
        .apply(json!(1))
        .unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert!(!*reached.lock().unwrap());
}

#[test]
fn composites_nest_as_arguments() -> Result<()> {
    let inner = compose(vec![add(1), times(2)]);
    assert_eq!(run(vec![Arg::from(inner.clone()), add(1)], json!(3))?, json!(9));

    let composite = freddies_rs::compose![inner, "done"];
    assert_eq!(composite.apply(json!(0))?.into_ready(), Some(json!("done")));
    Ok(())
}

#[test]
fn composites_can_be_called_repeatedly() -> Result<()> {
    let composite = compose(vec![add(1)]);
    for n in 0..3 {
        assert_eq!(composite.apply(json!(n))?.into_ready(), Some(json!(n + 1)));
    }
    Ok(())
}
