// Accessor and mutator contracts of a single routine

mod common;

use common::{counter, Harness};
use routinely_scheduler::{RoutineBuilder, RoutineError, Value, MAX_ARGUMENTS};

#[test]
fn test_builder_fields_are_readable() {
    let h = Harness::new(1);
    let (_, callback) = counter();
    let handle = RoutineBuilder::new()
        .env("env")
        .func(callback.clone())
        .interval(250)
        .iterations(4)
        .tag("heartbeat")
        .data(42)
        .args(["a", "b"])
        .suspended(true)
        .quiet(true)
        .endure(true)
        .persistent(true)
        .yields(true)
        .build(&h.scheduler)
        .unwrap();
    let routine = h.scheduler.routine(handle);

    assert_eq!(routine.handle(), handle);
    assert_eq!(routine.env(), Ok(Value::from("env")));
    assert_eq!(routine.func(), Ok(Value::Function(callback)));
    assert_eq!(routine.interval(), Ok(250));
    assert_eq!(routine.iterations(), Ok(4));
    assert_eq!(routine.tag(), Ok("heartbeat".to_string()));
    assert_eq!(routine.data(), Ok(Value::from(42)));
    assert_eq!(routine.argument_count(), Ok(2));
    assert_eq!(routine.arguments(), Ok(vec![Value::from("a"), Value::from("b")]));
    assert_eq!(routine.suspended(), Ok(true));
    assert_eq!(routine.quiet(), Ok(true));
    assert_eq!(routine.endure(), Ok(true));
    assert_eq!(routine.persistent(), Ok(true));
    assert_eq!(routine.yields(), Ok(true));
    assert_eq!(routine.inactive(), Ok(false));
    assert_eq!(routine.result(), Ok(Value::Null));
}

#[test]
fn test_setters_round_trip() {
    let h = Harness::new(1);
    let (_, callback) = counter();
    let handle = h.scheduler.create(Value::Null, callback, 10, 0).unwrap();
    let routine = h.scheduler.routine(handle);

    routine.set_tag("renamed").unwrap();
    routine.set_env(7).unwrap();
    routine.set_data("payload").unwrap();
    routine.set_result(1.5).unwrap();
    routine.set_iterations(9).unwrap();
    routine.set_quiet(true).unwrap();
    routine.set_endure(true).unwrap();
    routine.set_persistent(true).unwrap();
    routine.set_yields(true).unwrap();

    assert_eq!(routine.tag(), Ok("renamed".to_string()));
    assert_eq!(routine.env(), Ok(Value::from(7)));
    assert_eq!(routine.data(), Ok(Value::from("payload")));
    assert_eq!(routine.result(), Ok(Value::from(1.5)));
    assert_eq!(routine.iterations(), Ok(9));
    assert_eq!(routine.quiet(), Ok(true));
    assert_eq!(routine.endure(), Ok(true));
    assert_eq!(routine.persistent(), Ok(true));
    assert_eq!(routine.yields(), Ok(true));

    routine.drop_env().unwrap();
    assert_eq!(routine.env(), Ok(Value::Null));
}

#[test]
fn test_negative_interval_is_clamped() {
    let h = Harness::new(2);
    let (_, callback) = counter();
    let created = h.scheduler.create(Value::Null, callback.clone(), -20, 0).unwrap();
    assert_eq!(h.scheduler.routine(created).interval(), Ok(0));

    let handle = h.scheduler.create(Value::Null, callback, 10, 0).unwrap();
    let routine = h.scheduler.routine(handle);
    routine.set_interval(-1).unwrap();
    assert_eq!(routine.interval(), Ok(0));
}

#[test]
fn test_set_func_rejects_non_functions() {
    let h = Harness::new(1);
    let (_, callback) = counter();
    let handle = h.scheduler.create(Value::Null, callback.clone(), 10, 0).unwrap();
    let routine = h.scheduler.routine(handle);

    assert_eq!(
        routine.set_func("not callable"),
        Err(RoutineError::InvalidCallback { found: "string" })
    );
    assert_eq!(
        routine.set_func(Value::Null),
        Err(RoutineError::InvalidCallback { found: "null" })
    );
    assert_eq!(routine.func(), Ok(Value::Function(callback)));
}

#[test]
fn test_create_rejects_non_functions() {
    let h = Harness::new(1);
    let result = h.scheduler.create(Value::Null, 12, 10, 0);
    assert_eq!(result, Err(RoutineError::InvalidCallback { found: "integer" }));
    assert_eq!(h.scheduler.count_used(), 0);
}

#[test]
fn test_argument_capacity() {
    let h = Harness::new(1);
    let (_, callback) = counter();

    let too_many = RoutineBuilder::new()
        .func(callback.clone())
        .args((0..=MAX_ARGUMENTS as i64).map(Value::from))
        .build(&h.scheduler);
    assert_eq!(
        too_many,
        Err(RoutineError::TooManyArguments {
            count: MAX_ARGUMENTS + 1
        })
    );

    let handle = RoutineBuilder::new()
        .func(callback)
        .args([1, 2, 3])
        .build(&h.scheduler)
        .unwrap();
    let routine = h.scheduler.routine(handle);

    assert_eq!(routine.argument(0), Ok(Value::from(1)));
    assert_eq!(routine.argument(5), Ok(Value::Null));
    assert_eq!(routine.argument(MAX_ARGUMENTS - 1), Ok(Value::Null));
    assert_eq!(
        routine.argument(MAX_ARGUMENTS),
        Err(RoutineError::ArgumentOutOfRange {
            index: MAX_ARGUMENTS
        })
    );
    assert_eq!(
        routine.set_argument(MAX_ARGUMENTS, 0),
        Err(RoutineError::ArgumentOutOfRange {
            index: MAX_ARGUMENTS
        })
    );

    routine.set_argument(4, "five").unwrap();
    assert_eq!(routine.argument_count(), Ok(5));
    assert_eq!(routine.argument(3), Ok(Value::Null));
    assert_eq!(routine.argument(4), Ok(Value::from("five")));

    routine.set_arguments(["x"]).unwrap();
    assert_eq!(routine.arguments(), Ok(vec![Value::from("x")]));
    assert_eq!(routine.argument(4), Ok(Value::Null));
    assert_eq!(
        routine.set_arguments(vec![0; MAX_ARGUMENTS + 1]),
        Err(RoutineError::TooManyArguments {
            count: MAX_ARGUMENTS + 1
        })
    );
}

#[test]
fn test_terminated_handle_fails_validation() {
    let h = Harness::new(1);
    let (_, callback) = counter();
    let handle = h.scheduler.create(Value::Null, callback.clone(), 10, 0).unwrap();
    let routine = h.scheduler.routine(handle);

    assert_eq!(routine.terminate(), Ok(()));
    assert!(!routine.is_valid());
    assert_eq!(routine.terminate(), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.tag(), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.interval(), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.elapsed(), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.set_tag("x"), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.restart(1), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.argument(0), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.set_func(callback), Err(RoutineError::InvalidHandle));
    assert_eq!(routine.drop_env(), Err(RoutineError::InvalidHandle));
    assert_eq!(h.scheduler.count_used(), 0);
}

#[test]
fn test_terminate_drops_held_values() {
    let h = Harness::new(1);
    let (_, callback) = counter();
    let payload = std::rc::Rc::new(());
    let handle = RoutineBuilder::new()
        .func(callback)
        .data(Value::Native(payload.clone()))
        .arg(Value::Native(payload.clone()))
        .build(&h.scheduler)
        .unwrap();
    assert_eq!(std::rc::Rc::strong_count(&payload), 3);

    h.scheduler.routine(handle).terminate().unwrap();
    assert_eq!(std::rc::Rc::strong_count(&payload), 1);
}
