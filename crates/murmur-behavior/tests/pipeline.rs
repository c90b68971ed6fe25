//! Pipeline composition through the fixture behaviors.

use murmur_behavior::{
    write_order_violations, Behavior, BehaviorFactory, BehaviorList, BehaviorSpec,
    WriteOrderPolicy,
};
use murmur_core::{ConfigError, Parameter};
use murmur_test_utils::{FixtureFactory, MockWorld};

fn spec(class: &str, name: &str, output: &str, value: Vec<f32>) -> BehaviorSpec {
    BehaviorSpec::new(class, name, "", output).with_param("value", value)
}

#[test]
fn add_writers_compose_on_top_of_replace() {
    let mut world = MockWorld::new();
    let a = world.add_agent("a");
    let acc = world.add_param(a, Parameter::new("acceleration", vec![7.0, 7.0]));

    let mut list = BehaviorList::new();
    for s in [
        spec("const", "reset", "acceleration", vec![0.0, 0.0]),
        spec("add_const", "f1", "acceleration", vec![1.0, 2.0]),
        spec("add_const", "f2", "acceleration", vec![0.5, -1.0]),
    ] {
        let b = FixtureFactory.create(&s, &mut world.attach_context(a)).unwrap();
        list.push(b, WriteOrderPolicy::Strict).unwrap();
    }

    let summary = world.act_list(a, &list).unwrap();
    assert_eq!(summary.run, 3);
    assert_eq!(world.value(acc), &[7.0, 7.0]);
    assert_eq!(world.staged(acc), &[1.5, 1.0]);
    world.flush(a);
    assert_eq!(world.value(acc), &[1.5, 1.0]);
}

#[test]
fn add_without_replace_accumulates_onto_committed_value() {
    let mut world = MockWorld::new();
    let a = world.add_agent("a");
    let x = world.add_param(a, Parameter::new("x", vec![1.0]));
    let b = FixtureFactory
        .create(&spec("add_const", "inc", "x", vec![2.0]), &mut world.attach_context(a))
        .unwrap();
    for expected in [3.0, 5.0, 7.0] {
        world.act(a, b.as_ref()).unwrap();
        world.flush(a);
        assert_eq!(world.value(x), &[expected]);
    }
}

#[test]
fn violations_listed_in_pipeline_order() {
    let mut world = MockWorld::new();
    let a = world.add_agent("a");
    world.add_param(a, Parameter::new("x", vec![0.0]));
    world.add_param(a, Parameter::new("y", vec![0.0]));
    let make = |world: &mut MockWorld, class: &str, name: &str, out: &str| {
        FixtureFactory
            .create(&spec(class, name, out, vec![0.0]), &mut world.attach_context(a))
            .unwrap()
    };
    let order: Vec<Box<dyn Behavior>> = vec![
        make(&mut world, "add_const", "fx", "x"),
        make(&mut world, "const", "rx", "x"),
        make(&mut world, "const", "ry", "y"),
        make(&mut world, "add_const", "fy", "y"),
    ];
    let violations = write_order_violations(order.iter().map(|b| b.as_ref()));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].earlier, "fx");
    assert_eq!(violations[0].later, "rx");
}

#[test]
fn unknown_class_is_reported() {
    let mut world = MockWorld::new();
    let a = world.add_agent("a");
    world.add_param(a, Parameter::new("x", vec![0.0]));
    let err = FixtureFactory
        .create(&spec("teleport", "t", "x", vec![0.0]), &mut world.attach_context(a))
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownClass {
            class: "teleport".into()
        }
    );
}
