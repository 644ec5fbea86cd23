/// Field-write and handler-dispatch contracts, exercised through the
/// public node surface.
use std::cell::RefCell;
use std::rc::Rc;

use tether_core::{NodeConfig, NullTransport, SyncNode, Value, Vec3};

fn test_node() -> SyncNode<NullTransport> {
    SyncNode::new(NodeConfig::default(), NullTransport)
}

#[test]
fn test_set_field_is_readable_and_dispatches_in_order() {
    let mut node = test_node();
    let id = node.create_object(Vec::new(), true);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let object = node.object_mut(id).unwrap();
    for label in ["a", "b"] {
        let seen = seen.clone();
        object.register_field_handler(
            "position",
            Box::new(move |value| seen.borrow_mut().push((label, value.clone()))),
        );
    }

    let value = Value::Vec3(Vec3::new(1.0, 2.0, 3.0));
    object.set_field("position", value.clone());

    assert_eq!(object.get::<Vec3>("position"), Some(Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(
        *seen.borrow(),
        vec![("a", value.clone()), ("b", value)],
        "each handler exactly once, in registration order"
    );
}

#[test]
fn test_missing_field_and_kind_mismatch_never_fault() {
    let mut node = test_node();
    let id = node.create_object(vec![("label".to_string(), Value::String("x".into()))], true);
    let object = node.object(id).unwrap();

    assert_eq!(object.get::<Vec3>("label"), None);
    assert_eq!(object.get::<String>("absent"), None);
    assert!(object.field("absent").is_none());
}

#[test]
fn test_double_register_single_remove_leaves_one() {
    let mut node = test_node();
    let id = node.create_object(Vec::new(), true);
    let count = Rc::new(RefCell::new(0u32));

    let object = node.object_mut(id).unwrap();
    let count_a = count.clone();
    let first = object.register_field_handler("f", Box::new(move |_| *count_a.borrow_mut() += 1));
    let count_b = count.clone();
    let _second = object.register_field_handler("f", Box::new(move |_| *count_b.borrow_mut() += 1));

    object.remove_field_handler("f", first);
    // a second removal of the same handle must change nothing
    object.remove_field_handler("f", first);

    object.set_field("f", Value::Bool(true));
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn test_last_write_wins_across_kinds() {
    let mut node = test_node();
    let id = node.create_object(Vec::new(), true);
    let object = node.object_mut(id).unwrap();

    object.set_field("shape", Value::Int(1));
    object.set_field("shape", Value::String("sphere".to_string()));

    assert_eq!(object.get::<i64>("shape"), None);
    assert_eq!(object.get::<String>("shape"), Some("sphere".to_string()));
}
