/// Conflict policy: originality decides the winner for a contested
/// field — an original keeps its local write, a mirror always takes
/// the inbound value.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tether_core::{NodeConfig, ObjectId, SyncMessage, SyncNode, Transport, Value, Vec3};

#[derive(Clone, Default)]
struct RecordingTransport {
    outbound: Rc<RefCell<Vec<SyncMessage>>>,
    inbound: Rc<RefCell<VecDeque<SyncMessage>>>,
}

impl Transport for RecordingTransport {
    fn enqueue_outbound(&mut self, message: SyncMessage) {
        self.outbound.borrow_mut().push(message);
    }

    fn poll_inbound(&mut self) -> Vec<SyncMessage> {
        self.inbound.borrow_mut().drain(..).collect()
    }
}

fn mirror_with_inbound(
    transport: &RecordingTransport,
    node: &mut SyncNode<RecordingTransport>,
) -> ObjectId {
    let id = ObjectId::from_u64(0xA11CE);
    transport.inbound.borrow_mut().push_back(SyncMessage::Create {
        id,
        fields: Vec::new(),
        original: true,
    });
    node.step(0.016);
    id
}

#[test]
fn test_mirror_takes_inbound_position_after_one_step() {
    let transport = RecordingTransport::default();
    let mut node = SyncNode::new(NodeConfig::default(), transport.clone());
    let id = mirror_with_inbound(&transport, &mut node);

    transport.inbound.borrow_mut().push_back(SyncMessage::FieldDiff {
        id,
        name: "position".to_string(),
        value: Value::Vec3(Vec3::new(1.0, 2.0, 3.0)),
    });
    node.step(0.016);

    assert_eq!(
        node.object(id).and_then(|o| o.get::<Vec3>("position")),
        Some(Vec3::new(1.0, 2.0, 3.0))
    );
}

#[test]
fn test_mirror_diff_application_fires_external_handler() {
    let transport = RecordingTransport::default();
    let mut node = SyncNode::new(NodeConfig::default(), transport.clone());
    let id = mirror_with_inbound(&transport, &mut node);

    let seen = Rc::new(RefCell::new(None));
    let seen_in_handler = seen.clone();
    node.object_mut(id).unwrap().register_field_handler(
        "position",
        Box::new(move |value| *seen_in_handler.borrow_mut() = Some(value.clone())),
    );

    transport.inbound.borrow_mut().push_back(SyncMessage::FieldDiff {
        id,
        name: "position".to_string(),
        value: Value::Vec3(Vec3::new(4.0, 5.0, 6.0)),
    });
    node.step(0.016);

    assert_eq!(
        *seen.borrow(),
        Some(Value::Vec3(Vec3::new(4.0, 5.0, 6.0))),
        "externally originated writes must reach subscribers"
    );
}

#[test]
fn test_original_discards_inbound_diff_and_keeps_local_write() {
    let transport = RecordingTransport::default();
    let mut node = SyncNode::new(NodeConfig::default(), transport.clone());
    let id = node.create_object(Vec::new(), true);

    node.object_mut(id)
        .unwrap()
        .register_before_sync(Box::new(|object, _| {
            object.set_field("position", Value::Vec3(Vec3::new(7.0, 8.0, 9.0)));
        }));

    // misbehaving peer tries to write an object it does not own
    transport.inbound.borrow_mut().push_back(SyncMessage::FieldDiff {
        id,
        name: "position".to_string(),
        value: Value::Vec3(Vec3::ZERO),
    });
    node.step(0.016);

    assert_eq!(
        node.object(id).and_then(|o| o.get::<Vec3>("position")),
        Some(Vec3::new(7.0, 8.0, 9.0)),
        "the original's local write wins"
    );
}

#[test]
fn test_inbound_kind_migration_is_last_write_wins() {
    let transport = RecordingTransport::default();
    let mut node = SyncNode::new(NodeConfig::default(), transport.clone());
    let id = mirror_with_inbound(&transport, &mut node);

    for value in [Value::Int(1), Value::String("one".to_string())] {
        transport.inbound.borrow_mut().push_back(SyncMessage::FieldDiff {
            id,
            name: "label".to_string(),
            value,
        });
    }
    node.step(0.016);

    assert_eq!(
        node.object(id).and_then(|o| o.get::<String>("label")),
        Some("one".to_string())
    );
}
