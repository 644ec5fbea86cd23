use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::{
    FromValue, NodeError, ObjectId, ObjectIdGenerator, SyncMessage, SyncObject, Transport, Value,
};

/// Per-participant configuration, passed explicitly into
/// [`SyncNode::new`]. There is no ambient global settings object.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeConfig {
    /// Partitions the object-id space between participants: two nodes
    /// with distinct keys can create originals concurrently without id
    /// collisions.
    pub node_key: u16,
}

/// Registry change surfaced to collaborators (e.g. a presentation
/// layer), drained via [`SyncNode::take_events`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// A newly created object's initial fields are populated and it is
    /// ready for use — fired for local creations and applied inbound
    /// creations alike.
    ObjectReady(ObjectId),
    /// The object was removed (locally or by a peer); its id is retired.
    ObjectDeleted(ObjectId),
}

/// Registry of [`SyncObject`]s for one participant, driving the
/// per-step propagation protocol over an external [`Transport`].
///
/// One logical thread drives [`SyncNode::step`]; all field mutation,
/// handler dispatch, and hook invocation happen on that thread. The
/// transport's queues are the only concurrency boundary.
pub struct SyncNode<T: Transport> {
    objects: HashMap<ObjectId, SyncObject>,
    id_generator: ObjectIdGenerator,
    transport: T,
    // Ids that once existed here; never looked up again, never revived.
    retired: HashSet<ObjectId>,
    pending_creates: Vec<ObjectId>,
    pending_deletes: Vec<ObjectId>,
    outgoing_events: Vec<NodeEvent>,
}

impl<T: Transport> SyncNode<T> {
    pub fn new(config: NodeConfig, transport: T) -> Self {
        Self {
            objects: HashMap::new(),
            id_generator: ObjectIdGenerator::new(config.node_key),
            transport,
            retired: HashSet::new(),
            pending_creates: Vec::new(),
            pending_deletes: Vec::new(),
            outgoing_events: Vec::new(),
        }
    }

    // Registry operations

    /// Allocates a fresh id and inserts a new object holding
    /// `initial_fields`. An `original` object is announced to peers at
    /// the next step and is this node's authoritative truth; a
    /// non-original one is a locally instantiated mirror snapshot.
    pub fn create_object(
        &mut self,
        initial_fields: Vec<(String, Value)>,
        original: bool,
    ) -> ObjectId {
        let id = self.id_generator.generate();
        self.objects
            .insert(id, SyncObject::with_fields(id, original, initial_fields));
        if original {
            self.pending_creates.push(id);
        }
        debug!("created object {id} (original: {original})");
        self.outgoing_events.push(NodeEvent::ObjectReady(id));
        id
    }

    /// Removes the object and schedules a deletion notice to peers. The
    /// id becomes permanently invalid; its handlers and hooks go with
    /// the object. Deleting an unknown id is a logged no-op.
    pub fn delete_object(&mut self, id: ObjectId) {
        if self.objects.remove(&id).is_none() {
            warn!("delete_object: unknown object {id}");
            return;
        }
        self.retired.insert(id);

        // An object created and deleted between steps was never
        // announced, so peers get neither notice.
        let announced = !self.pending_creates.contains(&id);
        self.pending_creates.retain(|pending| *pending != id);
        if announced {
            self.pending_deletes.push(id);
        }
        debug!("deleted object {id}");
        self.outgoing_events.push(NodeEvent::ObjectDeleted(id));
    }

    pub fn object(&self, id: ObjectId) -> Option<&SyncObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SyncObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Dereferences an `ObjectRef` value. Dangling references are an
    /// expected condition: they log at debug and yield `None`.
    pub fn resolve(&self, reference: &Value) -> Option<&SyncObject> {
        let Value::ObjectRef(id) = reference else {
            debug!(
                "resolve: value is {}, not an ObjectRef",
                reference.kind_name()
            );
            return None;
        };
        let object = self.objects.get(id);
        if object.is_none() {
            debug!("resolve: dangling reference to {id}");
        }
        object
    }

    /// Drains the registry-change events accumulated since the last
    /// call; apply each in sequence and discard.
    pub fn take_events(&mut self) -> Vec<NodeEvent> {
        std::mem::take(&mut self.outgoing_events)
    }

    // Hierarchy convention: a "parent" field holds an ObjectRef, the
    // parent's "children" field holds a Sequence of ObjectRefs.

    /// Links `child_id` under `parent_id`: sets the child's "parent"
    /// field and reconciles both parents' "children" sequences so the
    /// new parent holds exactly one entry for the child — no matter how
    /// many times the link runs.
    pub fn set_parent(&mut self, child_id: ObjectId, parent_id: ObjectId) -> Result<(), NodeError> {
        if !self.objects.contains_key(&parent_id) {
            return Err(NodeError::UnknownObject { id: parent_id });
        }
        let Some(child) = self.objects.get_mut(&child_id) else {
            return Err(NodeError::UnknownObject { id: child_id });
        };

        let previous_parent = child.get::<ObjectId>("parent");
        child.set_field("parent", Value::ObjectRef(parent_id));

        if let Some(previous_id) = previous_parent {
            if previous_id != parent_id {
                self.remove_child_entry(previous_id, child_id, false);
            }
        }
        self.insert_child_entry(parent_id, child_id, false);
        Ok(())
    }

    fn insert_child_entry(&mut self, parent_id: ObjectId, child_id: ObjectId, remote: bool) {
        let Some(parent) = self.objects.get_mut(&parent_id) else {
            debug!("child {child_id} links to unknown parent {parent_id}; skipping");
            return;
        };
        let mut children = parent.get::<Vec<Value>>("children").unwrap_or_default();
        let child_ref = Value::ObjectRef(child_id);
        if children.contains(&child_ref) {
            return;
        }
        children.push(child_ref);
        let sequence = Value::Sequence(children);
        if remote {
            parent.apply_remote("children", sequence);
        } else {
            parent.set_field("children", sequence);
        }
    }

    fn remove_child_entry(&mut self, parent_id: ObjectId, child_id: ObjectId, remote: bool) {
        let Some(parent) = self.objects.get_mut(&parent_id) else {
            return;
        };
        let Some(mut children) = parent.get::<Vec<Value>>("children") else {
            return;
        };
        let child_ref = Value::ObjectRef(child_id);
        if !children.contains(&child_ref) {
            return;
        }
        children.retain(|entry| *entry != child_ref);
        let sequence = Value::Sequence(children);
        if remote {
            parent.apply_remote("children", sequence);
        } else {
            parent.set_field("children", sequence);
        }
    }

    // Propagation

    /// Runs one synchronization step, in strict phase order:
    ///
    /// 1. every original object's before-sync hooks run with
    ///    `delta_time` (suppression window active per object);
    /// 2. pending creation notices, every dirty field as a diff, then
    ///    pending deletion notices are handed to the transport;
    /// 3. the inbound queue is drained and applied.
    ///
    /// All hooks complete before any outbound message is captured, and
    /// everything queued inbound before the step began is applied
    /// before the next step's hooks — one consistency point per step.
    pub fn step(&mut self, delta_time: f32) {
        for object in self.objects.values_mut() {
            if object.is_original() {
                object.run_before_sync(delta_time);
            }
        }

        let mut outbound = Vec::new();
        for id in std::mem::take(&mut self.pending_creates) {
            let Some(object) = self.objects.get_mut(&id) else {
                continue;
            };
            // the snapshot carries the full state; anything dirty by
            // now would only duplicate it
            object.clear_dirty();
            outbound.push(SyncMessage::Create {
                id,
                fields: object.snapshot(),
                original: true,
            });
        }
        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort();
        for id in ids {
            let Some(object) = self.objects.get_mut(&id) else {
                continue;
            };
            for (name, value) in object.take_dirty() {
                outbound.push(SyncMessage::FieldDiff { id, name, value });
            }
        }
        for id in std::mem::take(&mut self.pending_deletes) {
            outbound.push(SyncMessage::Delete { id });
        }
        for message in outbound {
            self.transport.enqueue_outbound(message);
        }

        for message in self.transport.poll_inbound() {
            match message {
                SyncMessage::Create { id, fields, .. } => self.apply_create(id, fields),
                SyncMessage::FieldDiff { id, name, value } => {
                    self.apply_field_diff(id, name, value)
                }
                SyncMessage::Delete { id } => self.apply_delete(id),
            }
        }
    }

    fn apply_create(&mut self, id: ObjectId, fields: Vec<(String, Value)>) {
        if self.retired.contains(&id) {
            warn!("create for retired id {id}; ignoring");
            return;
        }
        if self.objects.contains_key(&id) {
            warn!("duplicate create for {id}; ignoring");
            return;
        }
        let parent_link = fields.iter().find_map(|(name, value)| {
            if name == "parent" {
                ObjectId::from_value(value)
            } else {
                None
            }
        });
        self.objects
            .insert(id, SyncObject::with_fields(id, false, fields));
        if let Some(parent_id) = parent_link {
            self.insert_child_entry(parent_id, id, true);
        }
        debug!("instantiated mirror {id}");
        self.outgoing_events.push(NodeEvent::ObjectReady(id));
    }

    fn apply_field_diff(&mut self, id: ObjectId, name: String, value: Value) {
        let Some(object) = self.objects.get_mut(&id) else {
            // includes ids deleted earlier in this same step
            debug!("diff for unknown object {id}; skipping");
            return;
        };
        if object.is_original() {
            // should not occur under correct peer behavior; the local
            // authoritative state wins either way
            warn!("inbound diff for original object {id} field {name:?}; discarding");
            return;
        }
        if let Some(existing) = object.field(&name) {
            if existing.kind_name() != value.kind_name() {
                debug!(
                    "field {name:?} on {id} migrates {} -> {}",
                    existing.kind_name(),
                    value.kind_name()
                );
            }
        }

        let parent_link = if name == "parent" {
            ObjectId::from_value(&value)
        } else {
            None
        };
        let previous_parent = if parent_link.is_some() {
            object.get::<ObjectId>("parent")
        } else {
            None
        };

        object.apply_remote(&name, value);

        if let Some(parent_id) = parent_link {
            if let Some(previous_id) = previous_parent {
                if previous_id != parent_id {
                    self.remove_child_entry(previous_id, id, true);
                }
            }
            self.insert_child_entry(parent_id, id, true);
        }
    }

    fn apply_delete(&mut self, id: ObjectId) {
        self.retired.insert(id);
        if self.objects.remove(&id).is_none() {
            debug!("delete for unknown object {id}; skipping");
            return;
        }
        debug!("removed mirror {id}");
        self.outgoing_events.push(NodeEvent::ObjectDeleted(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullTransport;

    fn test_node() -> SyncNode<NullTransport> {
        SyncNode::new(NodeConfig::default(), NullTransport)
    }

    #[test]
    fn test_create_then_lookup() {
        let mut node = test_node();
        let id = node.create_object(vec![("health".to_string(), Value::Int(5))], true);
        assert!(node.contains(id));
        assert_eq!(node.object(id).and_then(|o| o.get::<i64>("health")), Some(5));
        assert_eq!(node.take_events(), vec![NodeEvent::ObjectReady(id)]);
    }

    #[test]
    fn test_delete_invalidates_id() {
        let mut node = test_node();
        let id = node.create_object(Vec::new(), true);
        node.take_events();
        node.delete_object(id);

        assert!(node.object(id).is_none());
        assert!(node.resolve(&Value::ObjectRef(id)).is_none());
        assert_eq!(node.take_events(), vec![NodeEvent::ObjectDeleted(id)]);

        // ids are never re-issued
        let next = node.create_object(Vec::new(), true);
        assert_ne!(next, id);
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut node = test_node();
        node.delete_object(ObjectId::from_u64(12345));
        assert!(node.take_events().is_empty());
    }

    #[test]
    fn test_resolve_non_ref_value_is_none() {
        let node = test_node();
        assert!(node.resolve(&Value::Int(3)).is_none());
    }

    #[test]
    fn test_set_parent_unknown_object_errors() {
        let mut node = test_node();
        let child = node.create_object(Vec::new(), true);
        let ghost = ObjectId::from_u64(0xFFFF);
        assert_eq!(
            node.set_parent(child, ghost),
            Err(NodeError::UnknownObject { id: ghost })
        );
        assert_eq!(
            node.set_parent(ghost, child),
            Err(NodeError::UnknownObject { id: ghost })
        );
    }

    #[test]
    fn test_set_parent_is_idempotent() {
        let mut node = test_node();
        let parent = node.create_object(Vec::new(), true);
        let child = node.create_object(Vec::new(), true);

        node.set_parent(child, parent).unwrap();
        node.set_parent(child, parent).unwrap();

        let children = node
            .object(parent)
            .and_then(|o| o.get::<Vec<Value>>("children"))
            .unwrap();
        assert_eq!(children, vec![Value::ObjectRef(child)]);
        assert_eq!(
            node.object(child).and_then(|o| o.get::<ObjectId>("parent")),
            Some(parent)
        );
    }

    #[test]
    fn test_relink_moves_child_between_parents() {
        let mut node = test_node();
        let old_parent = node.create_object(Vec::new(), true);
        let new_parent = node.create_object(Vec::new(), true);
        let child = node.create_object(Vec::new(), true);

        node.set_parent(child, old_parent).unwrap();
        node.set_parent(child, new_parent).unwrap();

        let old_children = node
            .object(old_parent)
            .and_then(|o| o.get::<Vec<Value>>("children"))
            .unwrap();
        assert!(old_children.is_empty());
        let new_children = node
            .object(new_parent)
            .and_then(|o| o.get::<Vec<Value>>("children"))
            .unwrap();
        assert_eq!(new_children, vec![Value::ObjectRef(child)]);
    }

    #[test]
    fn test_create_then_delete_before_step_announces_nothing() {
        let mut node = test_node();
        let id = node.create_object(Vec::new(), true);
        node.delete_object(id);
        assert!(node.pending_creates.is_empty());
        assert!(node.pending_deletes.is_empty());
    }
}
