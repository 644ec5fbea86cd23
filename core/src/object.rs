use std::collections::{HashMap, HashSet};

use crate::{FromValue, ObjectId, Value};

/// Removable handle for a registered field handler (registration order
/// is preserved; removal is by handle, so removing twice is a no-op).
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct FieldHandlerId(u64);

/// Removable handle for a registered before-sync hook.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct HookId(u64);

/// Callback invoked with the new value whenever its field is written
/// outside the suppression window. Must not block; it runs on the step
/// thread.
pub type FieldHandler = Box<dyn FnMut(&Value)>;

/// Hook run once per step, before dirty fields are captured for
/// outbound transmission. Receives the object and the elapsed time, so
/// authoritative logic can push freshly computed state into fields.
pub type BeforeSyncHook = Box<dyn FnMut(&mut SyncObject, f32)>;

/// A named-field container kept consistent across participants.
///
/// An `original` object is the authoritative copy; a non-original one
/// is a mirror updated only by applied inbound diffs.
pub struct SyncObject {
    id: ObjectId,
    original: bool,
    fields: HashMap<String, Value>,
    dirty: HashSet<String>,
    field_handlers: HashMap<String, Vec<(FieldHandlerId, FieldHandler)>>,
    before_sync_hooks: Vec<(HookId, BeforeSyncHook)>,
    // Raised while before-sync hooks run: writes made inside the hook
    // are the object's own authoritative state being pushed in, so they
    // must not re-trigger the handlers meant for externally originated
    // changes. They still get marked dirty for outbound capture.
    in_before_sync: bool,
    next_registration: u64,
}

impl SyncObject {
    pub(crate) fn new(id: ObjectId, original: bool) -> Self {
        Self {
            id,
            original,
            fields: HashMap::new(),
            dirty: HashSet::new(),
            field_handlers: HashMap::new(),
            before_sync_hooks: Vec::new(),
            in_before_sync: false,
            next_registration: 0,
        }
    }

    /// Build an object with an initial field snapshot. The snapshot is
    /// not marked dirty: for originals the creation notice carries the
    /// full state, for mirrors it came from the peer in the first place.
    pub(crate) fn with_fields(
        id: ObjectId,
        original: bool,
        initial_fields: Vec<(String, Value)>,
    ) -> Self {
        let mut object = Self::new(id, original);
        for (name, value) in initial_fields {
            object.fields.insert(name, value);
        }
        object
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn is_original(&self) -> bool {
        self.original
    }

    /// Weak reference to this object, for storing in another object's
    /// fields.
    pub fn object_ref(&self) -> Value {
        Value::ObjectRef(self.id)
    }

    // Field access

    /// Stores `value` under `name`, marks the field dirty for the next
    /// propagation cycle, and synchronously invokes every handler
    /// registered for `name` in registration order — unless the write
    /// happens inside this object's before-sync window.
    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value.clone());
        self.dirty.insert(name.to_string());
        if self.in_before_sync {
            return;
        }
        self.dispatch(name, &value);
    }

    /// Current raw value of a field, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Typed read of a field. Absent field or kind mismatch is `None`;
    /// this never faults.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.fields.get(name).and_then(T::from_value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    // Handler registration

    pub fn register_field_handler(&mut self, name: &str, handler: FieldHandler) -> FieldHandlerId {
        let handler_id = FieldHandlerId(self.next_registration);
        self.next_registration += 1;
        self.field_handlers
            .entry(name.to_string())
            .or_default()
            .push((handler_id, handler));
        handler_id
    }

    /// Removes one handler registration. Removing a handle that is not
    /// currently registered is a no-op.
    pub fn remove_field_handler(&mut self, name: &str, handler_id: FieldHandlerId) {
        if let Some(handlers) = self.field_handlers.get_mut(name) {
            handlers.retain(|(registered_id, _)| *registered_id != handler_id);
        }
    }

    pub fn register_before_sync(&mut self, hook: BeforeSyncHook) -> HookId {
        let hook_id = HookId(self.next_registration);
        self.next_registration += 1;
        self.before_sync_hooks.push((hook_id, hook));
        hook_id
    }

    /// Idempotent, same contract as [`Self::remove_field_handler`].
    pub fn remove_before_sync(&mut self, hook_id: HookId) {
        self.before_sync_hooks
            .retain(|(registered_id, _)| *registered_id != hook_id);
    }

    // Field conventions carried by every participant

    /// Replaces the "tags" field with a Sequence of string values.
    pub fn set_tags(&mut self, tags: &[&str]) {
        let elements = tags
            .iter()
            .filter(|tag| !tag.is_empty())
            .map(|tag| Value::String((*tag).to_string()))
            .collect();
        self.set_field("tags", Value::Sequence(elements));
    }

    /// String entries of the "tags" field, if present. Non-string
    /// elements are skipped.
    pub fn tags(&self) -> Vec<String> {
        let Some(Value::Sequence(elements)) = self.fields.get("tags") else {
            return Vec::new();
        };
        elements
            .iter()
            .filter_map(|element| match element {
                Value::String(tag) => Some(tag.clone()),
                _ => None,
            })
            .collect()
    }

    // Propagation internals, driven by the node

    /// Runs the before-sync hooks in registration order with the
    /// suppression window raised. Hooks may freely write this object's
    /// fields; those writes are captured dirty but do not dispatch.
    pub(crate) fn run_before_sync(&mut self, delta_time: f32) {
        self.in_before_sync = true;
        let mut hooks = std::mem::take(&mut self.before_sync_hooks);
        for (_, hook) in hooks.iter_mut() {
            hook(self, delta_time);
        }
        // hooks registered from inside a hook land behind the originals
        let added_during_run = std::mem::take(&mut self.before_sync_hooks);
        self.before_sync_hooks = hooks;
        self.before_sync_hooks.extend(added_during_run);
        self.in_before_sync = false;
    }

    /// Applies an externally originated write: stores the value and
    /// dispatches handlers, but does NOT mark the field dirty — an
    /// applied inbound diff must never echo back outbound.
    pub(crate) fn apply_remote(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value.clone());
        self.dispatch(name, &value);
    }

    /// Drains the dirty set into (name, current value) pairs, sorted by
    /// name so outbound capture order is deterministic.
    pub(crate) fn take_dirty(&mut self) -> Vec<(String, Value)> {
        let mut names: Vec<String> = self.dirty.drain().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| {
                let value = self.fields.get(&name).cloned()?;
                Some((name, value))
            })
            .collect()
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Full field snapshot, sorted by name, for creation notices.
    pub(crate) fn snapshot(&self) -> Vec<(String, Value)> {
        let mut snapshot: Vec<(String, Value)> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        snapshot.sort_by(|(a, _), (b, _)| a.cmp(b));
        snapshot
    }

    fn dispatch(&mut self, name: &str, value: &Value) {
        let Some(handlers) = self.field_handlers.get_mut(name) else {
            return;
        };
        for (_, handler) in handlers.iter_mut() {
            handler(value);
        }
    }
}
