use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::{
    object::{EnumType, ObjectInstance, ProtocolType, RecordType},
    value::{MapKey, Value},
};

/// Handle to a runtime instance stored in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(u32);

impl HeapId {
    #[cfg(test)]
    pub(crate) fn sentinel() -> Self {
        Self(u32::MAX)
    }
}

/// A `List<T>` instance. The element tag is recorded at creation and
/// enforced only there.
#[derive(Debug, Clone, Default)]
pub struct ListInstance {
    element_type: String,
    elements: Vec<Value>,
}

impl ListInstance {
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_elements(element_type: impl Into<String>, elements: Vec<Value>) -> Self {
        Self {
            element_type: element_type.into(),
            elements,
        }
    }

    #[must_use]
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Stamps the element tag; used when an empty literal meets a
    /// `List<T>` annotation.
    pub fn set_element_type(&mut self, element_type: impl Into<String>) {
        self.element_type = element_type.into();
    }

    #[must_use]
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut Vec<Value> {
        &mut self.elements
    }

    pub fn add(&mut self, element: Value) {
        self.elements.push(element);
    }

    pub fn get(&self, index: usize) -> Result<Value, String> {
        self.elements.get(index).cloned().ok_or_else(|| {
            format!("List index {index} out of bounds (size: {})", self.elements.len())
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<(), String> {
        if index >= self.elements.len() {
            return Err(format!(
                "List index {index} out of bounds (size: {})",
                self.elements.len()
            ));
        }
        self.elements.remove(index);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, String> {
        self.elements.pop().ok_or_else(|| "Cannot pop from empty list".to_owned())
    }

    pub fn reverse(&mut self) {
        self.elements.reverse();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

/// A `Map<K, V>` instance: insertion-ordered, duplicate-key insertion
/// overwrites in place.
#[derive(Debug, Clone, Default)]
pub struct MapInstance {
    entries: IndexMap<MapKey, Value>,
}

impl MapInstance {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &IndexMap<MapKey, Value> {
        &self.entries
    }

    pub fn put(&mut self, key: MapKey, value: Value) {
        self.entries.insert(key, value);
    }

    #[must_use]
    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &MapKey) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A `Set<T>` instance with unique membership.
#[derive(Debug, Clone, Default)]
pub struct SetInstance {
    elements: IndexSet<MapKey>,
}

impl SetInstance {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn elements(&self) -> &IndexSet<MapKey> {
        &self.elements
    }

    /// Returns `false` when the element was already present.
    pub fn add(&mut self, element: MapKey) -> bool {
        self.elements.insert(element)
    }

    #[must_use]
    pub fn contains(&self, element: &MapKey) -> bool {
        self.elements.contains(element)
    }

    pub fn remove(&mut self, element: &MapKey) -> bool {
        self.elements.shift_remove(element)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

/// A record instance: fixed field names, field values set at construction
/// and immutable afterwards.
#[derive(Debug, Clone)]
pub struct RecordInstance {
    pub type_name: Rc<str>,
    pub fields: IndexMap<String, Value>,
}

/// A stateful iterator over a heap-resident list.
#[derive(Debug, Clone)]
pub struct ListIterator {
    pub list: HeapId,
    pub index: usize,
}

/// Runtime instances with identity, stored in the arena.
#[derive(Debug)]
pub enum HeapData {
    List(ListInstance),
    Map(MapInstance),
    Set(SetInstance),
    Object(ObjectInstance),
    Record(RecordInstance),
    RecordType(RecordType),
    EnumType(EnumType),
    Protocol(ProtocolType),
    Iterator(ListIterator),
}

/// Arena of runtime instances indexed by `HeapId`.
///
/// The object graph is acyclic by construction (properties are set once,
/// before a reference escapes), so slots simply live for the lifetime of
/// the interpreter; there is no collector and no reference counting.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<HeapData>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        let id = HeapId(u32::try_from(self.slots.len()).expect("heap exhausted"));
        self.slots.push(data);
        id
    }

    /// # Panics
    /// Panics if the id was not produced by this heap.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.slots[id.0 as usize]
    }

    /// # Panics
    /// Panics if the id was not produced by this heap.
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self.slots[id.0 as usize]
    }
}
