//! Wire list and container conversions

use std::collections::HashMap;

use super::Value;

/// Ordered list of byte-sequence elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireList {
    elements: Vec<Vec<u8>>,
}

impl WireList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    /// Append one element
    pub fn push(&mut self, element: impl Into<Vec<u8>>) {
        self.elements.push(element.into());
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.elements.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.elements.iter().map(Vec::as_slice)
    }

    /// Iterate as (key, value) pairs; an odd trailing element is ignored
    pub fn pairs(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.elements
            .chunks_exact(2)
            .map(|pair| (pair[0].as_slice(), pair[1].as_slice()))
    }

    /// Total payload bytes across all elements
    pub fn payload_len(&self) -> usize {
        self.elements.iter().map(Vec::len).sum()
    }

    pub fn into_vec(self) -> Vec<Vec<u8>> {
        self.elements
    }
}

impl From<Vec<Vec<u8>>> for WireList {
    fn from(elements: Vec<Vec<u8>>) -> Self {
        Self { elements }
    }
}

impl FromIterator<Vec<u8>> for WireList {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for WireList {
    type Item = Vec<u8>;
    type IntoIter = std::vec::IntoIter<Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

// =============================================================================
// Container -> List
// =============================================================================

/// Flat array encoding: one element per convertible entry, order preserved
pub fn sequence_to_list<I, T>(seq: I) -> WireList
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    seq.into_iter()
        .filter_map(|element| Into::<Value>::into(element).into_wire())
        .collect()
}

/// Flat pair encoding: key then value for each entry, in the mapping's order
///
/// An entry whose key or value has no byte form is dropped as a whole so the
/// list keeps its key/value alternation.
pub fn mapping_to_list<I, K, V>(mapping: I) -> WireList
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Value>,
    V: Into<Value>,
{
    let entries = mapping.into_iter();
    let mut list = WireList::with_capacity(entries.size_hint().0 * 2);
    for (key, value) in entries {
        let (key, value): (Value, Value) = (key.into(), value.into());
        if let (Some(key), Some(value)) = (key.into_wire(), value.into_wire()) {
            list.push(key);
            list.push(value);
        }
    }
    list
}

// =============================================================================
// List -> Container
// =============================================================================

/// Inverse of [`sequence_to_list`]: one output element per list element
pub fn list_to_sequence(list: WireList) -> Vec<Vec<u8>> {
    list.into_vec()
}

/// Consume the list two elements at a time; later keys overwrite earlier ones
pub fn list_to_mapping(list: WireList) -> HashMap<Vec<u8>, Vec<u8>> {
    let mut mapping = HashMap::with_capacity(list.len() / 2);
    let mut elements = list.into_iter();
    while let (Some(key), Some(value)) = (elements.next(), elements.next()) {
        mapping.insert(key, value);
    }
    mapping
}
