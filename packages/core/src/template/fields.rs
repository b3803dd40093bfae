//! Field Reader
//!
//! Read-only access to a node's authored fields that records which keys were
//! consumed, so leftovers can be checked explicitly afterwards.

use std::cell::RefCell;

use indexmap::IndexSet;

use super::authored::{Template, TemplateMap};

pub struct Fields<'a> {
    map: &'a TemplateMap,
    read: RefCell<IndexSet<&'a str>>,
}

impl<'a> Fields<'a> {
    pub fn new(map: &'a TemplateMap) -> Self {
        Fields {
            map,
            read: RefCell::new(IndexSet::new()),
        }
    }

    /// Read a field, marking it consumed.
    pub fn get(&self, key: &str) -> Option<&'a Template> {
        let (key, value) = self.map.get_key_value(key)?;
        self.read.borrow_mut().insert(key.as_str());
        Some(value)
    }

    /// Keys read so far, in read order.
    pub fn consumed(&self) -> Vec<String> {
        self.read.borrow().iter().map(|k| k.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_reads_without_mutating_the_map() {
        let map = TemplateMap::new().with("items", 1).with("extra", 2);
        let fields = Fields::new(&map);
        assert!(fields.get("items").is_some());
        assert!(fields.get("missing").is_none());
        assert_eq!(fields.consumed(), vec!["items"]);
        assert_eq!(map.len(), 2);
    }
}
