use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::kanp::interpreted::interpreter::kanp_value::KanpValue;

/// The single, global variable namespace of one program run. Function parameters are bound into
/// it directly and undone afterwards, so callees see whatever the caller had bound (dynamic
/// scoping).
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, KanpValue>,
}

/// Pre-call state of each parameter name, in binding order.
#[derive(Debug)]
#[must_use]
pub struct SavedBindings(Vec<(String, Option<KanpValue>)>);

impl Environment {
    pub fn new() -> Self { Environment { values: HashMap::new() } }

    pub fn get(&self, key: &str) -> Option<&KanpValue> {
        self.values.get(key)
    }
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
    pub fn define(&mut self, key: String, value: KanpValue) {
        self.values.insert(key, value);
    }
    pub fn assign(&mut self, key: &str, value: KanpValue) -> bool {
        match self.values.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn bind(&mut self, params: &[String], args: Vec<KanpValue>) -> SavedBindings {
        SavedBindings(
            params
                .iter()
                .zip(args)
                .map(|(param, arg)| (param.to_owned(), self.values.insert(param.to_owned(), arg)))
                .collect()
        )
    }

    // Undone in reverse, so a name bound twice ends up with its original value.
    pub fn restore(&mut self, saved: SavedBindings) {
        for (name, previous) in saved.0.into_iter().rev() {
            match previous {
                Some(value) => self.values.insert(name, value),
                None => self.values.remove(&name),
            };
        }
    }

    pub fn snapshot(&self) -> HashMap<String, KanpValue> {
        self.values.clone()
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut entries = self.values
            .iter()
            .map(|(k, v)| format!("{} -> {}", k, v.stringify()))
            .collect::<Vec<_>>();
        entries.sort();
        write!(f, "{}", entries.join("\t\n"))
    }
}
