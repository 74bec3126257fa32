//! Variable store for one program run

use super::value::Variable;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Every variable created during a run, keyed by ID.
///
/// Each interpreter owns its own store, so independent runs never see each
/// other's variables.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct VariableStore {
    vars: BTreeMap<u8, Variable>,
}

impl VariableStore {
    pub fn new() -> Self {
        VariableStore {
            vars: BTreeMap::new(),
        }
    }

    /// Insert or replace a variable under its own ID.
    pub fn define(&mut self, var: Variable) {
        self.vars.insert(var.id, var);
    }

    pub fn get(&self, id: u8) -> Option<&Variable> {
        self.vars.get(&id)
    }

    /// Read a variable by value, or an empty default if it was never created.
    pub fn get_or_default(&self, id: u8) -> Variable {
        match self.vars.get(&id) {
            Some(var) => var.clone(),
            None => {
                warn!(id, "variable does not exist");
                Variable {
                    id,
                    ..Variable::default()
                }
            }
        }
    }

    /// Mutable access, creating an empty default if needed.
    pub fn get_or_create(&mut self, id: u8) -> &mut Variable {
        self.vars.entry(id).or_insert_with(|| {
            warn!(id, "variable does not exist, creating an empty one");
            Variable {
                id,
                ..Variable::default()
            }
        })
    }

    pub fn contains(&self, id: u8) -> bool {
        self.vars.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variables in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }
}
