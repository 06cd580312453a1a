//! Per-function local-slot allocation. Named source variables are resolved
//! to `cv` (compiled-variable, by-index) operands at compile time so the VM
//! never has to hash a name to find a local; grounded on the teacher's
//! `SlotIdentifier::{ID, NAME}` split in `datex_values/slot.rs`.

use indexmap::IndexMap;

#[derive(Default)]
pub struct FunctionScope {
    slots: IndexMap<String, u32>,
    next_tmp: u32,
    /// Loop nesting, used to validate `break`/`continue` and to know how
    /// many `fe_free`s an exit path must emit.
    pub loop_depth: u32,
    pub in_function: bool,
}

impl FunctionScope {
    pub fn new() -> Self {
        FunctionScope::default()
    }

    /// Returns the slot index for `name`, allocating a new one if this is
    /// the first reference (the source language does not require variable
    /// declaration before use).
    pub fn slot_for(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.slots.get(name) {
            return idx;
        }
        let idx = self.slots.len() as u32;
        self.slots.insert(name.to_string(), idx);
        idx
    }

    pub fn existing_slot(&self, name: &str) -> Option<u32> {
        self.slots.get(name).copied()
    }

    pub fn alloc_tmp(&mut self) -> u32 {
        let idx = self.next_tmp;
        self.next_tmp += 1;
        idx
    }

    pub fn max_local_slot(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn slot_names(&self) -> &IndexMap<String, u32> {
        &self.slots
    }
}
