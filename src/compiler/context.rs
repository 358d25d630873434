//! Per-function compilation context.
//!
//! Tracks which registers are borrowed, where every visible name lives
//! and the geometry of the frame being built. A fresh context is created
//! for each function definition; nothing in it survives the function.

use std::fmt::Display;

use log::trace;

use crate::errors::errors::{Error, ErrorImpl};

use super::{
    frame::{Frame, DYNAMIC_SLOT_BYTES, WORD_SIZE},
    registers::{Register, RESERVED, SCRATCH_BAND, TEMPORARY_BAND},
};

/// The three storage tiers, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Variable,
    Dynamic,
    Global,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Variable => write!(f, "variable"),
            Tier::Dynamic => write!(f, "dynamic"),
            Tier::Global => write!(f, "global"),
        }
    }
}

/// Insertion-ordered name to slot map.
///
/// A new name gets the current table length as its slot; adding a name
/// that is already bound keeps its slot. Slots stay dense as long as
/// deletions happen in reverse insertion order.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    entries: Vec<(String, u32)>,
}

impl BindingTable {
    pub fn add(&mut self, name: &str) -> u32 {
        if let Some(slot) = self.get(name) {
            return slot;
        }

        let slot = self.entries.len() as u32;
        self.entries.push((name.to_string(), slot));
        slot
    }

    pub fn delete(&mut self, name: &str) -> bool {
        match self.entries.iter().rposition(|(entry, _)| entry == name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, slot)| *slot)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved storage location of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Byte offset from `$fp`; parameters and function-level locals.
    Frame(i32),
    /// Byte offset from the current `$sp`; block-scoped dynamics.
    Stack(u32),
    /// Global symbol, reached through the GOT.
    Global(String),
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Frame(offset) => write!(f, "{}({})", offset, Register::FP.name()),
            Address::Stack(offset) => write!(f, "{}({})", offset, Register::SP.name()),
            Address::Global(name) => write!(f, "%got({})({})", name, Register::GP),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Context {
    registers: [bool; 32],
    frame: Frame,
    globals: BindingTable,
    variables: BindingTable,
    dynamics: BindingTable,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let mut registers = [false; 32];
        for band in RESERVED {
            for index in band {
                registers[index as usize] = true;
            }
        }

        Context {
            registers,
            frame: Frame::default(),
            globals: BindingTable::default(),
            variables: BindingTable::default(),
            dynamics: BindingTable::default(),
        }
    }

    pub fn with_frame(frame: Frame) -> Self {
        Context {
            frame,
            ..Context::new()
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Bytes currently pushed below the frame by live dynamics.
    pub fn dynamic_bytes(&self) -> u32 {
        DYNAMIC_SLOT_BYTES * self.dynamics.len() as u32
    }

    fn free_in(&self, band: std::ops::RangeInclusive<u8>) -> Result<Vec<Register>, ErrorImpl> {
        let free: Vec<Register> = band
            .map(Register)
            .filter(|register| !self.is_used(*register))
            .collect();

        if free.is_empty() {
            return Err(ErrorImpl::RegistersExhausted);
        }
        Ok(free)
    }

    /// Unborrowed scratch registers, lowest first.
    pub fn free_saved_registers(&self) -> Result<Vec<Register>, ErrorImpl> {
        self.free_in(SCRATCH_BAND)
    }

    pub fn free_temporary_registers(&self) -> Result<Vec<Register>, ErrorImpl> {
        self.free_in(TEMPORARY_BAND)
    }

    pub fn is_used(&self, register: Register) -> bool {
        self.registers[register.index()]
    }

    pub fn set_used(&mut self, register: Register) {
        self.registers[register.index()] = true;
    }

    pub fn set_unused(&mut self, register: Register) {
        self.registers[register.index()] = false;
    }

    /// Scratch registers currently borrowed.
    pub fn borrowed_scratch(&self) -> Vec<Register> {
        SCRATCH_BAND
            .map(Register)
            .filter(|register| self.is_used(*register))
            .collect()
    }

    /// Borrows the lowest free scratch register for the duration of `f`.
    ///
    /// The register is released whether `f` succeeds or fails.
    pub fn with_scratch<T, F>(&mut self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Context, Register) -> Result<T, Error>,
    {
        let register = self.free_saved_registers()?[0];
        self.set_used(register);
        trace!("borrowed {}", register);

        let result = f(self, register);

        self.set_unused(register);
        trace!("released {}", register);
        result
    }

    fn table(&self, tier: Tier) -> &BindingTable {
        match tier {
            Tier::Variable => &self.variables,
            Tier::Dynamic => &self.dynamics,
            Tier::Global => &self.globals,
        }
    }

    fn table_mut(&mut self, tier: Tier) -> &mut BindingTable {
        match tier {
            Tier::Variable => &mut self.variables,
            Tier::Dynamic => &mut self.dynamics,
            Tier::Global => &mut self.globals,
        }
    }

    fn add(&mut self, tier: Tier, name: &str) -> u32 {
        let slot = self.table_mut(tier).add(name);
        trace!("bound {} {:?} to slot {}", tier, name, slot);
        slot
    }

    fn delete(&mut self, tier: Tier, name: &str) -> Result<(), ErrorImpl> {
        if self.table_mut(tier).delete(name) {
            Ok(())
        } else {
            Err(unbound(tier, name))
        }
    }

    fn find(&self, tier: Tier, name: &str) -> Result<u32, ErrorImpl> {
        self.table(tier).get(name).ok_or_else(|| unbound(tier, name))
    }

    pub fn add_global(&mut self, name: &str) -> u32 {
        self.add(Tier::Global, name)
    }

    pub fn delete_global(&mut self, name: &str) -> Result<(), ErrorImpl> {
        self.delete(Tier::Global, name)
    }

    pub fn find_global(&self, name: &str) -> Result<u32, ErrorImpl> {
        self.find(Tier::Global, name)
    }

    pub fn is_global(&self, name: &str) -> bool {
        self.globals.contains(name)
    }

    pub fn add_variable(&mut self, name: &str) -> u32 {
        self.add(Tier::Variable, name)
    }

    pub fn delete_variable(&mut self, name: &str) -> Result<(), ErrorImpl> {
        self.delete(Tier::Variable, name)
    }

    pub fn find_variable(&self, name: &str) -> Result<u32, ErrorImpl> {
        self.find(Tier::Variable, name)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    pub fn add_dynamic(&mut self, name: &str) -> u32 {
        self.add(Tier::Dynamic, name)
    }

    pub fn delete_dynamic(&mut self, name: &str) -> Result<(), ErrorImpl> {
        self.delete(Tier::Dynamic, name)
    }

    pub fn find_dynamic(&self, name: &str) -> Result<u32, ErrorImpl> {
        self.find(Tier::Dynamic, name)
    }

    pub fn is_dynamic(&self, name: &str) -> bool {
        self.dynamics.contains(name)
    }

    /// Whether `name` resolves in any tier.
    pub fn is_on_stack(&self, name: &str) -> bool {
        self.is_variable(name) || self.is_dynamic(name) || self.is_global(name)
    }

    /// Resolves `name` by tier priority: variable, then dynamic, then global.
    pub fn find_on_stack(&self, name: &str) -> Result<Address, ErrorImpl> {
        if let Some(slot) = self.variables.get(name) {
            return Ok(Address::Frame(-((WORD_SIZE * slot) as i32)));
        }

        if let Some(slot) = self.dynamics.get(name) {
            let count = self.dynamics.len() as u32;
            return Ok(Address::Stack(
                DYNAMIC_SLOT_BYTES * count.saturating_sub(slot + 1),
            ));
        }

        if self.globals.contains(name) {
            return Ok(Address::Global(name.to_string()));
        }

        Err(ErrorImpl::UnresolvedIdentifier {
            name: name.to_string(),
        })
    }
}

fn unbound(tier: Tier, name: &str) -> ErrorImpl {
    ErrorImpl::UnboundName {
        tier: tier.to_string(),
        name: name.to_string(),
    }
}
