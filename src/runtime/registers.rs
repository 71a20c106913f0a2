use core::fmt;
use std::collections::HashMap;

use lasso::{Rodeo, Spur};

use super::RuntimeError;
use crate::compiler::instruction::Register;

/// Growable register arena with optional names.
///
/// A name is bound to at most one register at a time. The same register can
/// be looked up by name through `bindings` or asked for its name through
/// `names`; both are kept in step by [`RegisterFile::bind`] and
/// [`RegisterFile::unbind`].
#[derive(Debug)]
pub struct RegisterFile {
    values: Vec<f64>,
    names: Vec<Option<Spur>>,
    bindings: HashMap<Spur, Register>,
    interner: Rodeo,
    capacity: usize,
}

impl RegisterFile {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![],
            names: vec![],
            bindings: HashMap::default(),
            interner: Rodeo::default(),
            capacity,
        }
    }

    /// Number of live registers. Every register below this is live.
    pub fn live(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, register: Register) -> Option<f64> {
        self.values.get(register.index()).copied()
    }

    pub fn name(&self, register: Register) -> Option<&str> {
        let key = (*self.names.get(register.index())?)?;
        Some(self.interner.resolve(&key))
    }

    /// The register currently bound to `name`.
    pub fn lookup(&self, name: &str) -> Option<Register> {
        let key = self.interner.get(name)?;
        self.bindings.get(&key).copied()
    }

    /// Write `value` into `register`, growing the live set up to and
    /// including it. Registers skipped over come alive as anonymous zeros.
    pub fn store(&mut self, register: Register, value: f64) -> Result<(), RuntimeError> {
        let index = register.index();
        if index >= self.capacity {
            return Err(RuntimeError::RegisterFileFull {
                register,
                capacity: self.capacity,
            });
        }
        if index >= self.values.len() {
            self.values.resize(index + 1, 0.0);
            self.names.resize(index + 1, None);
        }
        self.values[index] = value;
        Ok(())
    }

    /// Name a live register, dropping whatever name it had before.
    ///
    /// A previous holder of `name` keeps its name slot until it is
    /// [unbound](Self::unbind), but lookups already resolve to `register`.
    pub fn bind(&mut self, register: Register, name: &str) -> Result<(), RuntimeError> {
        let live = self.live();
        let key = self.interner.get_or_intern(name);
        let slot = self
            .names
            .get_mut(register.index())
            .ok_or(RuntimeError::UnknownRegister { register, live })?;

        if let Some(previous) = slot.replace(key) {
            if previous != key && self.bindings.get(&previous) == Some(&register) {
                self.bindings.remove(&previous);
            }
        }
        self.bindings.insert(key, register);
        Ok(())
    }

    /// Make a register anonymous. Its value stays.
    pub fn unbind(&mut self, register: Register) {
        let Some(key) = self.names.get_mut(register.index()).and_then(Option::take) else {
            return;
        };
        if self.bindings.get(&key) == Some(&register) {
            self.bindings.remove(&key);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, f64, Option<&str>)> + '_ {
        self.values.iter().enumerate().map(|(index, value)| {
            let register = Register(index as u32);
            (register, *value, self.name(register))
        })
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (register, value, name) in self.iter() {
            match name {
                Some(name) => writeln!(f, "{register}/'{name}' = {value:.6}")?,
                None => writeln!(f, "{register} = {value:.6}")?,
            }
        }
        Ok(())
    }
}
