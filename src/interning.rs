//! Process-wide name interning.
//!
//! Scalar-expression encoding and knowledge-map construction both synthesise
//! constant names at runtime; every synthesised name must map to the same id
//! no matter which thread or call path produced it first. A single
//! `once_cell::sync::Lazy<parking_lot::Mutex<Interner>>` gives us that without
//! requiring callers to thread a table through every function signature.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Interner {
    ids: HashMap<String, u64>,
    names: Vec<String>,
}

impl Interner {
    fn add(&mut self, name: &str) -> u64 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u64;
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    fn name(&self, id: u64) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }
}

static CONSTANT_NAMES: Lazy<Mutex<Interner>> = Lazy::new(|| Mutex::new(Interner::default()));
static PRINCIPAL_NAMES: Lazy<Mutex<Interner>> = Lazy::new(|| Mutex::new(Interner::default()));

/// Interns a constant name, returning its stable id. Idempotent: interning
/// the same name twice (from any thread) returns the same id.
pub fn intern_constant_name(name: &str) -> u64 {
    CONSTANT_NAMES.lock().add(name)
}

/// Looks up the name previously interned under `id`, if any.
pub fn constant_name(id: u64) -> Option<String> {
    CONSTANT_NAMES.lock().name(id).map(str::to_string)
}

/// Interns a principal name, returning its stable id. The `Attacker`
/// principal is interned lazily the first time it is referenced, so it
/// always exists but never claims id 0 unless it happens to be the first
/// principal mentioned.
pub fn intern_principal_name(name: &str) -> u64 {
    PRINCIPAL_NAMES.lock().add(name)
}

pub fn principal_name(id: u64) -> Option<String> {
    PRINCIPAL_NAMES.lock().name(id).map(str::to_string)
}

/// The id of the distinguished `Attacker` principal, interned lazily on
/// first use. Every constant placed in a knowledge map before any
/// `principal` block is attributed to this principal.
pub fn attacker_principal_id() -> u64 {
    intern_principal_name("Attacker")
}

/// Resets both interning tables. Only meaningful in tests, where each case
/// wants its own stable id assignment starting from zero.
#[cfg(test)]
pub fn reset_for_test() {
    *CONSTANT_NAMES.lock() = Interner::default();
    *PRINCIPAL_NAMES.lock() = Interner::default();
}
