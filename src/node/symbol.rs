//! Globally interned symbolic names
//!
//! Symbols are short textual names compared and hashed by content. A single
//! process-wide pool (lasso's `ThreadedRodeo`) backs every `Symbol`, so two
//! symbols created from equal strings carry the same 4-byte key and content
//! equality coincides with key equality.

use std::fmt;

use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

static POOL: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::default);

/// An interned name. Cheap to copy, compare, and hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Intern a string, returning its symbol
    pub fn new(s: &str) -> Self {
        Self(POOL.get_or_intern(s))
    }

    /// The symbol's text. Lives as long as the process; the pool never
    /// evicts.
    pub fn as_str(self) -> &'static str {
        Lazy::force(&POOL).resolve(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}
