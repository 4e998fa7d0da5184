use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub use crate::btree::Char16;

/// A single typed attribute value. Mixed-type comparison is a programmer
/// contract violation per the data model — `compare` panics rather than
/// guessing at an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Int64(i64),
    Char16(Char16),
}

impl Register {
    pub fn from_int(value: i64) -> Self {
        Register::Int64(value)
    }

    pub fn from_str(value: &str) -> Self {
        Register::Char16(Char16::from_str(value))
    }

    pub fn as_int(&self) -> i64 {
        match self {
            Register::Int64(v) => *v,
            Register::Char16(_) => panic!("register is not Int64"),
        }
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Register::Char16(v) => v.as_str(),
            Register::Int64(_) => panic!("register is not Char16"),
        }
    }

    pub fn get_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Ordering between two registers of the *same* type. Comparing
    /// registers of different types is undefined behavior by contract;
    /// this panics loudly instead of silently picking an answer.
    pub fn compare(&self, other: &Register) -> Ordering {
        match (self, other) {
            (Register::Int64(a), Register::Int64(b)) => a.cmp(b),
            (Register::Char16(a), Register::Char16(b)) => a.cmp(b),
            _ => panic!("comparing registers of different types is undefined behavior"),
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Register::Int64(v) => write!(f, "{}", v),
            Register::Char16(v) => write!(f, "{}", v.as_str().trim_end_matches('\0')),
        }
    }
}
