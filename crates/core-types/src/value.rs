//! Opaque values and the identity hash that models `id(v)` in the paper.

use alloc::string::{String, ToString};
use core::fmt;

use displaydoc::Display;

/// An opaque value a proposer may propose.
///
/// The paper treats values as opaque and hashing as an injective abstraction; there is no
/// cryptographic hash here, only a newtype wrapping the symbol itself.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[displaydoc("{0}")]
pub struct Value(String);

impl Value {
    /// Build a value from its symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Value(symbol.into())
    }

    /// The identity hash of this value: `id(a) == id(b)` iff `a == b`.
    pub fn id(&self) -> ValueId {
        ValueId(self.0.clone())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(s)
    }
}

/// The identity abstraction of a hash applied to a [`Value`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[displaydoc("id({0})")]
pub struct ValueId(String);

/// Either `Nil` or a value of type `T`, used for prevote/precommit payloads
/// (`Option<ValueId>` would work just as well, but the paper spells this out as its own sum
/// type and `NilOrVal` reads closer to the "upon" rules than `Option` does).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NilOrVal<T> {
    /// No value (a vote for nil).
    Nil,
    /// A vote for the given value id.
    Val(T),
}

impl<T> NilOrVal<T> {
    /// Whether this is `Val(_)`.
    pub fn is_val(&self) -> bool {
        matches!(self, NilOrVal::Val(_))
    }

    /// Whether this is `Nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, NilOrVal::Nil)
    }

    /// The wrapped value id, if any.
    pub fn as_ref(&self) -> NilOrVal<&T> {
        match self {
            NilOrVal::Nil => NilOrVal::Nil,
            NilOrVal::Val(v) => NilOrVal::Val(v),
        }
    }

    /// Map the wrapped value id, if any.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> NilOrVal<U> {
        match self {
            NilOrVal::Nil => NilOrVal::Nil,
            NilOrVal::Val(v) => NilOrVal::Val(f(v)),
        }
    }

    /// The wrapped value id, or `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            NilOrVal::Nil => None,
            NilOrVal::Val(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for NilOrVal<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            None => NilOrVal::Nil,
            Some(v) => NilOrVal::Val(v),
        }
    }
}

impl<T: fmt::Display> fmt::Display for NilOrVal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NilOrVal::Nil => write!(f, "nil"),
            NilOrVal::Val(v) => write!(f, "{v}"),
        }
    }
}
