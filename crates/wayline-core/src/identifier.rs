//! Interned identifiers for nodes and edges.
//!
//! Node and edge ids are compared, hashed, and copied on every geometry call,
//! so they are stored once in a process-wide string interner and passed around
//! as a small `Copy` symbol.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, MutexGuard, OnceLock, PoisonError},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

/// Locks the global interner.
///
/// The interner is only ever appended to, so a poisoned lock still guards a
/// consistent table and is recovered rather than propagated.
fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Identifier of a node or an edge.
///
/// # Examples
///
/// ```
/// use wayline_core::identifier::Id;
///
/// let a = Id::new("payments-api");
/// let b: Id = "payments-api".into();
/// assert_eq!(a, b);
/// assert_eq!(a, "payments-api");
///
/// let generated = Id::generated("edge", 3);
/// assert_eq!(generated, "edge-3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from a string slice, interning it on first use.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Creates a deterministic `{prefix}-{index}` identifier.
    ///
    /// Used when an incoming record has no usable id of its own.
    pub fn generated(prefix: &str, index: usize) -> Self {
        Self::new(&format!("{prefix}-{index}"))
    }

    /// Returns an owned copy of the identifier text.
    pub fn to_text(self) -> String {
        interner()
            .resolve(self.0)
            .map(str::to_owned)
            .unwrap_or_default()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Ids order by their text, not by interning order.
///
/// The batch layout seeds columns in id order, which must not depend on the
/// order in which strings happened to be interned.
impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let interner = interner();
        interner.resolve(self.0).cmp(&interner.resolve(other.0))
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::new(&text))
    }
}
