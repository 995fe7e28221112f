use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A symbol value. Two symbols are the same symbol only if they were created by the
/// same `Symbol()` call; clones share that identity, so a symbol handed across realms
/// stays equal to itself.
#[derive(Clone)]
pub struct SymbolData {
    id: Uuid,
    description: Option<String>,
}

impl SymbolData {
    pub fn new(description: impl Into<String>) -> Self {
        SymbolData {
            id: Uuid::new_v4(),
            description: Some(description.into()),
        }
    }

    pub fn new_empty() -> Self {
        SymbolData {
            id: Uuid::new_v4(),
            description: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
impl PartialEq for SymbolData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for SymbolData {}
impl Hash for SymbolData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}
impl Display for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}
impl fmt::Debug for SymbolData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Symbol({}#{})",
            self.description.as_deref().unwrap_or(""),
            self.id.to_simple()
        )
    }
}

/* Well known symbols */
lazy_static! {
    pub static ref SYMBOL_TO_STRING_TAG: SymbolData = SymbolData::new("Symbol.toStringTag");
}
