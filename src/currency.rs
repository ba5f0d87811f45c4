use std::fmt::{self, Debug, Display};
use std::sync::RwLock;

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::interner::Interner;

lazy_static! {
    static ref INTERNER: RwLock<Interner> = RwLock::new(Interner::with_capacity(16));
}

type Id = usize;

/// An ISO-like currency code such as `LKR` or `USD`.
///
/// Codes are interned so a `Currency` is a cheap `Copy` value that
/// compares by index.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Currency(Id);

impl Currency {
    pub fn new(code: &str) -> Currency {
        let mut iner = INTERNER.write().unwrap();
        Currency(iner.intern(code.trim()))
    }

    /// The home currency, used where a record does not name one.
    pub fn base() -> Currency {
        Currency::new("LKR")
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn code(&self) -> String {
        let iner = INTERNER.read().unwrap();
        iner.code(self.0).to_owned()
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} :: {})", self.code(), self.0)
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Ok(Currency::new(&code))
    }
}
