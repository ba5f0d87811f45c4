use std::collections::HashMap;

/// Stores each currency code once and hands out a stable index for it.
///
/// Index 0 is reserved for the empty code so that a default `Currency`
/// is always valid.
pub struct Interner {
    map: HashMap<String, usize>,
    codes: Vec<String>,
}

impl Interner {
    pub fn with_capacity(cap: usize) -> Interner {
        let mut iner = Interner {
            map: HashMap::with_capacity(cap),
            codes: Vec::with_capacity(cap),
        };
        iner.intern("");
        iner
    }

    /// Returns the index of `code`, adding it first if it is new.
    pub fn intern(&mut self, code: &str) -> usize {
        if let Some(&idx) = self.map.get(code) {
            return idx;
        }
        let idx = self.codes.len();
        self.map.insert(code.to_owned(), idx);
        self.codes.push(code.to_owned());
        idx
    }

    /// # Panics
    /// Panics if `idx` was not handed out by this interner.
    pub fn code(&self, idx: usize) -> &str {
        self.codes[idx].as_str()
    }
}
