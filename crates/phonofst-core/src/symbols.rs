// Symbol ids and the interning symbol table.
//
// Automata only ever see `Symbol` ids. The table maps ids back to names for
// rendering results and is written next to an automaton in model files.

use bytemuck::{Pod, Zeroable};
use hashbrown::HashMap;

use crate::SymbolTableError;

/// An opaque token from a finite alphabet.
///
/// Id 0 is reserved for [`Symbol::EPSILON`] ("no consumption / production").
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Pod, Zeroable)]
pub struct Symbol(pub u32);

impl Symbol {
    /// The empty symbol. Distinct from every real symbol.
    pub const EPSILON: Symbol = Symbol(0);

    #[inline]
    pub fn is_epsilon(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interning table from symbol names to dense ids.
///
/// The empty name always maps to [`Symbol::EPSILON`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    names: Vec<String>,
    index: HashMap<String, Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only epsilon.
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(String::new(), Symbol::EPSILON);
        Self {
            names: vec![String::new()],
            index,
        }
    }

    /// Return the id of `name`, adding it if it is not known yet.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.index.get(name) {
            return sym;
        }
        let sym = Symbol(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), sym);
        sym
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.index.get(name).copied()
    }

    /// Name of a symbol, `None` for ids this table never produced.
    pub fn name(&self, sym: Symbol) -> Option<&str> {
        self.names.get(sym.index()).map(String::as_str)
    }

    /// Number of symbols including epsilon.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when only epsilon is present.
    pub fn is_empty(&self) -> bool {
        self.names.len() == 1
    }

    /// Iterate over all real (non-epsilon) symbols in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.names
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, name)| (Symbol(i as u32), name.as_str()))
    }

    /// Concatenate the names of a symbol sequence. Epsilons render as nothing;
    /// unknown ids are skipped.
    pub fn render(&self, symbols: &[Symbol]) -> String {
        let mut out = String::new();
        for &sym in symbols {
            if let Some(name) = self.name(sym) {
                out.push_str(name);
            }
        }
        out
    }

    /// Map every character of `text` to its symbol. Returns `None` if any
    /// character is not in the table.
    pub fn lookup_chars(&self, text: &str) -> Option<Vec<Symbol>> {
        let mut buf = [0u8; 4];
        text.chars()
            .map(|ch| self.get(ch.encode_utf8(&mut buf)))
            .collect()
    }

    /// Append the binary form of the table to `buf`.
    ///
    /// Layout: symbol count (u32 LE) followed by one NUL-terminated UTF-8
    /// string per symbol, epsilon first.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), SymbolTableError> {
        buf.extend_from_slice(&(self.names.len() as u32).to_le_bytes());
        for name in &self.names {
            if name.as_bytes().contains(&0) {
                return Err(SymbolTableError::EmbeddedNul(name.clone()));
            }
            buf.extend_from_slice(name.as_bytes());
            buf.push(0);
        }
        Ok(())
    }

    /// Parse a table written by [`write_to`](Self::write_to) starting at
    /// `offset`. Returns the table and the offset just past its data.
    pub fn parse(data: &[u8], offset: usize) -> Result<(Self, usize), SymbolTableError> {
        if offset + 4 > data.len() {
            return Err(SymbolTableError::TooShort {
                expected: offset + 4,
                actual: data.len(),
            });
        }
        let count = u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]);
        let mut pos = offset + 4;

        let mut names = Vec::with_capacity(count as usize);
        let mut index = HashMap::with_capacity(count as usize);

        for i in 0..count {
            let start = pos;
            while pos < data.len() && data[pos] != 0 {
                pos += 1;
            }
            if pos >= data.len() {
                return Err(SymbolTableError::Unterminated(i));
            }
            let name = std::str::from_utf8(&data[start..pos])
                .map_err(|_| SymbolTableError::InvalidUtf8(i))?;
            pos += 1;

            if i == 0 && !name.is_empty() {
                return Err(SymbolTableError::MissingEpsilon);
            }
            if index.insert(name.to_string(), Symbol(i)).is_some() {
                return Err(SymbolTableError::Duplicate(name.to_string()));
            }
            names.push(name.to_string());
        }

        if names.is_empty() {
            return Err(SymbolTableError::MissingEpsilon);
        }

        Ok((Self { names, index }, pos))
    }
}
