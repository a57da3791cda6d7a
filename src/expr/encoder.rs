//! Shields function calls and color literals from the simplifier.
//!
//! The simplifier only understands arithmetic over numbers and names. A level
//! expression can also contain template function calls (`cos(a)`,
//! `math.floor(h / 2)`) and hex colors (`#ff00aa`), which the encoder swaps for
//! opaque symbols before simplification and restores afterwards. Symbols are
//! derived from a SHA-256 hash of the hidden text so that identical calls
//! collapse into the same symbol and can cancel algebraically.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::transform::TransformError;

pub const SYMBOL_PREFIX: &str = "tyl_sym_";

/// Number of hash bytes kept in a symbol name
const HASH_BYTES: usize = 8;

/// Exactly the width `symbol_for` emits, so trailing hex letters stay text
static SYMBOL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let source = format!("{}[0-9a-f]{{{}}}", SYMBOL_PREFIX, HASH_BYTES * 2);
    Regex::new(&source).expect("symbol pattern must compile")
});

/// A symbol table scoped to one transform call.
#[derive(Debug, Default)]
pub struct ExpressionEncoder {
    symbols: HashMap<String, String>,
}

impl ExpressionEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct substrings recorded so far
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Replace function calls and hex colors in `expr` with symbols
    pub fn encode(&mut self, expr: &str) -> String {
        let bytes = expr.as_bytes();
        let mut out = String::with_capacity(expr.len());
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            if is_ident_start(b) {
                let end = scan_while(bytes, i, is_ident_continue);
                match call_end(bytes, end) {
                    Some(call) => {
                        out.push_str(&self.symbol_for(&expr[i..call]));
                        i = call;
                    }
                    None => {
                        out.push_str(&expr[i..end]);
                        i = end;
                    }
                }
            } else if b.is_ascii_digit() {
                // Skip whole numeric literals so `1e5` never starts an identifier
                let end = scan_while(bytes, i, is_ident_continue);
                out.push_str(&expr[i..end]);
                i = end;
            } else if b == b'#' && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit) {
                let end = scan_while(bytes, i + 1, |c| c.is_ascii_hexdigit());
                out.push_str(&self.symbol_for(&expr[i..end]));
                i = end;
            } else {
                match expr[i..].chars().next() {
                    Some(ch) => {
                        out.push(ch);
                        i += ch.len_utf8();
                    }
                    None => break,
                }
            }
        }

        out
    }

    /// Restore every symbol in `expr` to the text it stands for
    pub fn decode(&self, expr: &str) -> Result<String, TransformError> {
        let mut out = String::with_capacity(expr.len());
        let mut last = 0;
        for symbol in SYMBOL_PATTERN.find_iter(expr) {
            let original = self
                .symbols
                .get(symbol.as_str())
                .ok_or_else(|| TransformError::UnrecognizedSymbol(symbol.as_str().to_string()))?;
            out.push_str(&expr[last..symbol.start()]);
            out.push_str(original);
            last = symbol.end();
        }
        out.push_str(&expr[last..]);
        Ok(out)
    }

    fn symbol_for(&mut self, token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        let hash: String = digest[..HASH_BYTES]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        let symbol = format!("{}{}", SYMBOL_PREFIX, hash);
        self.symbols
            .entry(symbol.clone())
            .or_insert_with(|| token.to_string());
        symbol
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

fn scan_while(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut end = start;
    while end < bytes.len() && pred(bytes[end]) {
        end += 1;
    }
    end
}

/// End of a balanced argument list opening at `start`, if there is one.
///
/// Parentheses inside quoted strings do not count.
fn call_end(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (j, &b) in bytes.iter().enumerate().skip(start) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(j + 1);
                    }
                }
                _ => {}
            },
        }
    }
    None
}
