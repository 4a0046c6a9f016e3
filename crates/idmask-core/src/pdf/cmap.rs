//! Minimal `ToUnicode` CMap reader (`bfchar` and `bfrange` sections).

use std::collections::HashMap;

/// Upper bound on codes expanded from a single `bfrange` entry.
const MAX_RANGE_LEN: u32 = 0x1_0000;

/// Character code → Unicode text mapping of one font.
#[derive(Debug, Clone, Default)]
pub(crate) struct ToUnicodeMap {
    map: HashMap<u32, String>,
}

impl ToUnicodeMap {
    pub(crate) fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Parse a decompressed CMap stream.
    pub(crate) fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut map = HashMap::new();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while i + 1 < tokens.len() {
                        match (&tokens[i], &tokens[i + 1]) {
                            (Token::Hex(src), Token::Hex(dst)) => {
                                map.insert(code_value(src), utf16_text(dst));
                                i += 2;
                            }
                            _ => break,
                        }
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while i + 2 < tokens.len() {
                        let (lo, hi) = match (&tokens[i], &tokens[i + 1]) {
                            (Token::Hex(lo), Token::Hex(hi)) => (code_value(lo), code_value(hi)),
                            _ => break,
                        };
                        if hi < lo || hi - lo >= MAX_RANGE_LEN {
                            i += 3;
                            continue;
                        }
                        match &tokens[i + 2] {
                            Token::Hex(dst) => {
                                for (offset, code) in (lo..=hi).enumerate() {
                                    map.insert(code, offset_text(dst, offset as u32));
                                }
                                i += 3;
                            }
                            Token::Array(items) => {
                                for (code, dst) in (lo..=hi).zip(items.iter()) {
                                    map.insert(code, utf16_text(dst));
                                }
                                i += 3;
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        Self { map }
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Array(Vec<Vec<u8>>),
    Word(String),
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let b = data[i];
        match b {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => {
                tokens.push(Token::Word("<<".to_string()));
                i += 2;
            }
            b'>' if data.get(i + 1) == Some(&b'>') => {
                tokens.push(Token::Word(">>".to_string()));
                i += 2;
            }
            b'<' => {
                let (hex, next) = read_hex(data, i + 1);
                tokens.push(Token::Hex(hex));
                i = next;
            }
            b'[' => {
                let mut items = Vec::new();
                i += 1;
                while i < data.len() && data[i] != b']' {
                    if data[i] == b'<' {
                        let (hex, next) = read_hex(data, i + 1);
                        items.push(hex);
                        i = next;
                    } else {
                        i += 1;
                    }
                }
                tokens.push(Token::Array(items));
                i += 1;
            }
            b'(' => {
                // literal strings only appear in the CMap header
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            _ if b.is_ascii_whitespace() || b == b']' || b == b'>' => i += 1,
            _ => {
                let start = i;
                while i < data.len() && !is_delimiter(data[i]) {
                    i += 1;
                }
                if i == start {
                    i += 1;
                    continue;
                }
                tokens.push(Token::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }

    tokens
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'<' | b'>' | b'[' | b']' | b'(' | b')' | b'%')
}

fn read_hex(data: &[u8], mut i: usize) -> (Vec<u8>, usize) {
    let mut nibbles = Vec::new();
    while i < data.len() && data[i] != b'>' {
        if let Some(v) = (data[i] as char).to_digit(16) {
            nibbles.push(v as u8);
        }
        i += 1;
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(0);
    }
    let bytes = nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
    (bytes, i + 1)
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|p| if p.len() == 2 { u16::from_be_bytes([p[0], p[1]]) } else { p[0] as u16 })
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

/// Destination text of a `bfrange` entry shifted by `offset` on its last unit.
fn offset_text(bytes: &[u8], offset: u32) -> String {
    let mut units = utf16_units(bytes);
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}
