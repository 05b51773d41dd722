// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Reverse of the `eval(function(p,a,c,k,e,d){...})` JavaScript packer.
//!
//! Accepted signature (whitespace between arguments is tolerated):
//!
//! ```text
//! eval(function(p,a,c,k,e,d){ ... return p}('<payload>',<base>,<count>,'<w0>|<w1>|...'.split('|') ...
//! ```
//!
//! Payload and dictionary may use single or double quotes, with backslash escapes.
//! Hosts change these scripts without notice, so a mismatch is a normal outcome.

const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SIGNATURE: &str = "eval(function(p,a,c,k,e,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedScript {
    pub payload: String,
    pub base: u32,
    pub count: usize,
    pub dictionary: Vec<String>,
}

impl PackedScript {
    pub fn unpack(&self) -> String {
        unpack(&self.payload, self.base, self.count, &self.dictionary)
    }
}

/// Representation of `index` in `base`, using the packer's digit set (0-9, a-z, A-Z).
pub fn encode_index(mut index: usize, base: u32) -> Option<String> {
    let base = base as usize;
    if !(2..=DIGITS.len()).contains(&base) {
        return None;
    }

    let mut digits = Vec::new();
    loop {
        digits.push(DIGITS[index % base] as char);
        index /= base;
        if index == 0 {
            break;
        }
    }

    Some(digits.into_iter().rev().collect())
}

/// Substitute every whole-word token with its dictionary entry.
///
/// Indices are processed from `symbol_count - 1` down to 0. Empty dictionary
/// entries leave their token untouched. An unsupported base yields `""`.
pub fn unpack<S: AsRef<str>>(
    payload: &str,
    base: u32,
    symbol_count: usize,
    dictionary: &[S],
) -> String {
    if encode_index(0, base).is_none() {
        return String::new();
    }

    let mut decoded = payload.to_string();
    for index in (0..symbol_count).rev() {
        let Some(word) = dictionary.get(index) else {
            continue;
        };
        let word: &str = word.as_ref();
        if word.is_empty() {
            continue;
        }
        let Some(token) = encode_index(index, base) else {
            continue;
        };
        if let Some(replaced) = replace_whole_word(&decoded, &token, word) {
            decoded = replaced;
        }
    }

    decoded
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Returns `None` when no whole-word occurrence exists.
fn replace_whole_word(haystack: &str, token: &str, replacement: &str) -> Option<String> {
    let bytes = haystack.as_bytes();
    let mut output = String::with_capacity(haystack.len());
    let mut last = 0;

    for (start, _) in haystack.match_indices(token) {
        let end = start + token.len();
        let free_before = start == 0 || !is_word_byte(bytes[start - 1]);
        let free_after = end >= bytes.len() || !is_word_byte(bytes[end]);
        if free_before && free_after {
            output.push_str(&haystack[last..start]);
            output.push_str(replacement);
            last = end;
        }
    }

    if last == 0 {
        return None;
    }

    output.push_str(&haystack[last..]);
    Some(output)
}

/// Undo JavaScript string-literal escaping.
pub fn unescape_js(literal: &str) -> String {
    let mut output = String::with_capacity(literal.len());
    let mut chars = literal.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('r') => output.push('\r'),
            Some('t') => output.push('\t'),
            Some(other) => output.push(other),
            None => output.push('\\'),
        }
    }

    output
}

/// Locate and parse the first generic packer block in `source`.
pub fn find_packed(source: &str) -> Option<PackedScript> {
    source
        .match_indices(SIGNATURE)
        .find_map(|(start, _)| parse_packed_at(&source[start..]))
}

fn parse_packed_at(block: &str) -> Option<PackedScript> {
    let args_start = match block.find("return p}(") {
        Some(pos) => pos + "return p}(".len(),
        None => {
            let pos = block.find("}('").or_else(|| block.find("}(\""))?;
            pos + 2
        }
    };

    let mut cursor = Cursor::new(&block[args_start..]);
    let payload = cursor.string_literal()?;
    cursor.expect(',')?;
    let base = u32::try_from(cursor.number()?).ok()?;
    cursor.expect(',')?;
    let count = cursor.number()?;
    cursor.expect(',')?;
    let words = cursor.string_literal()?;
    cursor.expect_str(".split(")?;
    let separator = cursor.string_literal()?;
    if separator != "|" {
        return None;
    }

    Some(PackedScript {
        payload,
        base,
        count,
        dictionary: words.split('|').map(str::to_string).collect(),
    })
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self { rest: source }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn expect(&mut self, ch: char) -> Option<()> {
        self.skip_whitespace();
        self.rest = self.rest.strip_prefix(ch)?;
        Some(())
    }

    fn expect_str(&mut self, literal: &str) -> Option<()> {
        self.skip_whitespace();
        self.rest = self.rest.strip_prefix(literal)?;
        Some(())
    }

    fn number(&mut self) -> Option<usize> {
        self.skip_whitespace();
        let end = self
            .rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(self.rest.len());
        let value = self.rest[..end].parse().ok()?;
        self.rest = &self.rest[end..];
        Some(value)
    }

    fn string_literal(&mut self) -> Option<String> {
        self.skip_whitespace();
        let quote = self.rest.chars().next().filter(|ch| *ch == '\'' || *ch == '"')?;

        let mut escaped = false;
        for (offset, ch) in self.rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                let literal = unescape_js(&self.rest[1..offset]);
                self.rest = &self.rest[offset + 1..];
                return Some(literal);
            }
        }

        None
    }
}
