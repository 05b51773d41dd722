// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Session cookies that embed pages set from script, needed to fetch their streams.

use regex::Regex;
use std::sync::OnceLock;

/// Insertion-ordered cookie map scoped to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later values for the same name overwrite earlier ones in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Merge `Set-Cookie` response header values.
    pub fn extend_from_set_cookie<S: AsRef<str>>(&mut self, values: &[S]) {
        for value in values {
            let pair = value.as_ref().split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                self.insert(name.trim(), value.trim());
            }
        }
    }
}

impl Extend<(String, String)> for CookieJar {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl IntoIterator for CookieJar {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieJar {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut jar = Self::new();
        for (name, value) in iter {
            jar.insert(name, value);
        }
        jar
    }
}

/// Scan page scripts for `$.cookie('name', 'value')` calls, then
/// `document.cookie = "name=value"` assignments.
pub fn extract_cookies(html: &str) -> CookieJar {
    static JQUERY_RE: OnceLock<Regex> = OnceLock::new();
    static DOCUMENT_RE: OnceLock<Regex> = OnceLock::new();

    let jquery = JQUERY_RE.get_or_init(|| {
        Regex::new(r#"\$\.cookie\(\s*['"]([^'"]+)['"]\s*,\s*['"]([^'"]*)['"]"#)
            .expect("valid jquery cookie regex")
    });
    let document = DOCUMENT_RE.get_or_init(|| {
        Regex::new(r#"document\.cookie\s*=\s*['"]\s*([^=;'"\s]+)\s*=\s*([^;'"]*)"#)
            .expect("valid document cookie regex")
    });

    let mut jar = CookieJar::new();
    for caps in jquery.captures_iter(html).chain(document.captures_iter(html)) {
        jar.insert(caps[1].trim(), caps[2].trim());
    }
    jar
}

/// `name=value` pairs joined with `"; "`; empty string when there is nothing to send.
pub fn build_cookie_header(jar: &CookieJar) -> String {
    jar.iter()
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
