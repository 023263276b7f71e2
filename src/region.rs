//! Locate and replace a `<div id="...">` region inside an HTML report
//!
//! The locator walks the document tag by tag and counts `<div` opens against
//! `</div>` closes from the target's opening tag until the depth returns to
//! zero. Comments, `<script>`/`<style>` bodies and quoted attribute values
//! are skipped, so markup inside them never moves the counter. Before and
//! after a splice the document is parsed with `scraper` to confirm the id
//! selects exactly one element.

use scraper::{Html, Selector};
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("invalid element id \"{0}\" (use letters, digits, '-' and '_')")]
    InvalidId(String),
    #[error("no <div> with id=\"{0}\" found in the document")]
    NotFound(String),
    #[error("id \"{id}\" is used by {count} elements; refusing to splice")]
    Duplicate { id: String, count: usize },
    #[error("<div id=\"{id}\"> opened at byte {start} is never closed")]
    Unterminated { id: String, start: usize },
    #[error("after splicing, id \"{id}\" selects {found} elements instead of 1")]
    Verification { id: String, found: usize },
}

/// A start or end tag found by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tag<'a> {
    /// Byte offset of `<`
    start: usize,
    /// Byte offset just past `>`
    end: usize,
    name: &'a str,
    closing: bool,
    /// Raw text between the tag name and `>`
    attrs: &'a str,
}

impl Tag<'_> {
    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Iterator over the tags of a document. Stops early on a truncated construct
/// (unclosed comment, tag or raw-text element).
struct TagScanner<'a> {
    doc: &'a str,
    pos: usize,
}

impl<'a> TagScanner<'a> {
    fn new(doc: &'a str) -> Self {
        Self { doc, pos: 0 }
    }
}

/// Index just past the `>` that ends a tag, ignoring `>` inside quotes
fn find_tag_end(doc: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in doc.as_bytes()[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(from + i + 1),
            None => {}
        }
    }
    None
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Tag<'a>> {
        let doc = self.doc;
        loop {
            let start = self.pos + doc[self.pos..].find('<')?;
            let rest = &doc[start..];

            if rest.starts_with("<!--") {
                match rest[4..].find("-->") {
                    Some(i) => {
                        self.pos = start + 4 + i + 3;
                        continue;
                    }
                    None => {
                        self.pos = doc.len();
                        return None;
                    }
                }
            }

            let closing = rest[1..].starts_with('/');
            let name_start = start + if closing { 2 } else { 1 };
            let name_len = doc[name_start..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
                .unwrap_or(doc.len() - name_start);
            let starts_alpha = doc[name_start..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic());
            if name_len == 0 || !starts_alpha {
                // Text `<`, doctype, processing instruction
                self.pos = start + 1;
                continue;
            }

            let name_end = name_start + name_len;
            let Some(end) = find_tag_end(doc, name_end) else {
                self.pos = doc.len();
                return None;
            };
            let tag = Tag {
                start,
                end,
                name: &doc[name_start..name_end],
                closing,
                attrs: &doc[name_end..end - 1],
            };
            self.pos = end;

            if !closing && (tag.is("script") || tag.is("style")) {
                // Raw text: resume at the matching end tag
                let close = format!("</{}", tag.name);
                match find_ascii_ci(&doc[end..], &close) {
                    Some(i) => self.pos = end + i,
                    None => self.pos = doc.len(),
                }
            }
            return Some(tag);
        }
    }
}

/// Value of attribute `wanted` in a tag's raw attribute text
fn attr_value<'a>(attrs: &'a str, wanted: &str) -> Option<&'a str> {
    let bytes = attrs.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'/') {
            i += 1;
        }
        let name = &attrs[name_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = "";
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let value_start = i + 1;
                i = value_start;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                value = &attrs[value_start..i];
                i += 1;
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                value = &attrs[value_start..i];
            }
        }
        if name.eq_ignore_ascii_case(wanted) {
            return Some(value);
        }
    }
    None
}

fn validate_id(id: &str) -> Result<(), RegionError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RegionError::InvalidId(id.to_string()))
    }
}

/// Number of elements the DOM parser finds with `id`
pub fn count_id(doc: &str, id: &str) -> Result<usize, RegionError> {
    validate_id(id)?;
    let selector = Selector::parse(&format!("[id=\"{}\"]", id))
        .map_err(|_| RegionError::InvalidId(id.to_string()))?;
    Ok(Html::parse_document(doc).select(&selector).count())
}

/// Byte range of the first `<div id="{id}">` element, from its opening `<`
/// to just past its matching `</div>`
pub fn locate_div(doc: &str, id: &str) -> Result<Range<usize>, RegionError> {
    validate_id(id)?;
    let mut scanner = TagScanner::new(doc);
    let open = scanner
        .by_ref()
        .find(|t| !t.closing && t.is("div") && attr_value(t.attrs, "id") == Some(id))
        .ok_or_else(|| RegionError::NotFound(id.to_string()))?;

    let mut depth = 1usize;
    for tag in scanner {
        if !tag.is("div") {
            continue;
        }
        if tag.closing {
            depth -= 1;
            if depth == 0 {
                return Ok(open.start..tag.end);
            }
        } else {
            depth += 1;
        }
    }
    Err(RegionError::Unterminated {
        id: id.to_string(),
        start: open.start,
    })
}

/// Replace the `<div id="{id}">` region with `replacement`.
///
/// The replacement must itself be the element carrying `id`; the result is
/// re-parsed and rejected unless exactly one element has that id.
pub fn splice_div(doc: &str, id: &str, replacement: &str) -> Result<String, RegionError> {
    match count_id(doc, id)? {
        0 => return Err(RegionError::NotFound(id.to_string())),
        1 => {}
        count => {
            return Err(RegionError::Duplicate {
                id: id.to_string(),
                count,
            })
        }
    }
    let range = locate_div(doc, id)?;

    let mut out = String::with_capacity(doc.len() - range.len() + replacement.len());
    out.push_str(&doc[..range.start]);
    out.push_str(replacement);
    out.push_str(&doc[range.end..]);

    let found = count_id(&out, id)?;
    if found != 1 {
        return Err(RegionError::Verification {
            id: id.to_string(),
            found,
        });
    }
    Ok(out)
}
