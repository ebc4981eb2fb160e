//! Type-annotated text form of a tag tree.
//!
//! Scalars become literals with a one-letter type suffix (`5b`, `-3s`, `7i`,
//! `1.5f`, `2.25d`), longs are written as their signed 32-bit halves
//! (`<high>;<low>l`), strings are JSON-quoted and arrays are bracketed
//! comma-separated literals followed by `b`, `i` or `l`. Compounds and lists
//! stay structural. An empty list is a one-element list holding the
//! `emptylist:<type>` sentinel so that the element type survives.
//!
//! Decoding infers every kind from the surface syntax alone, so the literal checks
//! run in a fixed order: arrays, sentinels and strings are
//! recognised before the generic numeric suffix.

use crate::{Tag, TagType};
use retrograde_common::{Result, RetrogradeError};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

pub const EMPTY_LIST_SENTINEL: &str = "emptylist:";

#[derive(Debug, Clone, PartialEq)]
pub enum EncodedValue {
    Compound(HashMap<String, EncodedValue>),
    List(Vec<EncodedValue>),
    Literal(String),
}

impl EncodedValue {
    pub fn literal(text: impl Into<String>) -> Self {
        EncodedValue::Literal(text.into())
    }

    pub fn empty_list(element_type: TagType) -> Self {
        EncodedValue::List(vec![EncodedValue::Literal(format!(
            "{}{}",
            EMPTY_LIST_SENTINEL,
            element_type.name()
        ))])
    }

    pub fn get(&self, key: &str) -> Option<&EncodedValue> {
        self.as_compound()?.get(key)
    }

    pub fn as_compound(&self) -> Option<&HashMap<String, EncodedValue>> {
        match self {
            EncodedValue::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<EncodedValue>> {
        match self {
            EncodedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            EncodedValue::Literal(text) => Some(text),
            _ => None,
        }
    }

    /// Element type carried by an empty-list sentinel, if this is one.
    pub fn empty_list_type(&self) -> Option<&str> {
        sentinel_type(self.as_list()?)
    }

    pub fn is_empty_list(&self) -> bool {
        self.empty_list_type().is_some()
    }

    /// Number of real elements; zero for the sentinel form and for non-lists.
    pub fn list_len(&self) -> usize {
        match self {
            EncodedValue::List(items) if !self.is_empty_list() => items.len(),
            _ => 0,
        }
    }

    /// Concatenates two encoded lists, keeping the sentinel only when both are empty.
    pub fn concat_lists(a: EncodedValue, b: EncodedValue) -> Result<EncodedValue> {
        match (a, b) {
            (EncodedValue::List(mut head), EncodedValue::List(tail)) => {
                if sentinel_type(&tail).is_some() {
                    return Ok(EncodedValue::List(head));
                }
                if sentinel_type(&head).is_some() {
                    return Ok(EncodedValue::List(tail));
                }
                head.extend(tail);
                Ok(EncodedValue::List(head))
            }
            _ => Err(RetrogradeError::invalid_format("only lists can be concatenated")),
        }
    }
}

fn sentinel_type(items: &[EncodedValue]) -> Option<&str> {
    match items {
        [EncodedValue::Literal(text)] => text.strip_prefix(EMPTY_LIST_SENTINEL),
        _ => None,
    }
}

/// Splits a long into its signed high and low 32-bit halves.
pub fn split_long(value: i64) -> (i32, i32) {
    ((value >> 32) as i32, value as i32)
}

/// Joins signed high and low 32-bit halves back into a long.
pub fn join_long(high: i32, low: i32) -> i64 {
    ((high as i64) << 32) | (low as u32 as i64)
}

fn long_literal(value: i64) -> String {
    let (high, low) = split_long(value);
    format!("{};{}", high, low)
}

fn array_literal<T: Display>(values: &[T], suffix: char) -> String {
    let body: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]{}", body.join(","), suffix)
}

pub fn encode_text(tag: &Tag) -> Result<EncodedValue> {
    let encoded = match tag {
        Tag::Compound(map) => {
            let mut buffer = HashMap::with_capacity(map.len());
            for (key, value) in map {
                buffer.insert(key.clone(), encode_text(value)?);
            }
            EncodedValue::Compound(buffer)
        }
        Tag::List(element_type, items) if items.is_empty() => {
            EncodedValue::empty_list(*element_type)
        }
        Tag::List(element_type, items) => {
            let mut buffer = Vec::with_capacity(items.len());
            for item in items {
                if item.tag_type() != *element_type {
                    return Err(RetrogradeError::invalid_format(format!(
                        "list of {} contains a {} element",
                        element_type.name(),
                        item.tag_type().name()
                    )));
                }
                buffer.push(encode_text(item)?);
            }
            EncodedValue::List(buffer)
        }
        Tag::Byte(v) => EncodedValue::Literal(format!("{}b", v)),
        Tag::Short(v) => EncodedValue::Literal(format!("{}s", v)),
        Tag::Int(v) => EncodedValue::Literal(format!("{}i", v)),
        Tag::Long(v) => EncodedValue::Literal(format!("{}l", long_literal(*v))),
        Tag::Float(v) => EncodedValue::Literal(format!("{}f", v)),
        Tag::Double(v) => EncodedValue::Literal(format!("{}d", v)),
        Tag::String(v) => EncodedValue::Literal(serde_json::to_string(v)?),
        Tag::ByteArray(v) => EncodedValue::Literal(array_literal(v, 'b')),
        Tag::IntArray(v) => EncodedValue::Literal(array_literal(v, 'i')),
        Tag::LongArray(v) => {
            let longs: Vec<String> = v.iter().map(|&l| long_literal(l)).collect();
            EncodedValue::Literal(array_literal(&longs, 'l'))
        }
        Tag::End => {
            return Err(RetrogradeError::invalid_format(
                "TAG_End has no textual form",
            ))
        }
    };
    Ok(encoded)
}

pub fn decode_text(value: &EncodedValue) -> Result<Tag> {
    match value {
        EncodedValue::Compound(map) => {
            let mut buffer = HashMap::with_capacity(map.len());
            for (key, value) in map {
                buffer.insert(key.clone(), decode_text(value)?);
            }
            Ok(Tag::Compound(buffer))
        }
        EncodedValue::List(items) => decode_list(items),
        EncodedValue::Literal(text) => decode_literal(text),
    }
}

fn decode_list(items: &[EncodedValue]) -> Result<Tag> {
    if let Some(name) = sentinel_type(items) {
        let element_type = TagType::from_name(name).ok_or_else(|| {
            RetrogradeError::invalid_format(format!("unknown empty list type {:?}", name))
        })?;
        return Ok(Tag::List(element_type, Vec::new()));
    }

    let tags = items.iter().map(decode_text).collect::<Result<Vec<_>>>()?;
    let element_type = match tags.first() {
        Some(first) => first.tag_type(),
        None => {
            return Err(RetrogradeError::invalid_format(
                "empty list without an element type sentinel",
            ))
        }
    };
    if let Some(stray) = tags.iter().find(|tag| tag.tag_type() != element_type) {
        return Err(RetrogradeError::invalid_format(format!(
            "list of {} contains a {} element",
            element_type.name(),
            stray.tag_type().name()
        )));
    }
    Ok(Tag::List(element_type, tags))
}

fn array_body(text: &str, suffix: char) -> Option<&str> {
    text.strip_prefix('[')?.strip_suffix(suffix)?.strip_suffix(']')
}

fn parse_number<T: FromStr>(text: &str, literal: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| RetrogradeError::invalid_format(format!("bad numeric literal {:?}", literal)))
}

fn parse_long(text: &str, literal: &str) -> Result<i64> {
    let (high, low) = text.split_once(';').ok_or_else(|| {
        RetrogradeError::invalid_format(format!("long {:?} is not a high;low pair", literal))
    })?;
    Ok(join_long(
        parse_number(high, literal)?,
        parse_number(low, literal)?,
    ))
}

fn parse_csv<T>(body: &str, literal: &str, parse: impl Fn(&str, &str) -> Result<T>) -> Result<Vec<T>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',').map(|item| parse(item, literal)).collect()
}

/// Classifies a literal: arrays, then sentinels, then strings, then numeric suffixes.
fn decode_literal(text: &str) -> Result<Tag> {
    if let Some(body) = array_body(text, 'b') {
        return parse_csv(body, text, parse_number::<i8>).map(Tag::ByteArray);
    }
    if let Some(body) = array_body(text, 'i') {
        return parse_csv(body, text, parse_number::<i32>).map(Tag::IntArray);
    }
    if let Some(body) = array_body(text, 'l') {
        return parse_csv(body, text, parse_long).map(Tag::LongArray);
    }

    if text.starts_with(EMPTY_LIST_SENTINEL) {
        return Err(RetrogradeError::invalid_format(format!(
            "empty list sentinel {:?} outside of a list",
            text
        )));
    }

    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return serde_json::from_str::<String>(text)
            .map(Tag::String)
            .map_err(|_| RetrogradeError::invalid_format(format!("bad string literal {}", text)));
    }

    let Some(suffix) = text.chars().last() else {
        return Err(RetrogradeError::invalid_format("empty literal"));
    };
    let number = &text[..text.len() - suffix.len_utf8()];
    match suffix {
        'b' => parse_number(number, text).map(Tag::Byte),
        's' => parse_number(number, text).map(Tag::Short),
        'i' => parse_number(number, text).map(Tag::Int),
        'l' => parse_long(number, text).map(Tag::Long),
        'f' => parse_number(number, text).map(Tag::Float),
        'd' => parse_number(number, text).map(Tag::Double),
        _ => Err(RetrogradeError::invalid_format(format!(
            "cannot classify literal {:?}",
            text
        ))),
    }
}
