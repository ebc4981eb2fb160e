use retrograde_common::{Result, RetrogradeError};
use retrograde_nbt::{decode_text, EncodedValue, Tag};

pub(crate) fn required<'a>(
    value: &'a EncodedValue,
    parent: &str,
    key: &str,
) -> Result<&'a EncodedValue> {
    value
        .get(key)
        .ok_or_else(|| RetrogradeError::invalid_format(format!("{} has no {} field", parent, key)))
}

fn unexpected(what: &str, expected: &str, tag: &Tag) -> RetrogradeError {
    RetrogradeError::invalid_format(format!(
        "{} should be a {}, found a {}",
        what,
        expected,
        tag.tag_type().name()
    ))
}

pub(crate) fn string(value: &EncodedValue, what: &str) -> Result<String> {
    match decode_text(value)? {
        Tag::String(text) => Ok(text),
        other => Err(unexpected(what, "string", &other)),
    }
}

pub(crate) fn int_array(value: &EncodedValue, what: &str) -> Result<Vec<i32>> {
    match decode_text(value)? {
        Tag::IntArray(ints) => Ok(ints),
        other => Err(unexpected(what, "int array", &other)),
    }
}

pub(crate) fn long_array(value: &EncodedValue, what: &str) -> Result<Vec<i64>> {
    match decode_text(value)? {
        Tag::LongArray(longs) => Ok(longs),
        other => Err(unexpected(what, "long array", &other)),
    }
}

/// Elements of an encoded list, none for the empty-list sentinel.
pub(crate) fn list_items<'a>(value: &'a EncodedValue, what: &str) -> Result<&'a [EncodedValue]> {
    if value.is_empty_list() {
        return Ok(&[]);
    }
    value
        .as_list()
        .map(Vec::as_slice)
        .ok_or_else(|| RetrogradeError::invalid_format(format!("{} should be a list", what)))
}
