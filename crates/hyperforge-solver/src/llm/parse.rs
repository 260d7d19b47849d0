//! Reader for `***`-delimited response blocks.

use std::collections::BTreeMap;

use crate::error::SelectionParseError;

/// Value a model uses to end the run.
pub const STOP_KEYWORD: &str = "stop";

const DELIMITER: &str = "***";

/// `key: value` pairs found between the first two `***` lines.
///
/// Keys are lower-cased and trimmed. Later duplicates overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBlock {
    fields: BTreeMap<String, String>,
}

impl ResponseBlock {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, SelectionParseError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SelectionParseError::MissingField(key.to_string()))
    }

    /// Parses an unsigned integer field.
    pub fn usize_field(&self, key: &str) -> Result<Option<usize>, SelectionParseError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| SelectionParseError::InvalidValue {
                    field: key.to_string(),
                    value: value.to_string(),
                }),
        }
    }

    /// True when the model asked to stop, either with `stop: true` or by
    /// naming `stop` in `field`.
    pub fn is_stop(&self, field: &str) -> bool {
        let flag = self
            .get(STOP_KEYWORD)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1"));
        flag || self
            .get(field)
            .is_some_and(|v| v.eq_ignore_ascii_case(STOP_KEYWORD))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Extracts the block between the first two `***` lines of `text`.
///
/// Lines without a colon are ignored.
pub fn parse_block(text: &str) -> Result<ResponseBlock, SelectionParseError> {
    let mut inside = false;
    let mut closed = false;
    let mut fields = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with(DELIMITER) {
            if inside {
                closed = true;
                break;
            }
            inside = true;
            continue;
        }
        if !inside {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    if !closed || fields.is_empty() {
        return Err(SelectionParseError::MissingBlock);
    }
    Ok(ResponseBlock { fields })
}

/// Splits a comma separated list, dropping empty items and brackets.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
