//! Sample labels from `<label>_<index>` row keys

use growth_core::{PrepError, PrepResult, Table};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What to do with a row key that has no `_<digits>` part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Fail with [`PrepError::InvalidFormat`]
    #[default]
    Strict,
    /// Use the whole key as the label
    PassThrough,
}

/// Split a key at its last underscore that is followed by a digit
///
/// Returns the label and the digit run after that underscore.
/// `"Strain_A_12"` gives `("Strain_A", "12")`.
pub fn split_label(key: &str) -> Option<(&str, &str)> {
    let bytes = key.as_bytes();
    let at = (0..bytes.len().saturating_sub(1))
        .rev()
        .find(|&i| bytes[i] == b'_' && bytes[i + 1].is_ascii_digit())?;

    let rest = &key[at + 1..];
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    Some((&key[..at], &rest[..digits_len]))
}

fn label_for(key: &str, policy: LabelPolicy) -> PrepResult<String> {
    match (split_label(key), policy) {
        (Some((label, _)), _) if !label.is_empty() => Ok(label.to_string()),
        (_, LabelPolicy::PassThrough) => Ok(key.to_string()),
        (Some(_), LabelPolicy::Strict) => Err(PrepError::InvalidFormat {
            value: key.to_string(),
            reason: "label before `_<digits>` is empty",
        }),
        (None, LabelPolicy::Strict) => Err(PrepError::InvalidFormat {
            value: key.to_string(),
            reason: "expected `<label>_<digits>`",
        }),
    }
}

/// Labels of every row, in row order, failing on keys without the pattern
pub fn extract_labels(table: &Table) -> PrepResult<Vec<String>> {
    extract_labels_with(table, LabelPolicy::Strict)
}

/// Labels of every row under the given policy
pub fn extract_labels_with(table: &Table, policy: LabelPolicy) -> PrepResult<Vec<String>> {
    debug!(rows = table.n_rows(), ?policy, "extracting labels");

    table
        .row_keys()
        .iter()
        .map(|key| label_for(&key.to_string(), policy))
        .collect()
}
