// src/demux.rs
//! Splits one batched completion back into per-job cover letters

use tracing::warn;

/// Delimiter the model is told to put before letter `ordinal` (1-based)
pub fn cover_letter_marker(ordinal: usize) -> String {
    format!("### COVER LETTER FOR JOB {} ###", ordinal)
}

pub fn missing_letter_sentinel(ordinal: usize) -> String {
    format!("Error: Could not find cover letter for job {}", ordinal)
}

pub fn empty_letter_sentinel(ordinal: usize) -> String {
    format!("Error: Empty cover letter for job {}", ordinal)
}

/// Returns exactly `n` entries; entry i belongs to job i + 1.
///
/// Each marker is located by its literal first occurrence. A body runs from the
/// end of its marker to the first occurrence of the next ordinal's marker, or
/// to end of text when that marker is absent or opens the text. A next marker
/// found earlier than that leaves the body empty.
pub fn split_cover_letters(raw_text: &str, n: usize) -> Vec<String> {
    (1..=n)
        .map(|ordinal| {
            let marker = cover_letter_marker(ordinal);
            let Some(found) = raw_text.find(&marker) else {
                warn!("Marker not found for job {}", ordinal);
                return missing_letter_sentinel(ordinal);
            };
            let start = found + marker.len();

            let end = if ordinal < n {
                match raw_text.find(&cover_letter_marker(ordinal + 1)) {
                    None | Some(0) => raw_text.len(),
                    Some(next) => next.max(start),
                }
            } else {
                raw_text.len()
            };

            let letter = raw_text[start..end].trim();
            if letter.is_empty() {
                warn!("Empty cover letter for job {}", ordinal);
                return empty_letter_sentinel(ordinal);
            }
            letter.to_string()
        })
        .collect()
}
