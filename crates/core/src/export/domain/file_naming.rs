use std::path::{Path, PathBuf};

use crate::shared::constants::PNG_EXTENSION;

/// `folder/<file_name>.png`
pub fn image_output_path(folder: &Path, file_name: &str) -> PathBuf {
    folder.join(format!("{file_name}.{PNG_EXTENSION}"))
}

/// Returns `file_name` if it is free, otherwise the first free `base(k)`.
///
/// A name that already ends in a counter such as `render(3)` keeps counting
/// from that counter instead of nesting, so the next free name is `render(4)`
/// rather than `render(3)(1)`. Names with no parenthesised number start at 1.
pub fn find_available_file_name(file_name: &str, exists: impl Fn(&str) -> bool) -> String {
    if !exists(file_name) {
        return file_name.to_owned();
    }

    let (base, mut k) = split_counter(file_name).unwrap_or((file_name, 1));

    let mut candidate = file_name.to_owned();
    while exists(&candidate) {
        candidate = format!("{base}({k})");
        k = k.saturating_add(1);
    }
    candidate
}

/// Same as [`find_available_file_name`], probing `folder` for PNG files.
pub fn find_available_file_name_in(folder: &Path, file_name: &str) -> String {
    find_available_file_name(file_name, |name| {
        image_output_path(folder, name).exists()
    })
}

/// Splits at the last `(` when it is directly followed by digits.
fn split_counter(file_name: &str) -> Option<(&str, u32)> {
    let pos = file_name.rfind('(')?;
    let after = &file_name[pos + 1..];
    let digits_len = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    let k = after[..digits_len].parse().ok()?;
    Some((&file_name[..pos], k))
}
