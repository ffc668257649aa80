//! Naming conventions for draft and derived (low-poly/high-poly) variants.

use crate::error::{Error, Result};

/// Length of the numeric disambiguator at the end of object names.
pub const DISAMBIGUATOR_LEN: usize = 4;

/// Prefix of `name` before the first occurrence of `draft_suffix`, or the
/// whole name when the suffix does not occur.
pub fn base_name<'a>(name: &'a str, draft_suffix: &str) -> &'a str {
    if draft_suffix.is_empty() {
        return name;
    }

    match name.find(draft_suffix) {
        Some(index) => &name[..index],
        None => name,
    }
}

/// Removes the disambiguator from an object name.
///
/// Accepted forms are four trailing digits, optionally after a `.`
/// (`Arm.0001`, `Arm0001`), and the `.NNN` form produced by [`unique_name`]
/// (`Arm.001`). The separator is removed along with the digits.
pub fn strip_disambiguator(name: &str) -> Result<&str> {
    let missing = || Error::MissingDisambiguator {
        name: name.to_string(),
    };

    let digits = name
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();

    let stem = if digits >= DISAMBIGUATOR_LEN {
        let stem = &name[..name.len() - DISAMBIGUATOR_LEN];
        stem.strip_suffix('.').unwrap_or(stem)
    } else if digits == DISAMBIGUATOR_LEN - 1 {
        name[..name.len() - digits]
            .strip_suffix('.')
            .ok_or_else(missing)?
    } else {
        return Err(missing());
    };

    if stem.is_empty() {
        return Err(missing());
    }

    Ok(stem)
}

/// Name of a derived object: the source name without its disambiguator,
/// followed by the target suffix.
pub fn derived_object_name(source_name: &str, target_suffix: &str) -> Result<String> {
    Ok(format!("{}{}", strip_disambiguator(source_name)?, target_suffix))
}

/// Name of a derived collection: the base name followed by the target suffix.
pub fn derived_collection_name(source_name: &str, draft_suffix: &str, target_suffix: &str) -> String {
    format!("{}{}", base_name(source_name, draft_suffix), target_suffix)
}

/// `base` if it is free, otherwise `base.001`, `base.002`, ... whichever is
/// free first.
pub fn unique_name(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }

    (1..)
        .map(|n| format!("{}.{:03}", base, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
