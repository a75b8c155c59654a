//! Naming conventions shared by generated files and module wiring.

use crate::tree::dirname;

/// The spellings of one feature name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    pub name: String,
    /// `UserProfile`
    pub class_name: String,
    /// `userProfile`
    pub property_name: String,
    /// `user-profile`
    pub file_name: String,
}

pub fn names(name: &str) -> Names {
    Names {
        name: name.to_string(),
        class_name: to_class_name(name),
        property_name: to_property_name(name),
        file_name: to_file_name(name),
    }
}

pub fn to_class_name(name: &str) -> String {
    let property = to_property_name(name);
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Camel-case `name`: every run of `-`, `_`, `.` or whitespace is dropped
/// and the character after it upper-cased; a leading capital is lowered.
pub fn to_property_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut after_separator = false;
    for c in name.chars() {
        if is_separator(c) {
            after_separator = true;
        } else if after_separator {
            out.extend(c.to_uppercase());
            after_separator = false;
        } else {
            out.push(c);
        }
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            first.to_ascii_lowercase().to_string() + chars.as_str()
        }
        _ => out,
    }
}

pub fn to_file_name(name: &str) -> String {
    dasherize(name)
}

/// `myCustomState` -> `my-custom-state`, `my_state name` -> `my-state-name`.
pub fn dasherize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push('-');
        }
        match c {
            ' ' | '_' => out.push('-'),
            c => out.extend(c.to_lowercase()),
        }
        prev = Some(c);
    }
    out
}

/// Directory holding the module file.
pub fn find_module_parent(module_path: &str) -> String {
    dirname(module_path)
}

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '.') || c.is_whitespace()
}
