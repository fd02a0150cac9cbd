//! Generated code helper for imported entities.
//!
//! Codes look like `DIV001` / `RNG014` / `BEAT102`: a fixed prefix plus a
//! zero-padded index. They are assigned on first import and never
//! reassigned, so generation always consults the full set of codes already
//! issued for the prefix.
use std::collections::HashSet;

/// Returns the lowest unused code for a prefix.
///
/// Pure function of its input: calling it twice with the same set yields
/// the same code. Callers that generate several codes in one pass must add
/// each result to `existing` before the next call.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use boundary_importer_repository::next_code;
///
/// let existing: HashSet<String> =
///     ["DIV001", "DIV002"].iter().map(|c| c.to_string()).collect();
/// assert_eq!(next_code("DIV", &existing), "DIV003");
/// ```
pub fn next_code(prefix: &str, existing: &HashSet<String>) -> String {
    let mut index: u32 = 1;
    loop {
        let code = format!("{}{:03}", prefix, index);
        if !existing.contains(&code) {
            return code;
        }
        index += 1;
    }
}
