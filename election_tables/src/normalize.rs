use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::Sex;

/// Normalizes a department code.
///
/// Numeric codes are left-padded with zeros to two characters ("1" -> "01").
/// Other codes (Corsica "2A"/"2B", overseas "ZA", ...) are upper-cased.
/// Returns `None` for codes outside the known shapes.
pub fn normalize_department_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }
    let normalized = if code.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>2}", code)
    } else {
        code
    };
    if is_valid_department_code(&normalized) {
        Some(normalized)
    } else {
        None
    }
}

/// Accepts `^[0-9]{2}$`, the 3-digit overseas codes (97x, 98x), the Corsican
/// codes and the `Z?` codes used for overseas territories and French abroad.
pub fn is_valid_department_code(code: &str) -> bool {
    let chars: Vec<char> = code.chars().collect();
    match chars.as_slice() {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => true,
        ['9', '7' | '8', c] if c.is_ascii_digit() => true,
        ['2', 'A' | 'B'] => true,
        ['Z', c] if c.is_ascii_uppercase() => true,
        _ => false,
    }
}

/// Sort key for department codes: numeric part first, then the letters.
/// This keeps "2A" and "2B" between "02" and "03".
pub fn department_sort_key(code: &str) -> (u32, String) {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    let letters: String = code.chars().filter(|c| c.is_alphabetic()).collect();
    (digits.parse::<u32>().unwrap_or(0), letters)
}

/// Trims and collapses inner whitespace. Used for the stored spelling of names.
pub fn clean_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Case- and diacritics-insensitive form of a name, used in natural keys.
pub fn fold_name(raw: &str) -> String {
    clean_name(raw)
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}

/// Natural key of a candidate.
#[derive(Eq, PartialEq, Debug, Clone, Hash, PartialOrd, Ord)]
pub struct CandidateKey {
    pub surname: String,
    pub given_name: String,
    pub sex: Sex,
}

impl CandidateKey {
    pub fn new(surname: &str, given_name: &str, sex: Sex) -> CandidateKey {
        CandidateKey {
            surname: fold_name(surname),
            given_name: fold_name(given_name),
            sex,
        }
    }
}

/// Python-style capitalization: first character upper-cased, the rest lower-cased.
pub(crate) fn capitalize(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
