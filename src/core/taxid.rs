//! Spanish tax identifier (NIF/NIE/CIF) checksum validation.
//!
//! The lookup alphabets are part of the external legal spec and are
//! compile-time constants — they must never be configurable.

use serde::{Deserialize, Serialize};

/// Control letter sequence for NIF/NIE: letter = table[number % 23].
const NIF_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

/// Valid CIF organisation-type prefixes.
const CIF_PREFIXES: &[u8] = b"ABCDEFGHJKLMNPQRSUVW";

/// CIF prefixes whose control character must be a letter (A..J).
const CIF_LETTER_CONTROL: &[u8] = b"KLMNPQRSW";

/// CIF prefixes whose control character must be a digit.
const CIF_DIGIT_CONTROL: &[u8] = b"ABEH";

/// Kind of Spanish tax identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxIdKind {
    /// Individual (8 digits + control letter).
    Nif,
    /// Foreign resident (X/Y/Z + 7 digits + control letter).
    Nie,
    /// Company (prefix letter + 7 digits + control digit/letter).
    Cif,
    /// Unrecognised shape.
    Unknown,
}

/// A classified Spanish tax identifier. Immutable value object, created by
/// [`classify`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxId {
    /// Input as given.
    pub raw: String,
    /// Uppercased, separators stripped.
    pub normalized: String,
    pub kind: TaxIdKind,
    pub valid: bool,
}

impl TaxId {
    /// The normalized identifier, regardless of validity.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }
}

/// Uppercase and strip whitespace, dots, and hyphens. Pure and total.
pub fn normalize(id: &str) -> String {
    id.chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn nif_letter(number: u32) -> char {
    NIF_LETTERS[(number % 23) as usize] as char
}

/// Validate a NIF (8 digits + control letter). Never panics; any other
/// shape is simply `false`.
pub fn validate_nif(id: &str) -> bool {
    let id = normalize(id);
    let bytes = id.as_bytes();
    if bytes.len() != 9 || !bytes[..8].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let letter = bytes[8] as char;
    if !letter.is_ascii_uppercase() {
        return false;
    }
    // 8 ASCII digits always parse
    let number: u32 = match id[..8].parse() {
        Ok(n) => n,
        Err(_) => return false,
    };
    letter == nif_letter(number)
}

/// Validate a NIE (X/Y/Z + 7 digits + control letter). The prefix maps to
/// a leading digit (X→0, Y→1, Z→2) and the same mod-23 table applies.
pub fn validate_nie(id: &str) -> bool {
    let id = normalize(id);
    let bytes = id.as_bytes();
    if bytes.len() != 9 || !bytes[1..8].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let prefix_digit = match bytes[0] {
        b'X' => 0u32,
        b'Y' => 1,
        b'Z' => 2,
        _ => return false,
    };
    let letter = bytes[8] as char;
    if !letter.is_ascii_uppercase() {
        return false;
    }
    let tail: u32 = match id[1..8].parse() {
        Ok(n) => n,
        Err(_) => return false,
    };
    let number = prefix_digit * 10_000_000 + tail;
    letter == nif_letter(number)
}

/// Validate a CIF (organisation prefix + 7 digits + control).
///
/// Control arithmetic per the legal spec: digits at even positions (0-indexed)
/// are doubled and digit-folded, digits at odd positions are summed as-is,
/// and the control digit is `(10 - total % 10) % 10`. Letter-control prefixes
/// require the letter form, digit-control prefixes the digit form, all other
/// prefixes accept either.
pub fn validate_cif(id: &str) -> bool {
    let id = normalize(id);
    let bytes = id.as_bytes();
    if bytes.len() != 9 || !CIF_PREFIXES.contains(&bytes[0]) {
        return false;
    }
    let digits = &bytes[1..8];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let control = bytes[8];
    if !(control.is_ascii_digit() || (b'A'..=b'J').contains(&control)) {
        return false;
    }

    let mut total = 0u32;
    for (i, d) in digits.iter().enumerate() {
        let d = u32::from(d - b'0');
        if i % 2 == 0 {
            let doubled = d * 2;
            total += if doubled > 9 { doubled - 9 } else { doubled };
        } else {
            total += d;
        }
    }
    let control_digit = ((10 - total % 10) % 10) as u8;
    let expected_digit = b'0' + control_digit;
    let expected_letter = b'A' + control_digit;

    if CIF_LETTER_CONTROL.contains(&bytes[0]) {
        control == expected_letter
    } else if CIF_DIGIT_CONTROL.contains(&bytes[0]) {
        control == expected_digit
    } else {
        control == expected_digit || control == expected_letter
    }
}

/// Classify an identifier by its first normalized character and run the
/// matching checksum. Never panics; unparseable input yields
/// `{ valid: false, kind: Unknown }`.
pub fn classify(id: &str) -> TaxId {
    let normalized = normalize(id);
    let (kind, valid) = match normalized.as_bytes().first() {
        Some(b'X') | Some(b'Y') | Some(b'Z') => (TaxIdKind::Nie, validate_nie(&normalized)),
        Some(c) if CIF_PREFIXES.contains(c) => (TaxIdKind::Cif, validate_cif(&normalized)),
        Some(c) if c.is_ascii_digit() => (TaxIdKind::Nif, validate_nif(&normalized)),
        _ => (TaxIdKind::Unknown, false),
    };
    TaxId {
        raw: id.to_string(),
        normalized,
        kind,
        valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- normalize ---

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize(" b-12.345.674 "), "B12345674");
        assert_eq!(normalize("x1234567l"), "X1234567L");
    }

    // --- NIF ---

    #[test]
    fn valid_nif() {
        // 12345678 % 23 = 14 → 'Z'
        assert!(validate_nif("12345678Z"));
        assert!(validate_nif("00000000T"));
    }

    #[test]
    fn nif_wrong_letter() {
        assert!(!validate_nif("12345678A"));
    }

    #[test]
    fn nif_bad_shape() {
        assert!(!validate_nif(""));
        assert!(!validate_nif("1234567Z"));
        assert!(!validate_nif("123456789"));
        assert!(!validate_nif("ABCDEFGHZ"));
    }

    // --- NIE ---

    #[test]
    fn valid_nie() {
        // X → 0, 00000000 % 23 = 0 → 'T'
        assert!(validate_nie("X0000000T"));
        // Y → 1, 10000000 % 23 = 14 → 'Z'
        assert!(validate_nie("Y0000000Z"));
    }

    #[test]
    fn nie_bad_prefix() {
        assert!(!validate_nie("A0000000T"));
    }

    #[test]
    fn nie_wrong_letter() {
        assert!(!validate_nie("X0000000A"));
    }

    // --- CIF ---

    #[test]
    fn valid_cif() {
        assert!(validate_cif("B12345674"));
    }

    #[test]
    fn cif_wrong_control() {
        assert!(!validate_cif("B12345670"));
    }

    #[test]
    fn cif_letter_control_prefix() {
        // Q requires the letter form of the same control value as B12345674 (4 → 'E')
        assert!(validate_cif("Q1234567E"));
        assert!(!validate_cif("Q12345674"));
    }

    #[test]
    fn cif_either_control_prefix() {
        // V accepts digit or letter form
        assert!(validate_cif("V12345674"));
        assert!(validate_cif("V1234567E"));
    }

    #[test]
    fn cif_bad_shape() {
        assert!(!validate_cif(""));
        assert!(!validate_cif("I12345674")); // I is not a CIF prefix
        assert!(!validate_cif("B1234567"));
    }

    // --- classify ---

    #[test]
    fn classify_dispatch() {
        assert_eq!(classify("12345678Z").kind, TaxIdKind::Nif);
        assert_eq!(classify("X0000000T").kind, TaxIdKind::Nie);
        assert_eq!(classify("B12345674").kind, TaxIdKind::Cif);
        assert_eq!(classify("??").kind, TaxIdKind::Unknown);
    }

    #[test]
    fn classify_never_panics_on_garbage() {
        let id = classify("");
        assert!(!id.valid);
        assert_eq!(id.kind, TaxIdKind::Unknown);
        assert!(!classify("ñÑñ").valid);
    }

    #[test]
    fn classify_keeps_raw_and_normalized() {
        let id = classify(" b-12345674 ");
        assert_eq!(id.raw, " b-12345674 ");
        assert_eq!(id.normalized, "B12345674");
        assert!(id.valid);
    }
}
