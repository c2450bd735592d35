use crate::error::LineBookError;

/// Example shown alongside a validation failure.
pub const PHONE_EXAMPLE: &str = "090-1234-5678";

/// Clean raw phone input the way the entry field does while typing.
///
/// Everything except digits and hyphens is dropped. A bare run of 10 or 11
/// digits is split into `NN[N]-NNNN-NNNN`; anything else is returned as
/// cleaned so the user can keep editing.
pub fn normalize_phone_input(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    let is_bare_digits = cleaned.chars().all(|c| c.is_ascii_digit());
    if is_bare_digits && (cleaned.len() == 10 || cleaned.len() == 11) {
        let head = cleaned.len() - 8;
        return format!(
            "{}-{}-{}",
            &cleaned[..head],
            &cleaned[head..head + 4],
            &cleaned[head + 4..]
        );
    }
    cleaned
}

/// True when `value` matches `NN[N]-NNNN-NNNN`.
pub fn is_valid_phone_number(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    let [area, middle, last] = groups.as_slice() else {
        return false;
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(area)
        && all_digits(middle)
        && all_digits(last)
        && (2..=3).contains(&area.len())
        && middle.len() == 4
        && last.len() == 4
}

/// Validate a phone number before save.
pub fn validate_phone_number(value: &str) -> Result<(), LineBookError> {
    if is_valid_phone_number(value) {
        return Ok(());
    }
    Err(LineBookError::InvalidPhoneNumber {
        input: value.to_string(),
        message: format!("電話番号の形式が正しくありません。\n例：{PHONE_EXAMPLE}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bare_digits() {
        assert_eq!(normalize_phone_input("09012345678"), "090-1234-5678");
        assert_eq!(normalize_phone_input("0312345678"), "03-1234-5678");
    }

    #[test]
    fn strips_foreign_characters() {
        assert_eq!(normalize_phone_input("090 1234 5678"), "090-1234-5678");
        assert_eq!(normalize_phone_input("(090)-1234-5678"), "090-1234-5678");
        assert_eq!(normalize_phone_input("tel:090-12"), "090-12");
    }

    #[test]
    fn leaves_partial_input_alone() {
        assert_eq!(normalize_phone_input("0901234"), "0901234");
        assert_eq!(normalize_phone_input(""), "");
    }

    #[test]
    fn validates_pattern() {
        assert!(is_valid_phone_number("090-1234-5678"));
        assert!(is_valid_phone_number("03-1234-5678"));
        assert!(!is_valid_phone_number("0901-234-5678"));
        assert!(!is_valid_phone_number("09012345678"));
        assert!(!is_valid_phone_number("090-1234-567"));
        assert!(!is_valid_phone_number("090-1234-5678-9"));
        assert!(!is_valid_phone_number("０９０-1234-5678"));
    }

    #[test]
    fn validation_error_carries_message() {
        let err = validate_phone_number("12-34").unwrap_err();
        assert!(err.to_string().contains(PHONE_EXAMPLE));
        assert!(matches!(err, LineBookError::InvalidPhoneNumber { ref input, .. } if input == "12-34"));
    }
}
