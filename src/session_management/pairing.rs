use crate::error_handling::types::SessionError;

/// Numbers shorter than this cannot carry a country code.
pub const MIN_PHONE_DIGITS: usize = 10;
const CODE_GROUP_LEN: usize = 4;
const CODE_SEPARATOR: char = '-';

/// Strips everything but ASCII digits and checks the result is long enough.
pub fn normalize_phone_number(raw: Option<&str>) -> Result<String, SessionError> {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return Err(SessionError::MissingPhoneNumber),
    };
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(SessionError::InvalidPhoneNumber(digits));
    }
    Ok(digits)
}

/// `ABCD1234` -> `ABCD-1234`.
pub fn format_pairing_code(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    chars
        .chunks(CODE_GROUP_LEN)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(&CODE_SEPARATOR.to_string())
}

pub fn instructions(formatted_code: &str) -> Vec<String> {
    vec![
        String::from("1. Open the messaging app on your phone"),
        String::from("2. Go to Settings → Linked Devices"),
        String::from("3. Tap 'Link a Device'"),
        String::from("4. Select 'Link with phone number instead'"),
        format!("5. Enter this code: {}", formatted_code),
    ]
}

pub fn message(raw_code: &str) -> String {
    format!(
        "Enter this {}-character code on your phone to connect",
        raw_code.chars().count()
    )
}
