use crate::domain::model::PhoneNumber;
use crate::utils::error::{LookupError, Result};

/// 國內號碼長度；剛好 10 碼且沒有 `+` 時補上預設國碼
const NATIONAL_NUMBER_LEN: usize = 10;

/// Strip everything but digits (a leading `+` survives) and enforce `min_digits`.
pub fn normalize_number(
    raw: &str,
    min_digits: usize,
    default_country_code: Option<&str>,
) -> Result<PhoneNumber> {
    let trimmed = raw.trim();
    let international = trimmed.starts_with('+');
    let mut digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < min_digits {
        return Err(LookupError::InvalidNumber {
            input: raw.to_string(),
            digits: digits.len(),
            min: min_digits,
        });
    }

    if !international && digits.len() == NATIONAL_NUMBER_LEN {
        if let Some(code) = default_country_code {
            digits.insert_str(0, code);
        }
    }

    Ok(PhoneNumber::new(digits, international))
}
