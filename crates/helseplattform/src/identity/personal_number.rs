//! Norwegian national identity number (fødselsnummer) checks.
//!
//! Layout is `DDMMYY` birth date, a three digit individual number, and two mod-11
//! control digits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const K1_WEIGHTS: [u32; 9] = [3, 7, 6, 1, 8, 9, 4, 5, 2];
const K2_WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersonalNumberError {
    #[error("personal number must contain exactly 11 digits")]
    InvalidLength,
    #[error("personal number encodes an impossible date")]
    InvalidDate,
    #[error("personal number control digits do not match")]
    ChecksumMismatch,
}

/// Validated 11 digit personal number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonalNumber {
    digits: [u8; 11],
}

impl PersonalNumber {
    /// Parse after stripping spaces and dashes.
    pub fn parse(raw: &str) -> Result<Self, PersonalNumberError> {
        let digits = cleaned_digits(raw).ok_or(PersonalNumberError::InvalidLength)?;

        let day = two_digit(&digits, 0);
        let month = two_digit(&digits, 2);
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return Err(PersonalNumberError::InvalidDate);
        }

        if control_digit(&digits[..9], &K1_WEIGHTS) != Some(digits[9])
            || control_digit(&digits[..10], &K2_WEIGHTS) != Some(digits[10])
        {
            return Err(PersonalNumberError::ChecksumMismatch);
        }

        Ok(Self { digits })
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    /// `DDMMYY XXXXX`
    pub fn formatted(&self) -> String {
        let text = self.as_string();
        format!("{} {}", &text[..6], &text[6..])
    }

    /// `****** XXXXX`, for display next to a signed-in profile.
    pub fn masked(&self) -> String {
        format!("****** {}", &self.as_string()[6..])
    }

    fn individual_number(&self) -> u32 {
        self.digits[6..9]
            .iter()
            .fold(0, |acc, digit| acc * 10 + u32::from(*digit))
    }

    /// Birth date using the individual-number century ranges.
    ///
    /// Only 500-749 with a year below 40 maps to the 2000s; every other range, 750-899
    /// included, is read as 19YY.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        let day = two_digit(&self.digits, 0);
        let month = two_digit(&self.digits, 2);
        let year = two_digit(&self.digits, 4) as i32;

        let century = match self.individual_number() {
            500..=749 if year < 40 => 2000,
            _ => 1900,
        };

        NaiveDate::from_ymd_opt(century + year, month, day)
    }

    /// Even individual numbers are female, odd are male.
    pub fn gender(&self) -> Gender {
        if self.individual_number() % 2 == 0 {
            Gender::Female
        } else {
            Gender::Male
        }
    }

    fn as_string(&self) -> String {
        self.digits
            .iter()
            .map(|digit| char::from(b'0' + digit))
            .collect()
    }
}

impl TryFrom<String> for PersonalNumber {
    type Error = PersonalNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PersonalNumber> for String {
    fn from(value: PersonalNumber) -> Self {
        value.as_string()
    }
}

fn cleaned_digits(raw: &str) -> Option<[u8; 11]> {
    let mut digits = [0u8; 11];
    let mut count = 0;
    for ch in raw.chars().filter(|ch| !ch.is_whitespace() && *ch != '-') {
        let digit = ch.to_digit(10)?;
        if count == digits.len() {
            return None;
        }
        digits[count] = digit as u8;
        count += 1;
    }
    (count == digits.len()).then_some(digits)
}

fn two_digit(digits: &[u8], offset: usize) -> u32 {
    u32::from(digits[offset]) * 10 + u32::from(digits[offset + 1])
}

/// Mod-11 control digit; `None` when the remainder makes the number unassignable.
fn control_digit(digits: &[u8], weights: &[u32]) -> Option<u8> {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(digit, weight)| u32::from(*digit) * weight)
        .sum();
    match 11 - (sum % 11) {
        11 => Some(0),
        10 => None,
        value => Some(value as u8),
    }
}
