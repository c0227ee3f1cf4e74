//! Check digit algorithms shared by the identifier tools

use rand::Rng;

use crate::capabilities::Entropy;

/// Strip spaces and hyphens, the separators people type into identifiers
pub fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

pub fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn digit_values(digits: &str) -> impl DoubleEndedIterator<Item = u32> + '_ {
    digits.chars().filter_map(|c| c.to_digit(10))
}

/// Luhn check digit for a payload of ASCII digits
pub fn luhn_check_digit(payload: &str) -> u32 {
    let sum: u32 = digit_values(payload)
        .rev()
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    (10 - sum % 10) % 10
}

/// Luhn validation of a full number (payload + check digit)
pub fn luhn_valid(number: &str) -> bool {
    if number.len() < 2 || !is_all_digits(number) {
        return false;
    }
    let (payload, check) = number.split_at(number.len() - 1);
    luhn_check_digit(payload) == digit_values(check).sum::<u32>()
}

/// GS1 check digit (EAN-13, ISBN-13): weights 1 and 3 from the left
/// for a 12 digit payload, i.e. 3 on the digit nearest the check digit.
pub fn gtin_check_digit(payload: &str) -> u32 {
    let sum: u32 = digit_values(payload)
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { d })
        .sum();
    (10 - sum % 10) % 10
}

pub fn gtin_valid(number: &str) -> bool {
    if number.len() < 2 || !is_all_digits(number) {
        return false;
    }
    let (payload, check) = number.split_at(number.len() - 1);
    gtin_check_digit(payload) == digit_values(check).sum::<u32>()
}

/// Remainder of a decimal string of any length modulo 97
pub fn mod97(digits: &str) -> u32 {
    digit_values(digits).fold(0, |acc, d| (acc * 10 + d) % 97)
}

/// Random string of ASCII digits
pub fn random_digits(entropy: &Entropy, len: usize) -> String {
    entropy.with(|rng| {
        (0..len)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    })
}
