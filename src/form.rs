//! Form body decoding
//!
//! Bespoke `application/x-www-form-urlencoded` handling. Nothing here fails:
//! malformed escapes, unknown keys and non-numeric values are absorbed the way
//! the numeric helpers describe.

use crate::grade::SUBJECT_COUNT;
use crate::record::StudentRecord;

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode a percent/plus-encoded string
///
/// - `+` becomes a space
/// - `%XX` with two hex digits becomes that byte
/// - `%` followed by two non-hex characters is copied verbatim
/// - a trailing `%` with fewer than two characters after it is dropped,
///   together with whatever follows it
///
/// Bytes that do not form valid UTF-8 are replaced lossily.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if i + 2 >= bytes.len() {
                    break;
                }
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                    _ => out.extend_from_slice(&bytes[i..i + 3]),
                }
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Convert the leading integer of `s`, or 0
///
/// Leading whitespace and one sign are accepted; conversion stops at the
/// first non-digit. Out-of-range values saturate.
pub fn parse_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        value = -value;
    }

    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Convert the leading decimal number of `s`, or 0.0
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. Non-finite results are treated as 0.0.
pub fn parse_float(s: &str) -> f32 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    // Exponent only counts if at least one digit follows it
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Iterate over the `key=value` pairs of a form body
///
/// Pairs without `=` are skipped. The split happens on the first `=`, so
/// values may contain further `=` characters. Values are not decoded.
pub fn pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split('&').filter_map(|pair| pair.split_once('='))
}

/// Parse a calculate form body into a student record
///
/// Recognized keys are `name`, `branch`, `semester`, `year`, `roll`, and any
/// key starting with `mark`. Marks fill the next free slot in arrival order;
/// marks beyond the fifth are dropped.
pub fn parse_form(body: &str) -> StudentRecord {
    let mut record = StudentRecord::default();
    let mut next_mark = 0;

    for (key, raw) in pairs(body) {
        let value = url_decode(raw);
        match key {
            "name" => record.set_name(&value),
            "branch" => record.set_branch(&value),
            "semester" => record.semester = parse_int(&value),
            "year" => record.year = parse_int(&value),
            "roll" => record.roll = parse_int(&value),
            k if k.starts_with("mark") => {
                if next_mark < SUBJECT_COUNT {
                    record.marks[next_mark] = parse_float(&value);
                    next_mark += 1;
                }
            }
            _ => {}
        }
    }

    record
}

/// The roll named by a delete body
///
/// Only the text after the first `=` is read; the key is ignored and the
/// value runs to the end of the body. `None` when the body has no `=`.
pub fn delete_roll(body: &str) -> Option<i32> {
    body.split_once('=').map(|(_, value)| parse_int(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("John%20Doe"), "John Doe");
        assert_eq!(url_decode("a+b"), "a b");
        assert_eq!(url_decode("plain"), "plain");
        assert_eq!(url_decode("%41%62c"), "Abc");
    }

    #[test]
    fn test_url_decode_incomplete_escape() {
        assert_eq!(url_decode("bad%"), "bad");
        assert_eq!(url_decode("bad%4"), "bad");
        assert_eq!(url_decode("%"), "");
    }

    #[test]
    fn test_url_decode_invalid_escape() {
        assert_eq!(url_decode("100%zz"), "100%zz");
        assert_eq!(url_decode("%g1x"), "%g1x");
    }

    #[test]
    fn test_url_decode_utf8() {
        assert_eq!(url_decode("Jos%C3%A9"), "José");
        // Lone continuation byte
        assert_eq!(url_decode("a%80b"), "a\u{FFFD}b");
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("  -7"), -7);
        assert_eq!(parse_int("+3"), 3);
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int("99999999999"), i32::MAX);
        assert_eq!(parse_int("-99999999999"), i32::MIN);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("95"), 95.0);
        assert_eq!(parse_float("88.5"), 88.5);
        assert_eq!(parse_float(" -1.25xyz"), -1.25);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("5."), 5.0);
        assert_eq!(parse_float("1e2"), 100.0);
        assert_eq!(parse_float("7e"), 7.0);
        assert_eq!(parse_float("abc"), 0.0);
        assert_eq!(parse_float("."), 0.0);
        assert_eq!(parse_float("1e99"), 0.0);
    }

    #[test]
    fn test_parse_form() {
        let record = parse_form(
            "name=Alice&roll=12&branch=CS&semester=3&year=2\
             &mark1=95&mark2=90&mark3=88&mark4=92&mark5=97",
        );
        assert_eq!(record.name, "Alice");
        assert_eq!(record.branch, "CS");
        assert_eq!(record.roll, 12);
        assert_eq!(record.semester, 3);
        assert_eq!(record.year, 2);
        assert_eq!(record.marks, [95.0, 90.0, 88.0, 92.0, 97.0]);
    }

    #[test]
    fn test_parse_form_marks_by_arrival() {
        // Slot order follows arrival, not the key suffix
        let record = parse_form("mark5=1&markX=2&mark=3");
        assert_eq!(record.marks, [1.0, 2.0, 3.0, 0.0, 0.0]);

        let record = parse_form("mark1=1&mark2=2&mark3=3&mark4=4&mark5=5&mark6=6");
        assert_eq!(record.marks, [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_parse_form_ignores_noise() {
        let record = parse_form("junk&colour=red&name=Bob+Smith&=empty&roll=x7");
        assert_eq!(record.name, "Bob Smith");
        assert_eq!(record.roll, 0);
        assert_eq!(record.marks, [0.0; 5]);
    }

    #[test]
    fn test_parse_form_value_with_equals() {
        let record = parse_form("name=a=b");
        assert_eq!(record.name, "a=b");
    }

    #[test]
    fn test_delete_roll() {
        assert_eq!(delete_roll("roll=42"), Some(42));
        assert_eq!(delete_roll("anything=7"), Some(7));
        assert_eq!(delete_roll("roll=5&x=9"), Some(5));
        assert_eq!(delete_roll("roll="), Some(0));
        assert_eq!(delete_roll("nothing"), None);
    }
}
