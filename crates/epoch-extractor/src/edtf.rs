//! Fuzzy date expression parsing
//!
//! Turns one EDTF-like token (`"155X"`, `"16XX/"`, `"[1600,1620]"`, `"15"`)
//! into a lower and an upper year. Unparsable input is not an error: the
//! affected side simply comes back as `None`.

use tracing::warn;

/// Lower and upper year of a parsed expression
pub type YearPair = (Option<i32>, Option<i32>);

/// Markers for uncertain or approximate dates
const UNCERTAINTY_MARKERS: &[char] = &['?', '~', '%'];

/// Digit placeholder for unknown precision
const PLACEHOLDER: char = 'X';

/// Separator of open and closed intervals
const RANGE_SEPARATOR: char = '/';

/// Parse one fuzzy date token into `(lower, upper)` years
pub fn parse_fuzzy_date(token: &str) -> YearPair {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| !UNCERTAINTY_MARKERS.contains(c))
        .collect();
    let has_separator = cleaned.contains(RANGE_SEPARATOR);

    // Century shorthand
    if cleaned.chars().count() == 2 {
        return (
            to_year(token, &format!("{cleaned}00")),
            to_year(token, &format!("{cleaned}99")),
        );
    }

    if cleaned.chars().count() < 6 && !has_separator {
        if cleaned.contains(PLACEHOLDER) {
            return (lowest(token, &cleaned), highest(token, &cleaned));
        }
        let year = to_year(token, &cleaned);
        return (year, year);
    }

    if let Some(rest) = cleaned.strip_prefix(RANGE_SEPARATOR) {
        return (None, highest(token, rest));
    }

    if let Some(rest) = cleaned.strip_suffix(RANGE_SEPARATOR) {
        return (lowest(token, rest), None);
    }

    if has_separator {
        let mut parts = cleaned.split(RANGE_SEPARATOR);
        let first = parts.next().unwrap_or_default();
        let second = parts.next().unwrap_or_default();
        return (lowest(token, first), highest(token, second));
    }

    if let Some(inner) = bracket_contents(&cleaned) {
        let candidates: Vec<&str> = inner.split(',').map(str::trim).collect();
        let first = candidates.first().copied().unwrap_or_default();
        let last = candidates.last().copied().unwrap_or_default();
        return (lowest(token, first), highest(token, last));
    }

    (None, None)
}

/// Contents of a `[..]` or `{..}` approximation bracket
fn bracket_contents(text: &str) -> Option<&str> {
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .or_else(|| text.strip_prefix('{').and_then(|t| t.strip_suffix('}')))?;
    Some(inner)
}

fn lowest(token: &str, text: &str) -> Option<i32> {
    to_year(token, &text.replace(PLACEHOLDER, "0"))
}

fn highest(token: &str, text: &str) -> Option<i32> {
    to_year(token, &text.replace(PLACEHOLDER, "9"))
}

fn to_year(token: &str, candidate: &str) -> Option<i32> {
    let candidate = candidate.trim();
    let digits = candidate.strip_prefix('-').unwrap_or(candidate);
    if (1..=4).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(year) = candidate.parse::<i32>() {
            return Some(year);
        }
    }
    warn!(token, candidate, "wrong EDTF expression");
    None
}
