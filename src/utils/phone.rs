/// Keeps only the ASCII digits of a phone input.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Formats up to nine digits as `XX-XXX-XX-XX`, the way the number is typed
/// into the posting form. Extra digits are dropped.
pub fn format_local(raw: &str) -> String {
    let digits: Vec<char> = digits_only(raw).chars().take(LOCAL_DIGITS).collect();
    let mut formatted = String::with_capacity(12);
    for (i, group) in [0..2, 2..5, 5..7, 7..9].into_iter().enumerate() {
        if group.start >= digits.len() {
            break;
        }
        if i > 0 {
            formatted.push('-');
        }
        let end = group.end.min(digits.len());
        formatted.extend(&digits[group.start..end]);
    }
    formatted
}

/// Digits in a local number without the country code.
pub const LOCAL_DIGITS: usize = 9;

/// True for a stored local number: exactly nine ASCII digits.
pub fn is_local_number(value: &str) -> bool {
    value.len() == LOCAL_DIGITS && value.chars().all(|c| c.is_ascii_digit())
}

/// True for a local number typed as two, three, two and two digit groups.
pub fn is_local_pattern(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    let lengths = [2, 3, 2, 2];
    groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_digit()))
}
