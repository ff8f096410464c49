//! Number and time formatting for the status screen.

/// Format `value` with thousands separators and at most `max_fraction_digits`
/// decimals, trailing zeros trimmed (`1234.5` → `"1,234.5"`).
pub fn format_number(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let fixed = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Format an integer count with thousands separators.
pub fn format_count(value: u64) -> String {
    format_number(value as f64, 0)
}

/// Format a currency amount: whole units plus ticker.
pub fn format_amount(value: f64, short_name: &str) -> String {
    format!("{} {}", format_number(value, 0), short_name)
}

/// Format a percentage with up to two decimals.
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value, 2))
}

/// Format seconds ago to human-readable string.
pub fn format_ago(secs: u64) -> String {
    if secs == 0 {
        "just now".to_string()
    } else if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

/// Shorten a long address to `prefix…suffix`.
pub fn short_address(address: &str, keep: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= keep * 2 + 1 {
        return address.to_string();
    }
    let prefix: String = chars[..keep].iter().collect();
    let suffix: String = chars[chars.len() - keep..].iter().collect();
    format!("{}…{}", prefix, suffix)
}
