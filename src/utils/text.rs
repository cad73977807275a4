use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize caller ids to "+<digits>". Accepts "+254...", "254...",
/// and local "07..." forms.
pub fn normalize_phone(phone: &str) -> String {
    let p = phone.trim();
    if let Some(stripped) = p.strip_prefix('+') {
        return format!("+{}", digits_only(stripped));
    }
    let d = digits_only(p);
    if d.starts_with("254") {
        return format!("+{}", d);
    }
    if d.starts_with('0') && d.len() >= 10 {
        return format!("+254{}", &d[1..]);
    }
    format!("+{}", d)
}

/// Public-safe phone label: show the prefix and the last three digits only.
pub fn mask_phone(phone: &str) -> String {
    let p = normalize_phone(phone);
    let d = digits_only(&p);
    if d.len() < 6 {
        return p;
    }
    format!("+{}***{}", &d[..3], &d[d.len() - 3..])
}

/// Sanitize a free-text menu token: trim, collapse whitespace, strip
/// everything outside the allow-list, cap the length.
pub fn clean_text(s: &str, max_len: usize) -> String {
    let collapsed = WHITESPACE.replace_all(s.trim(), " ").to_string();
    let cleaned: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || " -,'/().".contains(*c))
        .collect();
    cleaned.chars().take(max_len).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_local_and_international_forms() {
        assert_eq!(normalize_phone("+254 700 000 002"), "+254700000002");
        assert_eq!(normalize_phone("254700000002"), "+254700000002");
        assert_eq!(normalize_phone("0700000002"), "+254700000002");
    }

    #[test]
    fn masks_all_but_edges() {
        assert_eq!(mask_phone("+254700000002"), "+254***002");
    }

    #[test]
    fn clean_text_collapses_and_strips() {
        assert_eq!(clean_text("  Market   Gate ", 28), "Market Gate");
        assert_eq!(clean_text("Market*Gate#1", 28), "MarketGate1");
    }

    #[test]
    fn clean_text_caps_length() {
        let long = "a".repeat(100);
        assert_eq!(clean_text(&long, 28).len(), 28);
    }

    #[test]
    fn clean_text_keeps_allowed_punctuation() {
        assert_eq!(clean_text("Mama's Shop (Main)", 28), "Mama's Shop (Main)");
    }
}
