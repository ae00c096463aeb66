//! Anti-bot interstitial detection
//!
//! Challenge and block pages are recognized by a fixed phrase list. This is a
//! heuristic: a legitimate posting that quotes one of these phrases is
//! misclassified, and a challenge page with unfamiliar wording slips through.

use crate::extract::text::fold_case;

/// Phrases that mark a block or challenge page (lowercase)
pub const BLOCK_MARKERS: &[&str] = &[
    "access denied",
    "cloudflare",
    "just a moment",
    "are you a robot",
    "ddos protection",
    "forbidden",
    "temporarily blocked",
    "erişim engellendi",
    "robot olmadığınızı",
];

/// Returns the first marker found in the body, ignoring case
pub fn detect_block(body: &str) -> Option<&'static str> {
    let lowered = fold_case(body);
    BLOCK_MARKERS
        .iter()
        .copied()
        .find(|marker| lowered.contains(marker))
}

/// Returns true if the body looks like a block or challenge page
pub fn is_blocked(body: &str) -> bool {
    detect_block(body).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert!(is_blocked("<title>Attention Required! | Cloudflare</title>"));
        assert!(is_blocked("<h1>CLOUDFLARE</h1>"));
        assert!(is_blocked("Just a moment..."));
    }

    #[test]
    fn test_reports_matched_marker() {
        assert_eq!(
            detect_block("<p>Access Denied: you don't have permission</p>"),
            Some("access denied")
        );
        assert_eq!(
            detect_block("<p>ERİŞİM ENGELLENDİ</p>"),
            Some("erişim engellendi")
        );
    }

    #[test]
    fn test_legitimate_page() {
        let html = r#"<html><body><h1>Backend Developer</h1><p>Rust ve Tokio deneyimi.</p></body></html>"#;
        assert!(!is_blocked(html));
        assert_eq!(detect_block(html), None);
    }
}
