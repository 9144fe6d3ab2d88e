use std::sync::OnceLock;

use regex::Regex;

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9]").expect("valid regex"))
}

/// Normalizes a phone number into the gateway's JID form, stripping `+`,
/// spaces, dashes, and any prior `@s.whatsapp.net` suffix before
/// re-appending it.
pub fn to_jid(to: &str) -> String {
    let digits_only = non_digits().replace_all(to, "");
    format!("{digits_only}@s.whatsapp.net")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_plus_and_formatting() {
        assert_eq!(to_jid("+1 555-123-0000"), "15551230000@s.whatsapp.net");
    }

    #[test]
    fn is_idempotent_on_an_already_suffixed_jid() {
        assert_eq!(
            to_jid("15551230000@s.whatsapp.net"),
            "15551230000@s.whatsapp.net"
        );
    }

    #[test]
    fn handles_bare_digits() {
        assert_eq!(to_jid("15551230000"), "15551230000@s.whatsapp.net");
    }
}
