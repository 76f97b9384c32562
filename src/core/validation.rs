use regex::Regex;
use std::sync::OnceLock;

pub const PASSWORD_RULE: &str =
    "Password should be 6 to 20 characters long with a numeric, 1 lowercase and 1 uppercase letters";

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*@[A-Za-z0-9_]+([.-]?[A-Za-z0-9_]+)*(\.[A-Za-z0-9_]{2,3})+$")
            .expect("Regex should compile")
    })
}

fn password_rules() -> &'static [Regex; 4] {
    static REGEX: OnceLock<[Regex; 4]> = OnceLock::new();
    REGEX.get_or_init(|| {
        [
            Regex::new(r"^.{6,20}$").expect("Regex should compile"),
            Regex::new(r"[0-9]").expect("Regex should compile"),
            Regex::new(r"[a-z]").expect("Regex should compile"),
            Regex::new(r"[A-Z]").expect("Regex should compile"),
        ]
    })
}

fn slug_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("Regex should compile"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// 6-20 characters with at least one digit, one lowercase and one
/// uppercase letter.
pub fn is_valid_password(password: &str) -> bool {
    password_rules().iter().all(|r| r.is_match(password))
}

/// Turns a title into the readable part of a blog slug.
pub fn slugify(title: &str) -> String {
    slug_regex()
        .replace_all(title, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether `link` is a full http(s) URL whose host names the platform.
/// `website` accepts any host.
pub fn is_valid_social_link(platform: &str, link: &str) -> bool {
    let rest = match link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return false;
    }
    platform == "website" || host.to_lowercase().contains(platform)
}

/// Case-insensitive substring matcher for user-supplied search text.
pub fn contains_matcher(query: &str) -> Option<Regex> {
    regex::RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rule() {
        assert!(is_valid_email("jane.doe@mail.example.com"));
        assert!(is_valid_email("a_b-c@x.io"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@example.comm"));
        assert!(!is_valid_email("ja ne@example.com"));
    }

    #[test]
    fn password_rule() {
        assert!(is_valid_password("Abcde1"));
        assert!(is_valid_password("Abcdefghijklmnopqr12"));
        assert!(!is_valid_password("Abcd1"));
        assert!(!is_valid_password("Abcdefghijklmnopqr123"));
        assert!(!is_valid_password("abcdef1"));
        assert!(!is_valid_password("ABCDEF1"));
        assert!(!is_valid_password("Abcdefg"));
    }

    #[test]
    fn slug_collapses_punctuation_and_spaces() {
        assert_eq!(slugify("Hello, World!  Rust 2024"), "Hello-World-Rust-2024");
        assert_eq!(slugify("  ---  "), "");
    }

    #[test]
    fn social_links_must_name_their_platform() {
        assert!(is_valid_social_link("github", "https://github.com/jane"));
        assert!(is_valid_social_link("website", "https://jane.dev"));
        assert!(!is_valid_social_link("github", "https://gitlab.com/jane"));
        assert!(!is_valid_social_link("twitter", "twitter.com/jane"));
    }

    #[test]
    fn contains_matcher_escapes_metacharacters() {
        let m = contains_matcher("c++ (intro)").unwrap();
        assert!(m.is_match("Learning C++ (Intro) today"));
        assert!(!m.is_match("learning c intro"));
    }
}
