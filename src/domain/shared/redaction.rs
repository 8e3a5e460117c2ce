use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement written in place of anything that looks like an API key
pub const REDACTED_KEY: &str = "sk-***";

// Keys may carry prefixes such as `sk-proj-` or `sk-svcacct-`, so hyphens are
// part of the tail class. The length floor keeps ordinary words out.
static API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sk-[A-Za-z0-9-]{16,}").expect("valid API key pattern"));

/// Mask every credential-shaped substring in `text`
pub fn redact(text: &str) -> String {
    API_KEY_RE.replace_all(text, REDACTED_KEY).into_owned()
}
