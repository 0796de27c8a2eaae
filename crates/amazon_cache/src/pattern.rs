//! Glob patterns for bulk invalidation.

use amazon_error::{AmazonError, AmazonResult};
use regex::Regex;

/// Compile a glob into an anchored regex.
///
/// `*` matches any run of characters (including `:` and `/`), `?` matches one
/// character; everything else is literal.
pub(crate) fn glob_to_regex(glob: &str) -> AmazonResult<Regex> {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    let mut literal = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
        .map_err(|e| AmazonError::config(format!("Invalid cache pattern '{}': {}", glob, e)))
}
