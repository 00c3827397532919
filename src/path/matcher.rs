//! Matching concrete paths against query patterns.

use super::parser::{Path, Token};

/// Whether `actual` satisfies `pattern`.
///
/// Walks both token sequences with one cursor each. A skip that is not the
/// last pattern token hands off to the following token as soon as it accepts
/// the current actual token; it never backtracks. Both cursors must run out
/// together.
///
/// `actual` may itself be a pattern: identical tokens always match each
/// other, so every path matches itself.
pub fn matches(actual: &Path, pattern: &Path) -> bool {
    let actual = actual.tokens();
    let pattern = pattern.tokens();
    let (mut i, mut j) = (0, 0);

    while i < actual.len() && j < pattern.len() {
        let current = &actual[i];
        match &pattern[j] {
            Token::Wildcard => {
                i += 1;
                j += 1;
            }
            Token::Skip => {
                let Some(next) = pattern.get(j + 1) else {
                    return true;
                };
                if *current == Token::Skip {
                    i += 1;
                    j += 1;
                } else if token_accepts(next, current) {
                    j += 1;
                } else {
                    i += 1;
                }
            }
            expected => {
                if !token_accepts(expected, current) {
                    return false;
                }
                i += 1;
                j += 1;
            }
        }
    }

    i == actual.len() && j == pattern.len()
}

fn token_accepts(expected: &Token, actual: &Token) -> bool {
    if expected == actual {
        return true;
    }
    match (expected, actual) {
        (Token::Wildcard, _) => true,
        (Token::Set(keys), Token::Key(key)) => keys.contains(key),
        _ => false,
    }
}
