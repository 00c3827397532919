//! Path tokens, the two path grammars and the caching normalizer.

use crate::error::{Result, StoreError};
use indexmap::IndexSet;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// One parsed unit of a path expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Exact key.
    Key(String),
    /// `*`: any single key at this depth.
    Wildcard,
    /// Empty segment (`..`): zero or more keys up to the next token, or every
    /// descendant when it ends the path.
    Skip,
    /// `a,b,c`: any of the listed keys.
    Set(IndexSet<String>),
}

impl Token {
    pub fn key(key: impl Into<String>) -> Self {
        Token::Key(key.into())
    }

    pub fn set<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Token::Set(keys.into_iter().map(Into::into).collect())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Token::Key(_))
    }

    /// Whether a concrete key satisfies this token.
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            Token::Key(k) => k == key,
            Token::Wildcard => true,
            Token::Skip => false,
            Token::Set(keys) => keys.contains(key),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Key(k) => f.write_str(k),
            Token::Wildcard => f.write_str("*"),
            Token::Skip => Ok(()),
            Token::Set(keys) => {
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(key)?;
                }
                Ok(())
            }
        }
    }
}

/// Which path grammar a string is parsed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// Single-node access: literal keys only.
    Simple,
    /// Multi-node access: adds `*`, `..` and `a,b` segments.
    Query,
}

/// A normalized path: an ordered token sequence. The empty path is the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path(Vec<Token>);

impl Path {
    /// Build a path from tokens. Adjacent skips fold into one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        tokens.dedup_by(|a, b| *a == Token::Skip && *b == Token::Skip);
        Path(tokens)
    }

    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Path made of literal keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path(keys.into_iter().map(|k| Token::Key(k.into())).collect())
    }

    /// Parse a string without caching.
    pub fn parse(input: &str, grammar: Grammar) -> Result<Self> {
        parse_str(input, grammar)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, token: Token) {
        if token == Token::Skip && self.0.last() == Some(&Token::Skip) {
            return;
        }
        self.0.push(token);
    }

    pub fn pop(&mut self) -> Option<Token> {
        self.0.pop()
    }

    /// This path with `offset` prepended.
    pub fn rebase(&self, offset: &Path) -> Path {
        let mut tokens = Vec::with_capacity(offset.len() + self.len());
        tokens.extend_from_slice(&offset.0);
        tokens.extend_from_slice(&self.0);
        Path::new(tokens)
    }

    /// True if every token is a plain key.
    pub fn is_literal(&self) -> bool {
        self.0.iter().all(Token::is_literal)
    }

    /// The plain keys of a literal path.
    pub fn literal_keys(&self) -> Result<Vec<String>> {
        self.0
            .iter()
            .map(|t| match t {
                Token::Key(k) => Ok(k.clone()),
                other => Err(StoreError::InvalidPath(format!(
                    "expected a plain key in '{}', found '{}'",
                    self, other
                ))),
            })
            .collect()
    }
}

impl fmt::Display for Path {
    /// Dot-joined form; inverse of parsing with [`Grammar::Query`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut after_skip = false;
        for (i, token) in self.0.iter().enumerate() {
            if let Token::Skip = token {
                f.write_str("..")?;
                after_skip = true;
                continue;
            }
            if i > 0 && !after_skip {
                f.write_str(".")?;
            }
            after_skip = false;
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_str(s, Grammar::Query)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn invalid(input: &str, reason: &str) -> StoreError {
    StoreError::InvalidPath(format!("'{}': {}", input, reason))
}

fn parse_str(input: &str, grammar: Grammar) -> Result<Path> {
    let mut tokens = Vec::new();
    let mut rest = input;
    let mut first = true;

    while !rest.is_empty() {
        let trimmed = rest.trim_start_matches('.');
        let dots = rest.len() - trimmed.len();
        rest = trimmed;
        let at_edge = first || rest.is_empty();

        match dots {
            0 => {}
            1 if !at_edge => {}
            1 => return Err(invalid(input, "leading or trailing dot")),
            _ => match grammar {
                Grammar::Simple => return Err(invalid(input, "empty segment")),
                Grammar::Query => tokens.push(Token::Skip),
            },
        }
        first = false;

        if rest.is_empty() {
            break;
        }
        let end = rest.find('.').unwrap_or(rest.len());
        tokens.push(segment_token(&rest[..end], grammar, input)?);
        rest = &rest[end..];
    }

    Ok(Path(tokens))
}

fn segment_token(segment: &str, grammar: Grammar, input: &str) -> Result<Token> {
    if grammar == Grammar::Simple {
        return Ok(Token::Key(segment.to_string()));
    }
    if segment == "*" {
        return Ok(Token::Wildcard);
    }
    if segment.contains(',') {
        let mut keys = IndexSet::new();
        for key in segment.split(',') {
            if key.is_empty() {
                return Err(invalid(input, "empty alternative in key set"));
            }
            keys.insert(key.to_string());
        }
        // "a,a" names a single key.
        if keys.len() == 1 {
            if let Some(key) = keys.pop() {
                return Ok(Token::Key(key));
            }
        }
        return Ok(Token::Set(keys));
    }
    Ok(Token::Key(segment.to_string()))
}

/// Anything a path can be normalized from.
#[derive(Clone, Debug)]
pub enum PathInput<'a> {
    /// A path expression to parse.
    Text(&'a str),
    /// An already tokenized path.
    Tokens(Cow<'a, [Token]>),
    /// Plain keys, taken verbatim (they may contain dots).
    Keys(Vec<Cow<'a, str>>),
}

impl<'a> From<&'a str> for PathInput<'a> {
    fn from(s: &'a str) -> Self {
        PathInput::Text(s)
    }
}

impl<'a> From<&'a String> for PathInput<'a> {
    fn from(s: &'a String) -> Self {
        PathInput::Text(s)
    }
}

impl<'a> From<&'a Path> for PathInput<'a> {
    fn from(path: &'a Path) -> Self {
        PathInput::Tokens(Cow::Borrowed(path.tokens()))
    }
}

impl From<Path> for PathInput<'_> {
    fn from(path: Path) -> Self {
        PathInput::Tokens(Cow::Owned(path.0))
    }
}

impl From<Vec<Token>> for PathInput<'_> {
    fn from(tokens: Vec<Token>) -> Self {
        PathInput::Tokens(Cow::Owned(tokens))
    }
}

impl<'a> From<&'a [Token]> for PathInput<'a> {
    fn from(tokens: &'a [Token]) -> Self {
        PathInput::Tokens(Cow::Borrowed(tokens))
    }
}

impl<'a> From<&'a [String]> for PathInput<'a> {
    fn from(keys: &'a [String]) -> Self {
        PathInput::Keys(keys.iter().map(|k| Cow::Borrowed(k.as_str())).collect())
    }
}

impl<'a> From<&'a [&'a str]> for PathInput<'a> {
    fn from(keys: &'a [&'a str]) -> Self {
        PathInput::Keys(keys.iter().map(|k| Cow::Borrowed(*k)).collect())
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for PathInput<'a> {
    fn from(keys: &'a [&'a str; N]) -> Self {
        PathInput::Keys(keys.iter().map(|k| Cow::Borrowed(*k)).collect())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for PathInput<'a> {
    fn from(keys: [&'a str; N]) -> Self {
        PathInput::Keys(keys.into_iter().map(Cow::Borrowed).collect())
    }
}

/// Normalizes path input into [`Path`]s, memoizing string parses.
pub struct PathParser {
    cache: Mutex<LruCache<(Grammar, String), Path>>,
}

impl PathParser {
    /// Create a parser that remembers up to `cache_size` parsed strings.
    pub fn new(cache_size: usize) -> Self {
        let cache_size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Normalize `input` under `grammar`.
    ///
    /// Token sequences are always copied, never aliased. Under the simple
    /// grammar they must consist of plain keys.
    pub fn normalize<'a>(&self, input: impl Into<PathInput<'a>>, grammar: Grammar) -> Result<Path> {
        match input.into() {
            PathInput::Text(s) => self.parse_cached(s, grammar),
            PathInput::Tokens(tokens) => {
                let path = Path::new(tokens.into_owned());
                if grammar == Grammar::Simple && !path.is_literal() {
                    return Err(StoreError::InvalidPath(format!(
                        "'{}': only plain keys are allowed here",
                        path
                    )));
                }
                Ok(path)
            }
            PathInput::Keys(keys) => Ok(Path::from_keys(keys.into_iter().map(Cow::into_owned))),
        }
    }

    fn parse_cached(&self, input: &str, grammar: Grammar) -> Result<Path> {
        let cache_key = (grammar, input.to_string());
        if let Some(path) = self.cache.lock().get(&cache_key).cloned() {
            return Ok(path);
        }

        tracing::trace!(path = input, ?grammar, "parsing path");
        let path = parse_str(input, grammar)?;
        self.cache.lock().put(cache_key, path.clone());
        Ok(path)
    }

    /// Number of cached parses.
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

impl Default for PathParser {
    fn default() -> Self {
        Self::new(crate::store::DEFAULT_PATH_CACHE_SIZE)
    }
}
