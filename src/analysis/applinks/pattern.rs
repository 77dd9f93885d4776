//! Path matching for the `android:path*` attributes

use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// How a declared path is compared against a URL path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    /// `android:path`
    Literal,
    /// `android:pathPrefix`
    Prefix,
    /// `android:pathPattern`
    Glob,
    /// `android:pathSuffix`
    Suffix,
    /// `android:pathAdvancedPattern`
    Advanced,
}

impl PathKind {
    /// Word used in mismatch messages
    pub fn label(&self) -> &'static str {
        match self {
            PathKind::Literal => "literal",
            PathKind::Prefix => "prefix",
            PathKind::Glob => "glob",
            PathKind::Suffix => "suffix",
            PathKind::Advanced => "advanced",
        }
    }
}

/// One declared path constraint
#[derive(Debug, Clone, Serialize)]
pub struct PathMatcher {
    pub kind: PathKind,
    pub pattern: String,

    /// Compiled form of an advanced pattern; `None` when it does not compile
    #[serde(skip)]
    regex: Option<Regex>,
}

impl PathMatcher {
    pub fn new(kind: PathKind, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let regex = match kind {
            PathKind::Advanced => compile_advanced(&pattern),
            _ => None,
        };
        Self {
            kind,
            pattern,
            regex,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            PathKind::Literal => self.pattern == path,
            PathKind::Prefix => path.starts_with(&self.pattern),
            PathKind::Suffix => path.ends_with(&self.pattern),
            PathKind::Glob => match_glob(&self.pattern, path),
            PathKind::Advanced => self.regex.as_ref().is_some_and(|regex| regex.is_match(path)),
        }
    }
}

impl PartialEq for PathMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.pattern == other.pattern
    }
}

impl Eq for PathMatcher {}

impl std::hash::Hash for PathMatcher {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.pattern.hash(state);
    }
}

impl std::fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path {} {}", self.kind.label(), self.pattern)
    }
}

/// Android's simple glob: `.` matches any character, `x*` matches zero or
/// more `x`, `.*` consumes up to the next literal and `\` escapes.
///
/// The matcher never backtracks, so `.*` stops at the first occurrence of
/// the character that follows it.
pub fn match_glob(pattern: &str, input: &str) -> bool {
    const NONE: char = '\0';
    let pattern: Vec<char> = pattern.chars().collect();
    let input: Vec<char> = input.chars().collect();
    let np = pattern.len();
    let nm = input.len();

    if np == 0 {
        return nm == 0;
    }
    let at = |i: usize| pattern.get(i).copied().unwrap_or(NONE);

    let mut ip = 0;
    let mut im = 0;
    let mut next = pattern[0];

    while ip < np && im < nm {
        let mut c = next;
        ip += 1;
        next = at(ip);
        let escaped = c == '\\';
        if escaped {
            c = next;
            ip += 1;
            next = at(ip);
        }
        if next == '*' {
            if !escaped && c == '.' {
                if ip >= np - 1 {
                    // trailing ".*" accepts the rest
                    return true;
                }
                ip += 1;
                next = at(ip);
                if next == '\\' {
                    ip += 1;
                    next = at(ip);
                }
                while im < nm && input[im] != next {
                    im += 1;
                }
                if im == nm {
                    return false;
                }
                ip += 1;
                next = at(ip);
                im += 1;
            } else {
                while im < nm && input[im] == c {
                    im += 1;
                }
                ip += 1;
                next = at(ip);
            }
        } else {
            if (escaped || c != '.') && input[im] != c {
                return false;
            }
            im += 1;
        }
    }

    if ip >= np && im >= nm {
        return true;
    }

    // input exhausted with only a ".*" left in the pattern
    np >= 2 && ip == np - 2 && pattern[ip] == '.' && pattern[ip + 1] == '*'
}

/// Anchor `pattern` so it must match the whole path
fn compile_advanced(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{})$", pattern)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            debug!("Invalid advanced path pattern {}: {}", pattern, e);
            None
        }
    }
}
