//! Version selection semantics.
//!
//! The resolver consumes version semantics through [`VersionOracle`]; it never
//! interprets version strings itself. [`DefaultVersionOracle`] is the stock
//! implementation and understands four selector forms:
//!
//! - exact versions: `1.2.3`
//! - prefixes: `1.2.+` (any version starting with `1.2.`) and `+` (anything)
//! - ranges: `[1.0,2.0)`, `]1.0,2.0]`, `[1.0,)`, `(,2.0]`
//! - status selectors: `latest.release`, `latest.milestone`, ...
//!
//! Status selectors cannot be decided from a version string alone, so they
//! report [`VersionOracle::needs_metadata`] and are accepted against the
//! resolved descriptor's status.

use std::cmp::Ordering;

use modchain_types::ModuleMetadata;

/// Pluggable version matching and ordering.
pub trait VersionOracle: Send + Sync {
    /// Whether `selector` is a selector rather than an exact version.
    fn is_dynamic(&self, selector: &str) -> bool;

    /// Whether acceptance of a candidate requires its resolved metadata.
    fn needs_metadata(&self, selector: &str) -> bool;

    /// Whether `candidate` satisfies `selector`, judging the version string only.
    fn accepts(&self, selector: &str, candidate: &str) -> bool;

    /// Whether the resolved `metadata` satisfies `selector`.
    fn accepts_metadata(&self, selector: &str, metadata: &ModuleMetadata) -> bool {
        self.accepts(selector, metadata.version())
    }

    /// Order two versions; `Greater` means `a` is the later version.
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Candidates ordered latest first.
    fn sort_latest_first(&self, candidates: &[String]) -> Vec<String> {
        let mut sorted = candidates.to_vec();
        sorted.sort_by(|a, b| self.compare(b, a));
        sorted
    }
}

/// Status scheme used when none is configured, lowest first.
pub const DEFAULT_STATUS_SCHEME: [&str; 3] = ["integration", "milestone", "release"];

const LATEST_PREFIX: &str = "latest.";

/// Stock [`VersionOracle`] implementation.
#[derive(Debug, Clone)]
pub struct DefaultVersionOracle {
    status_scheme: Vec<String>,
}

impl Default for DefaultVersionOracle {
    fn default() -> Self {
        Self {
            status_scheme: DEFAULT_STATUS_SCHEME.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DefaultVersionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom status scheme, ordered from least to most mature.
    pub fn with_status_scheme(status_scheme: Vec<String>) -> Self {
        if status_scheme.is_empty() {
            return Self::default();
        }
        Self { status_scheme }
    }

    pub fn status_scheme(&self) -> &[String] {
        &self.status_scheme
    }

    fn status_rank(&self, status: &str) -> Option<usize> {
        self.status_scheme.iter().position(|s| s == status)
    }
}

impl VersionOracle for DefaultVersionOracle {
    fn is_dynamic(&self, selector: &str) -> bool {
        !matches!(Selector::parse(selector), Selector::Exact(_))
    }

    fn needs_metadata(&self, selector: &str) -> bool {
        matches!(Selector::parse(selector), Selector::Latest(_))
    }

    fn accepts(&self, selector: &str, candidate: &str) -> bool {
        match Selector::parse(selector) {
            Selector::Exact(version) => version == candidate,
            Selector::Prefix(prefix) => candidate.starts_with(prefix),
            Selector::Range { lower, upper } => {
                let above = lower.map_or(true, |bound| {
                    match compare_versions(candidate, bound.version) {
                        Ordering::Greater => true,
                        Ordering::Equal => bound.inclusive,
                        Ordering::Less => false,
                    }
                });
                let below = upper.map_or(true, |bound| {
                    match compare_versions(candidate, bound.version) {
                        Ordering::Less => true,
                        Ordering::Equal => bound.inclusive,
                        Ordering::Greater => false,
                    }
                });
                above && below
            }
            // Every version string is a plausible match until its status is known.
            Selector::Latest(_) => true,
        }
    }

    fn accepts_metadata(&self, selector: &str, metadata: &ModuleMetadata) -> bool {
        match Selector::parse(selector) {
            Selector::Latest(status) => {
                match (self.status_rank(status), self.status_rank(&metadata.status)) {
                    (Some(required), Some(actual)) => actual >= required,
                    _ => false,
                }
            }
            _ => self.accepts(selector, metadata.version()),
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        compare_versions(a, b)
    }
}

#[derive(Debug, Clone, Copy)]
struct Bound<'a> {
    version: &'a str,
    inclusive: bool,
}

#[derive(Debug)]
enum Selector<'a> {
    Exact(&'a str),
    Prefix(&'a str),
    Range {
        lower: Option<Bound<'a>>,
        upper: Option<Bound<'a>>,
    },
    Latest(&'a str),
}

impl<'a> Selector<'a> {
    fn parse(selector: &'a str) -> Self {
        if let Some(status) = selector.strip_prefix(LATEST_PREFIX) {
            return Selector::Latest(status);
        }
        if let Some(prefix) = selector.strip_suffix('+') {
            return Selector::Prefix(prefix);
        }
        Self::parse_range(selector).unwrap_or(Selector::Exact(selector))
    }

    fn parse_range(selector: &'a str) -> Option<Self> {
        let open = selector.chars().next()?;
        let close = selector.chars().last()?;
        if selector.len() < 3
            || !matches!(open, '[' | ']' | '(')
            || !matches!(close, ']' | '[' | ')')
        {
            return None;
        }
        let inner = &selector[1..selector.len() - 1];
        let (low, high) = inner.split_once(',')?;
        let (low, high) = (low.trim(), high.trim());
        let lower = (!low.is_empty()).then_some(Bound {
            version: low,
            inclusive: open == '[',
        });
        let upper = (!high.is_empty()).then_some(Bound {
            version: high,
            inclusive: close == ']',
        });
        Some(Selector::Range { lower, upper })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Part<'a> {
    Number(&'a str),
    Word(&'a str),
}

fn split_parts(version: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    for segment in version.split(['.', '-', '_', '+']) {
        let mut start = 0;
        let bytes = segment.as_bytes();
        for i in 1..=bytes.len() {
            let boundary =
                i == bytes.len() || bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit();
            if boundary {
                let piece = &segment[start..i];
                if piece.as_bytes()[0].is_ascii_digit() {
                    parts.push(Part::Number(piece));
                } else {
                    parts.push(Part::Word(piece));
                }
                start = i;
            }
        }
    }
    parts
}

fn word_rank(word: &str) -> u8 {
    match word.to_ascii_lowercase().as_str() {
        "dev" => 0,
        "rc" => 2,
        "snapshot" => 3,
        "final" => 4,
        "ga" => 5,
        "release" => 6,
        "sp" => 7,
        _ => 1,
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_parts(a: &Part<'_>, b: &Part<'_>) -> Ordering {
    match (a, b) {
        (Part::Number(x), Part::Number(y)) => compare_numbers(x, y),
        (Part::Number(_), Part::Word(_)) => Ordering::Greater,
        (Part::Word(_), Part::Number(_)) => Ordering::Less,
        (Part::Word(x), Part::Word(y)) => word_rank(x)
            .cmp(&word_rank(y))
            .then_with(|| x.cmp(y)),
    }
}

/// Order two version strings.
///
/// Numeric parts compare numerically and rank above word parts. When one
/// version is a prefix of the other, a trailing numeric part makes the longer
/// version later (`1.0.1 > 1.0`) while a trailing word makes it earlier
/// (`1.0-rc < 1.0`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let left = split_parts(a);
    let right = split_parts(b);
    for (x, y) in left.iter().zip(right.iter()) {
        let ord = compare_parts(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    match left.len().cmp(&right.len()) {
        Ordering::Greater => match left[right.len()] {
            Part::Number(_) => Ordering::Greater,
            Part::Word(_) => Ordering::Less,
        },
        Ordering::Less => match right[left.len()] {
            Part::Number(_) => Ordering::Less,
            Part::Word(_) => Ordering::Greater,
        },
        Ordering::Equal => a.cmp(b),
    }
}
