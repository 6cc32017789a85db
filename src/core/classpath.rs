//! Classpath discovery and normalization.
//!
//! The classpath is the ordered list of module archives handed to the
//! packager's runtime. Entries are supplied explicitly by the caller (or read
//! from `CLASSPATH`) and normalized once for the host OS:
//!
//! - on Windows hosts a single leading separator is stripped and `/` becomes `\`
//! - on every host `%20` is decoded to a literal space
//!
//! Discovery order is preserved and duplicates are kept.

use std::cell::OnceCell;

/// Host OS family, which decides path syntax and the classpath separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFamily {
    Windows,
    Unix,
}

impl HostFamily {
    /// The family of the OS this binary runs on.
    pub fn current() -> Self {
        if cfg!(windows) {
            HostFamily::Windows
        } else {
            HostFamily::Unix
        }
    }

    /// Separator used when joining classpath entries.
    pub fn classpath_separator(&self) -> char {
        match self {
            HostFamily::Windows => ';',
            HostFamily::Unix => ':',
        }
    }

    /// Normalize a raw module path for this host.
    pub fn normalize(&self, raw: &str) -> String {
        let path = match self {
            HostFamily::Windows => {
                let stripped = raw
                    .strip_prefix('/')
                    .or_else(|| raw.strip_prefix('\\'))
                    .unwrap_or(raw);
                stripped.replace('/', "\\")
            }
            HostFamily::Unix => raw.to_string(),
        };
        path.replace("%20", " ")
    }
}

impl Default for HostFamily {
    fn default() -> Self {
        HostFamily::current()
    }
}

/// Lazily normalized classpath for one orchestration run.
#[derive(Debug, Clone)]
pub struct ClasspathResolver {
    raw: Vec<String>,
    host: HostFamily,
    entries: OnceCell<Vec<String>>,
    joined: OnceCell<String>,
}

impl ClasspathResolver {
    /// Create a resolver over explicit, un-normalized entries.
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClasspathResolver {
            raw: raw.into_iter().map(Into::into).collect(),
            host: HostFamily::current(),
            entries: OnceCell::new(),
            joined: OnceCell::new(),
        }
    }

    /// Create a resolver from the `CLASSPATH` environment variable.
    ///
    /// Returns an empty resolver when the variable is unset.
    pub fn from_env() -> Self {
        let host = HostFamily::current();
        let raw = std::env::var("CLASSPATH").unwrap_or_default();
        Self::new(split_classpath(&raw, host)).with_host(host)
    }

    /// Override the host family (mainly for cross-host testing).
    pub fn with_host(mut self, host: HostFamily) -> Self {
        self.host = host;
        self.entries = OnceCell::new();
        self.joined = OnceCell::new();
        self
    }

    /// The host family this resolver normalizes for.
    pub fn host(&self) -> HostFamily {
        self.host
    }

    /// Normalized entries, in discovery order.
    pub fn resolve(&self) -> &[String] {
        self.entries.get_or_init(|| {
            let entries: Vec<String> = self.raw.iter().map(|p| self.host.normalize(p)).collect();
            tracing::debug!("resolved {} classpath entries", entries.len());
            entries
        })
    }

    /// Entries joined with the host separator.
    pub fn joined(&self) -> &str {
        self.joined.get_or_init(|| {
            let sep = self.host.classpath_separator().to_string();
            self.resolve().join(&sep)
        })
    }

    /// Whether no entries were supplied.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

fn split_classpath(raw: &str, host: HostFamily) -> Vec<String> {
    raw.split(host.classpath_separator())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
