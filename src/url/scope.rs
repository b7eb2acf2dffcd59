use crate::url::domain::extract_host;
use url::Url;

/// Returns true if `candidate` may be crawled in a session seeded by `seed`
///
/// The policy is "same hostname as the seed": hosts are compared
/// case-insensitively with ports and the scheme ignored. Anything that does
/// not parse, is not http(s), or has no host is out of scope.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_harvest::url::is_in_scope;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// assert!(is_in_scope("http://EXAMPLE.com:8080/about", &seed));
/// assert!(!is_in_scope("https://blog.example.com/", &seed));
/// assert!(!is_in_scope("not a url", &seed));
/// ```
pub fn is_in_scope(candidate: &str, seed: &Url) -> bool {
    match Url::parse(candidate) {
        Ok(url) => ScopeFilter::new(seed).allows(&url),
        Err(_) => false,
    }
}

/// Same-hostname scope predicate bound to one seed
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    seed_host: Option<String>,
}

impl ScopeFilter {
    /// Creates a filter that admits only the seed's hostname
    pub fn new(seed: &Url) -> Self {
        Self {
            seed_host: extract_host(seed),
        }
    }

    /// The hostname every admitted URL must share
    pub fn host(&self) -> Option<&str> {
        self.seed_host.as_deref()
    }

    /// Checks a parsed candidate URL against the scope
    pub fn allows(&self, candidate: &Url) -> bool {
        if candidate.scheme() != "http" && candidate.scheme() != "https" {
            return false;
        }

        match (&self.seed_host, extract_host(candidate)) {
            (Some(seed), Some(host)) => *seed == host,
            _ => false,
        }
    }
}
