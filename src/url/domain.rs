use url::Url;

/// Extracts the comparable hostname from a URL
///
/// The host is lowercased and a trailing root dot (`example.com.`) is removed.
/// Ports are not part of the hostname.
///
/// # Arguments
///
/// * `url` - The URL to extract the host from
///
/// # Returns
///
/// * `Some(String)` - The normalized host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_harvest::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_suffix('.').map(str::to_string).unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Derives the dataset session name from the seed URL
///
/// Every character of the hostname outside `[A-Za-z0-9_]` becomes `_`, so
/// `www.example.com` maps to `www_example_com`.
pub fn session_name_for(seed: &Url) -> String {
    seed.host_str()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_host() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_host(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_ignores_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_strips_trailing_dot() {
        let url = Url::parse("https://example.com./page").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_ip_host() {
        let url = Url::parse("http://127.0.0.1:3000/").unwrap();
        assert_eq!(extract_host(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_session_name_replaces_separators() {
        let url = Url::parse("https://www.example.com/start").unwrap();
        assert_eq!(session_name_for(&url), "www_example_com");
    }

    #[test]
    fn test_session_name_for_ip() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(session_name_for(&url), "127_0_0_1");
    }

    #[test]
    fn test_session_name_keeps_hyphen_out() {
        let url = Url::parse("https://my-site.dev/").unwrap();
        assert_eq!(session_name_for(&url), "my_site_dev");
    }
}
