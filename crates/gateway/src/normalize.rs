//! URL canonicalization for cache addressing.

use url::Url;

/// Canonicalize a target URL into its cache-key form.
///
/// Applied in order: force `https` for `http` inputs (never the
/// reverse), strip one leading `www.` from the hostname, strip one
/// trailing slash unless the path is exactly `/`, lowercase the
/// hostname. Path and query case is preserved.
///
/// Normalization is deterministic and idempotent; URLs differing only
/// in scheme, `www.` prefix, trailing slash, or hostname case collapse
/// to the same key, which is what lets the shared cache land hits
/// across semantically identical inputs.
pub fn normalize_url(target: &Url) -> String {
    let mut url = target.clone();

    if url.scheme() == "http" {
        // http and https are both special schemes, the swap cannot fail.
        let _ = url.set_scheme("https");
    }

    if let Some(host) = url.host_str() {
        let lowered = host.to_ascii_lowercase();
        let canonical = match lowered.strip_prefix("www.") {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => lowered,
        };
        if canonical != host {
            let _ = url.set_host(Some(&canonical));
        }
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(input: &str) -> String {
        normalize_url(&Url::parse(input).unwrap())
    }

    #[test]
    fn test_equivalent_forms_share_one_key() {
        let expected = "https://example.com/a";
        assert_eq!(normalize("http://WWW.Example.com/a/"), expected);
        assert_eq!(normalize("https://example.com/a"), expected);
        assert_eq!(normalize("http://example.com/a"), expected);
        assert_eq!(normalize("https://www.example.com/a/"), expected);
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "http://WWW.Example.com/a/",
            "https://example.com",
            "https://example.com/path/To/Thing?Query=Case",
            "http://www.sub.example.com:8080/x/",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_root_path_keeps_its_slash() {
        assert_eq!(normalize("http://www.example.com/"), "https://example.com/");
        assert_eq!(normalize("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_path_and_query_case_preserved() {
        assert_eq!(
            normalize("http://Example.com/Path/File?Key=Value"),
            "https://example.com/Path/File?Key=Value"
        );
    }

    #[test]
    fn test_only_leading_www_is_stripped() {
        assert_eq!(
            normalize("https://www.www.example.com/"),
            "https://www.example.com/"
        );
        assert_eq!(
            normalize("https://nowww.example.com/"),
            "https://nowww.example.com/"
        );
    }

    #[test]
    fn test_https_never_downgraded() {
        assert_eq!(normalize("https://example.com/a"), "https://example.com/a");
    }
}
