//! RFC 8288 `Link` header parsing, limited to what GitHub sends:
//! `<https://api.github.com/...?page=2>; rel="next", <...>; rel="last"`.

/// Split a `Link` header into `(url, rel)` pairs, skipping malformed entries.
pub fn parse_links(header: &str) -> Vec<(String, String)> {
    header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let target = parts.next()?.trim();
            let url = target.strip_prefix('<')?.strip_suffix('>')?;

            let rel = parts.find_map(|param| {
                let (key, value) = param.split_once('=')?;
                if key.trim().eq_ignore_ascii_case("rel") {
                    Some(value.trim().trim_matches('"').to_string())
                } else {
                    None
                }
            })?;

            Some((url.to_string(), rel))
        })
        .collect()
}

/// URL of the `rel="next"` relation, if present.
pub fn next_link(header: &str) -> Option<String> {
    parse_links(header)
        .into_iter()
        .find(|(_, rel)| rel.split_whitespace().any(|r| r == "next"))
        .map(|(url, _)| url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB_LINK: &str = r#"<https://api.github.com/repositories/1/releases?page=2>; rel="next", <https://api.github.com/repositories/1/releases?page=5>; rel="last""#;

    #[test]
    fn test_parse_links() {
        let links = parse_links(GITHUB_LINK);
        assert_eq!(
            links,
            vec![
                (
                    "https://api.github.com/repositories/1/releases?page=2".to_string(),
                    "next".to_string()
                ),
                (
                    "https://api.github.com/repositories/1/releases?page=5".to_string(),
                    "last".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_next_link() {
        assert_eq!(
            next_link(GITHUB_LINK).as_deref(),
            Some("https://api.github.com/repositories/1/releases?page=2")
        );
    }

    #[test]
    fn test_next_link_missing_on_last_page() {
        let header = r#"<https://x.test/r?page=1>; rel="first", <https://x.test/r?page=4>; rel="prev""#;
        assert_eq!(next_link(header), None);
    }

    #[test]
    fn test_unquoted_rel_and_extra_params() {
        let header = "<https://x.test/r?page=3>; type=\"json\"; rel=next";
        assert_eq!(next_link(header).as_deref(), Some("https://x.test/r?page=3"));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        assert!(parse_links("").is_empty());
        assert!(parse_links("https://x.test/r; rel=\"next\"").is_empty());
        assert!(parse_links("<https://x.test/r>").is_empty());
    }
}
