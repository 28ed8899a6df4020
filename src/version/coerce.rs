use semver::Version;

/// Extract the first `MAJOR[.MINOR[.PATCH]]` number group from a tag.
///
/// Leading text (`v`, `cmake-`) and anything after the third component
/// (`.2`, `-rc4`) is ignored; missing components are zero. Returns `None`
/// when the tag contains no digits.
pub fn coerce(tag: &str) -> Option<Version> {
    let start = tag.find(|c: char| c.is_ascii_digit())?;
    let mut rest = &tag[start..];

    let mut parts = [0u64; 3];
    for (i, part) in parts.iter_mut().enumerate() {
        if i > 0 {
            match rest.strip_prefix('.') {
                Some(after) if after.starts_with(|c: char| c.is_ascii_digit()) => rest = after,
                _ => break,
            }
        }
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        *part = rest[..len].parse().ok()?;
        rest = &rest[len..];
    }

    Some(Version::new(parts[0], parts[1], parts[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_plain_and_prefixed() {
        assert_eq!(coerce("3.19.2"), Some(Version::new(3, 19, 2)));
        assert_eq!(coerce("v3.19.2"), Some(Version::new(3, 19, 2)));
        assert_eq!(coerce("cmake-3.19.2"), Some(Version::new(3, 19, 2)));
    }

    #[test]
    fn test_coerce_drops_qualifiers() {
        assert_eq!(coerce("v3.16.0-rc4"), Some(Version::new(3, 16, 0)));
        assert_eq!(coerce("v2.8.10.2"), Some(Version::new(2, 8, 10)));
        assert_eq!(coerce("v3.20.0+build5"), Some(Version::new(3, 20, 0)));
    }

    #[test]
    fn test_coerce_fills_missing_components() {
        assert_eq!(coerce("v3"), Some(Version::new(3, 0, 0)));
        assert_eq!(coerce("v3.1"), Some(Version::new(3, 1, 0)));
        assert_eq!(coerce("v3."), Some(Version::new(3, 0, 0)));
    }

    #[test]
    fn test_coerce_rejects_tags_without_digits() {
        assert_eq!(coerce("not-a-version"), None);
        assert_eq!(coerce(""), None);
        assert_eq!(coerce("latest"), None);
    }

    #[test]
    fn test_coerce_rejects_overflow() {
        assert_eq!(coerce("v99999999999999999999999.1.1"), None);
    }
}
