use anyhow::Context;
use semver::{Version, VersionReq};
use std::str::FromStr;

/// A requested version, as typed by the user.
///
/// Partial versions are ranges over everything they leave open:
/// `3` and `3.x` match any 3.y.z, `3.15` and `3.15.x` match any 3.15.z,
/// while `3.15.5` matches exactly that release.
///
/// Anything else is a range. Both npm style (`>=3.10 <3.20`, `3.10 - 3.19`,
/// `3.16 || 3.19`) and Cargo style (`>=3.10, <3.20`) comparators are
/// accepted; each `||` alternative becomes one [`semver::VersionReq`] and a
/// version matches when any of them does. A bare version inside a range
/// matches like its shorthand, not as a caret requirement.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionSpec {
    Any,
    Major(u64),
    Minor(u64, u64),
    Exact(Version),
    Range(Vec<VersionReq>),
}

impl VersionSpec {
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Any => true,
            VersionSpec::Major(major) => version.major == *major,
            VersionSpec::Minor(major, minor) => {
                version.major == *major && version.minor == *minor
            }
            VersionSpec::Exact(exact) => version == exact,
            VersionSpec::Range(alternatives) => alternatives.iter().any(|req| req.matches(version)),
        }
    }
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for VersionSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
        let trimmed = match trimmed.strip_prefix(['v', 'V']) {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
            _ => trimmed,
        };

        if trimmed.is_empty() {
            return Ok(VersionSpec::Any);
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() <= 3 && parts.iter().all(|p| is_number(p) || is_wildcard(p)) {
            // Everything after the first wildcard is left open
            let numbers = parts
                .iter()
                .take_while(|p| !is_wildcard(p))
                .map(|p| p.parse::<u64>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Version component out of range in '{}'", s))?;

            return Ok(match numbers[..] {
                [] => VersionSpec::Any,
                [major] => VersionSpec::Major(major),
                [major, minor] => VersionSpec::Minor(major, minor),
                [major, minor, patch, ..] => VersionSpec::Exact(Version::new(major, minor, patch)),
            });
        }

        let alternatives = trimmed
            .split("||")
            .map(|alternative| {
                let req = comparators(alternative)?.join(", ");
                VersionReq::parse(&req).with_context(|| format!("Invalid range '{}'", alternative.trim()))
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .with_context(|| format!("Invalid version specifier '{}'", s))?;
        Ok(VersionSpec::Range(alternatives))
    }
}

const OPERATORS: [&str; 7] = [">=", "<=", ">", "<", "=", "~", "^"];

/// Rewrite one `||` alternative into comparators `VersionReq` accepts.
///
/// Comparators may be separated by whitespace or commas, an operator may be
/// detached from its version (`>= 3.10`), and `A - B` is an inclusive range.
fn comparators(alternative: &str) -> anyhow::Result<Vec<String>> {
    let tokens: Vec<&str> = alternative
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        anyhow::bail!("Empty range alternative");
    }

    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens.get(i + 1) == Some(&"-") {
            let upper = tokens
                .get(i + 2)
                .with_context(|| format!("Missing upper bound after '{} -'", tokens[i]))?;
            out.push(format!(">={}", bare_version(tokens[i])));
            out.push(format!("<={}", bare_version(upper)));
            i += 3;
            continue;
        }

        let token = tokens[i];
        i += 1;
        let comparator = match OPERATORS.iter().find(|op| token.starts_with(**op)) {
            Some(op) if token.len() == op.len() => {
                let version = tokens
                    .get(i)
                    .with_context(|| format!("Missing version after '{}'", op))?;
                i += 1;
                format!("{}{}", op, bare_version(version))
            }
            Some(op) => format!("{}{}", op, bare_version(&token[op.len()..])),
            None => match bare_version(token) {
                v if v.is_empty() => "*".to_string(),
                v => format!("={}", v),
            },
        };
        out.push(comparator);
    }
    Ok(out)
}

/// `v3.15.x` -> `3.15`: drop a `v` prefix and everything from the first
/// wildcard component on.
fn bare_version(token: &str) -> String {
    let token = token.strip_prefix(['v', 'V']).unwrap_or(token);
    token
        .split('.')
        .take_while(|p| !is_wildcard(p))
        .collect::<Vec<_>>()
        .join(".")
}
