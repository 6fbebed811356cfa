use super::RouterError;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::iter;

/// Mount path accepted by the registration methods.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Express-style template: `/users/:id`, `/files/*`.
    Literal(String),
    Regex(Regex),
    /// Any of the listed patterns.
    List(Vec<PathPattern>),
}

/// String form of a pattern: literals verbatim, regexes as `/source/`,
/// lists joined with `,`.
impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Literal(path) => f.write_str(path),
            PathPattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
            PathPattern::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for PathPattern {
    fn from(path: &str) -> Self {
        PathPattern::Literal(path.to_string())
    }
}

impl From<String> for PathPattern {
    fn from(path: String) -> Self {
        PathPattern::Literal(path)
    }
}

impl From<Regex> for PathPattern {
    fn from(regex: Regex) -> Self {
        PathPattern::Regex(regex)
    }
}

impl<T: Into<PathPattern>> From<Vec<T>> for PathPattern {
    fn from(items: Vec<T>) -> Self {
        PathPattern::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PathPattern>, const N: usize> From<[T; N]> for PathPattern {
    fn from(items: [T; N]) -> Self {
        PathPattern::List(items.into_iter().map(Into::into).collect())
    }
}

/// Result of matching a layer against a routing path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PathMatch {
    /// Length of the path prefix consumed by the pattern.
    pub consumed: usize,
    pub params: HashMap<String, String>,
}

enum Alternative {
    /// `/` or empty: matches everything, consumes nothing.
    Root,
    Template(matchit::Router<()>),
    Regex(Regex),
}

/// Compiled form of a [`PathPattern`].
pub(crate) struct Matcher {
    alternatives: Vec<Alternative>,
    /// `false` for mounts, which match by prefix on a segment boundary.
    end: bool,
}

impl Matcher {
    pub fn compile(pattern: &PathPattern, end: bool) -> Result<Self, RouterError> {
        let mut alternatives = Vec::new();
        collect(pattern, &mut alternatives)?;
        Ok(Self { alternatives, end })
    }

    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        self.alternatives
            .iter()
            .find_map(|alternative| self.match_alternative(alternative, path))
    }

    fn match_alternative(&self, alternative: &Alternative, path: &str) -> Option<PathMatch> {
        match alternative {
            Alternative::Root if self.end => {
                (trim_trailing(path) == "/").then(PathMatch::default)
            }
            Alternative::Root => Some(PathMatch::default()),
            Alternative::Template(router) if self.end => {
                let trimmed = trim_trailing(path);
                let matched = router.at(trimmed).ok()?;
                Some(PathMatch {
                    consumed: path.len(),
                    params: collect_params(matched.params.iter()),
                })
            }
            Alternative::Template(router) => segment_ends(path).find_map(|end| {
                router.at(&path[..end]).ok().map(|matched| PathMatch {
                    consumed: end,
                    params: collect_params(matched.params.iter()),
                })
            }),
            Alternative::Regex(regex) => {
                let captures = regex.captures(path)?;
                let whole = captures.get(0)?;
                let consumed = match (self.end, whole.start()) {
                    (true, _) => path.len(),
                    (false, 0) => whole.end(),
                    (false, _) => 0,
                };
                let params = regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        captures
                            .name(name)
                            .map(|value| (name.to_string(), value.as_str().to_string()))
                    })
                    .collect();
                Some(PathMatch { consumed, params })
            }
        }
    }
}

fn collect(pattern: &PathPattern, out: &mut Vec<Alternative>) -> Result<(), RouterError> {
    match pattern {
        PathPattern::Literal(path) => {
            let trimmed = trim_trailing(path);
            if trimmed == "/" {
                out.push(Alternative::Root);
                return Ok(());
            }

            let template = to_template(trimmed);
            let mut router = matchit::Router::new();
            router
                .insert(template, ())
                .map_err(|source| RouterError::InvalidPattern {
                    pattern: path.clone(),
                    source,
                })?;
            out.push(Alternative::Template(router));
        }
        PathPattern::Regex(regex) => out.push(Alternative::Regex(regex.clone())),
        PathPattern::List(items) => {
            for item in items {
                collect(item, out)?;
            }
        }
    }
    Ok(())
}

/// Drops trailing slashes, keeping a lone `/` (or turning `""` into it).
pub(crate) fn trim_trailing(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Candidate prefix lengths for mount matching, shortest first: every
/// position of a `/` after the first character, then the full length.
fn segment_ends(path: &str) -> impl Iterator<Item = usize> + '_ {
    path.char_indices()
        .filter(|&(i, c)| c == '/' && i > 0)
        .map(|(i, _)| i)
        .chain(iter::once(path.len()))
}

fn collect_params<'k, 'v>(
    params: impl Iterator<Item = (&'k str, &'v str)>,
) -> HashMap<String, String> {
    params
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Translates Express template syntax into matchit syntax.
fn to_template(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 8);
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }

                if name.is_empty() {
                    out.push(':');
                } else {
                    out.push('{');
                    out.push_str(&name);
                    out.push('}');
                }
            }
            '*' => out.push_str("{*wildcard}"),
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount(pattern: impl Into<PathPattern>) -> Matcher {
        Matcher::compile(&pattern.into(), false).unwrap()
    }

    fn route(pattern: impl Into<PathPattern>) -> Matcher {
        Matcher::compile(&pattern.into(), true).unwrap()
    }

    #[test]
    fn display_mirrors_string_coercion() {
        assert_eq!(PathPattern::from("/api").to_string(), "/api");
        assert_eq!(
            PathPattern::from(Regex::new("^/v[0-9]+").unwrap()).to_string(),
            "/^/v[0-9]+/"
        );
        assert_eq!(PathPattern::from(["/a", "/b"]).to_string(), "/a,/b");
    }

    #[test]
    fn templates_are_translated() {
        assert_eq!(to_template("/users/:id"), "/users/{id}");
        assert_eq!(to_template("/files/*"), "/files/{*wildcard}");
        assert_eq!(to_template("/a:"), "/a:");
        assert_eq!(to_template("/{x}"), "/{{x}}");
    }

    #[test]
    fn mounts_match_on_segment_boundaries() {
        let api = mount("/api");

        assert_eq!(api.matches("/api").map(|m| m.consumed), Some(4));
        assert_eq!(api.matches("/api/users").map(|m| m.consumed), Some(4));
        assert_eq!(api.matches("/api/").map(|m| m.consumed), Some(4));
        assert!(api.matches("/apix").is_none());
        assert!(api.matches("/").is_none());
    }

    #[test]
    fn root_mount_matches_everything() {
        let root = mount("/");
        assert_eq!(root.matches("/anything/at/all"), Some(PathMatch::default()));
        assert!(mount("").matches("/x").is_some());
    }

    #[test]
    fn mount_params_are_captured() {
        let users = mount("/users/:id");
        let found = users.matches("/users/42/posts").unwrap();

        assert_eq!(found.consumed, "/users/42".len());
        assert_eq!(found.params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn doubled_slashes_in_a_mount_still_match() {
        let odd = mount("//api//");
        assert_eq!(odd.matches("//api//").map(|m| m.consumed), Some(5));
    }

    #[test]
    fn routes_match_the_whole_path_ignoring_trailing_slashes() {
        let user = route("/users/:id");

        assert!(user.matches("/users/7").is_some());
        assert!(user.matches("/users/7/").is_some());
        assert!(user.matches("/users/7/posts").is_none());
        assert!(route("/").matches("/").is_some());
        assert!(route("/").matches("/x").is_none());
    }

    #[test]
    fn lists_match_any_alternative() {
        let either = route(["/a", "/b"]);
        assert!(either.matches("/a").is_some());
        assert!(either.matches("/b").is_some());
        assert!(either.matches("/c").is_none());
    }

    #[test]
    fn regex_mounts_consume_a_leading_match() {
        let versioned = mount(Regex::new("^/v(?P<version>[0-9]+)").unwrap());
        let found = versioned.matches("/v2/items").unwrap();

        assert_eq!(found.consumed, 3);
        assert_eq!(found.params.get("version").map(String::as_str), Some("2"));
    }

    #[test]
    fn invalid_templates_are_reported() {
        let err = Matcher::compile(&PathPattern::from("/a/*/b"), true);
        assert!(matches!(err, Err(RouterError::InvalidPattern { .. })));
    }
}
