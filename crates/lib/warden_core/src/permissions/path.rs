//! Segment-aware resource paths.

/// A request or grant path split into lower-cased segments.
///
/// Query strings, fragments, empty segments and trailing slashes are
/// dropped, so `/Users/?page=2` and `/users` are the same path. `/` has no
/// segments and is a prefix of every path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    pub fn parse(raw: &str) -> Self {
        let path = raw.split(['?', '#']).next().unwrap_or_default();
        let segments = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .collect();
        Self { segments }
    }

    /// Whether every segment of `prefix` equals the corresponding leading
    /// segment of `self`.
    pub fn starts_with(&self, prefix: &ResourcePath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(p, s)| p == s)
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> ResourcePath {
        ResourcePath::parse(raw)
    }

    #[test]
    fn prefix_respects_segment_boundaries() {
        assert!(p("/role/info").starts_with(&p("/role")));
        assert!(p("/role").starts_with(&p("/role")));
        assert!(!p("/roleinfo").starts_with(&p("/role")));
        assert!(!p("/role").starts_with(&p("/role/info")));
    }

    #[test]
    fn root_matches_everything() {
        assert!(p("/").is_root());
        assert!(p("/anything/at/all").starts_with(&p("/")));
        assert!(p("/").starts_with(&p("/")));
    }

    #[test]
    fn case_query_and_trailing_slash_are_ignored() {
        assert_eq!(p("/API/Users/?page=2#top"), p("/api/users"));
        assert!(p("/api/users/7").starts_with(&p("/Api/Users/")));
    }

    #[test]
    fn display_normalises() {
        assert_eq!(p("api//users/").to_string(), "/api/users");
        assert_eq!(p("").to_string(), "/");
    }
}
