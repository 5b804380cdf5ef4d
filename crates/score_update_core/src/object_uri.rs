use std::fmt;

use crate::contract::ValidationError;

pub const OBJECT_URI_SCHEME: &str = "kiicloud";

/// Owner of the bucket an object lives in, derived from the URI path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectScope {
    App { bucket: String },
    User { user_id: String, bucket: String },
    Group { group_id: String, bucket: String },
    Thing { thing_id: String, bucket: String },
    /// Any path that does not follow the bucket layout, e.g. `objects/1`.
    Unscoped,
}

impl ObjectScope {
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Self::App { bucket }
            | Self::User { bucket, .. }
            | Self::Group { bucket, .. }
            | Self::Thing { bucket, .. } => Some(bucket),
            Self::Unscoped => None,
        }
    }
}

/// Parsed `kiicloud://` reference to a remote data object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUri {
    segments: Vec<String>,
}

impl ObjectUri {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("uri cannot be empty"));
        }

        let Some((scheme, path)) = trimmed.split_once("://") else {
            return Err(ValidationError::new(format!(
                "uri '{trimmed}' must start with {OBJECT_URI_SCHEME}://"
            )));
        };
        if scheme != OBJECT_URI_SCHEME {
            return Err(ValidationError::new(format!(
                "unsupported uri scheme '{scheme}', expected {OBJECT_URI_SCHEME}"
            )));
        }

        let segments: Vec<String> = path
            .trim_end_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(ValidationError::new(format!(
                "uri '{trimmed}' contains an empty path segment"
            )));
        }
        if segments
            .iter()
            .any(|segment| segment == "." || segment == "..")
        {
            return Err(ValidationError::new(format!(
                "uri '{trimmed}' contains a relative path segment"
            )));
        }
        if segments.len() < 2 {
            return Err(ValidationError::new(format!(
                "uri '{trimmed}' must name a collection and an object id"
            )));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn object_id(&self) -> &str {
        // parse() guarantees at least two segments
        &self.segments[self.segments.len() - 1]
    }

    pub fn scope(&self) -> ObjectScope {
        let parts: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        match parts.as_slice() {
            ["buckets", bucket, "objects", _] => ObjectScope::App {
                bucket: bucket.to_string(),
            },
            ["users", owner, "buckets", bucket, "objects", _] => ObjectScope::User {
                user_id: owner.to_string(),
                bucket: bucket.to_string(),
            },
            ["groups", owner, "buckets", bucket, "objects", _] => ObjectScope::Group {
                group_id: owner.to_string(),
                bucket: bucket.to_string(),
            },
            ["things", owner, "buckets", bucket, "objects", _] => ObjectScope::Thing {
                thing_id: owner.to_string(),
                bucket: bucket.to_string(),
            },
            _ => ObjectScope::Unscoped,
        }
    }

    /// Unescaped path segments of the object resource below the API endpoint.
    pub fn rest_segments<'a>(&'a self, app_id: &'a str) -> Vec<&'a str> {
        let mut segments = vec!["apps", app_id];
        segments.extend(self.segments.iter().map(String::as_str));
        segments
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OBJECT_URI_SCHEME}://{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_object_uri() {
        let uri = ObjectUri::parse("kiicloud://objects/1").expect("uri should parse");

        assert_eq!(uri.object_id(), "1");
        assert_eq!(uri.scope(), ObjectScope::Unscoped);
        assert_eq!(uri.rest_segments("app-1"), vec!["apps", "app-1", "objects", "1"]);
        assert_eq!(uri.to_string(), "kiicloud://objects/1");
    }

    #[test]
    fn classifies_bucket_scopes() {
        let app = ObjectUri::parse("kiicloud://buckets/scores/objects/abc").expect("app uri");
        assert_eq!(
            app.scope(),
            ObjectScope::App {
                bucket: "scores".to_string()
            }
        );

        let user = ObjectUri::parse("kiicloud://users/u-9/buckets/scores/objects/abc")
            .expect("user uri");
        assert_eq!(user.scope().bucket(), Some("scores"));
        assert!(matches!(
            user.scope(),
            ObjectScope::User { ref user_id, .. } if user_id == "u-9"
        ));

        let group = ObjectUri::parse("kiicloud://groups/g-1/buckets/board/objects/x")
            .expect("group uri");
        assert!(matches!(group.scope(), ObjectScope::Group { .. }));
    }

    #[test]
    fn trims_whitespace_and_trailing_slash() {
        let uri = ObjectUri::parse("  kiicloud://buckets/b/objects/o/ ").expect("uri should parse");
        assert_eq!(uri.to_string(), "kiicloud://buckets/b/objects/o");
    }

    #[test]
    fn rejects_dot_segments() {
        for text in [
            "kiicloud://../../admin/x",
            "kiicloud://objects/../1",
            "kiicloud://buckets/./objects/1",
        ] {
            let error = ObjectUri::parse(text).expect_err("dot segment should fail");
            assert!(error.message().contains("relative path segment"));
        }
    }

    #[test]
    fn keeps_reserved_characters_inside_segments() {
        let query = ObjectUri::parse("kiicloud://objects/a?b=1").expect("uri should parse");
        assert_eq!(query.object_id(), "a?b=1");

        let fragment = ObjectUri::parse("kiicloud://objects/a#frag").expect("uri should parse");
        assert_eq!(fragment.object_id(), "a#frag");
        assert_eq!(
            fragment.rest_segments("app-1"),
            vec!["apps", "app-1", "objects", "a#frag"]
        );
    }

    #[test]
    fn rejects_foreign_scheme() {
        let error = ObjectUri::parse("https://objects/1").expect_err("scheme should fail");
        assert!(error.message().contains("unsupported uri scheme"));
    }

    #[test]
    fn rejects_missing_scheme_and_empty_segments() {
        assert!(ObjectUri::parse("objects/1").is_err());
        assert!(ObjectUri::parse("kiicloud://objects//1").is_err());
        assert!(ObjectUri::parse("kiicloud://objects").is_err());
        assert!(ObjectUri::parse("").is_err());
    }
}
