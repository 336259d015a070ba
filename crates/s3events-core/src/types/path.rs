//! S3 path parsing
//!
//! Accepts `s3://bucket/prefix` as well as the bare `bucket/prefix` form.

use crate::{Error, Result};
use std::fmt;

/// Bucket and key prefix addressed by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Path {
    pub bucket: String,
    /// Key prefix without the leading slash; empty for the whole bucket
    pub prefix: String,
}

impl S3Path {
    /// Parse an S3 path string
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();
        let path = path.strip_prefix("s3://").unwrap_or(path);

        if path.contains("://") {
            return Err(Error::InvalidS3Path(format!(
                "{}: only the s3:// scheme is supported",
                path
            )));
        }

        let (bucket, prefix) = match path.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix),
            None => (path, ""),
        };

        if bucket.is_empty() {
            return Err(Error::InvalidS3Path(format!(
                "{}: bucket name cannot be empty",
                path
            )));
        }

        if bucket.chars().any(|c| c.is_whitespace()) {
            return Err(Error::InvalidS3Path(format!(
                "{}: bucket name cannot contain whitespace",
                bucket
            )));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    /// Check if the path addresses a whole bucket
    pub fn is_bucket_only(&self) -> bool {
        self.prefix.is_empty()
    }
}

impl fmt::Display for S3Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "s3://{}", self.bucket)
        } else {
            write!(f, "s3://{}/{}", self.bucket, self.prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_path() {
        let path = S3Path::parse("s3://mybucket").unwrap();
        assert_eq!(path.bucket, "mybucket");
        assert!(path.is_bucket_only());

        let path = S3Path::parse("s3://mybucket/").unwrap();
        assert_eq!(path.bucket, "mybucket");
        assert_eq!(path.prefix, "");

        let path = S3Path::parse("s3://mybucket/logs/2024/").unwrap();
        assert_eq!(path.bucket, "mybucket");
        assert_eq!(path.prefix, "logs/2024/");

        // Scheme is optional
        let path = S3Path::parse("mybucket/test-file").unwrap();
        assert_eq!(path.bucket, "mybucket");
        assert_eq!(path.prefix, "test-file");
    }

    #[test]
    fn test_invalid_s3_path() {
        assert!(S3Path::parse("s3://").is_err());
        assert!(S3Path::parse("/prefix-only").is_err());
        assert!(S3Path::parse("http://mybucket/key").is_err());
        assert!(S3Path::parse("my bucket/key").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            S3Path::parse("mybucket/a/b").unwrap().to_string(),
            "s3://mybucket/a/b"
        );
        assert_eq!(S3Path::parse("mybucket").unwrap().to_string(), "s3://mybucket");
    }
}
