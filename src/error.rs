use std::path::PathBuf;
use thiserror::Error;

/// pyautodoc error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    /// A template exists but carries neither the page tag nor the generic marker
    #[error("Template found for {} but missing {{{{autogenerated}}}} or {tag} tag.", .path.display())]
    MissingMarkers { path: PathBuf, tag: String },

    #[error("No project url configured for top-level package '{0}'")]
    MissingProjectUrl(String),

    #[error("{name} was given in the class list of {page} but {name} is not a Python class.")]
    NotAClass { name: String, page: String },

    #[error("{0} is detected as neither a class, a method nor a function.")]
    Unclassifiable(String),

    #[error("Cannot resolve '{name}': no attribute '{segment}'")]
    NotFound { name: String, segment: String },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for pyautodoc operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a lookup error for a dotted name
    pub fn not_found(name: impl Into<String>, segment: impl Into<String>) -> Self {
        Error::NotFound {
            name: name.into(),
            segment: segment.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Error::Analysis(msg.into())
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// True for errors caused by a template or config the user has to fix
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingMarkers { .. }
                | Error::ConfigValidation(_)
                | Error::ConfigParse(_)
                | Error::MissingProjectUrl(_)
        )
    }

    /// True for objects of the wrong kind (not a class, not classifiable)
    pub fn is_type_error(&self) -> bool {
        matches!(self, Error::NotAClass { .. } | Error::Unclassifiable(_))
    }

    /// True when a dotted name could not be resolved
    pub fn is_lookup(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_missing_markers_display() {
        let err = Error::MissingMarkers {
            path: PathBuf::from("docs/layers.md"),
            tag: "{{autogenerated-layers}}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Template found for docs/layers.md but missing {{autogenerated}} or {{autogenerated-layers}} tag."
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_not_a_class_display() {
        let err = Error::NotAClass {
            name: "pkg.relu".to_string(),
            page: "activations.md".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pkg.relu was given in the class list of activations.md but pkg.relu is not a Python class."
        );
        assert!(err.is_type_error());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("pkg.Missing", "Missing");
        assert_eq!(err.to_string(), "Cannot resolve 'pkg.Missing': no attribute 'Missing'");
        assert!(err.is_lookup());
        assert!(!err.is_type_error());
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("/foo/bar.py", "unexpected token");
        assert!(err.to_string().contains("/foo/bar.py"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("at least one page required");
        assert_eq!(err.to_string(), "Config validation error: at least one page required");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
