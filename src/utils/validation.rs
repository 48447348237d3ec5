/// Longest file name accepted from a chat command, in characters.
pub const MAX_FILE_NAME_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Checks a file name typed in a chat command. The name doubles as the object
/// key prefix, so path separators and traversal segments are refused.
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError {
            code: "EMPTY_FILENAME",
            message: "filename cannot be empty".to_string(),
        });
    }

    if name.chars().count() > MAX_FILE_NAME_CHARS {
        return Err(ValidationError {
            code: "FILENAME_TOO_LONG",
            message: format!("filename must be at most {} characters", MAX_FILE_NAME_CHARS),
        });
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        tracing::warn!("Path-like filename rejected: {}", name);
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "filename cannot contain path separators".to_string(),
        });
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "filename contains control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates payload size against the configured maximum
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}
