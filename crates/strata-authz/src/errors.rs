use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("malformed policy: {0}")]
    PolicyMalformed(String),
    #[error("policy source is read-only: {0} is not supported")]
    ReadOnlySource(&'static str),
    #[error("invalid enforcement request: {0}")]
    Evaluation(String),
    #[error("casbin error: {0}")]
    Casbin(#[from] casbin::Error),
    #[error("failed to read policy source: {0}")]
    Source(#[from] std::io::Error),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::PolicyMalformed("bad line".to_string()),
            AuthzError::ReadOnlySource("save"),
            AuthzError::Evaluation("expected 4 fields".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }
}
