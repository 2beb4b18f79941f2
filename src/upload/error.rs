/// Result alias for uploader operations.
pub type Result<T> = std::result::Result<T, UploadError>;

/// Errors from talking to the file host.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request never produced an HTTP response.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        /// Connection failures and timeouts; eligible for one retry.
        transient: bool,
    },

    /// The host answered with a non-success status.
    #[error("host rejected the request ({status}): {body}")]
    HostRejected { status: u16, body: String },

    /// The host answered 2xx but the body is not what we asked for.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Rejected locally; the host would refuse a file this big.
    #[error("file is {size} bytes, over the host limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Whether a single automatic retry is allowed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkError { transient: true, .. })
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        Self::NetworkError {
            transient: e.is_timeout() || e.is_connect() || e.is_request(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_network_errors_retry() {
        let transient = UploadError::NetworkError {
            message: "connection reset".into(),
            transient: true,
        };
        assert!(transient.is_transient());

        let hard = UploadError::NetworkError {
            message: "bad certificate".into(),
            transient: false,
        };
        assert!(!hard.is_transient());

        let rejected = UploadError::HostRejected {
            status: 503,
            body: "busy".into(),
        };
        assert!(!rejected.is_transient());
    }

    #[test]
    fn file_too_large_message() {
        let err = UploadError::FileTooLarge {
            size: 300,
            limit: 200,
        };
        assert_eq!(
            err.to_string(),
            "file is 300 bytes, over the host limit of 200 bytes"
        );
    }
}
