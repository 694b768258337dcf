use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Command `{program}` failed: {detail}")]
    CommandFailed { program: String, detail: String },

    #[error("Command `{program}` timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Unexpected output: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FocusError {
    pub fn command_failed(program: impl Into<String>, detail: impl Into<String>) -> Self {
        FocusError::CommandFailed {
            program: program.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FocusError>;

#[macro_export]
macro_rules! focus_error {
    (tool_unavailable, $($arg:tt)*) => {
        $crate::error::FocusError::ToolUnavailable(format!($($arg)*))
    };
    (parse, $($arg:tt)*) => {
        $crate::error::FocusError::Parse(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::FocusError::Internal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FocusError::command_failed("wmctrl", "exit status 1");
        assert_eq!(err.to_string(), "Command `wmctrl` failed: exit status 1");

        let err = FocusError::Timeout {
            program: "qdbus".to_string(),
            timeout_ms: 5000,
        };
        assert!(err.to_string().contains("5000ms"));

        let err = focus_error!(parse, "bad line {}", 3);
        assert!(matches!(err, FocusError::Parse(ref m) if m == "bad line 3"));
    }
}
