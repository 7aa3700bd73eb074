use std::io;

use thiserror::Error;

/// Why a child could not be started. Always fatal for that launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Executable '{program}' not found")]
    NotFound {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied launching '{program}'")]
    PermissionDenied {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid launch request for '{program}': {reason}")]
    InvalidInput { program: String, reason: String },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    pub(crate) fn from_spawn(program: String, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => LaunchError::NotFound { program, source },
            io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied { program, source },
            io::ErrorKind::InvalidInput => LaunchError::InvalidInput {
                program,
                reason: source.to_string(),
            },
            _ => LaunchError::Spawn { program, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_errors_are_classified() {
        let err = LaunchError::from_spawn("x".into(), io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, LaunchError::NotFound { .. }));
        assert_eq!(err.to_string(), "Executable 'x' not found");

        let err = LaunchError::from_spawn(
            "x".into(),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, LaunchError::PermissionDenied { .. }));

        let err = LaunchError::from_spawn("x".into(), io::Error::other("fork failed"));
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }
}
