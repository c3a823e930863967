//! Typed errors surfaced by the resolution pipeline.
//!
//! The numeric sub-kind codes are part of the reporting contract: callers
//! use them to tell a transient relational fault from a fatal one, and a
//! fetch timeout from other transport failures.

use thiserror::Error;

/// Sub-kind of a relational data fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFault {
    /// Unrecoverable query or schema problem.
    Fatal,
    /// Busy/locked database; a later retry by the caller may succeed.
    Transient,
    /// No database file configured; checked before any query runs.
    MissingConfig,
}

impl DataFault {
    pub fn code(self) -> u8 {
        match self {
            DataFault::Fatal => 0,
            DataFault::Transient => 1,
            DataFault::MissingConfig => 3,
        }
    }
}

/// Sub-kind of a cover fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFault {
    /// Connect or read deadline exceeded.
    Timeout,
    /// Any other transport failure, including error HTTP statuses.
    Transport,
}

impl NetworkFault {
    pub fn code(self) -> u8 {
        match self {
            NetworkFault::Timeout => 4,
            NetworkFault::Transport => 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolverError {
    /// Malformed or unobtainable relational query result.
    #[error("{source_name} data error ({}): {message}", .fault.code())]
    Data {
        source_name: String,
        fault: DataFault,
        message: String,
    },

    /// Cover fetch transport failure. Never retried internally.
    #[error("{url} network error ({}){}: {message}", .fault.code(), render_status(.status))]
    Network {
        url: String,
        fault: NetworkFault,
        status: Option<u16>,
        message: String,
    },
}

fn render_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" [HTTP {code}]"),
        None => String::new(),
    }
}

impl ResolverError {
    pub fn data(source_name: &str, fault: DataFault, message: impl Into<String>) -> Self {
        ResolverError::Data {
            source_name: source_name.to_string(),
            fault,
            message: message.into(),
        }
    }

    pub fn network(
        url: &str,
        fault: NetworkFault,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        ResolverError::Network {
            url: url.to_string(),
            fault,
            status,
            message: message.into(),
        }
    }

    /// Classifies a rusqlite failure. Busy/locked is the only fault the
    /// caller could reasonably retry; everything else is fatal.
    pub fn from_sqlite(source_name: &str, error: rusqlite::Error) -> Self {
        let fault = match &error {
            rusqlite::Error::SqliteFailure(failure, _)
                if matches!(
                    failure.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                DataFault::Transient
            }
            _ => DataFault::Fatal,
        };
        ResolverError::data(source_name, fault, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{DataFault, NetworkFault, ResolverError};

    #[test]
    fn test_fault_codes_match_reporting_contract() {
        assert_eq!(DataFault::Fatal.code(), 0);
        assert_eq!(DataFault::Transient.code(), 1);
        assert_eq!(DataFault::MissingConfig.code(), 3);
        assert_eq!(NetworkFault::Timeout.code(), 4);
        assert_eq!(NetworkFault::Transport.code(), 0);
    }

    #[test]
    fn test_display_includes_code_and_status() {
        let error = ResolverError::network(
            "https://example.org/",
            NetworkFault::Transport,
            Some(503),
            "service unavailable",
        );
        let rendered = error.to_string();
        assert!(rendered.contains("(0)"));
        assert!(rendered.contains("[HTTP 503]"));

        let error = ResolverError::data("Grand Comics Database", DataFault::MissingConfig, "no db");
        assert!(error.to_string().contains("(3)"));
    }
}
