use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Driver-level sentinel for a query that matched zero rows.
    #[error("no rows in result set")]
    NoRows,

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Unique or foreign-key violation, carrying the engine's message verbatim.
    #[error("{0}")]
    Constraint(String),

    #[error("cannot decode column {column}: {message}")]
    Decode { column: String, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    #[error("driver is not connected")]
    NotConnected,

    #[error("transaction already finished")]
    TransactionClosed,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{op}: {source}")]
    Context {
        op: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Attaches an operation prefix. Errors that already carry one, and
    /// not-found or constraint outcomes, are returned untouched.
    pub fn context(self, op: impl Into<String>) -> Self {
        match self {
            Error::Context { .. }
            | Error::NoRows
            | Error::NotFound { .. }
            | Error::Constraint(_) => self,
            other => Error::Context {
                op: op.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error below any context prefix.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NoRows | Error::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.root(), Error::Constraint(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled | Error::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) trait ResultExt<T> {
    fn context(self, op: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, op: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| match e {
            Error::Context { .. } | Error::NoRows | Error::NotFound { .. } | Error::Constraint(_) => {
                e
            }
            other => other.context(op()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_applied_once() {
        let err = Error::Cancelled.context("list apps").context("list apps");
        assert_eq!(err.to_string(), "list apps: operation cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_not_found_and_constraint_are_never_wrapped() {
        let err = Error::not_found("ecosystem", "acme").context("get ecosystem");
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.to_string(), "ecosystem not found: acme");

        let err = Error::Constraint("UNIQUE constraint failed: ecosystems.name".into())
            .context("create ecosystem");
        assert_eq!(err.to_string(), "UNIQUE constraint failed: ecosystems.name");
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_result_ext_defers_prefix() {
        let res: Result<()> = Err(Error::NotConnected);
        let err = res.context(|| "ping".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "ping: driver is not connected");
        assert!(matches!(err.root(), Error::NotConnected));
    }
}
