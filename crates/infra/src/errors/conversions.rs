//! Mapping of storage and transport failures onto [`BergerieError`].
//!
//! The orphan rule keeps `From<rusqlite::Error> for BergerieError` out of the
//! domain crate, so adapters convert through the [`InfraError`] newtype:
//! `.map_err(InfraError::from)?` inside a function returning the domain
//! `Result`.

use bergerie_domain::BergerieError;
use rusqlite::ffi::ErrorCode;

#[derive(Debug)]
pub struct InfraError(pub BergerieError);

impl From<InfraError> for BergerieError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BergerieError> for InfraError {
    fn from(value: BergerieError) -> Self {
        Self(value)
    }
}

// SQLite extended result codes that callers care to tell apart.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

/* -------------------------------------------------------------------------- */
/* SQLite and pool */
/* -------------------------------------------------------------------------- */

fn from_sqlite(err: rusqlite::Error) -> BergerieError {
    use rusqlite::Error as E;

    match err {
        E::SqliteFailure(failure, message) => {
            let message = message.unwrap_or_else(|| failure.to_string());
            match (failure.code, failure.extended_code) {
                (ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked, _) => {
                    BergerieError::Database(format!("database busy: {message}"))
                }
                (
                    ErrorCode::ConstraintViolation,
                    SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY,
                ) => BergerieError::Database(format!("unique constraint violation: {message}")),
                _ => BergerieError::Database(message),
            }
        }
        E::QueryReturnedNoRows => BergerieError::NotFound("no matching row".into()),
        // Column parsers wrap domain errors; surface those unchanged.
        E::FromSqlConversionFailure(_, _, cause) => match cause.downcast::<BergerieError>() {
            Ok(domain) => *domain,
            Err(other) => BergerieError::Database(format!("unreadable column: {other}")),
        },
        other => BergerieError::Database(other.to_string()),
    }
}

impl From<rusqlite::Error> for InfraError {
    fn from(value: rusqlite::Error) -> Self {
        Self(from_sqlite(value))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(BergerieError::Database(format!("connection pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* HTTP and JSON */
/* -------------------------------------------------------------------------- */

fn from_http(err: &reqwest::Error) -> BergerieError {
    if let Some(status) = err.status() {
        let reason = status.canonical_reason().unwrap_or("unexpected status");
        return BergerieError::provider(status.as_u16(), reason);
    }
    if err.is_timeout() {
        return BergerieError::Network("HTTP request timed out".into());
    }
    if err.is_connect() {
        return BergerieError::Network("HTTP connection failed".into());
    }
    if err.is_decode() {
        return BergerieError::Network(format!("unreadable HTTP response: {err}"));
    }
    BergerieError::Network(format!("HTTP request failed: {err}"))
}

impl From<reqwest::Error> for InfraError {
    fn from(value: reqwest::Error) -> Self {
        Self(from_http(&value))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(BergerieError::Internal(format!("unexpected JSON shape: {value}")))
    }
}
