//! Row decoding helpers for values stored as text.

use std::fmt::Display;
use std::str::FromStr;

use bergerie_domain::BergerieError;
use rusqlite::types::Type;
use rusqlite::Row;

/// Read a text column and parse it with `FromStr` (ids, enums, decimals).
pub(crate) fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let text: String = row.get(idx)?;
    text.parse::<T>().map_err(|e| conversion_failure(idx, &text, e))
}

fn conversion_failure(idx: usize, text: &str, err: impl Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(BergerieError::Internal(format!("unreadable value {text:?}: {err}"))),
    )
}
