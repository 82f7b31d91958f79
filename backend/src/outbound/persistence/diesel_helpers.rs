//! Shared helpers for the Diesel store implementations.
//!
//! Error mapping keeps raw database detail out of the domain: Diesel and pool
//! failures become [`StoreError`] variants with generic messages, with the
//! specifics logged at debug level here.

use tracing::debug;

use crate::domain::ports::StoreError;

use super::pool::PoolError;

/// Map pool errors to domain store errors.
pub(crate) fn map_pool_error(error: PoolError) -> StoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain store errors.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> StoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => StoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => StoreError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StoreError::connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => StoreError::query("database error"),
        _ => StoreError::query("database error"),
    }
}

/// Collect row conversion results, turning the first failure into a query
/// error. Conversion failures indicate data the application did not write,
/// so they surface as store errors rather than panics.
pub(crate) fn collect_rows<T>(
    results: impl Iterator<Item = Result<T, String>>,
) -> Result<Vec<T>, StoreError> {
    results
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::query)
}

/// Convert an optional row, mapping conversion failure to a query error.
pub(crate) fn convert_optional<R, T>(
    row: Option<R>,
    convert: impl FnOnce(R) -> Result<T, String>,
) -> Result<Option<T>, StoreError> {
    row.map(convert).transpose().map_err(StoreError::query)
}

/// Cast a database progress column (i32) to the domain's 0–100 percentage.
pub(crate) fn cast_progress(progress: i32) -> Result<u8, String> {
    u8::try_from(progress).map_err(|_| format!("progress {progress} outside 0-100"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection() {
        let mapped = map_pool_error(PoolError::checkout("refused"));
        assert!(matches!(mapped, StoreError::Connection { .. }));
    }

    #[rstest]
    fn diesel_not_found_maps_to_query() {
        let mapped = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(mapped, StoreError::Query { .. }));
    }

    #[rstest]
    fn collect_rows_surfaces_first_failure() {
        let rows: Vec<Result<u8, String>> =
            vec![Ok(1), Err("bad row".to_owned()), Err("worse row".to_owned())];
        let err = collect_rows(rows.into_iter()).expect_err("fails");
        assert!(err.to_string().contains("bad row"));
    }

    #[rstest]
    #[case(0, Ok(0))]
    #[case(100, Ok(100))]
    fn progress_casts_in_range(#[case] raw: i32, #[case] expected: Result<u8, String>) {
        assert_eq!(cast_progress(raw), expected);
    }

    #[rstest]
    fn progress_rejects_negative() {
        assert!(cast_progress(-1).is_err());
    }
}
