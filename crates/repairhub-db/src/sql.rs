use repairhub_core::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Maps a sqlx error to an [`AppError`]. Constraint violations are client
/// errors; everything else is a database error.
pub(crate) fn db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return AppError::BadRequest(format!("Duplicate record: {}", db.message()));
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return AppError::BadRequest(format!("Referenced record missing: {}", db.message()));
            }
            Some(CHECK_VIOLATION) => {
                return AppError::BadRequest(format!("Invalid value: {}", db.message()));
            }
            _ => {}
        }
    }
    AppError::DatabaseError(e.to_string())
}

/// `%keyword%` for ILIKE, with LIKE wildcards in the keyword escaped.
pub(crate) fn contains_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Parses an enum stored as text, reporting corrupt rows as database errors.
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse()
        .map_err(|e: String| AppError::DatabaseError(format!("Invalid {column} in row: {e}")))
}
