//! Storage adapter error type.
//!
//! Driver errors are classified on conversion so a foreign-key rejection
//! surfaces as `ForeignKeyViolation` no matter which relational driver
//! produced it.

use crate::db::DbError;
use crate::model::{Entity, RecordId, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound { entity: Entity, id: RecordId },
    /// The backend rejected a write or delete because of a foreign key.
    ForeignKeyViolation(String),
    Db(DbError),
    Sqlx(sqlx::Error),
    Orm(sea_orm::DbErr),
    Document(DocumentError),
    /// Persisted row or document cannot be mapped to a record.
    InvalidData(String),
    /// The blocking bridge runtime could not be created.
    Runtime(std::io::Error),
}

impl StoreError {
    pub fn not_found(entity: Entity, id: &RecordId) -> Self {
        Self::NotFound {
            entity,
            id: id.clone(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ForeignKeyViolation(message) => {
                write!(f, "foreign key constraint failed: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Sqlx(err) => write!(f, "{err}"),
            Self::Orm(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Runtime(err) => write!(f, "failed to start store runtime: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Sqlx(err) => Some(err),
            Self::Orm(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Runtime(err) => Some(err),
            Self::NotFound { .. } | Self::ForeignKeyViolation(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(code, message)
                if is_sqlite_foreign_key(code, message.as_deref()) =>
            {
                Self::ForeignKeyViolation(
                    message
                        .clone()
                        .unwrap_or_else(|| SQLITE_FOREIGN_KEY_MESSAGE.to_string()),
                )
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        if let Some(message) = sqlx_foreign_key_message(&value) {
            return Self::ForeignKeyViolation(message);
        }
        Self::Sqlx(value)
    }
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(value: sea_orm::DbErr) -> Self {
        if let Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(message)) = value.sql_err() {
            return Self::ForeignKeyViolation(message);
        }
        let driver_message = match &value {
            sea_orm::DbErr::Exec(sea_orm::RuntimeErr::SqlxError(err))
            | sea_orm::DbErr::Query(sea_orm::RuntimeErr::SqlxError(err))
            | sea_orm::DbErr::Conn(sea_orm::RuntimeErr::SqlxError(err)) => {
                sqlx_foreign_key_message(err)
            }
            _ => None,
        };
        match driver_message {
            Some(message) => Self::ForeignKeyViolation(message),
            None => Self::Orm(value),
        }
    }
}

const SQLITE_FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

/// SQLite reports a restricted parent delete as `SQLITE_CONSTRAINT_TRIGGER`
/// (1811) and a dangling child insert as `SQLITE_CONSTRAINT_FOREIGNKEY`
/// (787); both carry the same message.
fn is_sqlite_foreign_key(code: &rusqlite::ffi::Error, message: Option<&str>) -> bool {
    if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
        return true;
    }
    code.code == rusqlite::ErrorCode::ConstraintViolation
        && message.is_some_and(|text| text.contains(SQLITE_FOREIGN_KEY_MESSAGE))
}

fn sqlx_foreign_key_message(err: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let restricted_by_sqlite = db_err.code().as_deref() == Some("1811")
        && db_err.message().contains(SQLITE_FOREIGN_KEY_MESSAGE);
    if matches!(db_err.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) || restricted_by_sqlite
    {
        return Some(db_err.message().to_string());
    }
    None
}

impl From<DocumentError> for StoreError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

/// Failures specific to the embedded document store.
#[derive(Debug)]
pub enum DocumentError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A writer panicked while holding the collection lock.
    Poisoned,
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "document store i/o failed: {err}"),
            Self::Json(err) => write!(f, "document store json failed: {err}"),
            Self::Poisoned => write!(f, "document store lock poisoned"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
