use parking::database::DatabaseError;

pub mod zone;

const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        sqlx::Error::Database(ref error)
            if error.code().as_deref() == Some(UNIQUE_VIOLATION) =>
        {
            DatabaseError::Conflict(error.message().to_owned())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => DatabaseError::Unavailable(Box::new(why)),
        _ => DatabaseError::Other(Box::new(why)),
    }
}
