use std::{error, fmt};

use parking::database::DatabaseError;

pub mod zone;

pub type Result<O> = core::result::Result<O, DatabaseError>;

pub trait DatabaseRow: Sized {
    type Model;

    fn to_model(self) -> Result<Self::Model>;
}

pub fn to_models<R: DatabaseRow>(rows: Vec<R>) -> Result<Vec<R::Model>> {
    rows.into_iter().map(DatabaseRow::to_model).collect()
}

/// A stored value the model cannot represent.
#[derive(Debug)]
pub struct CorruptRow(pub String);

impl fmt::Display for CorruptRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "corrupt row: {}", self.0)
    }
}

impl error::Error for CorruptRow {}

pub(crate) fn corrupt(why: String) -> DatabaseError {
    DatabaseError::Other(Box::new(CorruptRow(why)))
}
