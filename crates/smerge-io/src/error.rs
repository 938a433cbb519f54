use smerge_core::schema::DataType;
use smerge_operators::OpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: cannot read '{value}' as {ty} for column '{column}'")]
    Parse {
        line: u64,
        column: String,
        value: String,
        ty: DataType,
    },

    #[error("schema: {0}")]
    Schema(String),
}

impl From<Error> for OpError {
    fn from(e: Error) -> Self {
        OpError::Exec(e.to_string())
    }
}
