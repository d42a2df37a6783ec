use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid value for filter '{field}'")]
    InvalidValue { field: String, value: String },
}
