use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
}
