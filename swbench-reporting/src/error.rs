use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No '{0}' page summary recorded")]
    MissingSummary(String),
}

pub type Result<T> = std::result::Result<T, Error>;
