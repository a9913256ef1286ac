use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocError>;

#[derive(Error, Debug)]
pub enum LocError {
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("`{program}` timed out after {}", humantime::format_duration(*.after))]
    Timeout { program: String, after: Duration },
    #[error("`{program}` exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Counter error: {0}")]
    Counter(String),
    #[error("Other: {0}")]
    Other(String),
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::discover::Error> for LocError {
    fn from(err: gix::discover::Error) -> Self {
        LocError::GitDiscover(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for LocError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        LocError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for LocError {
    fn from(err: gix::object::commit::Error) -> Self {
        LocError::Commit(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for LocError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        LocError::ObjectFindConv(Box::new(err))
    }
}
