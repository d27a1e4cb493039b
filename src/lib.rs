pub mod app;
pub mod cli;
pub mod config;
pub mod handoff;
pub mod lifecycle;
pub mod overlay;
pub mod power;
pub mod render;
pub mod sampler;
pub mod source;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    InvalidArgs(String),
    Io(std::io::Error),
    Spawn(String),
    Idle(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgs(msg) => write!(f, "invalid arguments: {msg}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Spawn(msg) => write!(f, "failed to spawn thread: {msg}"),
            Error::Idle(msg) => write!(f, "idle query failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}
