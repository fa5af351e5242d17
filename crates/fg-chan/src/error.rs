use std::fmt;

#[derive(Debug)]
pub enum ChannelError {
    Parse(String),
    UnsupportedClass(String),
    EndOfStream,
    Core(fg_core::Error),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Parse(msg) => write!(f, "parse error: {msg}"),
            ChannelError::UnsupportedClass(class) => write!(f, "class {class} not supported"),
            ChannelError::EndOfStream => write!(f, "no more objects in the stream"),
            ChannelError::Core(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<fg_core::Error> for ChannelError {
    fn from(e: fg_core::Error) -> Self {
        ChannelError::Core(e)
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
