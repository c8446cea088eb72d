#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

#[macro_use]
mod util;

pub mod format;
pub mod lzw;
pub mod module;
pub mod reader;

pub use crate::format::{Format, Loader, ProbeInfo};
pub use crate::module::{Module, RawSamples, SampleLoader};
pub use crate::reader::Reader;

use std::error;
use std::fmt;
use std::io;

pub const MAX_KEYS       : usize = 128;
pub const MAX_CHANNELS   : usize = 64;
pub const MAX_ROWS       : usize = 256;
pub const MAX_ENV_POINTS : usize = 32;
pub const MAX_SAMPLES    : usize = 1024;


#[derive(Debug)]
pub enum Error {
    NotThisFormat(String),
    TruncatedInput(String),
    MalformedHeader(String),
    CompressionFault(String),
    UnsupportedVariant(String),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotThisFormat(descr)      => write!(f, "not this format: {}", descr),
            Error::TruncatedInput(descr)     => write!(f, "truncated input: {}", descr),
            Error::MalformedHeader(descr)    => write!(f, "malformed header: {}", descr),
            Error::CompressionFault(descr)   => write!(f, "compression fault: {}", descr),
            Error::UnsupportedVariant(descr) => write!(f, "unsupported variant: {}", descr),
            Error::Io(err)                   => write!(f, "{}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _              => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
