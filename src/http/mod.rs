mod ureq_backend;

use std::fmt;
use std::io::{self, Read};

use thiserror::Error;

pub use ureq_backend::UreqTransport;

/// Bodies larger than this are cut off when read.
const MAX_BODY_LEN: u64 = 2 * 1024 * 1024;

pub struct Response {
    status: u16,
    pub(self) reader: Box<dyn Read>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("server responded with HTTP {0}")]
    Status(u16, Response),

    #[error("{0}")]
    Transport(Box<str>),
}

/// Something that can perform a blocking HTTP GET. Every outbound call this
/// program makes goes through here.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response, Error> {
        (**self).get(url, query)
    }
}

impl Response {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn into_string(self) -> Result<String, io::Error> {
        let mut vec = Vec::with_capacity(1024);
        self.reader.take(MAX_BODY_LEN).read_to_end(&mut vec)?;
        String::from_utf8(vec).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Renders a request for the logs. The API key never shows up in there.
pub(crate) fn describe(url: &str, query: &[(&str, &str)]) -> String {
    let mut line = String::from(url);
    for (i, (param, value)) in query.iter().enumerate() {
        line.push(if i == 0 { '?' } else { '&' });
        line.push_str(param);
        line.push('=');
        line.push_str(if *param == "key" { "<redacted>" } else { value });
    }
    line
}
