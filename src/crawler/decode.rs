//! Response body decoding
//!
//! Decompression is chosen strictly from the `Content-Encoding` response header.
//! An absent or unrecognised encoding passes the bytes through untouched.

use crate::FetchError;
use std::fmt;
use std::io::Read;

/// Supported content codings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Deflate,
    Brotli,
}

impl ContentEncoding {
    /// Maps a `Content-Encoding` header value to a decoder
    ///
    /// Stacked codings (`gzip, br`) are not unwrapped and fall through as identity.
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Identity;
        };

        match value.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Self::Gzip,
            "deflate" => Self::Deflate,
            "br" => Self::Brotli,
            _ => Self::Identity,
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity",
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::Brotli => "br",
        };
        f.write_str(name)
    }
}

/// Fully decompresses a response body
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The decoded bytes
/// * `Err(FetchError::Decompression)` - The body was not valid for its declared coding
pub fn decode_body(bytes: &[u8], encoding: ContentEncoding) -> Result<Vec<u8>, FetchError> {
    let result = match encoding {
        ContentEncoding::Identity => return Ok(bytes.to_vec()),
        ContentEncoding::Gzip => read_all(flate2::read::GzDecoder::new(bytes)),
        ContentEncoding::Deflate => {
            // "deflate" is specified as zlib-wrapped, but raw streams are common
            read_all(flate2::read::ZlibDecoder::new(bytes))
                .or_else(|_| read_all(flate2::read::DeflateDecoder::new(bytes)))
        }
        ContentEncoding::Brotli => read_all(brotli::Decompressor::new(bytes, 4096)),
    };

    result.map_err(|e| FetchError::Decompression {
        encoding: encoding.to_string(),
        message: e.to_string(),
    })
}

fn read_all<R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}
