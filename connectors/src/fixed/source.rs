use crate::error::Error;
use std::io::{BufRead, BufReader, Cursor as IoCursor, Read};

/// A fixed-width source as named by its URI scheme (§6 Source URIs):
/// `fixed://<path>`, `stdin`, `inline`, `http(s)://…`, or a filename glob.
/// Each variant resolves to one or more byte streams concatenated in order.
pub enum FixedSource {
    Stdin,
    Inline(String),
    Path(String),
    Http(String),
    Glob(String),
}

impl FixedSource {
    /// Parses a source URI into the concrete variant. Glob patterns are any
    /// path containing `*` or `?`; everything else falling through the
    /// recognized schemes is treated as a plain filesystem path.
    pub fn parse(uri: &str) -> Self {
        if uri == "stdin" {
            FixedSource::Stdin
        } else if let Some(rest) = uri.strip_prefix("inline:") {
            FixedSource::Inline(rest.to_string())
        } else if let Some(rest) = uri.strip_prefix("fixed://") {
            FixedSource::Path(rest.to_string())
        } else if uri.starts_with("http://") || uri.starts_with("https://") {
            FixedSource::Http(uri.to_string())
        } else if uri.contains('*') || uri.contains('?') {
            FixedSource::Glob(uri.to_string())
        } else {
            FixedSource::Path(uri.to_string())
        }
    }

    /// Opens every underlying byte stream in order, ready for line-by-line
    /// consumption by the reader.
    pub fn open_readers(&self) -> Result<Vec<Box<dyn BufRead + Send>>, Error> {
        match self {
            FixedSource::Stdin => {
                Ok(vec![Box::new(BufReader::new(std::io::stdin()))])
            }
            FixedSource::Inline(text) => {
                Ok(vec![Box::new(IoCursor::new(text.clone().into_bytes()))])
            }
            FixedSource::Path(path) => {
                let file = std::fs::File::open(path)?;
                Ok(vec![Box::new(BufReader::new(file))])
            }
            FixedSource::Http(url) => {
                let body = reqwest::blocking::get(url)
                    .and_then(|resp| resp.error_for_status())
                    .and_then(|resp| resp.bytes())
                    .map_err(|e| Error::Connect(e.to_string()))?;
                Ok(vec![Box::new(IoCursor::new(body.to_vec()))])
            }
            FixedSource::Glob(pattern) => {
                let mut paths: Vec<_> = glob::glob(pattern)
                    .map_err(|e| Error::Parse(e.to_string()))?
                    .filter_map(Result::ok)
                    .collect();
                paths.sort();
                let mut readers: Vec<Box<dyn BufRead + Send>> = Vec::with_capacity(paths.len());
                for path in paths {
                    let file = std::fs::File::open(&path)?;
                    readers.push(Box::new(BufReader::new(file)));
                }
                Ok(readers)
            }
        }
    }
}

/// Decodes a raw byte buffer with the configured encoding, substituting the
/// Unicode replacement character for undecodable sequences rather than
/// failing the whole line (the reader counts those as per-row decode
/// errors, §4.4).
pub fn decode_line(raw: &[u8], encoding_label: &str) -> (String, bool) {
    let encoding = encoding_rs::Encoding::for_label(encoding_label.as_bytes())
        .unwrap_or(encoding_rs::UTF_8);
    let (decoded, _, had_errors) = encoding.decode(raw);
    (decoded.into_owned(), had_errors)
}

pub fn read_all_bytes(mut reader: Box<dyn BufRead + Send>) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}
