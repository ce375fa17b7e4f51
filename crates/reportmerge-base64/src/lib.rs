//! Base64 helpers for reportmerge.
//!
//! Besides one-shot [`encode`]/[`decode`], this crate provides
//! [`Base64StreamEncoder`], which turns a sequence of arbitrarily sized byte
//! chunks into base64 text whose concatenation is exactly the base64 of the
//! concatenated input. Base64 works on 3-byte groups, so up to two trailing
//! bytes of every chunk are carried over to the next one and only the true
//! tail of the stream is ever padded.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::io::{self, Write};

pub use base64::DecodeError;

/// Encodes bytes to a padded standard base64 string.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes a padded standard base64 string.
pub fn decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded)
}

/// Validates if a string is valid base64
pub fn is_valid_base64(encoded: &str) -> bool {
    decode(encoded).is_ok()
}

/// Incremental base64 encoder that keeps output aligned across chunk boundaries.
#[derive(Debug, Clone, Default)]
pub struct Base64StreamEncoder {
    remainder: Vec<u8>,
    bytes_in: u64,
}

impl Base64StreamEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one chunk and return the text that can be emitted now.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        let mut out = String::new();
        self.push_into(chunk, &mut out);
        out
    }

    /// Like [`push`](Self::push) but appends to an existing buffer.
    pub fn push_into(&mut self, mut chunk: &[u8], out: &mut String) {
        self.bytes_in += chunk.len() as u64;

        if !self.remainder.is_empty() {
            while self.remainder.len() < 3 && !chunk.is_empty() {
                self.remainder.push(chunk[0]);
                chunk = &chunk[1..];
            }
            if self.remainder.len() < 3 {
                return;
            }
            STANDARD.encode_string(&self.remainder, out);
            self.remainder.clear();
        }

        let aligned = chunk.len() - chunk.len() % 3;
        if aligned > 0 {
            STANDARD.encode_string(&chunk[..aligned], out);
        }
        self.remainder.extend_from_slice(&chunk[aligned..]);
    }

    /// Bytes held back for the next chunk (always 0, 1 or 2).
    pub fn pending(&self) -> usize {
        self.remainder.len()
    }

    /// Total bytes consumed so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Encode whatever is left. This is the only place padding is produced.
    pub fn finish(self) -> String {
        if self.remainder.is_empty() {
            String::new()
        } else {
            STANDARD.encode(&self.remainder)
        }
    }
}

/// [`Write`] adapter that base64-encodes everything written through it.
///
/// The tail is only flushed by [`Base64Writer::finish`]; dropping the writer
/// without finishing loses up to two input bytes.
#[derive(Debug)]
pub struct Base64Writer<W: Write> {
    inner: W,
    encoder: Base64StreamEncoder,
    scratch: String,
}

impl<W: Write> Base64Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            encoder: Base64StreamEncoder::new(),
            scratch: String::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Total raw bytes accepted so far.
    pub fn bytes_in(&self) -> u64 {
        self.encoder.bytes_in()
    }

    /// Write the padded tail and hand back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        let Base64Writer {
            mut inner, encoder, ..
        } = self;
        let tail = encoder.finish();
        inner.write_all(tail.as_bytes())?;
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for Base64Writer<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.scratch.clear();
        self.encoder.push_into(data, &mut self.scratch);
        self.inner.write_all(self.scratch.as_bytes())?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(chunks: &[&[u8]]) -> String {
        let mut enc = Base64StreamEncoder::new();
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&enc.push(chunk));
        }
        out.push_str(&enc.finish());
        out
    }

    #[test]
    fn test_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_is_valid_base64() {
        assert!(is_valid_base64("SGVsbG8="));
        assert!(!is_valid_base64("not-valid!!!"));
    }

    #[test]
    fn empty_stream_emits_nothing() {
        assert_eq!(stream(&[]), "");
        let empty: &[u8] = b"";
        assert_eq!(stream(&[empty, empty]), "");
    }

    #[test]
    fn aligned_chunk_leaves_no_remainder() {
        let mut enc = Base64StreamEncoder::new();
        assert_eq!(enc.push(b"abcdef"), "YWJjZGVm");
        assert_eq!(enc.pending(), 0);
        assert_eq!(enc.finish(), "");
    }

    #[test]
    fn remainder_is_carried_not_padded() {
        let mut enc = Base64StreamEncoder::new();
        assert_eq!(enc.push(b"Hell"), "SGVs");
        assert_eq!(enc.pending(), 1);
        assert_eq!(enc.push(b"o"), "");
        assert_eq!(enc.pending(), 2);
        assert_eq!(enc.push(b", World!"), "bG8sIFdvcmxk");
        assert_eq!(enc.finish(), "IQ==");
    }

    #[test]
    fn single_byte_chunks_match_one_shot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let chunks: Vec<&[u8]> = data.chunks(1).collect();
        assert_eq!(stream(&chunks), encode(data));
    }

    #[test]
    fn bytes_in_counts_everything() {
        let mut enc = Base64StreamEncoder::new();
        enc.push(b"ab");
        enc.push(b"cde");
        assert_eq!(enc.bytes_in(), 5);
    }

    #[test]
    fn writer_streams_into_inner() {
        let mut w = Base64Writer::new(Vec::new());
        w.write_all(b"Hel").unwrap();
        w.write_all(b"lo").unwrap();
        assert_eq!(w.get_ref().as_slice(), b"SGVs");
        let out = w.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "SGVsbG8=");
    }

    #[test]
    fn writer_with_io_copy() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let mut w = Base64Writer::new(Vec::new());
        io::copy(&mut data.as_slice(), &mut w).unwrap();
        assert_eq!(w.bytes_in(), 10_000);
        let out = w.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), encode(&data));
    }
}
