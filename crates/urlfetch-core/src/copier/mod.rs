//! Bounded-buffer stream copy.
//!
//! Copies a byte source either verbatim into a byte sink or, decoded, into a
//! text sink. Memory use is bounded by the chunk size regardless of payload
//! size. Source and sink are taken by value and released when the copy
//! returns, whichever way it ends; a failing release never masks the copy's
//! own result.

mod lines;

use encoding_rs::{CoderResult, Encoding};
use std::fmt;
use std::io::{self, Read, Write};

use lines::LineNormalizer;

/// Default chunk size for copies, in bytes.
pub const COPY_BUFFER_SIZE: usize = 512;

/// Reads into `buf`, retrying on `Interrupted`. Returns 0 at end of stream.
fn read_chunk<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match source.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Copies raw bytes from `source` to `sink` in chunks of `buffer_size`.
///
/// The sink is flushed before returning; a flush failure is a write failure.
/// Returns the number of bytes copied. On error, everything read before the
/// failure has already been handed to the sink.
pub fn copy_bytes<R, W>(mut source: R, mut sink: W, buffer_size: usize) -> io::Result<u64>
where
    R: Read,
    W: Write,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = read_chunk(&mut source, &mut buf)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
        total += n as u64;
    }
    sink.flush()?;
    Ok(total)
}

/// Decodes `source` with `encoding` and writes it line by line to `sink`,
/// each line followed by a single `\n`.
///
/// All line terminators (`\r\n`, `\r`, `\n`) come out as `\n`. Malformed input
/// is replaced with U+FFFD. A leading BOM is dropped, so unlike a byte-faithful
/// decode the text never starts with U+FEFF. Returns the number of source
/// bytes consumed.
pub fn copy_text<R, W>(
    mut source: R,
    mut sink: W,
    encoding: &'static Encoding,
    buffer_size: usize,
) -> io::Result<u64>
where
    R: Read,
    W: fmt::Write,
{
    let mut decoder = encoding.new_decoder_with_bom_removal();
    let mut normalizer = LineNormalizer::new();
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut decoded = String::new();
    let mut text = String::new();
    let mut total = 0u64;

    loop {
        let n = read_chunk(&mut source, &mut buf)?;
        let last = n == 0;
        total += n as u64;

        let mut input = &buf[..n];
        loop {
            decoded.clear();
            let room = decoder
                .max_utf8_buffer_length(input.len())
                .ok_or_else(|| io::Error::other("decoded chunk too large"))?;
            decoded.reserve(room);
            let (result, read, _had_errors) = decoder.decode_to_string(input, &mut decoded, last);
            input = &input[read..];

            text.clear();
            normalizer.push(&decoded, &mut text);
            if last && result == CoderResult::InputEmpty {
                normalizer.finish(&mut text);
            }
            sink.write_str(&text).map_err(|_| io::Error::other("text sink rejected write"))?;

            if result == CoderResult::InputEmpty {
                break;
            }
        }

        if last {
            break;
        }
    }
    Ok(total)
}
