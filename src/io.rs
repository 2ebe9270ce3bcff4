//! Input abstraction: optional GZip decompression and bounded forward
//! skips that use a native seek whenever the stream supports one.

use std::io::{Read, Seek, SeekFrom};

use flate2::read::GzDecoder;

use crate::error::Result;

/// The two-byte GZip member header.
pub(crate) const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Largest single allocation the read-based skip path will make.
const SKIP_CHUNK: usize = 1 << 20;

/// A byte source for the dispatcher: either the raw stream or a GZip
/// decoder over it. The raw arm can seek, so skipping a payload there
/// costs nothing; the decoder arm has to consume.
pub(crate) enum Input<R: Read + Seek> {
    Plain(R),
    Gzip(GzDecoder<R>),
}

impl<R: Read + Seek> Input<R> {
    pub fn plain(source: R) -> Self {
        Input::Plain(source)
    }

    pub fn gzip(source: R) -> Self {
        Input::Gzip(GzDecoder::new(source))
    }

    /// Probe the first two bytes for the GZip magic, restoring the stream
    /// position before deciding which arm to build.
    pub fn detect(mut source: R) -> Result<Self> {
        let start = source.stream_position()?;

        let mut magic = [0u8; 2];
        let mut got = 0;
        while got < magic.len() {
            let n = source.read(&mut magic[got..])?;
            if n == 0 {
                break;
            }
            got += n;
        }
        source.seek(SeekFrom::Start(start))?;

        if got == magic.len() && magic == GZIP_MAGIC {
            Ok(Input::Gzip(GzDecoder::new(source)))
        } else {
            Ok(Input::Plain(source))
        }
    }

    /// Advance `len` bytes without materializing them.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        match self {
            Input::Plain(r) => {
                r.seek(SeekFrom::Current(len as i64))?;
                Ok(())
            }
            Input::Gzip(r) => skip_by_reading(r, len),
        }
    }

    pub fn into_inner(self) -> R {
        match self {
            Input::Plain(r) => r,
            Input::Gzip(r) => r.into_inner(),
        }
    }
}

impl<R: Read + Seek> Read for Input<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Input::Plain(r) => r.read(buf),
            Input::Gzip(r) => r.read(buf),
        }
    }
}

/// Consume and discard `len` bytes from a non-seekable reader. Fails with
/// `UnexpectedEnd` if the stream runs out first.
pub(crate) fn skip_by_reading<R: Read>(reader: &mut R, len: u64) -> Result<()> {
    if len == 0 {
        return Ok(());
    }

    let mut buf = vec![0u8; SKIP_CHUNK.min(len as usize)];
    let mut remaining = len;
    while remaining > 0 {
        let want = (buf.len() as u64).min(remaining) as usize;
        reader.read_exact(&mut buf[..want])?;
        remaining -= want as u64;
    }
    Ok(())
}
