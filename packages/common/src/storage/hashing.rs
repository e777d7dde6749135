use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, ReadBuf};

use super::error::LimitExceeded;
use super::hash::{ContentHash, ContentHasher};

/// Reader adapter that feeds every byte it yields into a SHA-256 accumulator.
///
/// Hand `&mut HashingReader` to a blob store `put` and call [`finish`] once the
/// store returns: the digest then covers exactly the bytes the store consumed,
/// without a second pass over the source.
///
/// [`finish`]: HashingReader::finish
pub struct HashingReader<R> {
    inner: R,
    hasher: ContentHasher,
    limit: Option<u64>,
}

impl<R> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: ContentHasher::new(),
            limit: None,
        }
    }

    /// Fail the stream with `SizeLimitExceeded` once more than `limit` bytes pass.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Bytes forwarded so far.
    pub fn bytes_read(&self) -> u64 {
        self.hasher.len()
    }

    /// Digest and length of everything read.
    pub fn finish(self) -> (ContentHash, u64) {
        self.hasher.finalize()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for HashingReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let before = buf.filled().len();

        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;

        let fresh = &buf.filled()[before..];
        if let Some(limit) = this.limit {
            let actual = this.hasher.len() + fresh.len() as u64;
            if actual > limit {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    LimitExceeded { actual, limit },
                )));
            }
        }
        this.hasher.update(fresh);

        Poll::Ready(Ok(()))
    }
}
