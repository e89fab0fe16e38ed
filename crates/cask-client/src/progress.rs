//! Byte-level upload progress
//!
//! [`ProgressReader`] wraps the reader handed to the storage backend and
//! reports percent-complete as the backend drains it. Percents are
//! monotonically non-decreasing; the reader caps at 99 and the client
//! emits the final 100 once the upload settles.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Progress callback: (object path, percent complete).
pub type ProgressFn = Arc<dyn Fn(&str, u8) + Send + Sync>;

pub(crate) struct ProgressReader<R> {
    inner: R,
    path: String,
    total: u64,
    seen: u64,
    last_percent: u8,
    on_progress: ProgressFn,
}

impl<R> ProgressReader<R> {
    pub(crate) fn new(inner: R, path: String, total: u64, on_progress: ProgressFn) -> Self {
        ProgressReader {
            inner,
            path,
            total,
            seen: 0,
            last_percent: 0,
            on_progress,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);

        if let Poll::Ready(Ok(())) = &result {
            let read = (buf.filled().len() - before) as u64;
            if read > 0 && this.total > 0 {
                this.seen += read;
                let percent = ((this.seen * 100 / this.total) as u8).min(99);
                if percent > this.last_percent {
                    this.last_percent = percent;
                    (this.on_progress)(&this.path, percent);
                }
            }
        }

        result
    }
}
