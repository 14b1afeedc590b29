use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Per-connection bookkeeping shared between the IO tap and the probe.
///
/// Travels with every response through the connection's `Connected::extra`.
#[derive(Debug, Clone, Default)]
pub struct ConnTrace {
    inner: Arc<TraceInner>,
}

#[derive(Debug, Default)]
struct TraceInner {
    exchanges: AtomicU64,
    wire: Mutex<WireState>,
}

#[derive(Debug, Default)]
struct WireState {
    awaiting_response: bool,
    first_read: Option<Instant>,
}

impl ConnTrace {
    /// Marks one more exchange on this connection and reports whether an
    /// earlier one already used it.
    #[must_use]
    pub fn claim(&self) -> bool {
        self.inner.exchanges.fetch_add(1, Ordering::AcqRel) > 0
    }

    #[must_use]
    pub fn exchanges(&self) -> u64 {
        self.inner.exchanges.load(Ordering::Acquire)
    }

    /// First plaintext byte read since the last write, if it arrived no
    /// earlier than `start`.
    #[must_use]
    pub fn first_read_after(&self, start: Instant) -> Option<Instant> {
        let state = self.inner.wire.lock().ok()?;
        state.first_read.filter(|instant| *instant >= start)
    }

    fn on_write(&self) {
        if let Ok(mut state) = self.inner.wire.lock() {
            state.awaiting_response = true;
            state.first_read = None;
        }
    }

    fn on_read(&self) {
        if let Ok(mut state) = self.inner.wire.lock()
            && state.awaiting_response
        {
            state.awaiting_response = false;
            state.first_read = Some(Instant::now());
        }
    }
}

/// IO wrapper that stamps the first read following each write.
#[derive(Debug)]
pub struct TracedStream<S> {
    inner: S,
    trace: ConnTrace,
}

impl<S> TracedStream<S> {
    pub const fn new(inner: S, trace: ConnTrace) -> Self {
        Self { inner, trace }
    }
}

impl<S> AsyncRead for TracedStream<S>
where
    S: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            self.trace.on_read();
        }
        poll
    }
}

impl<S> AsyncWrite for TracedStream<S>
where
    S: AsyncWrite + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(written)) = poll
            && written > 0
        {
            self.trace.on_write();
        }
        poll
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write_vectored(cx, bufs);
        if let Poll::Ready(Ok(written)) = poll
            && written > 0
        {
            self.trace.on_write();
        }
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
