use std::time::Duration;

/// Outcome of one probe.
///
/// `origin_ms` is `None` when the response carried no usable origin timing
/// header. In that case `cdn_latency_ms` holds the full TTFB and must not be
/// read as a decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSample {
    /// 1-based round the sample belongs to.
    pub index: usize,
    pub ttfb: Duration,
    pub origin_ms: Option<f64>,
    pub cdn_latency_ms: f64,
    pub status_code: u16,
    pub reused: bool,
    pub actual_protocol: String,
    pub error: Option<String>,
}

impl RequestSample {
    #[must_use]
    pub fn success(
        index: usize,
        ttfb: Duration,
        origin_ms: Option<f64>,
        status_code: u16,
        reused: bool,
        actual_protocol: impl Into<String>,
    ) -> Self {
        let ttfb_ms = duration_ms(ttfb);
        let cdn_latency_ms = origin_ms.map_or(ttfb_ms, |origin| ttfb_ms - origin);
        Self {
            index,
            ttfb,
            origin_ms,
            cdn_latency_ms,
            status_code,
            reused,
            actual_protocol: actual_protocol.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            ttfb: Duration::ZERO,
            origin_ms: None,
            cdn_latency_ms: 0.0,
            status_code: 0,
            reused: false,
            actual_protocol: String::new(),
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub const fn ttfb_ms(&self) -> f64 {
        duration_ms(self.ttfb)
    }
}

/// Milliseconds with microsecond resolution.
#[must_use]
pub const fn duration_ms(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}
