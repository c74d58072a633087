//! A thin, per-process metrics registry used by block-sync and the transaction pool.
//!
//! Metric names are dotted (`BlockSync.Idle.StateLatency`) to match the original
//! hierarchy; since Prometheus metric names may only contain `[a-zA-Z0-9_:]`, dots are
//! mapped to underscores on registration. The dotted form is preserved as the metric's
//! `const_label` `"name"` so the original hierarchy is still visible in scraped output.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use prometheus::{Histogram as PHistogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use tracing::warn;

fn sanitize(name: &str) -> String {
    name.replace('.', "_")
}

/// A registry of metrics for one node process. Clone is cheap: it shares the underlying
/// [`prometheus::Registry`].
#[derive(Clone)]
pub struct MetricsFactory {
    registry: Registry,
}

impl Default for MetricsFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsFactory {
    pub fn new() -> Self {
        Self { registry: Registry::new() }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// A latency histogram. `max_expected` bounds the largest bucket; observations beyond
    /// it are still recorded (in the `+Inf` bucket), just with less resolution.
    pub fn histogram(&self, name: &str, max_expected: Duration) -> Histogram {
        let buckets = prometheus::exponential_buckets(0.001, 2.0, 24)
            .unwrap_or_default()
            .into_iter()
            .filter(|s| *s <= max_expected.as_secs_f64().max(0.001))
            .collect::<Vec<_>>();
        let opts = HistogramOpts::new(sanitize(name), name.to_string())
            .const_label("name", name)
            .buckets(if buckets.is_empty() { vec![max_expected.as_secs_f64()] } else { buckets });
        let histogram = PHistogram::with_opts(opts).expect("valid histogram opts");
        if let Err(e) = self.registry.register(Box::new(histogram.clone())) {
            warn!(metric = name, error = %e, "failed to register histogram, already registered?");
        }
        Histogram { inner: histogram }
    }

    pub fn gauge(&self, name: &str) -> Gauge {
        let opts = Opts::new(sanitize(name), name.to_string()).const_label("name", name);
        let gauge = IntGauge::with_opts(opts).expect("valid gauge opts");
        if let Err(e) = self.registry.register(Box::new(gauge.clone())) {
            warn!(metric = name, error = %e, "failed to register gauge, already registered?");
        }
        Gauge { inner: gauge }
    }

    /// A windowed event-rate counter: `measure()` records one event now; `rate_per_second()`
    /// reports events-per-second over the trailing `window`.
    pub fn rate(&self, name: &str) -> Rate {
        let opts = Opts::new(sanitize(name), name.to_string()).const_label("name", name);
        let counter = IntCounter::with_opts(opts).expect("valid counter opts");
        if let Err(e) = self.registry.register(Box::new(counter.clone())) {
            warn!(metric = name, error = %e, "failed to register rate counter, already registered?");
        }
        Rate { counter, window: Duration::from_secs(60), events: Mutex::new(Vec::new()) }
    }
}

/// A latency histogram, wrapping [`prometheus::Histogram`].
#[derive(Clone)]
pub struct Histogram {
    inner: PHistogram,
}

impl Histogram {
    pub fn record(&self, elapsed: Duration) {
        self.inner.observe(elapsed.as_secs_f64());
    }
}

/// A point-in-time integer gauge, wrapping [`prometheus::IntGauge`].
#[derive(Clone)]
pub struct Gauge {
    inner: IntGauge,
}

impl Gauge {
    pub fn set(&self, value: i64) {
        self.inner.set(value);
    }

    pub fn increment(&self) {
        self.inner.inc();
    }

    pub fn get(&self) -> i64 {
        self.inner.get()
    }
}

/// A trailing-window event rate, wrapping a monotonic [`prometheus::IntCounter`] alongside
/// an in-memory timestamp window for the rate computation itself.
pub struct Rate {
    counter: IntCounter,
    window: Duration,
    events: Mutex<Vec<Instant>>,
}

impl Rate {
    pub fn measure(&self, count: u64) {
        self.counter.inc_by(count);
        let now = Instant::now();
        let mut events = self.events.lock();
        events.push(now);
        let window = self.window;
        events.retain(|t| now.duration_since(*t) <= window);
    }

    pub fn rate_per_second(&self) -> f64 {
        let now = Instant::now();
        let window = self.window;
        let events = self.events.lock();
        let count = events.iter().filter(|t| now.duration_since(**t) <= window).count();
        count as f64 / window.as_secs_f64()
    }

    pub fn total(&self) -> u64 {
        self.counter.get()
    }
}
