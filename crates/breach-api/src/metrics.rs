//! Prometheus counters for the result cache and the backend.
use breach_core::{BreachError, PipelineTokens, VariantKind};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    stored: IntCounterVec,
    consumed: IntCounterVec,
    misses: IntCounterVec,
    backend_failures: IntCounterVec,
    cache_entries: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let stored = IntCounterVec::new(
            Opts::new("breach_results_stored_total", "Results written to the cache"),
            &["kind"],
        )?;
        let consumed = IntCounterVec::new(
            Opts::new("breach_results_consumed_total", "Results handed to a render"),
            &["kind"],
        )?;
        let misses = IntCounterVec::new(
            Opts::new(
                "breach_cache_misses_total",
                "Render tokens that resolved to nothing",
            ),
            &["kind"],
        )?;
        let backend_failures = IntCounterVec::new(
            Opts::new("breach_backend_failures_total", "Failed backend calls"),
            &["stage"],
        )?;
        let cache_entries = IntGauge::new("breach_cache_entries", "Results currently cached")?;

        registry.register(Box::new(stored.clone()))?;
        registry.register(Box::new(consumed.clone()))?;
        registry.register(Box::new(misses.clone()))?;
        registry.register(Box::new(backend_failures.clone()))?;
        registry.register(Box::new(cache_entries.clone()))?;

        Ok(Self {
            registry,
            stored,
            consumed,
            misses,
            backend_failures,
            cache_entries,
        })
    }

    pub fn record_stored(&self, tokens: &PipelineTokens) {
        if tokens.data_token.is_some() {
            self.stored
                .with_label_values(&[VariantKind::Extract.as_str()])
                .inc();
        }
        if tokens.solve_token.is_some() {
            self.stored
                .with_label_values(&[VariantKind::Solve.as_str()])
                .inc();
        }
    }

    /// Counts one token lookup made while rendering.
    pub fn record_lookup(&self, kind: VariantKind, found: bool) {
        let counter = if found { &self.consumed } else { &self.misses };
        counter.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_backend_failure(&self, err: &BreachError) {
        let stage = err.endpoint().trim_start_matches('/');
        self.backend_failures.with_label_values(&[stage]).inc();
    }

    /// Text exposition format, with the cache gauge refreshed first.
    pub fn encode(&self, cache_entries: usize) -> Result<String, prometheus::Error> {
        self.cache_entries.set(cache_entries as i64);

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
