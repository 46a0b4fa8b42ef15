use prometheus::{
    Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub work_orders_total: IntCounterVec,
    pub applications_in_queue: IntGauge,
    pub planning_latency_seconds: HistogramVec,
    pub match_score: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let work_orders_total = IntCounterVec::new(
            Opts::new("work_orders_total", "Total work orders by outcome"),
            &["outcome"],
        )
        .expect("valid work_orders_total metric");

        let applications_in_queue = IntGauge::new(
            "applications_in_queue",
            "Current number of applications awaiting planning",
        )
        .expect("valid applications_in_queue metric");

        let planning_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "planning_latency_seconds",
                "Latency of planning one application in seconds",
            ),
            &["outcome"],
        )
        .expect("valid planning_latency_seconds metric");

        let match_score = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "match_score",
                "Match score of dispatched work orders [0..100]",
            )
            .buckets(vec![50.0, 60.0, 70.0, 80.0, 90.0, 100.0]),
        )
        .expect("valid match_score metric");

        registry
            .register(Box::new(work_orders_total.clone()))
            .expect("register work_orders_total");
        registry
            .register(Box::new(applications_in_queue.clone()))
            .expect("register applications_in_queue");
        registry
            .register(Box::new(planning_latency_seconds.clone()))
            .expect("register planning_latency_seconds");
        registry
            .register(Box::new(match_score.clone()))
            .expect("register match_score");

        Self {
            registry,
            work_orders_total,
            applications_in_queue,
            planning_latency_seconds,
            match_score,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
