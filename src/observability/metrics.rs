use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::store::Partition;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub transitions_total: IntCounterVec,
    pub transition_latency_seconds: HistogramVec,
    pub deliveries_in_partition: IntGaugeVec,
    pub sign_ins_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Delivery status transitions by target and outcome"),
            &["target", "outcome"],
        )
        .expect("valid transitions_total metric");

        let transition_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "transition_latency_seconds",
                "Latency of a single delivery transition in seconds",
            ),
            &["outcome"],
        )
        .expect("valid transition_latency_seconds metric");

        let deliveries_in_partition = IntGaugeVec::new(
            Opts::new("deliveries_in_partition", "Deliveries currently filed per partition"),
            &["partition"],
        )
        .expect("valid deliveries_in_partition metric");

        let sign_ins_total = IntCounterVec::new(
            Opts::new("sign_ins_total", "Admin sign-in attempts by outcome"),
            &["outcome"],
        )
        .expect("valid sign_ins_total metric");

        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(transition_latency_seconds.clone()))
            .expect("register transition_latency_seconds");
        registry
            .register(Box::new(deliveries_in_partition.clone()))
            .expect("register deliveries_in_partition");
        registry
            .register(Box::new(sign_ins_total.clone()))
            .expect("register sign_ins_total");

        for partition in Partition::ALL {
            deliveries_in_partition
                .with_label_values(&[partition.collection_name()])
                .set(0);
        }

        Self {
            registry,
            transitions_total,
            transition_latency_seconds,
            deliveries_in_partition,
            sign_ins_total,
        }
    }

    pub fn partition_moved(&self, from: Partition, to: Partition) {
        self.deliveries_in_partition
            .with_label_values(&[from.collection_name()])
            .dec();
        self.deliveries_in_partition
            .with_label_values(&[to.collection_name()])
            .inc();
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
