use shared::metrics_defs::{MetricDef, MetricType};

pub const CARTS_VALIDATED: MetricDef = MetricDef {
    name: "cart.validated",
    metric_type: MetricType::Counter,
    description: "Carts checked against the item limit. Tagged with result.",
};

pub const TELEMETRY_ATTEMPTS: MetricDef = MetricDef {
    name: "telemetry.attempts",
    metric_type: MetricType::Counter,
    description: "HTTP attempts made to the telemetry endpoint",
};

pub const TELEMETRY_DELIVERED: MetricDef = MetricDef {
    name: "telemetry.delivered",
    metric_type: MetricType::Counter,
    description: "Telemetry payloads accepted by the endpoint",
};

pub const TELEMETRY_DROPPED: MetricDef = MetricDef {
    name: "telemetry.dropped",
    metric_type: MetricType::Counter,
    description: "Telemetry payloads given up on. Tagged with reason.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Time to produce the validation response in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    CARTS_VALIDATED,
    TELEMETRY_ATTEMPTS,
    TELEMETRY_DELIVERED,
    TELEMETRY_DROPPED,
    REQUEST_DURATION,
];
