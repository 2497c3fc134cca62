use shared::metrics_defs::{MetricDef, MetricType};

pub const WEBHOOK_REQUESTS: MetricDef = MetricDef {
    name: "webhook.requests",
    metric_type: MetricType::Counter,
    description: "Webhook requests handled. Tagged with outcome.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "webhook.request.duration",
    metric_type: MetricType::Histogram,
    description: "Webhook request duration in seconds. Tagged with outcome.",
};

pub const UPSERT_ATTEMPTS: MetricDef = MetricDef {
    name: "crm.upsert.attempts",
    metric_type: MetricType::Counter,
    description: "Calls made to the CRM upsert endpoint. Tagged with status.",
};

pub const UPSERT_FAILURES: MetricDef = MetricDef {
    name: "crm.upsert.failures",
    metric_type: MetricType::Counter,
    description: "Upserts that ended in an error. Tagged with kind.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    WEBHOOK_REQUESTS,
    REQUEST_DURATION,
    UPSERT_ATTEMPTS,
    UPSERT_FAILURES,
];
