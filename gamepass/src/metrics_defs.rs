//! Metrics definitions for the gamepass service.

use shared::metrics_defs::{MetricDef, MetricType};

pub const UPSTREAM_REQUESTS: MetricDef = MetricDef {
    name: "upstream.requests",
    metric_type: MetricType::Counter,
    description: "Upstream calls. Tagged with outcome (success, error_status, timeout, failed).",
};

pub const UPSTREAM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "upstream.request.duration",
    metric_type: MetricType::Histogram,
    description: "Upstream call duration in seconds",
};

pub const PAGINATION_PAGES: MetricDef = MetricDef {
    name: "pagination.pages",
    metric_type: MetricType::Histogram,
    description: "Number of upstream pages fetched for one created-gamepasses listing",
};

pub const PAGINATION_CAP_REACHED: MetricDef = MetricDef {
    name: "pagination.cap_reached",
    metric_type: MetricType::Counter,
    description: "Listings that stopped at the page cap while upstream still returned a cursor",
};

pub const OWNERSHIP_VERDICTS: MetricDef = MetricDef {
    name: "ownership.verdicts",
    metric_type: MetricType::Counter,
    description: "Ownership checks answered. Tagged with style and verdict.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    UPSTREAM_REQUESTS,
    UPSTREAM_REQUEST_DURATION,
    PAGINATION_PAGES,
    PAGINATION_CAP_REACHED,
    OWNERSHIP_VERDICTS,
];
