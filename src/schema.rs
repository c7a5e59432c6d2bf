//! Static attribute tables for every entity the filter language can address.
//!
//! Each entity maps to a key in the caller's table map (`runs`,
//! `experiments`, `metrics`); each attribute maps to a physical column or a
//! join requirement. Nothing outside these tables resolves.

/// `lifecycle_stage` of soft-deleted runs and experiments.
pub const LIFECYCLE_STAGE_DELETED: &str = "deleted";

/// `status` of a run that is still reporting.
pub const STATUS_RUNNING: &str = "RUNNING";

/// Table holding the most recent sample per (run, metric key, context).
pub const LATEST_METRICS_TABLE: &str = "latest_metrics";

/// Step of the first sample of every metric series.
pub const FIRST_STEP: i64 = 0;

/// Table holding metric context JSON documents.
pub const CONTEXTS_TABLE: &str = "contexts";

/// Table-map key under which the caller may register the contexts table for
/// `metric.context` lookups.
pub const CONTEXTS_KEY: &str = "contexts";

/// Run key/value tables joined by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValueTable {
    Tags,
    Params,
}

impl KeyValueTable {
    pub fn table(self) -> &'static str {
        match self {
            KeyValueTable::Tags => "tags",
            KeyValueTable::Params => "params",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Plain column on the entity's own table
    Column(&'static str),
    /// Boolean attribute, true when `column = value`
    Flag {
        column: &'static str,
        value: &'static str,
    },
    /// `(end_time - start_time) / 1000` on the runs table
    Duration,
    /// `name` column of the experiments table
    ExperimentName,
    /// `run.metrics["key", {context}]`, joined through latest metrics
    MetricSeries,
    /// `run.tags[...]` and `run.params[...]`
    KeyValue(KeyValueTable),
    /// A key inside the metric context JSON document
    Context,
    /// Always [`FIRST_STEP`]; no column backs it
    FirstStep,
}

#[derive(Debug)]
pub struct AttributeDescriptor {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct EntityDescriptor {
    /// Name used in queries (`run`)
    pub name: &'static str,
    /// Key into the caller's table map (`runs`)
    pub table_key: &'static str,
    pub attributes: &'static [AttributeDescriptor],
}

impl EntityDescriptor {
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeDescriptor> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

const fn attribute(
    name: &'static str,
    kind: AttributeKind,
    description: &'static str,
) -> AttributeDescriptor {
    AttributeDescriptor {
        name,
        kind,
        description,
    }
}

static RUN_ATTRIBUTES: &[AttributeDescriptor] = &[
    attribute("name", AttributeKind::Column("name"), "run name"),
    attribute("hash", AttributeKind::Column("run_uuid"), "run id"),
    attribute(
        "experiment",
        AttributeKind::ExperimentName,
        "name of the run's experiment",
    ),
    attribute(
        "archived",
        AttributeKind::Flag {
            column: "lifecycle_stage",
            value: LIFECYCLE_STAGE_DELETED,
        },
        "true for deleted runs",
    ),
    attribute(
        "active",
        AttributeKind::Flag {
            column: "status",
            value: STATUS_RUNNING,
        },
        "true for running runs",
    ),
    attribute(
        "creation_time",
        AttributeKind::Column("start_time"),
        "start time, epoch milliseconds",
    ),
    attribute(
        "created_at",
        AttributeKind::Column("start_time"),
        "alias of creation_time",
    ),
    attribute(
        "end_time",
        AttributeKind::Column("end_time"),
        "end time, epoch milliseconds",
    ),
    attribute(
        "finalized_at",
        AttributeKind::Column("end_time"),
        "alias of end_time",
    ),
    attribute("duration", AttributeKind::Duration, "run duration in seconds"),
    attribute(
        "metrics",
        AttributeKind::MetricSeries,
        "latest metric value: metrics[\"key\", {context}].last / .last_step / .first_step",
    ),
    attribute(
        "tags",
        AttributeKind::KeyValue(KeyValueTable::Tags),
        "tag value: tags[\"key\"] or tags.key",
    ),
    attribute(
        "params",
        AttributeKind::KeyValue(KeyValueTable::Params),
        "param value: params[\"key\"] or params.key",
    ),
];

static EXPERIMENT_ATTRIBUTES: &[AttributeDescriptor] = &[
    attribute("name", AttributeKind::Column("name"), "experiment name"),
    attribute(
        "archived",
        AttributeKind::Flag {
            column: "lifecycle_stage",
            value: LIFECYCLE_STAGE_DELETED,
        },
        "true for deleted experiments",
    ),
];

static METRIC_ATTRIBUTES: &[AttributeDescriptor] = &[
    attribute("name", AttributeKind::Column("key"), "metric key"),
    attribute("last", AttributeKind::Column("value"), "latest value"),
    attribute("last_step", AttributeKind::Column("last_iter"), "latest step"),
    attribute("first_step", AttributeKind::FirstStep, "first step, always 0"),
    attribute(
        "context",
        AttributeKind::Context,
        "context value: context.key or context[\"key\"]",
    ),
];

pub static ENTITIES: &[EntityDescriptor] = &[
    EntityDescriptor {
        name: "run",
        table_key: "runs",
        attributes: RUN_ATTRIBUTES,
    },
    EntityDescriptor {
        name: "experiment",
        table_key: "experiments",
        attributes: EXPERIMENT_ATTRIBUTES,
    },
    EntityDescriptor {
        name: "metric",
        table_key: "metrics",
        attributes: METRIC_ATTRIBUTES,
    },
];

pub fn entity(name: &str) -> Option<&'static EntityDescriptor> {
    ENTITIES.iter().find(|entity| entity.name == name)
}

/// What a metric series member such as `.last` resolves to.
pub fn metric_member(member: &str) -> Option<AttributeKind> {
    match member {
        "last" => Some(AttributeKind::Column("value")),
        "last_step" => Some(AttributeKind::Column("last_iter")),
        "first_step" => Some(AttributeKind::FirstStep),
        _ => None,
    }
}

/// Strip a JSON-path style `$.` prefix from a context key.
pub fn canonical_context_key(key: &str) -> &str {
    key.strip_prefix("$.").unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_attributes_resolve() {
        let run = entity("run").unwrap();
        assert_eq!(run.table_key, "runs");
        assert_eq!(
            run.attribute("hash").unwrap().kind,
            AttributeKind::Column("run_uuid")
        );
        assert!(run.attribute("status").is_none());
    }

    #[test]
    fn test_unknown_entity() {
        assert!(entity("runs").is_none());
        assert!(entity("re").is_none());
    }

    #[test]
    fn test_context_key_prefix() {
        assert_eq!(canonical_context_key("$.key1"), "key1");
        assert_eq!(canonical_context_key("key1"), "key1");
        assert_eq!(canonical_context_key("$key1"), "$key1");
    }
}
