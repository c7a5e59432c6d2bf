// tests/property_tests.rs

use std::collections::BTreeSet;

use proptest::prelude::*;
use runql::{QueryCompiler, QueryConfig, SqlValue};

fn compiler(dialect: &str) -> QueryCompiler {
    QueryCompiler::new(QueryConfig::new(dialect)).unwrap()
}

fn metric_reference() -> impl Strategy<Value = (String, Option<String>)> {
    (
        prop::sample::select(vec!["loss", "acc", "lr"]),
        prop::option::of(prop::sample::select(vec!["train", "val"])),
    )
        .prop_map(|(key, subset)| (key.to_string(), subset.map(str::to_string)))
}

fn render(reference: &(String, Option<String>)) -> String {
    match reference {
        (key, None) => format!("run.metrics['{key}'].last > 0"),
        (key, Some(subset)) => {
            format!(r#"run.metrics['{key}', {{"subset": "{subset}"}}].last > 0"#)
        }
    }
}

proptest! {
    #[test]
    fn prop_one_join_per_distinct_metric(references in prop::collection::vec(metric_reference(), 1..12)) {
        let query = references.iter().map(render).collect::<Vec<_>>().join(" or ");
        let compiled = compiler("postgres").compile(&query).unwrap();

        let distinct: BTreeSet<_> = references.iter().cloned().collect();
        let with_context = distinct.iter().filter(|(_, subset)| subset.is_some()).count();
        prop_assert_eq!(compiled.joins().len(), distinct.len() + with_context);

        for (index, join) in compiled.joins().iter().enumerate() {
            prop_assert!(join.alias.ends_with(&format!("_{index}")), "alias {}", join.alias);
        }
        let signatures: BTreeSet<_> = compiled.joins().iter().map(|j| j.signature.clone()).collect();
        prop_assert_eq!(signatures.len(), compiled.joins().len());
    }

    #[test]
    fn prop_default_adds_exactly_one_param(name in "[a-zA-Z0-9 _%;-]{0,24}") {
        let query = format!("run.name == '{name}'");
        let with_default = compiler("postgres").compile(&query).unwrap();
        let without = QueryCompiler::new(QueryConfig::new("postgres").with_default("", ""))
            .unwrap()
            .compile(&query)
            .unwrap();

        let params = with_default.params();
        prop_assert_eq!(params.len(), without.params().len() + 1);
        prop_assert_eq!(params.last(), Some(&SqlValue::from("deleted")));
        prop_assert_eq!(&params[0], &SqlValue::from(name.as_str()));
        prop_assert_eq!(
            with_default.where_sql(),
            Some(r#""runs"."name" = ? AND "runs"."lifecycle_stage" <> ?"#)
        );
    }

    #[test]
    fn prop_integer_literals_bind_as_integers(n in any::<i64>()) {
        let compiled = compiler("sqlite").compile(&format!("run.duration < {n}")).unwrap();
        prop_assert_eq!(&compiled.params()[0], &SqlValue::Integer(n));
    }

    #[test]
    fn prop_float_literals_bind_as_floats(x in -1.0e6f64..1.0e6) {
        let compiled = compiler("sqlite").compile(&format!("run.duration < {x:?}")).unwrap();
        prop_assert_eq!(&compiled.params()[0], &SqlValue::Float(x));
    }

    #[test]
    fn prop_dialects_bind_same_values(
        reference in metric_reference(),
        tag in "[a-z]{1,8}",
        value in "[a-z0-9]{0,8}",
        negate in any::<bool>(),
    ) {
        let mut query = format!("{} and run.tags['{tag}'] == '{value}' and re.search('{value}', run.name)", render(&reference));
        if negate {
            query = format!("not ({query})");
        }
        let postgres = compiler("postgres").compile(&query).unwrap();
        let sqlite = compiler("sqlite").compile(&query).unwrap();

        prop_assert_eq!(postgres.joins().len(), sqlite.joins().len());
        prop_assert_eq!(postgres.is_metric_selected(), sqlite.is_metric_selected());

        // JSON paths are the only dialect-specific parameter
        let strip_paths = |params: Vec<SqlValue>| -> Vec<SqlValue> {
            params
                .into_iter()
                .filter(|p| !matches!(p.as_str(), Some(s) if s.starts_with('{') || s.starts_with("$.")))
                .collect()
        };
        prop_assert_eq!(strip_paths(postgres.params()), strip_paths(sqlite.params()));
    }
}
