// Renders query specs into NRQL text
use crate::domain::query::{QuerySpec, SelectItem, Source};

/// Attribute names outside `[A-Za-z0-9_.]` need backticks.
pub fn attribute(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "\\`"))
    }
}

pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn render(spec: &QuerySpec) -> String {
    let mut parts = Vec::with_capacity(7);

    let select: Vec<String> = spec.select.iter().map(render_select).collect();
    parts.push(format!("SELECT {}", select.join(", ")));

    match &spec.from {
        Source::Events(event_type) => parts.push(format!("FROM {}", attribute(event_type))),
        Source::Nested(inner) => parts.push(format!("FROM ({})", render(inner))),
    }

    if !spec.where_clauses.is_empty() {
        let clauses: Vec<String> = spec.where_clauses.iter().map(|c| group_clause(c)).collect();
        parts.push(format!("WHERE {}", clauses.join(" AND ")));
    }

    if !spec.facet_by.is_empty() {
        let facets: Vec<String> = spec.facet_by.iter().map(|f| attribute(f)).collect();
        parts.push(format!("FACET {}", facets.join(", ")));
    }

    if let Some(expression) = &spec.order_by {
        parts.push(format!("ORDER BY {} DESC", attribute(expression)));
    }

    parts.push(format!("LIMIT {}", spec.limit));

    if let Some(minutes) = spec.since_minutes {
        parts.push(format!("SINCE {} minutes ago", minutes));
    }

    parts.join(" ")
}

fn render_select(item: &SelectItem) -> String {
    let call = format!("{}({})", item.function.name(), attribute(&item.argument));
    let expression = if item.or_zero {
        format!("{} OR 0", call)
    } else {
        call
    };
    format!("{} AS {}", expression, string_literal(&item.alias))
}

/// Parenthesizes a disjunctive clause so it binds correctly under AND.
fn group_clause(clause: &str) -> String {
    let trimmed = clause.trim();
    if trimmed.to_ascii_uppercase().contains(" OR ") && !trimmed.starts_with('(') {
        format!("({})", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::AggregateFn;

    #[test]
    fn test_attribute_quoting() {
        assert_eq!(attribute("provider.clusterName"), "provider.clusterName");
        assert_eq!(attribute("aws.kafka.Topic"), "aws.kafka.Topic");
        assert_eq!(attribute("my-cluster tag"), "`my-cluster tag`");
    }

    #[test]
    fn test_string_literal_escapes_quotes() {
        assert_eq!(string_literal("o'brien"), "'o\\'brien'");
    }

    #[test]
    fn test_render_flat_query() {
        let spec = QuerySpec::from_events("AwsMskClusterSample")
            .select([SelectItem::of(AggregateFn::Latest, "provider.activeControllerCount.Sum")])
            .filter("accountId IN (1, 2)")
            .facet(["accountId".to_string(), "provider.clusterName".to_string()])
            .limit(100)
            .since_minutes(60);

        assert_eq!(
            render(&spec),
            "SELECT latest(provider.activeControllerCount.Sum) AS 'provider.activeControllerCount.Sum' \
             FROM AwsMskClusterSample WHERE accountId IN (1, 2) \
             FACET accountId, provider.clusterName LIMIT 100 SINCE 60 minutes ago"
        );
    }

    #[test]
    fn test_render_nested_query_with_zero_coercion() {
        let inner = QuerySpec::from_events("KafkaBrokerSample")
            .select([SelectItem::of(AggregateFn::Average, "broker.IOInPerSecond")])
            .facet(["clusterName".to_string(), "broker.id".to_string()]);
        let outer = QuerySpec::over(inner)
            .select([SelectItem::of(AggregateFn::Sum, "broker.IOInPerSecond").or_zero()])
            .facet(["clusterName".to_string()])
            .order_by_desc("broker.IOInPerSecond")
            .limit(10);

        assert_eq!(
            render(&outer),
            "SELECT sum(broker.IOInPerSecond) OR 0 AS 'broker.IOInPerSecond' \
             FROM (SELECT average(broker.IOInPerSecond) AS 'broker.IOInPerSecond' FROM KafkaBrokerSample \
             FACET clusterName, broker.id LIMIT 2000) \
             FACET clusterName ORDER BY broker.IOInPerSecond DESC LIMIT 10"
        );
    }

    #[test]
    fn test_disjunctions_are_grouped() {
        let spec = QuerySpec::from_events("Metric")
            .select([SelectItem::of(AggregateFn::Max, "x")])
            .filter("a = 1 OR b = 1")
            .filter("(c OR d) IN ('v')")
            .limit(1);
        assert_eq!(
            render(&spec),
            "SELECT max(x) AS 'x' FROM Metric WHERE (a = 1 OR b = 1) AND (c OR d) IN ('v') LIMIT 1"
        );
    }
}
