// Query domain model - semantic description of a backend aggregation query
use super::provider::{EntityType, GroupBy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Upper bound on `LIMIT`, regardless of provider.
pub const MAX_QUERY_LIMIT: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationMode {
    /// Per-entity health metrics; absent values stay absent.
    Health,
    /// Throughput rates; unreported values display as zero.
    Throughput,
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMode::Health => f.write_str("health"),
            AggregationMode::Throughput => f.write_str("throughput"),
        }
    }
}

/// Lookup key for a registered query template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub entity_type: EntityType,
    pub mode: AggregationMode,
    pub group_by: Option<GroupBy>,
}

impl TemplateKey {
    pub fn new(entity_type: EntityType, mode: AggregationMode, group_by: Option<GroupBy>) -> Self {
        Self {
            entity_type,
            mode,
            group_by,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Latest,
    Average,
    Sum,
    Max,
}

impl AggregateFn {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFn::Latest => "latest",
            AggregateFn::Average => "average",
            AggregateFn::Sum => "sum",
            AggregateFn::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub function: AggregateFn,
    pub argument: String,
    pub alias: String,
    /// Render as `... OR 0` so unreported values display as zero.
    pub or_zero: bool,
}

impl SelectItem {
    /// Aggregates an attribute and keeps the attribute name as the output alias.
    pub fn of(function: AggregateFn, attribute: &str) -> Self {
        Self {
            function,
            argument: attribute.to_string(),
            alias: attribute.to_string(),
            or_zero: false,
        }
    }

    pub fn or_zero(mut self) -> Self {
        self.or_zero = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Events(String),
    Nested(Box<QuerySpec>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub select: Vec<SelectItem>,
    pub from: Source,
    pub where_clauses: Vec<String>,
    pub facet_by: Vec<String>,
    /// Sorted descending, largest first.
    pub order_by: Option<String>,
    pub limit: u32,
    pub since_minutes: Option<u32>,
}

impl QuerySpec {
    pub fn from_events(event_type: &str) -> Self {
        Self::with_source(Source::Events(event_type.to_string()))
    }

    /// Outer query re-aggregating the rows of `inner`.
    pub fn over(inner: QuerySpec) -> Self {
        Self::with_source(Source::Nested(Box::new(inner)))
    }

    fn with_source(from: Source) -> Self {
        Self {
            select: Vec::new(),
            from,
            where_clauses: Vec::new(),
            facet_by: Vec::new(),
            order_by: None,
            limit: MAX_QUERY_LIMIT,
            since_minutes: None,
        }
    }

    pub fn select(mut self, items: impl IntoIterator<Item = SelectItem>) -> Self {
        self.select.extend(items);
        self
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.where_clauses.push(clause.into());
        self
    }

    pub fn facet(mut self, attributes: impl IntoIterator<Item = String>) -> Self {
        for attribute in attributes {
            if !self.facet_by.contains(&attribute) {
                self.facet_by.push(attribute);
            }
        }
        self
    }

    pub fn order_by_desc(mut self, expression: &str) -> Self {
        self.order_by = Some(expression.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_QUERY_LIMIT);
        self
    }

    pub fn since_minutes(mut self, minutes: u32) -> Self {
        self.since_minutes = Some(minutes);
        self
    }

    /// Adds a predicate to the query that reads raw samples.
    pub fn filter_innermost(self, clause: impl Into<String>) -> Self {
        match self.from {
            Source::Nested(inner) => Self {
                from: Source::Nested(Box::new(inner.filter_innermost(clause))),
                ..self
            },
            Source::Events(_) => self.filter(clause),
        }
    }

    #[cfg(test)]
    pub fn innermost(&self) -> &QuerySpec {
        match &self.from {
            Source::Nested(inner) => inner.innermost(),
            Source::Events(_) => self,
        }
    }

    /// Checks that every outer reference resolves to an inner alias or facet.
    pub fn unresolved_references(&self) -> Vec<String> {
        let Source::Nested(inner) = &self.from else {
            return Vec::new();
        };

        let produced: HashSet<&str> = inner
            .select
            .iter()
            .map(|s| s.alias.as_str())
            .chain(inner.facet_by.iter().map(String::as_str))
            .collect();

        let mut missing: Vec<String> = self
            .select
            .iter()
            .map(|s| &s.argument)
            .chain(self.facet_by.iter())
            .filter(|name| !produced.contains(name.as_str()))
            .cloned()
            .collect();
        missing.extend(inner.unresolved_references());
        missing
    }
}
