// User filter selection, already parsed by whoever persisted it
use super::provider::LogicalAttribute;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    InSet,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub attribute: LogicalAttribute,
    pub operator: FilterOperator,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub multiple: bool,
}

impl FilterSpec {
    #[cfg(test)]
    pub fn new(attribute: LogicalAttribute, operator: FilterOperator, values: Vec<String>) -> Self {
        let multiple = values.len() > 1;
        Self {
            attribute,
            operator,
            values,
            multiple,
        }
    }

    /// An empty filter is equivalent to no filter at all.
    pub fn is_active(&self) -> bool {
        !self.values.is_empty()
    }
}
