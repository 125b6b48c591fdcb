// src/process/table.rs

use indexmap::IndexMap;

use super::value::{Fields, Value};

/// What the row that creates a table contributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// The first row of a table only fixes its header; its values are not kept.
    #[default]
    HeaderOnly,
    /// The first row fixes the header and is also kept as the first data row.
    FirstRowIsData,
}

/// A named table: header fixed at creation, rows aligned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    fn new(name: String, header: Vec<String>) -> Self {
        Self {
            name,
            header,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as `(field, value)` pairs in header order.
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &Value)>> + '_ {
        self.rows.iter().map(move |row| {
            self.header
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect()
        })
    }

    // Header fields missing from `fields` become null; extra fields are dropped.
    fn push(&mut self, fields: &Fields) {
        let row = self
            .header
            .iter()
            .map(|name| fields.get(name).cloned().unwrap_or(Value::Null))
            .collect();
        self.rows.push(row);
    }
}

/// All tables of one query, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSet {
    policy: HeaderPolicy,
    tables: IndexMap<String, Table>,
}

impl TableSet {
    pub fn new(policy: HeaderPolicy) -> Self {
        Self {
            policy,
            tables: IndexMap::new(),
        }
    }

    /// Create `name` from `fields` on first sight, otherwise append one row.
    pub(crate) fn ensure(&mut self, name: String, fields: Fields) {
        if let Some(table) = self.tables.get_mut(&name) {
            table.push(&fields);
            return;
        }

        let header = fields.keys().cloned().collect();
        let mut table = Table::new(name.clone(), header);
        if self.policy == HeaderPolicy::FirstRowIsData {
            table.push(&fields);
        }
        self.tables.insert(name, table);
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

impl<'a> IntoIterator for &'a TableSet {
    type Item = &'a Table;
    type IntoIter = indexmap::map::Values<'a, String, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn first_sighting_only_sets_header() {
        let mut set = TableSet::default();
        set.ensure(
            "campaign".into(),
            fields(&[("id", 1.into()), ("name", "A".into())]),
        );

        let table = set.get("campaign").expect("table");
        assert_eq!(table.header(), ["id", "name"]);
        assert!(table.is_empty());
    }

    #[test]
    fn later_rows_align_to_header() {
        let mut set = TableSet::default();
        set.ensure(
            "campaign".into(),
            fields(&[("id", 1.into()), ("name", "A".into())]),
        );
        // reordered, with an extra field
        set.ensure(
            "campaign".into(),
            fields(&[("status", "PAUSED".into()), ("name", "B".into()), ("id", 2.into())]),
        );
        // missing `name`
        set.ensure("campaign".into(), fields(&[("id", 3.into())]));

        let table = set.get("campaign").expect("table");
        assert_eq!(table.header(), ["id", "name"]);
        assert_eq!(
            table.rows(),
            [
                vec![Value::from(2), Value::from("B")],
                vec![Value::from(3), Value::Null],
            ]
        );
    }

    #[test]
    fn first_row_is_data_keeps_every_row() {
        let mut set = TableSet::new(HeaderPolicy::FirstRowIsData);
        set.ensure("metrics".into(), fields(&[("clicks", 1.into())]));
        set.ensure("metrics".into(), fields(&[("clicks", 2.into())]));

        let table = set.get("metrics").expect("table");
        assert_eq!(table.rows(), [vec![Value::from(1)], vec![Value::from(2)]]);
    }

    #[test]
    fn tables_keep_first_seen_order() {
        let mut set = TableSet::default();
        for name in ["metrics", "campaign", "campaignBudget", "metrics"] {
            set.ensure(name.into(), fields(&[("x", 1.into())]));
        }
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["metrics", "campaign", "campaignBudget"]);
    }

    #[test]
    fn records_pair_fields_with_values() {
        let mut set = TableSet::new(HeaderPolicy::FirstRowIsData);
        set.ensure(
            "campaign".into(),
            fields(&[("id", 9.into()), ("name", "Z".into())]),
        );
        let table = set.get("campaign").expect("table");
        let records: Vec<_> = table.records().collect();
        assert_eq!(
            records,
            vec![vec![("id", &Value::from(9)), ("name", &Value::from("Z"))]]
        );
    }
}
