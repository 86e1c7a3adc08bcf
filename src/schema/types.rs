/// Classifier mapping a numeric natural-key value to a fixed bucket label.
pub type Classifier = fn(f64) -> &'static str;

/// SQLite column affinity for a natural-key column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColType {
    Integer,
    Real,
    Text,
}

impl ColType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColType::Integer => "INTEGER",
            ColType::Real => "REAL",
            ColType::Text => "TEXT",
        }
    }
}

/// Derived label column attached to a binned axis.
#[derive(Clone, Copy)]
pub struct Label {
    /// Label column name in the dimension table
    pub column: &'static str,
    /// Natural-key column whose value feeds the classifier
    pub source: &'static str,
    pub classify: Classifier,
}

/// One axis of the star schema.
///
/// The Dimension Builder and Fact Assembler iterate these descriptors
/// uniformly; no axis has bespoke build or join code (the calendar axis
/// only adds derived date-part columns on top of the common path).
#[derive(Clone, Copy)]
pub struct Dimension {
    /// Dimension table name (e.g. "dim_mass_category")
    pub table: &'static str,
    /// Surrogate key column, also the foreign key column in the fact table
    pub key_column: &'static str,
    /// Natural key column(s) in the source relation
    pub natural_keys: &'static [&'static str],
    /// Declared affinity per natural key column
    pub natural_types: &'static [ColType],
    pub label: Option<Label>,
    /// Calendar axis: natural key is a release-date string, expanded into
    /// date-part columns (year, month, month_name, day, weekday_name)
    pub calendar: bool,
}

impl Dimension {
    /// Index of the label's source column within `natural_keys`.
    pub fn label_source_index(&self) -> Option<usize> {
        let label = self.label?;
        self.natural_keys.iter().position(|c| *c == label.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type() {
        assert_eq!(ColType::Integer.sql_type(), "INTEGER");
        assert_eq!(ColType::Real.sql_type(), "REAL");
        assert_eq!(ColType::Text.sql_type(), "TEXT");
    }
}
