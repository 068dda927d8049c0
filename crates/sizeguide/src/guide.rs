//! Keyed store of per-size measurement rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use maison_core::{DomainError, DomainResult, ValidationError};

/// One row of the guide: a size plus its named measurements.
///
/// Rows hold values only for fields that were declared on the product and
/// actually filled in; a declared field with no value here renders blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeGuideRow {
    size: String,
    values: BTreeMap<String, String>,
}

impl SizeGuideRow {
    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}

/// The measurement table of one product.
///
/// Field names are product-scoped: declared once, applied to every row.
/// Declaring a field retroactively does not populate existing rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeGuide {
    fields: Vec<String>,
    rows: Vec<SizeGuideRow>,
}

impl SizeGuide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted parts, dropping row values for fields that
    /// are no longer declared.
    pub fn from_persisted(fields: Vec<String>, rows: Vec<(String, BTreeMap<String, String>)>) -> Self {
        let mut guide = Self {
            fields,
            rows: Vec::new(),
        };
        for (size, values) in rows {
            // Best-effort: skip rows an upstream bug may have duplicated.
            let _ = guide.upsert_row(&size, values, None);
        }
        guide
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[SizeGuideRow] {
        &self.rows
    }

    /// Declare a measurement field. Case-insensitive duplicates are rejected.
    pub fn add_field(&mut self, name: &str) -> DomainResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::empty("measurement field"));
        }
        if let Some(existing) = self.find_field(name) {
            return Err(ValidationError::DuplicateField(existing.to_string()).into());
        }
        self.fields.push(name.to_string());
        Ok(())
    }

    /// Undeclare a field and strip it from every row. Rows survive.
    /// Returns whether the field was declared.
    pub fn remove_field(&mut self, name: &str) -> bool {
        let Some(declared) = self.find_field(name).map(str::to_string) else {
            return false;
        };
        self.fields.retain(|f| *f != declared);
        for row in &mut self.rows {
            row.values.remove(&declared);
        }
        true
    }

    /// Add a row, or replace the one at `editing`.
    ///
    /// A new size colliding (case-insensitively) with an existing row is
    /// rejected as [`ValidationError::DuplicateSize`] unless `editing` points
    /// at that very row. Values for undeclared fields are dropped; blank
    /// values are dropped too (the row renders them blank either way).
    pub fn upsert_row(
        &mut self,
        size: &str,
        values: BTreeMap<String, String>,
        editing: Option<usize>,
    ) -> DomainResult<()> {
        let size = size.trim();
        if size.is_empty() {
            return Err(DomainError::empty("size"));
        }
        if let Some(index) = editing {
            if index >= self.rows.len() {
                return Err(DomainError::NotFound);
            }
        }
        let collision = self
            .rows
            .iter()
            .position(|row| row.size.eq_ignore_ascii_case(size));
        if let Some(at) = collision {
            if editing != Some(at) {
                return Err(ValidationError::DuplicateSize(self.rows[at].size.clone()).into());
            }
        }

        let mut kept = BTreeMap::new();
        for (field, value) in values {
            if value.trim().is_empty() {
                continue;
            }
            if let Some(declared) = self.find_field(&field) {
                kept.insert(declared.to_string(), value);
            }
        }
        let row = SizeGuideRow {
            size: size.to_string(),
            values: kept,
        };
        match editing {
            Some(index) => self.rows[index] = row,
            None => self.rows.push(row),
        }
        Ok(())
    }

    pub fn remove_row(&mut self, index: usize) -> DomainResult<SizeGuideRow> {
        if index >= self.rows.len() {
            return Err(DomainError::NotFound);
        }
        Ok(self.rows.remove(index))
    }

    fn find_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.eq_ignore_ascii_case(name.trim()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn duplicate_field_is_rejected_case_insensitively() {
        let mut guide = SizeGuide::new();
        guide.add_field("Chest").unwrap();
        let err = guide.add_field("chest").unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(ValidationError::DuplicateField("Chest".into()))
        );
    }

    #[test]
    fn case_variant_size_is_a_duplicate() {
        // Scenario: rows for "S" and "M" exist; adding "s" must fail.
        let mut guide = SizeGuide::new();
        guide.upsert_row("S", BTreeMap::new(), None).unwrap();
        guide.upsert_row("M", BTreeMap::new(), None).unwrap();

        let err = guide.upsert_row("s", BTreeMap::new(), None).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(ValidationError::DuplicateSize("S".into()))
        );
    }

    #[test]
    fn editing_a_row_may_keep_its_own_size() {
        let mut guide = SizeGuide::new();
        guide.add_field("Chest").unwrap();
        guide.upsert_row("S", BTreeMap::new(), None).unwrap();

        guide
            .upsert_row("s", values(&[("Chest", "86")]), Some(0))
            .unwrap();
        assert_eq!(guide.rows().len(), 1);
        assert_eq!(guide.rows()[0].size(), "s");
        assert_eq!(guide.rows()[0].value("Chest"), Some("86"));
    }

    #[test]
    fn editing_a_row_onto_another_rows_size_is_rejected() {
        let mut guide = SizeGuide::new();
        guide.upsert_row("S", BTreeMap::new(), None).unwrap();
        guide.upsert_row("M", BTreeMap::new(), None).unwrap();

        let err = guide.upsert_row("S", BTreeMap::new(), Some(1)).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation(ValidationError::DuplicateSize("S".into()))
        );
    }

    #[test]
    fn new_field_leaves_existing_rows_blank() {
        let mut guide = SizeGuide::new();
        guide.add_field("Chest").unwrap();
        guide.upsert_row("S", values(&[("Chest", "86")]), None).unwrap();

        guide.add_field("Waist").unwrap();
        assert_eq!(guide.rows()[0].value("Waist"), None);
        assert_eq!(guide.rows()[0].value("Chest"), Some("86"));
    }

    #[test]
    fn undeclared_and_blank_values_are_dropped() {
        let mut guide = SizeGuide::new();
        guide.add_field("Chest").unwrap();
        guide
            .upsert_row("S", values(&[("Chest", "86"), ("Hips", "90"), ("chest", "")]), None)
            .unwrap();
        // "chest" (blank) lost to the non-blank entry; "Hips" undeclared.
        assert_eq!(guide.rows()[0].values().len(), 1);
        assert_eq!(guide.rows()[0].value("Chest"), Some("86"));
    }

    #[test]
    fn values_match_declared_field_spelling() {
        let mut guide = SizeGuide::new();
        guide.add_field("Chest").unwrap();
        guide
            .upsert_row("S", values(&[("CHEST", "86")]), None)
            .unwrap();
        assert_eq!(guide.rows()[0].value("Chest"), Some("86"));
    }

    #[test]
    fn removing_a_field_strips_it_from_every_row() {
        let mut guide = SizeGuide::new();
        guide.add_field("Chest").unwrap();
        guide.add_field("Waist").unwrap();
        guide
            .upsert_row("S", values(&[("Chest", "86"), ("Waist", "70")]), None)
            .unwrap();
        guide
            .upsert_row("M", values(&[("Chest", "90")]), None)
            .unwrap();

        assert!(guide.remove_field("chest"));
        assert_eq!(guide.fields(), ["Waist"]);
        assert_eq!(guide.rows().len(), 2);
        assert_eq!(guide.rows()[0].value("Chest"), None);
        assert_eq!(guide.rows()[0].value("Waist"), Some("70"));
        assert!(!guide.remove_field("Chest"));
    }

    #[test]
    fn remove_row_out_of_range_is_not_found() {
        let mut guide = SizeGuide::new();
        assert_eq!(guide.remove_row(0).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn blank_inputs_are_rejected() {
        let mut guide = SizeGuide::new();
        assert!(guide.add_field("  ").is_err());
        assert!(guide.upsert_row("", BTreeMap::new(), None).is_err());
    }

    #[test]
    fn hydration_drops_duplicate_rows() {
        let guide = SizeGuide::from_persisted(
            vec!["Chest".into()],
            vec![
                ("S".into(), values(&[("Chest", "86")])),
                ("s".into(), values(&[("Chest", "99")])),
            ],
        );
        assert_eq!(guide.rows().len(), 1);
        assert_eq!(guide.rows()[0].value("Chest"), Some("86"));
    }
}
