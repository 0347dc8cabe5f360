use chrono::{DateTime, Utc};

use super::{Document, ProjectStatus};

/// Fields a client document is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FirstName,
    LastName,
    Status,
    TotalAmount,
    ConstructionDays,
    CreatedAt,
}

impl Field {
    pub fn key(&self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Status => "status",
            Field::TotalAmount => "totalAmount",
            Field::ConstructionDays => "constructionDays",
            Field::CreatedAt => "createdAt",
        }
    }
}

/// Values substituted for missing or unusable fields.
#[derive(Debug, Clone, Copy)]
pub struct RecordDefaults {
    pub construction_days: i64,
    pub now: DateTime<Utc>,
}

/// A client document after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub status: ProjectStatus,
    pub total_amount: f64,
    pub construction_days: i64,
    pub created_at: DateTime<Utc>,
}

impl ClientRecord {
    /// Validate a raw document, substituting defaults for absent fields.
    ///
    /// Returns the record along with the fields that had to be defaulted.
    /// `constructionDays` counts whole days: fractions are truncated towards
    /// zero, so `10.7` becomes 10 and `0.5` counts as zero. A zero duration is
    /// treated like an absent one; negative values are kept so the duration
    /// policy can decide about them.
    pub fn from_document(doc: &Document, defaults: &RecordDefaults) -> (Self, Vec<Field>) {
        let mut defaulted = Vec::new();

        let mut text = |field: Field| match doc.str_field(field.key()) {
            Some(value) => value.to_string(),
            None => {
                defaulted.push(field);
                String::new()
            }
        };
        let first_name = text(Field::FirstName);
        let last_name = text(Field::LastName);

        let status = match doc.str_field(Field::Status.key()) {
            Some(raw) => ProjectStatus::parse(raw),
            None => {
                defaulted.push(Field::Status);
                ProjectStatus::Unknown(String::new())
            }
        };

        let total_amount = doc
            .number_field(Field::TotalAmount.key())
            .unwrap_or_else(|| {
                defaulted.push(Field::TotalAmount);
                0.0
            });

        let construction_days = match doc.number_field(Field::ConstructionDays.key()) {
            Some(days) if days.trunc() != 0.0 => days.trunc() as i64,
            _ => {
                defaulted.push(Field::ConstructionDays);
                defaults.construction_days
            }
        };

        let created_at = doc
            .timestamp_field(Field::CreatedAt.key())
            .unwrap_or_else(|| {
                defaulted.push(Field::CreatedAt);
                defaults.now
            });

        let record = Self {
            id: doc.id.clone(),
            first_name,
            last_name,
            status,
            total_amount,
            construction_days,
            created_at,
        };
        (record, defaulted)
    }

    /// Display name, family name first.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn defaults() -> RecordDefaults {
        RecordDefaults {
            construction_days: 45,
            now: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn complete_document_needs_no_defaults() {
        let doc = Document::from_value(
            "c1",
            json!({
                "firstName": "Алия",
                "lastName": "Ким",
                "status": "building",
                "totalAmount": 1_500_000,
                "constructionDays": 60,
                "createdAt": "2024-01-01T00:00:00Z",
            }),
        );
        let (record, defaulted) = ClientRecord::from_document(&doc, &defaults());
        assert!(defaulted.is_empty());
        assert_eq!(record.full_name(), "Ким Алия");
        assert_eq!(record.status, ProjectStatus::Building);
        assert_eq!(record.total_amount, 1_500_000.0);
        assert_eq!(record.construction_days, 60);
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_document_falls_back_to_documented_defaults() {
        let doc = Document::from_value("c2", json!({}));
        let (record, defaulted) = ClientRecord::from_document(&doc, &defaults());

        assert_eq!(record.first_name, "");
        assert_eq!(record.last_name, "");
        assert_eq!(record.status, ProjectStatus::Unknown(String::new()));
        assert_eq!(record.total_amount, 0.0);
        assert_eq!(record.construction_days, 45);
        assert_eq!(record.created_at, defaults().now);
        assert_eq!(
            defaulted,
            vec![
                Field::FirstName,
                Field::LastName,
                Field::Status,
                Field::TotalAmount,
                Field::ConstructionDays,
                Field::CreatedAt,
            ]
        );
    }

    #[test]
    fn zero_duration_uses_default_but_negative_is_kept() {
        let zero = Document::from_value("z", json!({ "constructionDays": 0 }));
        let (record, defaulted) = ClientRecord::from_document(&zero, &defaults());
        assert_eq!(record.construction_days, 45);
        assert!(defaulted.contains(&Field::ConstructionDays));

        let negative = Document::from_value("n", json!({ "constructionDays": -10 }));
        let (record, defaulted) = ClientRecord::from_document(&negative, &defaults());
        assert_eq!(record.construction_days, -10);
        assert!(!defaulted.contains(&Field::ConstructionDays));
    }

    #[test]
    fn fractional_duration_is_truncated_to_whole_days() {
        let fractional = Document::from_value("f", json!({ "constructionDays": 10.7 }));
        let (record, defaulted) = ClientRecord::from_document(&fractional, &defaults());
        assert_eq!(record.construction_days, 10);
        assert!(!defaulted.contains(&Field::ConstructionDays));

        let below_one = Document::from_value("h", json!({ "constructionDays": 0.5 }));
        let (record, defaulted) = ClientRecord::from_document(&below_one, &defaults());
        assert_eq!(record.construction_days, 45);
        assert!(defaulted.contains(&Field::ConstructionDays));
    }

    #[test]
    fn unknown_status_is_preserved_verbatim() {
        let doc = Document::from_value("u", json!({ "status": "unknown_value" }));
        let (record, defaulted) = ClientRecord::from_document(&doc, &defaults());
        assert_eq!(record.status, ProjectStatus::Unknown("unknown_value".to_string()));
        assert!(!defaulted.contains(&Field::Status));
    }
}
