use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Unit assumed when a medication record omits one.
pub const DEFAULT_DOSE_UNIT: &str = "mg";

// ---------------------------------------------------------------------------
// Snapshot: one measurement as written by the measurement store
// ---------------------------------------------------------------------------

/// A point-in-time health record.
///
/// Numeric fields accept numbers or numeric strings. Anything else, like a
/// `null` list or a numeric date, reads as absent or empty rather than
/// failing the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient_number")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub waist: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub hips: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub neck: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub body_fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub estrogen_level: Option<f64>,
    /// Older key for the estrogen level; `estrogen_level` wins when both are set.
    #[serde(default, deserialize_with = "lenient_number")]
    pub estradiol: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub testosterone_level: Option<f64>,
    /// Older key for the testosterone level.
    #[serde(default, deserialize_with = "lenient_number")]
    pub testosterone: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub libido: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub medications: Vec<MedicationEntry>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub symptoms: Vec<SymptomEntry>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
}

impl Snapshot {
    /// Whether the snapshot carries a non-blank date.
    pub fn has_date(&self) -> bool {
        self.date.as_deref().is_some_and(|d| !d.trim().is_empty())
    }

    pub fn estrogen(&self) -> Option<f64> {
        self.estrogen_level.or(self.estradiol)
    }

    pub fn testosterone(&self) -> Option<f64> {
        self.testosterone_level.or(self.testosterone)
    }

    /// Calendar day of the measurement, when the date parses.
    /// Accepts `YYYY-MM-DD` or any RFC 3339 timestamp.
    pub fn measured_on(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    }
}

// ---------------------------------------------------------------------------
// Raw input shapes
// ---------------------------------------------------------------------------

/// A medication as it arrives: bare id or structured record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MedicationEntry {
    Id(String),
    Record(MedicationRecord),
    /// Any other JSON shape. Dropped during normalization.
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub medication_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub dose: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub dosage: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// A symptom as it arrives: bare id or structured record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SymptomEntry {
    Id(String),
    Record(SymptomRecord),
    /// Any other JSON shape. Dropped during normalization.
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SymptomRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub symptom_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub severity: Option<f64>,
}

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationIntake {
    pub id: String,
    pub dose: Option<f64>,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomReport {
    pub id: String,
    /// 1..=5, 3 is neutral.
    pub severity: f64,
}

pub const MIN_SEVERITY: f64 = 1.0;
pub const MAX_SEVERITY: f64 = 5.0;

impl MedicationEntry {
    /// Canonical form, or `None` when no id can be resolved.
    pub fn normalize(&self) -> Option<MedicationIntake> {
        match self {
            Self::Id(id) => non_blank(Some(id)).map(|id| MedicationIntake {
                id,
                dose: None,
                unit: DEFAULT_DOSE_UNIT.to_string(),
            }),
            Self::Record(record) => {
                let id = non_blank(record.id.as_ref())
                    .or_else(|| non_blank(record.medication_id.as_ref()))?;
                Some(MedicationIntake {
                    id,
                    dose: record.dose.or(record.dosage),
                    unit: non_blank(record.unit.as_ref())
                        .unwrap_or_else(|| DEFAULT_DOSE_UNIT.to_string()),
                })
            }
            Self::Unrecognized(_) => None,
        }
    }
}

impl SymptomEntry {
    /// Canonical form, or `None` when no id can be resolved.
    /// Missing, zero or non-finite severities take `default_severity`.
    pub fn normalize(&self, default_severity: f64) -> Option<SymptomReport> {
        match self {
            Self::Id(id) => non_blank(Some(id)).map(|id| SymptomReport {
                id,
                severity: default_severity,
            }),
            Self::Record(record) => {
                let id = non_blank(record.id.as_ref())
                    .or_else(|| non_blank(record.symptom_id.as_ref()))?;
                let severity = match record.severity {
                    Some(s) if s.is_finite() && s != 0.0 => s.clamp(MIN_SEVERITY, MAX_SEVERITY),
                    _ => default_severity,
                };
                Some(SymptomReport { id, severity })
            }
            Self::Unrecognized(_) => None,
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accept a JSON number or numeric string; everything else is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(serde_json::Value::String(s)) => {
            s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    })
}

/// A JSON array, or empty for `null` and any other shape.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(items @ serde_json::Value::Array(_)) => {
            serde_json::from_value(items).unwrap_or_default()
        }
        _ => Vec::new(),
    })
}

/// A JSON string; everything else is `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_medication_shapes() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "medications": [
                    "spironolactone",
                    {"id": "estradiol_valerate", "dose": 4},
                    {"medicationId": "bicalutamide", "dosage": "50", "unit": "mg"},
                    {"dose": 10},
                    42
                ]
            }"#,
        )
        .unwrap();

        let meds: Vec<_> = snapshot
            .medications
            .iter()
            .filter_map(MedicationEntry::normalize)
            .collect();

        assert_eq!(meds.len(), 3);
        assert_eq!(meds[0].id, "spironolactone");
        assert_eq!(meds[0].dose, None);
        assert_eq!(meds[0].unit, "mg");
        assert_eq!(meds[1].dose, Some(4.0));
        assert_eq!(meds[2].id, "bicalutamide");
        assert_eq!(meds[2].dose, Some(50.0));
    }

    #[test]
    fn blank_ids_are_dropped() {
        assert!(MedicationEntry::Id("  ".into()).normalize().is_none());
        let record = SymptomEntry::Record(SymptomRecord {
            id: Some(String::new()),
            symptom_id: None,
            severity: Some(4.0),
        });
        assert!(record.normalize(3.0).is_none());
    }

    #[test]
    fn symptom_severity_defaults_and_clamps() {
        let bare = SymptomEntry::Id("headache".into()).normalize(3.0).unwrap();
        assert_eq!(bare.severity, 3.0);

        let zero: SymptomEntry =
            serde_json::from_str(r#"{"id": "headache", "severity": 0}"#).unwrap();
        assert_eq!(zero.normalize(3.0).unwrap().severity, 3.0);

        let junk: SymptomEntry =
            serde_json::from_str(r#"{"symptomId": "headache", "severity": "bad"}"#).unwrap();
        let junk = junk.normalize(3.0).unwrap();
        assert_eq!(junk.id, "headache");
        assert_eq!(junk.severity, 3.0);

        let high: SymptomEntry =
            serde_json::from_str(r#"{"id": "headache", "severity": 9}"#).unwrap();
        assert_eq!(high.normalize(3.0).unwrap().severity, 5.0);
    }

    #[test]
    fn hormone_aliases_and_string_numbers() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"estradiol": 120, "testosterone": "35.5", "weight": "n/a", "date": "2026-03-01"}"#,
        )
        .unwrap();
        assert_eq!(snapshot.estrogen(), Some(120.0));
        assert_eq!(snapshot.testosterone(), Some(35.5));
        assert_eq!(snapshot.weight, None);
        assert!(snapshot.has_date());
    }

    #[test]
    fn canonical_hormone_key_wins_over_older_key() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"estrogenLevel": 150, "estradiol": 90,
                "testosteroneLevel": "20", "testosterone": 600}"#,
        )
        .unwrap();
        assert_eq!(snapshot.estrogen(), Some(150.0));
        assert_eq!(snapshot.testosterone(), Some(20.0));

        let only_old: Snapshot =
            serde_json::from_str(r#"{"estrogenLevel": null, "estradiol": 90}"#).unwrap();
        assert_eq!(only_old.estrogen(), Some(90.0));
    }

    #[test]
    fn null_lists_read_as_empty() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"weight": 70, "medications": null, "symptoms": null}"#,
        )
        .unwrap();
        assert!(snapshot.medications.is_empty());
        assert!(snapshot.symptoms.is_empty());
        assert_eq!(snapshot.weight, Some(70.0));

        let odd: Snapshot =
            serde_json::from_str(r#"{"medications": "spironolactone", "symptoms": {}}"#).unwrap();
        assert!(odd.medications.is_empty());
        assert!(odd.symptoms.is_empty());
    }

    #[test]
    fn non_string_date_reads_as_absent() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"date": 20260101, "weight": 70}"#).unwrap();
        assert_eq!(snapshot.date, None);
        assert!(!snapshot.has_date());
        assert_eq!(snapshot.weight, Some(70.0));
    }

    #[test]
    fn measured_on_accepts_date_and_timestamp() {
        let mut snapshot = Snapshot {
            date: Some("2026-03-01".into()),
            ..Default::default()
        };
        assert_eq!(snapshot.measured_on(), NaiveDate::from_ymd_opt(2026, 3, 1));

        snapshot.date = Some("2026-03-01T08:30:00+09:00".into());
        assert_eq!(snapshot.measured_on(), NaiveDate::from_ymd_opt(2026, 3, 1));

        snapshot.date = Some("last tuesday".into());
        assert_eq!(snapshot.measured_on(), None);
        assert!(snapshot.has_date());
    }
}
