use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a wire string does not name a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnumValue {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RiskDomain {
    Vte => "vte",
    Hyperkalemia => "hyperkalemia",
    Polycythemia => "polycythemia",
    Hepatotoxicity => "hepatotoxicity",
    Metabolic => "metabolic",
    Psychiatric => "psychiatric",
    Meningioma => "meningioma",
    SleepApnea => "sleep_apnea",
});

// Declared least to most severe so the derived `Ord` reads `Info < Warning < Critical`.
str_enum!(AlertLevel {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(TransitionMode {
    Mtf => "mtf",
    Ftm => "ftm",
});

str_enum!(EducationKind {
    DrugMonitoring => "drug_monitoring",
    DrugEducation => "drug_education",
});

str_enum!(MedicationChangeKind {
    New => "new",
    Increased => "increased",
});

impl AlertLevel {
    /// Display rank: critical first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Warning => 1,
            Self::Info => 2,
        }
    }
}

impl Default for TransitionMode {
    fn default() -> Self {
        Self::Mtf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_domain_round_trips_through_wire_name() {
        for domain in RiskDomain::ALL {
            let parsed: RiskDomain = domain.as_str().parse().unwrap();
            assert_eq!(parsed, *domain);
        }
        assert_eq!(RiskDomain::ALL.len(), 8);
    }

    #[test]
    fn risk_domain_serializes_snake_case() {
        let json = serde_json::to_string(&RiskDomain::SleepApnea).unwrap();
        assert_eq!(json, "\"sleep_apnea\"");
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = "martian".parse::<TransitionMode>().unwrap_err();
        assert_eq!(err.field, "TransitionMode");
        assert_eq!(err.value, "martian");
    }

    #[test]
    fn alert_level_ordering() {
        assert!(AlertLevel::Critical > AlertLevel::Warning);
        assert!(AlertLevel::Warning > AlertLevel::Info);
        assert!(AlertLevel::Critical.rank() < AlertLevel::Info.rank());
    }

    #[test]
    fn domain_works_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(RiskDomain::Vte, 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"vte":1}"#);
        let back: std::collections::BTreeMap<RiskDomain, i32> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&RiskDomain::Vte), Some(&1));
    }
}
