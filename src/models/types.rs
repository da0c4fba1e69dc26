//! Canonical categorical values
//!
//! Standardization maps free-form source text onto these closed sets. Each
//! value is stored in Arrow as its display label, so the enums serialize to and
//! from plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declare a closed set of labelled values with string (de)serialization
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every value, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The label stored in relations
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Parse a stored label (exact match)
            #[must_use]
            pub fn from_label(label: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.label() == label)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum! {
    /// Patient sex
    pub enum Sex {
        Male => "Male",
        Female => "Female",
        Unknown => "Unknown",
    }
}

labelled_enum! {
    /// Chest pain type
    pub enum ChestPainType {
        TypicalAngina => "Typical Angina",
        AtypicalAngina => "Atypical Angina",
        NonAnginalPain => "Non-Anginal Pain",
        Asymptomatic => "Asymptomatic",
        Unknown => "Unknown",
    }
}

labelled_enum! {
    /// Resting electrocardiographic result
    pub enum RestingEcg {
        Normal => "Normal",
        LvHypertrophy => "LV Hypertrophy",
        StTAbnormality => "ST-T Abnormality",
        Unknown => "Unknown",
    }
}

labelled_enum! {
    /// Slope of the peak exercise ST segment
    pub enum StSlope {
        Upsloping => "Upsloping",
        Flat => "Flat",
        Downsloping => "Downsloping",
        Unknown => "Unknown",
    }
}

labelled_enum! {
    /// Thalassemia result
    pub enum Thalassemia {
        Normal => "Normal",
        FixedDefect => "Fixed Defect",
        ReversibleDefect => "Reversible Defect",
        Unknown => "Unknown",
    }
}

labelled_enum! {
    /// Age bucket of a validated record
    pub enum AgeGroup {
        Under40 => "<40",
        Forties => "40-49",
        Fifties => "50-59",
        Sixties => "60-69",
        SeventyPlus => "70+",
        Unknown => "Unknown",
    }
}

impl AgeGroup {
    /// Bucket an age in years; null ages are `Unknown`
    #[must_use]
    pub const fn from_age(age: Option<i32>) -> Self {
        match age {
            None => Self::Unknown,
            Some(a) if a < 40 => Self::Under40,
            Some(a) if a < 50 => Self::Forties,
            Some(a) if a < 60 => Self::Fifties,
            Some(a) if a < 70 => Self::Sixties,
            Some(_) => Self::SeventyPlus,
        }
    }
}

impl From<Option<i32>> for AgeGroup {
    fn from(age: Option<i32>) -> Self {
        Self::from_age(age)
    }
}

labelled_enum! {
    /// Category of the maximum heart rate achieved
    pub enum HeartRateCategory {
        VeryHigh => "Very High",
        High => "High",
        Moderate => "Moderate",
        Low => "Low",
    }
}

impl HeartRateCategory {
    /// Categorize a maximum heart rate; anything below 140 (or null) is `Low`
    #[must_use]
    pub const fn from_rate(rate: Option<i32>) -> Self {
        match rate {
            Some(r) if r >= 180 => Self::VeryHigh,
            Some(r) if r >= 160 => Self::High,
            Some(r) if r >= 140 => Self::Moderate,
            _ => Self::Low,
        }
    }
}

impl From<Option<i32>> for HeartRateCategory {
    fn from(rate: Option<i32>) -> Self {
        Self::from_rate(rate)
    }
}

labelled_enum! {
    /// Heart disease severity as recorded by the diagnosis code
    pub enum SeverityLevel {
        NoDisease => "No Disease",
        Mild => "Mild",
        Moderate => "Moderate",
        Severe => "Severe",
        VerySevere => "Very Severe",
    }
}

impl SeverityLevel {
    /// Map a diagnosis code (0-4) to a severity level
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::NoDisease),
            1 => Some(Self::Mild),
            2 => Some(Self::Moderate),
            3 => Some(Self::Severe),
            4 => Some(Self::VerySevere),
            _ => None,
        }
    }
}
