use serde::{Deserialize, Serialize};

/// Whether a raw field is used as a number or expanded into indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numerical,
    Categorical,
}

/// Static description of one raw input column
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    /// JSON key as it appears in the training data
    pub key: &'static str,

    /// How the normalizer treats the field
    pub kind: FieldKind,

    /// Human-readable description
    pub description: &'static str,

    /// Value used in the documented example payload
    pub example: f64,
}

/// Raw input columns, in training-data order.
///
/// The double spaces in some keys come from the source dataset; column name
/// normalization collapses them.
pub const RAW_FIELDS: [FieldSpec; 13] = [
    FieldSpec {
        key: "Call  Failure",
        kind: FieldKind::Numerical,
        description: "Number of call failures",
        example: 8.0,
    },
    FieldSpec {
        key: "Complains",
        kind: FieldKind::Categorical,
        description: "Whether the customer has complained (0: no, 1: yes)",
        example: 0.0,
    },
    FieldSpec {
        key: "Subscription  Length",
        kind: FieldKind::Numerical,
        description: "Total months of subscription",
        example: 38.0,
    },
    FieldSpec {
        key: "Charge  Amount",
        kind: FieldKind::Numerical,
        description: "Charge bracket (0: lowest, 9: highest)",
        example: 0.0,
    },
    FieldSpec {
        key: "Seconds of Use",
        kind: FieldKind::Numerical,
        description: "Total seconds of calls",
        example: 4370.0,
    },
    FieldSpec {
        key: "Frequency of use",
        kind: FieldKind::Numerical,
        description: "Total number of calls",
        example: 71.0,
    },
    FieldSpec {
        key: "Frequency of SMS",
        kind: FieldKind::Numerical,
        description: "Total number of text messages",
        example: 5.0,
    },
    FieldSpec {
        key: "Distinct Called Numbers",
        kind: FieldKind::Numerical,
        description: "Total number of distinct phone numbers called",
        example: 17.0,
    },
    FieldSpec {
        key: "Age Group",
        kind: FieldKind::Numerical,
        description: "Age bracket (1: youngest, 5: oldest)",
        example: 3.0,
    },
    FieldSpec {
        key: "Tariff Plan",
        kind: FieldKind::Categorical,
        description: "Tariff plan (1: pay as you go, 2: contractual)",
        example: 1.0,
    },
    FieldSpec {
        key: "Status",
        kind: FieldKind::Categorical,
        description: "Account status (1: active, 2: non-active)",
        example: 1.0,
    },
    FieldSpec {
        key: "Age",
        kind: FieldKind::Numerical,
        description: "Customer age in years",
        example: 30.0,
    },
    FieldSpec {
        key: "Customer Value",
        kind: FieldKind::Numerical,
        description: "Calculated value of the customer",
        example: 197.64,
    },
];

/// One customer as posted to the prediction endpoint.
///
/// Every field is optional: a missing field is filled with zero during
/// normalization instead of rejecting the payload. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "Call  Failure", alias = "Call Failure", default)]
    pub call_failure: Option<f64>,

    #[serde(rename = "Complains", default)]
    pub complains: Option<f64>,

    #[serde(rename = "Subscription  Length", alias = "Subscription Length", default)]
    pub subscription_length: Option<f64>,

    #[serde(rename = "Charge  Amount", alias = "Charge Amount", default)]
    pub charge_amount: Option<f64>,

    #[serde(rename = "Seconds of Use", default)]
    pub seconds_of_use: Option<f64>,

    #[serde(rename = "Frequency of use", default)]
    pub frequency_of_use: Option<f64>,

    #[serde(rename = "Frequency of SMS", default)]
    pub frequency_of_sms: Option<f64>,

    #[serde(rename = "Distinct Called Numbers", default)]
    pub distinct_called_numbers: Option<f64>,

    #[serde(rename = "Age Group", default)]
    pub age_group: Option<f64>,

    #[serde(rename = "Tariff Plan", default)]
    pub tariff_plan: Option<f64>,

    #[serde(rename = "Status", default)]
    pub status: Option<f64>,

    #[serde(rename = "Age", default)]
    pub age: Option<f64>,

    #[serde(rename = "Customer Value", default)]
    pub customer_value: Option<f64>,
}

impl CustomerRecord {
    /// Field values in `RAW_FIELDS` order
    pub fn values(&self) -> [Option<f64>; 13] {
        [
            self.call_failure,
            self.complains,
            self.subscription_length,
            self.charge_amount,
            self.seconds_of_use,
            self.frequency_of_use,
            self.frequency_of_sms,
            self.distinct_called_numbers,
            self.age_group,
            self.tariff_plan,
            self.status,
            self.age,
            self.customer_value,
        ]
    }

    /// Number of fields present in the payload
    pub fn present_fields(&self) -> usize {
        self.values().iter().filter(|v| v.is_some()).count()
    }

    /// The documented example customer
    pub fn example() -> Self {
        let value = |i: usize| Some(RAW_FIELDS[i].example);
        Self {
            call_failure: value(0),
            complains: value(1),
            subscription_length: value(2),
            charge_amount: value(3),
            seconds_of_use: value(4),
            frequency_of_use: value(5),
            frequency_of_sms: value(6),
            distinct_called_numbers: value(7),
            age_group: value(8),
            tariff_plan: value(9),
            status: value(10),
            age: value(11),
            customer_value: value(12),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_training_keys() {
        let record: CustomerRecord = serde_json::from_value(json!({
            "Call  Failure": 8,
            "Complains": 0,
            "Subscription  Length": 38,
            "Tariff Plan": 1,
            "Customer Value": 197.64
        }))
        .unwrap();

        assert_eq!(record.call_failure, Some(8.0));
        assert_eq!(record.subscription_length, Some(38.0));
        assert_eq!(record.customer_value, Some(197.64));
        assert_eq!(record.status, None);
        assert_eq!(record.present_fields(), 5);
    }

    #[test]
    fn test_single_space_aliases() {
        let record: CustomerRecord = serde_json::from_value(json!({
            "Call Failure": 3,
            "Subscription Length": 12,
            "Charge Amount": 2
        }))
        .unwrap();

        assert_eq!(record.call_failure, Some(3.0));
        assert_eq!(record.subscription_length, Some(12.0));
        assert_eq!(record.charge_amount, Some(2.0));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let record: CustomerRecord =
            serde_json::from_value(json!({ "Age": 25, "Churn": 1, "Nickname": "x" })).unwrap();
        assert_eq!(record.age, Some(25.0));
        assert_eq!(record.present_fields(), 1);
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let result: Result<CustomerRecord, _> =
            serde_json::from_value(json!({ "Tariff Plan": "contractual" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_example_covers_every_field() {
        let example = CustomerRecord::example();
        assert_eq!(example.present_fields(), RAW_FIELDS.len());

        let round = serde_json::to_value(&example).unwrap();
        assert_eq!(round["Seconds of Use"], json!(4370.0));
        assert_eq!(round["Call  Failure"], json!(8.0));
    }

    #[test]
    fn test_raw_field_kinds() {
        let categorical: Vec<&str> = RAW_FIELDS
            .iter()
            .filter(|f| f.kind == FieldKind::Categorical)
            .map(|f| f.key)
            .collect();
        assert_eq!(categorical, vec!["Complains", "Tariff Plan", "Status"]);
    }
}
