//! Typed field values recognized during an audit conversation.
//!
//! Every enumerated field is a closed Rust enum, so a value outside the
//! declared domain cannot be represented. Numeric fields are `u32` and are
//! only stored when strictly positive.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declares a closed field-value enum with its wire names.
///
/// Generates serde renames, `all()`, `as_str()`, a case-insensitive
/// `parse()` and `Display`.
macro_rules! field_value {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Returns every value in declaration order.
            pub fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }

            /// Wire name of the value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Parses a wire name, ignoring case and surrounding whitespace.
            pub fn parse(s: &str) -> Option<Self> {
                let normalized = s.trim().to_lowercase();
                Self::all().iter().copied().find(|v| v.as_str() == normalized)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

field_value! {
    /// Legal status of the person being audited.
    UserType {
        Individual => "individual",
        Business => "business",
        SelfEmployed => "self_employed",
    }
}

field_value! {
    /// Belgian region, which decides the available subsidy programs.
    Region {
        Wallonie => "wallonie",
        Bruxelles => "bruxelles",
        Flandre => "flandre",
    }
}

field_value! {
    /// Energy supplier named by the user.
    EnergyProvider {
        Engie => "engie",
        Luminus => "luminus",
        Lampiris => "lampiris",
        Mega => "mega",
        Eneco => "eneco",
        OctaPlus => "octa+",
        Elegant => "elegant",
    }
}

field_value! {
    PropertyType {
        House => "house",
        Apartment => "apartment",
        Commercial => "commercial",
    }
}

field_value! {
    HeatingType {
        Central => "central",
        HeatPump => "heat_pump",
        Electric => "electric",
    }
}

field_value! {
    InsulationStatus {
        Good => "good",
        Poor => "poor",
    }
}

/// Wire keys of every field, in the order they are reported.
pub const FIELD_KEYS: &[&str] = &[
    "userType",
    "region",
    "electricityUsage",
    "gasUsage",
    "energyProvider",
    "propertyType",
    "propertySize",
    "yearBuilt",
    "heatingType",
    "insulationStatus",
];

/// Fields recognized in one message (or accumulated over several).
///
/// Absent fields mean "not yet known" and are omitted from the JSON form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Annual electricity consumption in kWh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electricity_usage: Option<u32>,
    /// Annual gas consumption as stated by the user (m³ or kWh, unit not recorded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_usage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_provider: Option<EnergyProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    /// Living area in m².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating_type: Option<HeatingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_status: Option<InsulationStatus>,
}

impl ExtractedFields {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wire keys of the fields that are present.
    pub fn present_keys(&self) -> Vec<&'static str> {
        let flags = [
            self.user_type.is_some(),
            self.region.is_some(),
            self.electricity_usage.is_some(),
            self.gas_usage.is_some(),
            self.energy_provider.is_some(),
            self.property_type.is_some(),
            self.property_size.is_some(),
            self.year_built.is_some(),
            self.heating_type.is_some(),
            self.insulation_status.is_some(),
        ];
        FIELD_KEYS
            .iter()
            .zip(flags)
            .filter_map(|(key, present)| present.then_some(*key))
            .collect()
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.present_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overlays `other` on top of `self`: fields present in `other` win,
    /// fields absent from `other` keep their current value.
    pub fn merge(&mut self, other: &ExtractedFields) {
        self.user_type = other.user_type.or(self.user_type);
        self.region = other.region.or(self.region);
        self.electricity_usage = other.electricity_usage.or(self.electricity_usage);
        self.gas_usage = other.gas_usage.or(self.gas_usage);
        self.energy_provider = other.energy_provider.or(self.energy_provider);
        self.property_type = other.property_type.or(self.property_type);
        self.property_size = other.property_size.or(self.property_size);
        self.year_built = other.year_built.or(self.year_built);
        self.heating_type = other.heating_type.or(self.heating_type);
        self.insulation_status = other.insulation_status.or(self.insulation_status);
    }

    /// Reads fields from a loosely-typed JSON object.
    ///
    /// Each key is read independently. Values outside a field's domain
    /// are dropped rather than coerced; unknown keys are ignored.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        Self {
            user_type: enum_field(object, "userType", UserType::parse),
            region: enum_field(object, "region", Region::parse),
            electricity_usage: count_field(object, "electricityUsage"),
            gas_usage: count_field(object, "gasUsage"),
            energy_provider: enum_field(object, "energyProvider", EnergyProvider::parse),
            property_type: enum_field(object, "propertyType", PropertyType::parse),
            property_size: count_field(object, "propertySize"),
            year_built: count_field(object, "yearBuilt"),
            heating_type: enum_field(object, "heatingType", HeatingType::parse),
            insulation_status: enum_field(object, "insulationStatus", InsulationStatus::parse),
        }
    }
}

fn enum_field<T>(object: &Map<String, Value>, key: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    object.get(key)?.as_str().and_then(parse)
}

fn count_field(object: &Map<String, Value>, key: &str) -> Option<u32> {
    let raw = match object.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    raw.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod values {
        use super::*;

        #[test]
        fn wire_names_round_trip_through_parse() {
            for provider in EnergyProvider::all() {
                assert_eq!(EnergyProvider::parse(provider.as_str()), Some(*provider));
            }
            assert_eq!(UserType::parse("SELF_EMPLOYED"), Some(UserType::SelfEmployed));
        }

        #[test]
        fn octa_plus_keeps_its_symbol() {
            let json = serde_json::to_string(&EnergyProvider::OctaPlus).unwrap();
            assert_eq!(json, "\"octa+\"");
        }

        #[test]
        fn unknown_names_do_not_parse() {
            assert_eq!(Region::parse("paris"), None);
            assert_eq!(HeatingType::parse("string"), None);
        }
    }

    mod record {
        use super::*;

        #[test]
        fn serializes_camel_case_and_omits_absent_fields() {
            let fields = ExtractedFields {
                user_type: Some(UserType::SelfEmployed),
                year_built: Some(1975),
                ..Default::default()
            };
            let json = serde_json::to_value(fields).unwrap();
            assert_eq!(json, json!({"userType": "self_employed", "yearBuilt": 1975}));
        }

        #[test]
        fn empty_record_serializes_to_empty_object() {
            let json = serde_json::to_string(&ExtractedFields::new()).unwrap();
            assert_eq!(json, "{}");
            assert!(ExtractedFields::new().is_empty());
        }

        #[test]
        fn present_keys_follow_declaration_order() {
            let fields = ExtractedFields {
                heating_type: Some(HeatingType::Central),
                region: Some(Region::Flandre),
                ..Default::default()
            };
            assert_eq!(fields.present_keys(), vec!["region", "heatingType"]);
            assert_eq!(fields.len(), 2);
        }

        #[test]
        fn merge_overlays_only_present_fields() {
            let mut running = ExtractedFields {
                user_type: Some(UserType::Individual),
                region: Some(Region::Wallonie),
                ..Default::default()
            };
            let update = ExtractedFields {
                region: Some(Region::Bruxelles),
                electricity_usage: Some(3200),
                ..Default::default()
            };
            running.merge(&update);

            assert_eq!(running.user_type, Some(UserType::Individual));
            assert_eq!(running.region, Some(Region::Bruxelles));
            assert_eq!(running.electricity_usage, Some(3200));
        }
    }

    mod lenient_json {
        use super::*;

        fn object(value: Value) -> Map<String, Value> {
            value.as_object().cloned().unwrap()
        }

        #[test]
        fn reads_in_domain_values() {
            let fields = ExtractedFields::from_json_object(&object(json!({
                "propertyType": "house",
                "propertySize": 120,
                "yearBuilt": "1992",
                "energyProvider": "Engie",
            })));
            assert_eq!(fields.property_type, Some(PropertyType::House));
            assert_eq!(fields.property_size, Some(120));
            assert_eq!(fields.year_built, Some(1992));
            assert_eq!(fields.energy_provider, Some(EnergyProvider::Engie));
        }

        #[test]
        fn drops_out_of_domain_values() {
            let fields = ExtractedFields::from_json_object(&object(json!({
                "userType": "particulier",
                "heatingType": "string",
                "electricityUsage": -40,
                "gasUsage": 12.5,
                "propertySize": 0,
                "insulationStatus": null,
                "somethingElse": "ignored",
            })));
            assert!(fields.is_empty());
        }

        #[test]
        fn drops_numbers_that_overflow() {
            let fields = ExtractedFields::from_json_object(&object(json!({
                "electricityUsage": 10_000_000_000u64,
            })));
            assert_eq!(fields.electricity_usage, None);
        }
    }
}
