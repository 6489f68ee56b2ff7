//! Ordered detection rules for the heuristic extractor.
//!
//! Keyword tables are evaluated top to bottom and the first hit wins, so
//! the order of entries is part of the behavior. All patterns expect
//! lowercased input.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{
    EnergyProvider, HeatingType, InsulationStatus, PropertyType, Region, UserType,
};

/// A value selected when any of its keywords occurs in the text.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<T> {
    pub value: T,
    pub keywords: &'static [&'static str],
}

impl<T: Copy> KeywordRule<T> {
    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|keyword| text.contains(keyword))
    }
}

/// Returns the value of the first rule with a keyword contained in `text`.
pub fn first_keyword_match<T: Copy>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    rules.iter().find(|rule| rule.matches(text)).map(|rule| rule.value)
}

/// Tries each pattern in order and parses capture group 1 of the first
/// pattern that matches.
///
/// A capture that does not fit in a `u32`, or that is zero, yields `None`
/// without trying the remaining patterns.
pub fn first_number(patterns: &[&Regex], text: &str) -> Option<u32> {
    let digits = patterns
        .iter()
        .find_map(|pattern| pattern.captures(text))?
        .get(1)?
        .as_str();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

pub const USER_TYPE_RULES: &[KeywordRule<UserType>] = &[
    KeywordRule {
        value: UserType::Individual,
        keywords: &["particulier", "ménage"],
    },
    KeywordRule {
        value: UserType::Business,
        keywords: &["entreprise", "société"],
    },
    KeywordRule {
        value: UserType::SelfEmployed,
        keywords: &["indépendant", "freelance"],
    },
];

// Wallonia is checked first: a message naming both Liège and Bruxelles
// resolves to wallonie.
pub const REGION_RULES: &[KeywordRule<Region>] = &[
    KeywordRule {
        value: Region::Wallonie,
        keywords: &["wallonie", "liège", "namur", "charleroi"],
    },
    KeywordRule {
        value: Region::Bruxelles,
        keywords: &["bruxelles", "bxl"],
    },
    KeywordRule {
        value: Region::Flandre,
        keywords: &["flandre", "anvers", "gand", "bruges"],
    },
];

pub const PROVIDER_RULES: &[KeywordRule<EnergyProvider>] = &[
    KeywordRule { value: EnergyProvider::Engie, keywords: &["engie"] },
    KeywordRule { value: EnergyProvider::Luminus, keywords: &["luminus"] },
    KeywordRule { value: EnergyProvider::Lampiris, keywords: &["lampiris"] },
    KeywordRule { value: EnergyProvider::Mega, keywords: &["mega"] },
    KeywordRule { value: EnergyProvider::Eneco, keywords: &["eneco"] },
    KeywordRule { value: EnergyProvider::OctaPlus, keywords: &["octa+"] },
    KeywordRule { value: EnergyProvider::Elegant, keywords: &["elegant"] },
];

pub const PROPERTY_TYPE_RULES: &[KeywordRule<PropertyType>] = &[
    KeywordRule {
        value: PropertyType::House,
        keywords: &["maison", "villa"],
    },
    KeywordRule {
        value: PropertyType::Apartment,
        keywords: &["appartement", "flat"],
    },
    KeywordRule {
        value: PropertyType::Commercial,
        keywords: &["bureau", "commercial"],
    },
];

pub const HEATING_RULES: &[KeywordRule<HeatingType>] = &[
    KeywordRule {
        value: HeatingType::Central,
        keywords: &["chauffage central", "chaudière"],
    },
    KeywordRule {
        value: HeatingType::HeatPump,
        keywords: &["pompe à chaleur"],
    },
    KeywordRule {
        value: HeatingType::Electric,
        keywords: &["électrique"],
    },
];

pub const INSULATION_RULES: &[KeywordRule<InsulationStatus>] = &[
    KeywordRule {
        value: InsulationStatus::Good,
        keywords: &["bien isolé", "bonne isolation"],
    },
    KeywordRule {
        value: InsulationStatus::Poor,
        keywords: &["mal isolé", "mauvaise isolation"],
    },
];

/// Phrases signalling that the user does not know their figures.
pub const UNCERTAINTY_MARKERS: &[&str] = &["je ne sais pas", "pas sûr"];

/// Returns true if the message says the user does not know their figures.
pub fn expresses_uncertainty(message: &str) -> bool {
    let text = message.to_lowercase();
    UNCERTAINTY_MARKERS.iter().any(|marker| text.contains(marker))
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

pub static ELECTRICITY_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| compile(r"([0-9]+)\s*(?:kwh|kw|kilowatt)"));
pub static ELECTRICITY_AFTER_KEYWORD: Lazy<Regex> =
    Lazy::new(|| compile(r"(?:consomm|électricité|elec).*?([0-9]+)"));

pub static GAS_AFTER_KEYWORD: Lazy<Regex> = Lazy::new(|| compile(r"gaz.*?([0-9]+)"));
pub static GAS_BEFORE_UNIT: Lazy<Regex> = Lazy::new(|| compile(r"([0-9]+).*?(?:gaz|m3)"));

pub static SIZE_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| compile(r"([0-9]+)\s*(?:m2|mètres|metres|m²)"));
pub static SIZE_AFTER_KEYWORD: Lazy<Regex> =
    Lazy::new(|| compile(r"(?:superficie|surface|taille).*?([0-9]+)"));

pub static YEAR_AFTER_KEYWORD: Lazy<Regex> =
    Lazy::new(|| compile(r"(?:construit|bâti|construction|année).*?([0-9]{4})"));
pub static YEAR_BEFORE_KEYWORD: Lazy<Regex> =
    Lazy::new(|| compile(r"([0-9]{4}).*?(?:construit|bâti|construction)"));
pub static BARE_YEAR: Lazy<Regex> = Lazy::new(|| compile(r"(19[0-9]{2}|20[0-9]{2})"));
