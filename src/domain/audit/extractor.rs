//! Heuristic field extraction and templated replies.
//!
//! Used as a drop-in substitute for the language model: given the user's
//! message, the current stage and the conversation so far, it recognizes
//! stage-specific fields with keyword tables and regular expressions and
//! writes a French reply that acknowledges them and steers the user to the
//! next topic.
//!
//! The extractor holds no state. Callers merge the returned fields into
//! their own running profile and decide when to change stage.

use serde::{Deserialize, Serialize};

use super::fields::{ExtractedFields, HeatingType, PropertyType, Region, UserType};
use super::rules::{
    expresses_uncertainty, first_keyword_match, first_number, BARE_YEAR, ELECTRICITY_AFTER_KEYWORD,
    ELECTRICITY_WITH_UNIT, GAS_AFTER_KEYWORD, GAS_BEFORE_UNIT, HEATING_RULES,
    INSULATION_RULES, PROPERTY_TYPE_RULES, PROVIDER_RULES, REGION_RULES, SIZE_AFTER_KEYWORD,
    SIZE_WITH_UNIT, USER_TYPE_RULES, YEAR_AFTER_KEYWORD,
    YEAR_BEFORE_KEYWORD,
};
use super::stage::ConversationStage;
use super::turn::{last_assistant_text, ConversationTurn};

/// Electricity below this many kWh per year is "below average".
pub const ELECTRICITY_LOW_THRESHOLD: u32 = 2500;
/// Electricity above this many kWh per year is "above average".
pub const ELECTRICITY_HIGH_THRESHOLD: u32 = 5000;

pub const GAS_LOW_THRESHOLD: u32 = 10_000;
pub const GAS_HIGH_THRESHOLD: u32 = 20_000;

/// Houses built before this year get insulation-first advice.
pub const OLD_BUILDING_YEAR: u32 = 1980;
/// Houses built before this year (and after `OLD_BUILDING_YEAR`) get heating advice.
pub const RECENT_BUILDING_YEAR: u32 = 2000;

/// Apartments smaller than this (m²) get the heat-recovery ventilation note.
pub const SMALL_APARTMENT_M2: u32 = 70;

/// The reply and fields produced for one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub reply_text: String,
    pub fields: ExtractedFields,
}

impl ExtractionResult {
    pub fn new(reply_text: impl Into<String>, fields: ExtractedFields) -> Self {
        Self {
            reply_text: reply_text.into(),
            fields,
        }
    }
}

/// Where a yearly consumption figure sits relative to fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionLevel {
    Low,
    Average,
    High,
}

impl ConsumptionLevel {
    /// Classifies yearly electricity use in kWh.
    ///
    /// Both bounds are strict: 2500 and 5000 are still average.
    pub fn for_electricity(kwh: u32) -> Self {
        Self::classify(kwh, ELECTRICITY_LOW_THRESHOLD, ELECTRICITY_HIGH_THRESHOLD)
    }

    /// Classifies yearly gas use (raw figure, unit as given by the user).
    pub fn for_gas(amount: u32) -> Self {
        Self::classify(amount, GAS_LOW_THRESHOLD, GAS_HIGH_THRESHOLD)
    }

    fn classify(value: u32, low: u32, high: u32) -> Self {
        if value < low {
            Self::Low
        } else if value > high {
            Self::High
        } else {
            Self::Average
        }
    }
}

/// Rule-based stand-in for the language model.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Recognizes fields in `message` for `stage` and composes a reply.
    ///
    /// Total over its inputs: any message, including an empty one, yields a
    /// non-empty reply and zero or more fields.
    pub fn extract(
        &self,
        message: &str,
        stage: ConversationStage,
        history: &[ConversationTurn],
    ) -> ExtractionResult {
        let text = message.to_lowercase();
        match stage {
            ConversationStage::Profile => self.profile(&text, history),
            ConversationStage::Consumption => self.consumption(&text),
            ConversationStage::Property => self.property(&text),
        }
    }

    fn profile(&self, text: &str, history: &[ConversationTurn]) -> ExtractionResult {
        let fields = ExtractedFields {
            user_type: first_keyword_match(USER_TYPE_RULES, text),
            region: first_keyword_match(REGION_RULES, text),
            ..Default::default()
        };

        let reply = match (fields.user_type, fields.region) {
            (Some(user_type), Some(region)) => format!(
                "Parfait ! J'ai bien compris que vous êtes {} basé en {}. {} \
                 Maintenant, j'aimerais en savoir plus sur votre consommation énergétique. \
                 Connaissez-vous votre consommation annuelle d'électricité en kWh ? \
                 Et utilisez-vous également du gaz naturel ?",
                user_type_with_article(user_type),
                region_name(region),
                regional_programs(region),
            ),
            (Some(user_type), None) => format!(
                "Merci de m'avoir précisé que vous êtes {}. Pour personnaliser mes \
                 recommandations, pourriez-vous me dire dans quelle région de Belgique vous \
                 êtes situé ? (Wallonie, Bruxelles ou Flandre)",
                user_type_with_article(user_type),
            ),
            (None, Some(region)) => format!(
                "Merci de m'avoir indiqué que vous êtes en {}. Pour mieux adapter mes \
                 conseils, êtes-vous un particulier, un indépendant ou une entreprise ?",
                region_name(region),
            ),
            (None, None) => profile_reprompt(last_assistant_text(history)).to_string(),
        };

        ExtractionResult::new(reply, fields)
    }

    fn consumption(&self, text: &str) -> ExtractionResult {
        let fields = ExtractedFields {
            electricity_usage: first_number(
                &[&*ELECTRICITY_WITH_UNIT, &*ELECTRICITY_AFTER_KEYWORD],
                text,
            ),
            gas_usage: first_number(&[&*GAS_AFTER_KEYWORD, &*GAS_BEFORE_UNIT], text),
            energy_provider: first_keyword_match(PROVIDER_RULES, text),
            ..Default::default()
        };

        if fields.electricity_usage.is_none() && fields.gas_usage.is_none() {
            let reply = if expresses_uncertainty(text) {
                "Je comprends qu'il peut être difficile de connaître ces chiffres précisément. \
                 Ne vous inquiétez pas, nous pouvons estimer votre consommation plus tard en \
                 fonction des caractéristiques de votre logement. Parlons justement de votre \
                 propriété : s'agit-il d'une maison ou d'un appartement ? Quelle est sa \
                 superficie approximative ?"
            } else {
                "Pour vous proposer des recommandations d'économies d'énergie pertinentes, \
                 j'aurais besoin d'informations sur votre consommation. Connaissez-vous \
                 approximativement votre consommation annuelle d'électricité en kWh ? \
                 Utilisez-vous également du gaz naturel ? Si vous ne connaissez pas ces \
                 chiffres exactement, nous pourrons les estimer plus tard."
            };
            return ExtractionResult::new(reply, fields);
        }

        let mut reply = String::from("Merci pour ces informations précieuses sur votre consommation. ");

        if let Some(kwh) = fields.electricity_usage {
            reply.push_str(&format!("Votre consommation électrique de {kwh} kWh/an "));
            reply.push_str(electricity_comment(ConsumptionLevel::for_electricity(kwh)));
        }

        if let Some(gas) = fields.gas_usage {
            reply.push_str(&format!("Concernant votre consommation de gaz de {gas} unités, "));
            reply.push_str(gas_comment(ConsumptionLevel::for_gas(gas)));
        }

        if let Some(provider) = fields.energy_provider {
            reply.push_str(&format!("Je note que vous êtes client chez {provider}. "));
        }

        reply.push_str(
            "Maintenant, j'aimerais en savoir plus sur votre propriété pour compléter l'audit. \
             Pouvez-vous me dire s'il s'agit d'une maison ou d'un appartement, sa superficie \
             approximative, et si possible son année de construction ?",
        );

        ExtractionResult::new(reply, fields)
    }

    fn property(&self, text: &str) -> ExtractionResult {
        let fields = ExtractedFields {
            property_type: first_keyword_match(PROPERTY_TYPE_RULES, text),
            property_size: first_number(&[&*SIZE_WITH_UNIT, &*SIZE_AFTER_KEYWORD], text),
            year_built: first_number(
                &[&*YEAR_AFTER_KEYWORD, &*YEAR_BEFORE_KEYWORD, &*BARE_YEAR],
                text,
            ),
            heating_type: first_keyword_match(HEATING_RULES, text),
            insulation_status: first_keyword_match(INSULATION_RULES, text),
            ..Default::default()
        };

        if fields.is_empty() {
            return ExtractionResult::new(
                "Pour vous proposer des recommandations vraiment personnalisées, j'aurais \
                 besoin de quelques informations sur votre propriété. Pourriez-vous me dire \
                 s'il s'agit d'une maison ou d'un appartement, sa superficie approximative en \
                 m², et si possible son année de construction ?",
                fields,
            );
        }

        let Some(description) = describe_property(&fields) else {
            return ExtractionResult::new(
                "Merci pour ces informations. Pour finaliser votre audit énergétique, \
                 pourriez-vous me préciser d'autres détails sur votre propriété ? Par exemple, \
                 s'agit-il d'une maison ou d'un appartement, quelle est sa superficie, et si \
                 possible son année de construction ?",
                fields,
            );
        };

        let mut reply = format!("Merci pour ces informations détaillées sur {description}. ");
        reply.push_str(&property_advice(&fields));
        reply.push_str(
            "Sur base de toutes les informations que vous m'avez fournies, je peux maintenant \
             générer un rapport d'audit complet avec des recommandations personnalisées pour \
             améliorer l'efficacité énergétique de votre propriété et réduire vos factures.",
        );

        ExtractionResult::new(reply, fields)
    }
}

fn user_type_with_article(user_type: UserType) -> &'static str {
    match user_type {
        UserType::Individual => "un particulier",
        UserType::SelfEmployed => "un indépendant",
        UserType::Business => "une entreprise",
    }
}

fn region_name(region: Region) -> &'static str {
    match region {
        Region::Wallonie => "Wallonie",
        Region::Bruxelles => "Bruxelles",
        Region::Flandre => "Flandre",
    }
}

fn regional_programs(region: Region) -> &'static str {
    match region {
        Region::Wallonie => {
            "En Wallonie, il existe plusieurs programmes de soutien pour l'efficacité \
             énergétique comme les primes Habitation."
        }
        Region::Bruxelles => {
            "À Bruxelles, vous pouvez bénéficier des Primes Énergie et Rénovation pour vos \
             projets d'amélioration énergétique."
        }
        Region::Flandre => {
            "En Flandre, des mécanismes comme les primes de rénovation peuvent vous aider à \
             financer vos travaux d'efficacité énergétique."
        }
    }
}

/// Picks the clarifying question when nothing was recognized, based on
/// what the assistant asked last.
fn profile_reprompt(last_assistant: &str) -> &'static str {
    let last_assistant = last_assistant.to_lowercase();
    if last_assistant.contains("particulier") || last_assistant.contains("indépendant") {
        "Je vois que vous n'avez pas précisé votre statut. Pour vous offrir des \
         recommandations pertinentes, j'ai besoin de savoir si vous êtes un particulier, un \
         indépendant ou une entreprise. Cela affecte les types de subventions auxquelles vous \
         pourriez avoir droit. Quel est votre statut ?"
    } else if last_assistant.contains("région") {
        "Je comprends. Pour vous proposer des solutions adaptées à votre localisation, \
         pourriez-vous me préciser dans quelle région de Belgique vous vous trouvez ? Les \
         programmes de soutien varient entre la Wallonie, Bruxelles et la Flandre."
    } else {
        "Je ne suis pas sûr de comprendre complètement votre situation. Pour commencer notre \
         audit énergétique, pourriez-vous me préciser si vous êtes un particulier, un \
         indépendant ou une entreprise, et dans quelle région de Belgique vous êtes situé ?"
    }
}

fn electricity_comment(level: ConsumptionLevel) -> &'static str {
    match level {
        ConsumptionLevel::Low => {
            "est inférieure à la moyenne belge (3500 kWh/an pour un ménage), ce qui est \
             excellent ! "
        }
        ConsumptionLevel::High => {
            "est supérieure à la moyenne belge (3500 kWh/an pour un ménage). Il y a \
             probablement un potentiel d'économies intéressant. "
        }
        ConsumptionLevel::Average => "est proche de la moyenne belge (3500 kWh/an pour un ménage). ",
    }
}

fn gas_comment(level: ConsumptionLevel) -> &'static str {
    match level {
        ConsumptionLevel::Low => {
            "elle est relativement basse, ce qui suggère une bonne efficacité de votre système \
             de chauffage ou une bonne isolation. "
        }
        ConsumptionLevel::High => {
            "elle est assez élevée, ce qui pourrait indiquer des opportunités d'amélioration au \
             niveau de l'isolation ou du système de chauffage. "
        }
        ConsumptionLevel::Average => "elle se situe dans une fourchette moyenne. ",
    }
}

/// Builds a noun phrase such as "votre maison de 90 m² construite en 1975".
///
/// Returns `None` when none of type, size or year is known.
fn describe_property(fields: &ExtractedFields) -> Option<String> {
    let mut description = String::new();

    if let Some(property_type) = fields.property_type {
        let noun = match property_type {
            PropertyType::House => "maison",
            PropertyType::Apartment => "appartement",
            PropertyType::Commercial => "local commercial",
        };
        description.push_str("votre ");
        description.push_str(noun);
    }

    if let Some(size) = fields.property_size {
        if description.is_empty() {
            description.push_str("votre propriété");
        }
        description.push_str(&format!(" de {size} m²"));
    }

    if let Some(year) = fields.year_built {
        if description.is_empty() {
            description.push_str("votre propriété");
        }
        description.push_str(&format!(" construite en {year}"));
    }

    (!description.is_empty()).then_some(description)
}

fn property_advice(fields: &ExtractedFields) -> String {
    match fields.property_type {
        Some(PropertyType::House) => house_advice(fields.year_built, fields.heating_type),
        Some(PropertyType::Apartment) => {
            let mut advice = String::from(
                "Pour un appartement, les principales économies d'énergie viennent généralement \
                 du remplacement des fenêtres et de l'optimisation du système de chauffage. ",
            );
            if fields.property_size.is_some_and(|size| size < SMALL_APARTMENT_M2) {
                advice.push_str(
                    "Pour un appartement de cette taille, un système de ventilation avec \
                     récupération de chaleur pourrait être particulièrement efficace. ",
                );
            }
            advice
        }
        Some(PropertyType::Commercial) | None => String::new(),
    }
}

fn house_advice(year_built: Option<u32>, heating: Option<HeatingType>) -> String {
    match year_built {
        Some(year) if year < OLD_BUILDING_YEAR => {
            let mut advice = String::from(
                "Pour une maison de cette époque, l'isolation est généralement la priorité \
                 absolue. Je vous recommande de vérifier l'isolation de votre toiture (30% des \
                 pertes), puis celle des murs (25% des pertes) et enfin des fenêtres (15% des \
                 pertes). ",
            );
            if heating == Some(HeatingType::Central) {
                advice.push_str(
                    "Votre chauffage central pourrait également être modernisé pour un modèle à \
                     condensation plus efficace. ",
                );
            }
            advice
        }
        Some(year) if year < RECENT_BUILDING_YEAR => format!(
            "Pour une maison construite dans les années {}, je vous recommande de vérifier \
             l'efficacité de votre système de chauffage et d'envisager l'installation de \
             panneaux photovoltaïques. ",
            year / 10 * 10
        ),
        _ => String::from(
            "Votre maison étant relativement récente, elle bénéficie probablement déjà d'une \
             bonne isolation. Vous pourriez envisager des technologies comme une pompe à chaleur \
             ou des panneaux solaires pour réduire davantage votre empreinte énergétique. ",
        ),
    }
}
