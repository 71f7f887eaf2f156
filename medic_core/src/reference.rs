//! Read-only reference catalogs: drug formulary and flashcards.
//!
//! These are inert data sets queried by category and certification level.
//! The only arithmetic is weight-based dosing.

use crate::error::ReferenceError;
use crate::model::CertificationLevel;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Heaviest patient weight accepted by the dosing calculator (kg).
const MAX_WEIGHT_KG: f64 = 350.0;

// =============================================================================
// FORMULARY
// =============================================================================

/// How a drug's dose is determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DoseRule {
    /// Same dose for every adult
    Fixed { mg: f64 },
    /// Scaled by weight, capped at `max_mg`
    PerKg { mg_per_kg: f64, max_mg: f64 },
}

/// A formulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drug {
    pub name: String,
    pub category: String,
    /// Levels permitted to administer
    pub levels: Vec<CertificationLevel>,
    pub dose: DoseRule,
    pub concentration_mg_per_ml: f64,
    pub route: String,
    #[serde(default)]
    pub notes: String,
}

/// A computed dose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dose {
    pub mg: f64,
    pub ml: f64,
    /// True when the weight-based dose hit the maximum
    pub capped: bool,
}

impl Drug {
    /// Computes the dose for a patient weight.
    pub fn dose_for_weight(&self, weight_kg: f64) -> Result<Dose, ReferenceError> {
        if !(weight_kg > 0.0 && weight_kg <= MAX_WEIGHT_KG) {
            return Err(ReferenceError::out_of_range("weight_kg", weight_kg, 0.0, MAX_WEIGHT_KG));
        }

        let (mg, capped) = match self.dose {
            DoseRule::Fixed { mg } => (mg, false),
            DoseRule::PerKg { mg_per_kg, max_mg } => {
                let raw = mg_per_kg * weight_kg;
                if raw > max_mg {
                    (max_mg, true)
                } else {
                    (raw, false)
                }
            }
        };

        let ml = if self.concentration_mg_per_ml > 0.0 {
            mg / self.concentration_mg_per_ml
        } else {
            0.0
        };

        Ok(Dose { mg, ml, capped })
    }

    /// Returns true if `level` may administer this drug.
    pub fn permitted_for(&self, level: CertificationLevel) -> bool {
        self.levels.contains(&level)
    }
}

/// The drug catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Formulary {
    drugs: Vec<Drug>,
}

impl Formulary {
    pub fn new(drugs: Vec<Drug>) -> Self {
        Self { drugs }
    }

    /// Finds a drug by name, case-insensitively.
    pub fn find(&self, name: &str) -> Result<&Drug, ReferenceError> {
        self.drugs
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ReferenceError::UnknownDrug(name.to_string()))
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Drug> + 'a {
        self.drugs
            .iter()
            .filter(move |d| d.category.eq_ignore_ascii_case(category))
    }

    pub fn for_level(&self, level: CertificationLevel) -> impl Iterator<Item = &Drug> + '_ {
        self.drugs.iter().filter(move |d| d.permitted_for(level))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drug> {
        self.drugs.iter()
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    /// The built-in prehospital formulary.
    pub fn builtin() -> Self {
        use CertificationLevel::*;

        let drug = |name: &str, category: &str, levels: &[CertificationLevel], dose: DoseRule, conc: f64, route: &str, notes: &str| Drug {
            name: name.to_string(),
            category: category.to_string(),
            levels: levels.to_vec(),
            dose,
            concentration_mg_per_ml: conc,
            route: route.to_string(),
            notes: notes.to_string(),
        };

        Self::new(vec![
            drug("Aspirin", "cardiac", &[Basic, Advanced, Paramedic],
                DoseRule::Fixed { mg: 324.0 }, 0.0, "PO",
                "Chewed. Contraindicated with active GI bleed or allergy."),
            drug("Nitroglycerin", "cardiac", &[Advanced, Paramedic],
                DoseRule::Fixed { mg: 0.4 }, 0.0, "SL",
                "Hold if SBP < 90 or PDE-5 inhibitor use within 48 h."),
            drug("Epinephrine 1:1000", "allergy", &[Basic, Advanced, Paramedic],
                DoseRule::PerKg { mg_per_kg: 0.01, max_mg: 0.5 }, 1.0, "IM",
                "Anterolateral thigh. May repeat every 5-15 min."),
            drug("Epinephrine 1:10000", "cardiac", &[Paramedic],
                DoseRule::PerKg { mg_per_kg: 0.01, max_mg: 1.0 }, 0.1, "IV/IO",
                "Cardiac arrest, every 3-5 min."),
            drug("Albuterol", "respiratory", &[Basic, Advanced, Paramedic],
                DoseRule::Fixed { mg: 2.5 }, 0.83, "Nebulized",
                "May repeat for persistent wheezing."),
            drug("Naloxone", "toxicology", &[Basic, Advanced, Paramedic],
                DoseRule::PerKg { mg_per_kg: 0.1, max_mg: 2.0 }, 1.0, "IN/IV/IM",
                "Titrate to respiratory effort, not consciousness."),
            drug("Dextrose 10%", "metabolic", &[Advanced, Paramedic],
                DoseRule::PerKg { mg_per_kg: 500.0, max_mg: 25_000.0 }, 100.0, "IV",
                "Recheck glucose after administration."),
            drug("Oral Glucose", "metabolic", &[Basic, Advanced, Paramedic],
                DoseRule::Fixed { mg: 15_000.0 }, 0.0, "PO",
                "Patient must be able to protect airway."),
            drug("Amiodarone", "cardiac", &[Paramedic],
                DoseRule::PerKg { mg_per_kg: 5.0, max_mg: 300.0 }, 50.0, "IV/IO",
                "Refractory VF/pVT."),
            drug("Diphenhydramine", "allergy", &[Advanced, Paramedic],
                DoseRule::PerKg { mg_per_kg: 1.0, max_mg: 50.0 }, 50.0, "IV/IM",
                "Adjunct only; never a substitute for epinephrine."),
        ])
    }
}

// =============================================================================
// FLASHCARDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    pub category: String,
    pub level: CertificationLevel,
}

/// A study deck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlashcardDeck {
    cards: Vec<Flashcard>,
}

impl FlashcardDeck {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self { cards }
    }

    /// Selects cards by optional category and level.
    ///
    /// A level filter includes every card written for that level or below.
    pub fn filter(&self, category: Option<&str>, level: Option<CertificationLevel>) -> Vec<&Flashcard> {
        self.cards
            .iter()
            .filter(|c| category.map_or(true, |cat| c.category.eq_ignore_ascii_case(cat)))
            .filter(|c| level.map_or(true, |lvl| c.level <= lvl))
            .collect()
    }

    /// Returns the cards in a seed-determined order.
    pub fn shuffled(&self, seed: u64) -> Vec<&Flashcard> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut cards: Vec<&Flashcard> = self.cards.iter().collect();
        cards.shuffle(&mut rng);
        cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The built-in study deck.
    pub fn builtin() -> Self {
        use CertificationLevel::*;

        let card = |front: &str, back: &str, category: &str, level| Flashcard {
            front: front.to_string(),
            back: back.to_string(),
            category: category.to_string(),
            level,
        };

        Self::new(vec![
            card("Adult compression rate", "100-120 per minute", "cardiac", Basic),
            card("Adult compression depth", "2 to 2.4 inches (5-6 cm)", "cardiac", Basic),
            card("Signs of anaphylaxis", "Hives, airway swelling, wheezing, hypotension", "allergy", Basic),
            card("Hypoglycemia threshold", "Blood glucose below 60 mg/dL with symptoms", "metabolic", Basic),
            card("Cincinnati stroke scale", "Facial droop, arm drift, abnormal speech", "neuro", Basic),
            card("Opioid toxidrome", "Pinpoint pupils, respiratory depression, decreased LOC", "toxicology", Basic),
            card("Nitroglycerin contraindications", "SBP < 90, PDE-5 inhibitors, right ventricular infarct", "cardiac", Advanced),
            card("Shockable rhythms", "Ventricular fibrillation and pulseless ventricular tachycardia", "cardiac", Paramedic),
            card("Amiodarone first dose in arrest", "300 mg IV/IO", "cardiac", Paramedic),
            card("Cushing's triad", "Hypertension, bradycardia, irregular respirations", "neuro", Paramedic),
        ])
    }
}
