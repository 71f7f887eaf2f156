//! Built-in training scenarios.

use medic_core::{
    CertificationLevel, Choice, DecisionPoint, Difficulty, Scenario, ScenarioCatalog, ScenarioError,
    Vital,
};
use std::collections::BTreeMap;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// EMS-001: Suspected acute coronary syndrome
    ChestPain,

    /// EMS-002: Anaphylaxis after a bee sting
    Anaphylaxis,

    /// EMS-003: Altered diabetic patient
    Hypoglycemia,

    /// EMS-004: Severe asthma exacerbation
    Asthma,

    /// EMS-005: Suspected opioid overdose
    OpioidOverdose,

    /// EMS-006: Acute stroke within the treatment window
    Stroke,

    /// EMS-007: Witnessed ventricular fibrillation arrest
    CardiacArrest,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::ChestPain,
            ScenarioId::Anaphylaxis,
            ScenarioId::Hypoglycemia,
            ScenarioId::Asthma,
            ScenarioId::OpioidOverdose,
            ScenarioId::Stroke,
            ScenarioId::CardiacArrest,
        ]
    }

    /// Returns scenarios written for `level` or below.
    pub fn for_level(level: CertificationLevel) -> Vec<ScenarioId> {
        Self::all()
            .into_iter()
            .filter(|id| id.level() <= level)
            .collect()
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::ChestPain => "chest_pain",
            ScenarioId::Anaphylaxis => "anaphylaxis",
            ScenarioId::Hypoglycemia => "hypoglycemia",
            ScenarioId::Asthma => "asthma",
            ScenarioId::OpioidOverdose => "opioid_overdose",
            ScenarioId::Stroke => "stroke",
            ScenarioId::CardiacArrest => "cardiac_arrest",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::ChestPain => "58M crushing substernal chest pain, diaphoretic",
            ScenarioId::Anaphylaxis => "24F bee sting, hives, throat tightness",
            ScenarioId::Hypoglycemia => "67M insulin-dependent diabetic, confused and sweaty",
            ScenarioId::Asthma => "16F known asthmatic, tripod position, speaking in words",
            ScenarioId::OpioidOverdose => "31M found unresponsive, pinpoint pupils, slow breathing",
            ScenarioId::Stroke => "72F sudden right-sided weakness and slurred speech",
            ScenarioId::CardiacArrest => "55M collapses in front of the crew, pulseless",
        }
    }

    /// Returns the level the scenario is written for.
    pub fn level(&self) -> CertificationLevel {
        match self {
            ScenarioId::ChestPain
            | ScenarioId::Anaphylaxis
            | ScenarioId::OpioidOverdose
            | ScenarioId::Stroke => CertificationLevel::Basic,
            ScenarioId::Hypoglycemia | ScenarioId::Asthma => CertificationLevel::Advanced,
            ScenarioId::CardiacArrest => CertificationLevel::Paramedic,
        }
    }

    /// Builds the scenario definition.
    pub fn build(&self) -> Scenario {
        match self {
            ScenarioId::ChestPain => chest_pain(),
            ScenarioId::Anaphylaxis => anaphylaxis(),
            ScenarioId::Hypoglycemia => hypoglycemia(),
            ScenarioId::Asthma => asthma(),
            ScenarioId::OpioidOverdose => opioid_overdose(),
            ScenarioId::Stroke => stroke(),
            ScenarioId::CardiacArrest => cardiac_arrest(),
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chest_pain" | "chestpain" | "acs" | "ems-001" => Ok(ScenarioId::ChestPain),
            "anaphylaxis" | "allergy" | "ems-002" => Ok(ScenarioId::Anaphylaxis),
            "hypoglycemia" | "diabetic" | "ems-003" => Ok(ScenarioId::Hypoglycemia),
            "asthma" | "ems-004" => Ok(ScenarioId::Asthma),
            "opioid_overdose" | "overdose" | "opioid" | "ems-005" => Ok(ScenarioId::OpioidOverdose),
            "stroke" | "cva" | "ems-006" => Ok(ScenarioId::Stroke),
            "cardiac_arrest" | "arrest" | "vf" | "ems-007" => Ok(ScenarioId::CardiacArrest),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

/// Builds and validates every built-in scenario.
pub fn builtin_catalog() -> Result<ScenarioCatalog, ScenarioError> {
    ScenarioCatalog::new(ScenarioId::all().iter().map(|id| id.build()).collect())
}

fn vitals(pairs: &[(Vital, i32)]) -> BTreeMap<Vital, i32> {
    pairs.iter().copied().collect()
}

fn scenario(
    id: ScenarioId,
    title: &str,
    difficulty: Difficulty,
    initial_vitals: BTreeMap<Vital, i32>,
    time_budget_secs: u32,
    decision_points: Vec<DecisionPoint>,
    learning_points: &[&str],
    pitfalls: &[&str],
) -> Scenario {
    Scenario {
        id: id.name().to_string(),
        title: title.to_string(),
        level: id.level(),
        difficulty,
        chief_complaint: id.description().to_string(),
        initial_vitals,
        time_budget_secs,
        decision_points,
        learning_points: learning_points.iter().map(|s| s.to_string()).collect(),
        pitfalls: pitfalls.iter().map(|s| s.to_string()).collect(),
    }
}

fn scene_safety() -> DecisionPoint {
    DecisionPoint::new(
        "You arrive on scene. What is your first action?",
        vec![
            Choice::correct("Confirm scene safety and don PPE", "Scene safety always comes first."),
            Choice::wrong("Run straight to the patient", "An injured rescuer helps nobody."),
            Choice::wrong("Start taking a SAMPLE history", "History comes after the primary survey."),
        ],
    )
    .with_time_limit(30)
}

fn chest_pain() -> Scenario {
    use Vital::*;
    scenario(
        ScenarioId::ChestPain,
        "Crushing Chest Pain",
        Difficulty::Beginner,
        vitals(&[(HeartRate, 104), (SpO2, 93), (RespiratoryRate, 22), (SystolicBp, 152), (DiastolicBp, 94)]),
        300,
        vec![
            scene_safety(),
            DecisionPoint::new(
                "Patient is alert, pale and diaphoretic, SpO2 93%. Next?",
                vec![
                    Choice::wrong("Apply a non-rebreather at 15 L/min", "Titrate oxygen to 94-99%; high flow is not indicated.")
                        .with_effect(SpO2, 1),
                    Choice::correct("Give oxygen by nasal cannula to SpO2 94%", "Titrated oxygen avoids hyperoxia.")
                        .with_effect(SpO2, 3),
                    Choice::wrong("Withhold oxygen", "The patient is hypoxic.").with_effect(SpO2, -2),
                ],
            ),
            DecisionPoint::new(
                "No allergies, no GI bleed. Which medication?",
                vec![
                    Choice::correct("Aspirin 324 mg chewed", "Aspirin reduces mortality in ACS.")
                        .with_effect(HeartRate, -4),
                    Choice::wrong("Aspirin 81 mg swallowed whole", "Underdosed and slower absorption."),
                    Choice::wrong("No medication until the ED", "Early aspirin is a core intervention."),
                ],
            ),
            DecisionPoint::new(
                "12-lead shows ST elevation in II, III, aVF. Next?",
                vec![
                    Choice::wrong("Give nitroglycerin immediately", "Inferior STEMI may involve the right ventricle; check BP and right-sided leads first.")
                        .with_effect(SystolicBp, -30),
                    Choice::correct("Transmit the ECG and alert the PCI center", "Early activation shortens door-to-balloon time."),
                    Choice::wrong("Repeat the 12-lead in 20 minutes", "Delays reperfusion."),
                ],
            )
            .out_of_scope(CertificationLevel::Basic),
        ],
        &["Titrate oxygen to 94-99%", "Aspirin is chewed, 324 mg", "Inferior STEMI: beware nitrates"],
        &["Routine high-flow oxygen", "Delaying STEMI notification"],
    )
}

fn anaphylaxis() -> Scenario {
    use Vital::*;
    scenario(
        ScenarioId::Anaphylaxis,
        "Bee Sting Anaphylaxis",
        Difficulty::Beginner,
        vitals(&[(HeartRate, 128), (SpO2, 90), (RespiratoryRate, 28), (SystolicBp, 84), (DiastolicBp, 50)]),
        240,
        vec![
            scene_safety(),
            DecisionPoint::new(
                "Hives, stridor and hypotension. First medication?",
                vec![
                    Choice::wrong("Diphenhydramine", "Antihistamines do not treat airway swelling or shock.")
                        .with_effect(SpO2, -3),
                    Choice::correct("Epinephrine 0.5 mg IM, anterolateral thigh", "Epinephrine is first line.")
                        .with_effect(SpO2, 4)
                        .with_effect(SystolicBp, 20),
                    Choice::wrong("Albuterol nebulizer only", "Bronchodilators do not reverse anaphylaxis.")
                        .with_effect(SpO2, -1),
                ],
            )
            .with_time_limit(20),
            DecisionPoint::new(
                "Five minutes later symptoms persist. Next?",
                vec![
                    Choice::correct("Repeat IM epinephrine", "Repeat every 5-15 minutes as needed.")
                        .with_effect(SystolicBp, 10)
                        .with_effect(SpO2, 3),
                    Choice::wrong("Wait for the first dose to work", "Persistent symptoms need another dose.")
                        .with_effect(SpO2, -3),
                ],
            ),
            DecisionPoint::new(
                "Patient is improving. Positioning for transport?",
                vec![
                    Choice::wrong("Sit upright with legs dangling", "Sudden upright posture can precipitate arrest in hypotensive anaphylaxis.")
                        .with_effect(SystolicBp, -15),
                    Choice::correct("Supine with legs elevated, upright only if breathing requires", "Supports preload."),
                ],
            ),
        ],
        &["Epinephrine IM first, repeat as needed", "Antihistamines are adjuncts"],
        &["Waiting on antihistamines", "Sitting a hypotensive patient bolt upright"],
    )
}

fn hypoglycemia() -> Scenario {
    use Vital::*;
    scenario(
        ScenarioId::Hypoglycemia,
        "Confused Diabetic",
        Difficulty::Intermediate,
        vitals(&[(HeartRate, 112), (SpO2, 97), (Gcs, 12), (BloodGlucose, 38)]),
        300,
        vec![
            DecisionPoint::new(
                "Patient is confused and diaphoretic. First assessment?",
                vec![
                    Choice::correct("Check blood glucose", "Always check glucose in altered mental status."),
                    Choice::wrong("Assume intoxication", "Hypoglycemia mimics intoxication."),
                    Choice::wrong("Perform a full secondary survey first", "Treat reversible causes early."),
                ],
            ),
            DecisionPoint::new(
                "Glucose 38 mg/dL, patient cannot protect the airway. Treatment?",
                vec![
                    Choice::wrong("Oral glucose gel", "Aspiration risk in a patient who cannot protect the airway.")
                        .with_effect(SpO2, -4),
                    Choice::correct("IV dextrose 10%", "Titrate D10 and recheck glucose.")
                        .with_effect(BloodGlucose, 80)
                        .with_effect(Gcs, 3),
                    Choice::wrong("Transport and treat at the hospital", "Delay prolongs neuroglycopenia.")
                        .with_effect(Gcs, -1),
                ],
            )
            .out_of_scope(CertificationLevel::Basic),
            DecisionPoint::new(
                "Glucose now 118 mg/dL and patient is alert. Next?",
                vec![
                    Choice::correct("Recheck glucose, give a meal, discuss transport", "Long-acting insulin can cause recurrence."),
                    Choice::wrong("Leave without further assessment", "Recurrence risk is high."),
                ],
            ),
        ],
        &["Glucose check in every altered patient", "No oral glucose without a protected airway"],
        &["Calling it intoxication", "Not rechecking glucose"],
    )
}

fn asthma() -> Scenario {
    use Vital::*;
    scenario(
        ScenarioId::Asthma,
        "Status Asthmaticus",
        Difficulty::Intermediate,
        vitals(&[(HeartRate, 132), (SpO2, 86), (RespiratoryRate, 34)]),
        240,
        vec![
            DecisionPoint::new(
                "Tripod position, diffuse wheezing, SpO2 86%. First?",
                vec![
                    Choice::correct("Oxygen and nebulized albuterol", "Bronchodilate and oxygenate.")
                        .with_effect(SpO2, 5)
                        .with_effect(RespiratoryRate, -4),
                    Choice::wrong("Have the patient lie flat", "Worsens work of breathing.")
                        .with_effect(SpO2, -3),
                    Choice::wrong("Obtain a detailed history first", "Treat the airway first.")
                        .with_effect(SpO2, -2),
                ],
            )
            .with_time_limit(30),
            DecisionPoint::new(
                "Wheezing is now faint and breath sounds are diminished. Interpretation?",
                vec![
                    Choice::wrong("Improvement, wheezing resolved", "A silent chest is an ominous sign.")
                        .with_effect(SpO2, -4),
                    Choice::correct("Worsening obstruction, prepare for assisted ventilation", "Quiet chest means little air movement."),
                ],
            ),
            DecisionPoint::new(
                "Patient is tiring. Next intervention?",
                vec![
                    Choice::correct("BVM-assisted ventilation with slow rate", "Allow time for exhalation.")
                        .with_effect(SpO2, 6),
                    Choice::wrong("Hyperventilate at 30 breaths/min", "Air trapping and barotrauma risk.")
                        .with_effect(SystolicBp, -10)
                        .with_effect(SpO2, -2),
                ],
            ),
        ],
        &["Silent chest is an emergency", "Slow ventilation rate in asthma"],
        &["Mistaking a quiet chest for improvement"],
    )
}

fn opioid_overdose() -> Scenario {
    use Vital::*;
    scenario(
        ScenarioId::OpioidOverdose,
        "Unresponsive in a Restroom",
        Difficulty::Beginner,
        vitals(&[(HeartRate, 58), (SpO2, 78), (RespiratoryRate, 4), (Gcs, 6)]),
        240,
        vec![
            scene_safety(),
            DecisionPoint::new(
                "Respirations 4/min, pinpoint pupils. First action?",
                vec![
                    Choice::correct("Open the airway and ventilate with a BVM", "Oxygenation before reversal.")
                        .with_effect(SpO2, 10),
                    Choice::wrong("Naloxone before any ventilation", "Ventilate first; naloxone takes minutes.")
                        .with_effect(SpO2, -2),
                    Choice::wrong("Sternal rub and wait", "The patient needs ventilation now.")
                        .with_effect(SpO2, -4),
                ],
            )
            .with_time_limit(20),
            DecisionPoint::new(
                "SpO2 improving with ventilation. Next?",
                vec![
                    Choice::correct("Intranasal naloxone, titrated to breathing", "Goal is adequate respirations, not full arousal.")
                        .with_effect(RespiratoryRate, 8)
                        .with_effect(Gcs, 5),
                    Choice::wrong("Maximal naloxone dose IV push", "Abrupt withdrawal and combative patient.")
                        .with_effect(HeartRate, 30),
                ],
            ),
        ],
        &["Ventilate first", "Titrate naloxone to respiratory effort"],
        &["Skipping BVM ventilation"],
    )
}

fn stroke() -> Scenario {
    use Vital::*;
    scenario(
        ScenarioId::Stroke,
        "Sudden Weakness",
        Difficulty::Intermediate,
        vitals(&[(HeartRate, 88), (SpO2, 96), (SystolicBp, 178), (DiastolicBp, 96), (BloodGlucose, 132)]),
        300,
        vec![
            DecisionPoint::new(
                "Right arm drift and slurred speech. Most important history item?",
                vec![
                    Choice::wrong("Medication allergies", "Useful, but not time critical."),
                    Choice::correct("Last known well time", "Determines treatment eligibility."),
                    Choice::wrong("Family history of stroke", "Not decision-changing now."),
                ],
            ),
            DecisionPoint::new(
                "Which condition must be excluded on scene?",
                vec![
                    Choice::correct("Hypoglycemia", "Low glucose is a classic stroke mimic."),
                    Choice::wrong("Hypertension", "Expected in stroke; do not treat prehospital."),
                ],
            ),
            DecisionPoint::new(
                "LKW 45 minutes ago, glucose normal. Destination?",
                vec![
                    Choice::wrong("Closest hospital regardless of capability", "Stroke centers offer thrombolysis and thrombectomy."),
                    Choice::correct("Stroke center with prenotification", "Prenotification shortens door-to-needle time."),
                ],
            ),
        ],
        &["Last known well drives treatment", "Always check glucose"],
        &["Lowering blood pressure in the field"],
    )
}

fn cardiac_arrest() -> Scenario {
    use Vital::*;
    scenario(
        ScenarioId::CardiacArrest,
        "Witnessed VF Arrest",
        Difficulty::Advanced,
        vitals(&[(HeartRate, 20), (SpO2, 70), (SystolicBp, 50), (Gcs, 3)]),
        240,
        vec![
            DecisionPoint::new(
                "Patient is pulseless and apneic. First?",
                vec![
                    Choice::correct("Start high-quality compressions, apply pads", "Minimize time to compressions.")
                        .with_effect(SystolicBp, 20),
                    Choice::wrong("Intubate first", "Compressions and defibrillation take priority."),
                    Choice::wrong("Obtain IV access first", "Delays compressions."),
                ],
            )
            .with_time_limit(15),
            DecisionPoint::new(
                "Monitor shows ventricular fibrillation. Next?",
                vec![
                    Choice::correct("Defibrillate, resume compressions immediately", "Shock then compress, no pulse check.")
                        .with_effect(HeartRate, 40),
                    Choice::wrong("Synchronized cardioversion", "Cannot synchronize to VF."),
                    Choice::wrong("Pulse check before shocking", "Delays defibrillation."),
                ],
            )
            .with_time_limit(20),
            DecisionPoint::new(
                "VF persists after the second shock. Medication?",
                vec![
                    Choice::correct("Epinephrine 1 mg IV/IO", "Epinephrine after the second shock.")
                        .with_effect(SystolicBp, 15),
                    Choice::wrong("Atropine 1 mg", "Not indicated in VF."),
                ],
            ),
            DecisionPoint::new(
                "VF persists after the third shock. Medication?",
                vec![
                    Choice::wrong("Repeat epinephrine immediately", "Epinephrine is every 3-5 minutes."),
                    Choice::correct("Amiodarone 300 mg IV/IO", "Antiarrhythmic for refractory VF.")
                        .with_effect(HeartRate, 60)
                        .with_effect(SpO2, 15),
                ],
            ),
        ],
        &["Compressions and early defibrillation", "Epinephrine every 3-5 min", "Amiodarone for refractory VF"],
        &["Pausing for pulse checks after shocks"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.len(), ScenarioId::all().len());
    }

    #[test]
    fn test_round_trip_names() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>().unwrap(), id);
            assert_eq!(id.build().id, id.name());
        }
        assert!("zombie".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_level_filter() {
        let basic = ScenarioId::for_level(CertificationLevel::Basic);
        assert!(basic.contains(&ScenarioId::ChestPain));
        assert!(!basic.contains(&ScenarioId::CardiacArrest));
        assert_eq!(ScenarioId::for_level(CertificationLevel::Paramedic).len(), ScenarioId::all().len());
    }
}
