//! Wildlife species roster.
//!
//! The detector is trained on five species commonly reported around farms.
//! A wildlife frame raises an alert only when one of its labels names a
//! roster species. Matching ignores ASCII case.

use serde::Serialize;

/// Reference information shown to clients alongside a wildlife alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesInfo {
    /// Label emitted by the detector.
    pub code: &'static str,
    pub korean_name: &'static str,
    pub common_name: &'static str,
    pub scientific_name: &'static str,
    pub description: &'static str,
    /// What to do when the animal is spotted.
    pub guidance: &'static str,
}

/// Species codes the detector reports, in class-index order.
pub static WILDLIFE_ROSTER: &[SpeciesInfo] = &[
    SpeciesInfo {
        code: "Gorani",
        korean_name: "고라니",
        common_name: "Water deer",
        scientific_name: "Hydropotes inermis",
        description: "Small tusked deer that grazes field edges at dawn and dusk.",
        guidance: "Keep distance and let it leave; check fences for gaps.",
    },
    SpeciesInfo {
        code: "Metdwaeji",
        korean_name: "멧돼지",
        common_name: "Wild boar",
        scientific_name: "Sus scrofa",
        description: "Large omnivore that roots up crops and can charge when cornered.",
        guidance: "Do not approach. Move indoors and report to local authorities.",
    },
    SpeciesInfo {
        code: "Neoguri",
        korean_name: "너구리",
        common_name: "Raccoon dog",
        scientific_name: "Nyctereutes procyonoides",
        description: "Nocturnal canid that raids feed and may carry rabies.",
        guidance: "Secure feed and avoid contact with pets.",
    },
    SpeciesInfo {
        code: "Meottokki",
        korean_name: "멧토끼",
        common_name: "Korean hare",
        scientific_name: "Lepus coreanus",
        description: "Hare that feeds on young shoots and bark.",
        guidance: "Protect seedlings with netting.",
    },
    SpeciesInfo {
        code: "Noru",
        korean_name: "노루",
        common_name: "Siberian roe deer",
        scientific_name: "Capreolus pygargus",
        description: "Medium deer that browses crops and crosses roads at night.",
        guidance: "Keep distance and drive slowly near the field.",
    },
];

/// Look up a roster species by detector label.
pub fn lookup(label: &str) -> Option<&'static SpeciesInfo> {
    WILDLIFE_ROSTER
        .iter()
        .find(|s| s.code.eq_ignore_ascii_case(label.trim()))
}

/// Roster species named by `labels`, in label order, without duplicates.
pub fn matching(labels: &[String]) -> Vec<&'static SpeciesInfo> {
    let mut found: Vec<&'static SpeciesInfo> = Vec::new();
    for label in labels {
        if let Some(info) = lookup(label) {
            if !found.iter().any(|f| f.code == info.code) {
                found.push(info);
            }
        }
    }
    found
}

/// Wildlife details surfaced with a `wildlife_alert` status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WildlifeSighting {
    pub detected_animals: Vec<String>,
    pub animal_info: Vec<&'static SpeciesInfo>,
}

impl WildlifeSighting {
    pub fn from_labels(labels: &[String]) -> Self {
        let animal_info = matching(labels);
        Self {
            detected_animals: animal_info.iter().map(|s| s.code.to_string()).collect(),
            animal_info,
        }
    }
}
