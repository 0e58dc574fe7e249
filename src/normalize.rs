//! Indicator-name normalization.
//!
//! Feeds spell the same indicator a dozen ways ("TB-Cases", "tuberculosis",
//! "new tb"), and every aggregation downstream groups by the name, so the
//! variants must collapse to one canonical label before anything counts them.

/// Synonym table, checked in order; first exact or substring hit wins.
/// Canonical forms appear as their own keys so normalization is idempotent.
const INDICATOR_MAPPING: &[(&str, &str)] = &[
    // Malaria
    ("malaria", "New Malaria Cases"),
    ("new malaria", "New Malaria Cases"),
    ("malaria cases", "New Malaria Cases"),
    ("new malaria cases", "New Malaria Cases"),
    ("malaria identified", "New Malaria Cases"),
    ("new malaria cases identified", "New Malaria Cases"),
    // Dengue
    ("dengue", "Dengue Cases"),
    ("dengue cases", "Dengue Cases"),
    ("dengue fever", "Dengue Cases"),
    ("new dengue", "Dengue Cases"),
    // Tuberculosis
    ("tb", "Tuberculosis Cases"),
    ("tuberculosis", "Tuberculosis Cases"),
    ("new tb", "Tuberculosis Cases"),
    ("tb cases", "Tuberculosis Cases"),
    ("tuberculosis cases", "Tuberculosis Cases"),
    // Diarrhea
    ("diarrhea", "Diarrhea Cases"),
    ("diarrhoea", "Diarrhea Cases"),
    ("diarrheal", "Diarrhea Cases"),
    ("acute diarrhea", "Diarrhea Cases"),
    // HIV
    ("hiv", "HIV Cases"),
    ("hiv positive", "HIV Cases"),
    ("new hiv", "HIV Cases"),
    // Hepatitis
    ("hepatitis", "Hepatitis Cases"),
    ("hepatitis a", "Hepatitis Cases"),
    ("hepatitis b", "Hepatitis Cases"),
    ("hepatitis c", "Hepatitis Cases"),
    // Measles
    ("measles", "Measles Cases"),
    ("measles cases", "Measles Cases"),
    ("new measles", "Measles Cases"),
    // Pneumonia
    ("pneumonia", "Pneumonia Cases"),
    ("pneumonia cases", "Pneumonia Cases"),
    ("acute pneumonia", "Pneumonia Cases"),
    // Encephalitis
    ("encephalitis", "Encephalitis Cases"),
    ("viral encephalitis", "Encephalitis Cases"),
    // Cholera
    ("cholera", "Cholera Cases"),
    ("acute cholera", "Cholera Cases"),
    ("cholera cases", "Cholera Cases"),
    // Influenza
    ("influenza", "Influenza Cases"),
    ("flu", "Influenza Cases"),
    ("seasonal flu", "Influenza Cases"),
    ("influenza like illness", "Influenza Cases"),
    // Mortality
    ("maternal death", "Maternal Mortality"),
    ("maternal deaths", "Maternal Mortality"),
    ("maternal mortality", "Maternal Mortality"),
    ("neonatal death", "Neonatal Mortality"),
    ("neonatal deaths", "Neonatal Mortality"),
    ("neonatal mortality", "Neonatal Mortality"),
    ("death", "Deaths"),
    ("deaths", "Deaths"),
    // Low birth weight
    ("low birth weight", "Low Birth Weight"),
    ("lbw", "Low Birth Weight"),
    // Hypertension
    ("hypertension", "Hypertension Cases"),
    ("high blood pressure", "Hypertension Cases"),
];

/// Fallback for names the table misses: first recognizable disease keyword
/// decides the canonical label.
const DISEASE_KEYWORDS: &[&str] = &[
    "malaria",
    "dengue",
    "tuberculosis",
    "tb",
    "diarrhea",
    "hiv",
    "hepatitis",
    "measles",
    "pneumonia",
    "encephalitis",
    "cholera",
    "influenza",
    "flu",
    "death",
    "mortality",
];

/// Lowercase, turn hyphen/underscore runs into spaces, collapse whitespace.
fn fold(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    let mut pending_space = false;
    for ch in name.trim().chars() {
        if ch == '-' || ch == '_' || ch.is_whitespace() {
            pending_space = !folded.is_empty();
        } else {
            if pending_space {
                folded.push(' ');
                pending_space = false;
            }
            for lower in ch.to_lowercase() {
                folded.push(lower);
            }
        }
    }
    folded
}

fn capitalize(word: &str) -> String {
    match word {
        "tb" => "TB".to_string(),
        "hiv" => "HIV".to_string(),
        _ => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

/// Map a free-text indicator name to its canonical form. Total function:
/// unmatched names come back trimmed but otherwise untouched.
pub fn normalize(name: &str) -> String {
    let folded = fold(name);
    if folded.is_empty() {
        return "Unknown".to_string();
    }

    for (key, canonical) in INDICATOR_MAPPING {
        if folded == *key || folded.contains(key) {
            return (*canonical).to_string();
        }
    }

    for keyword in DISEASE_KEYWORDS {
        if folded.contains(keyword) {
            if folded.contains("death") || folded.contains("mortality") {
                return "Deaths".to_string();
            }
            return format!("{} Cases", capitalize(keyword));
        }
    }

    name.trim().to_string()
}
