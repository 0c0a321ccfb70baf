//! Plain-text prediction report in English or Hindi.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::service::Prediction;

/// Report language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "hindi" | "hi" => Ok(Self::Hindi),
            other => Err(format!("unknown language \"{other}\" (expected english or hindi)")),
        }
    }
}

struct Texts {
    title: &'static str,
    description: &'static str,
    asthma: &'static str,
    no_asthma: &'static str,
}

impl Language {
    fn texts(self) -> Texts {
        match self {
            Self::English => Texts {
                title: "Asthma Risk Prediction",
                description: "Health parameters used to check the risk of asthma.",
                asthma: "Asthma Detected. Please consult a doctor.",
                no_asthma: "No Asthma Detected. Keep up the healthy lifestyle!",
            },
            Self::Hindi => Texts {
                title: "दमा जोखिम पूर्वानुमान",
                description: "दमा के जोखिम की जांच के लिए निम्नलिखित स्वास्थ्य पैरामीटर भरें।",
                asthma: "दमा का जोखिम पाया गया। कृपया डॉक्टर से संपर्क करें।",
                no_asthma: "कोई दमा नहीं पाया गया। स्वस्थ जीवनशैली बनाए रखें!",
            },
        }
    }
}

const ASTHMA_SUGGESTIONS: [&str; 4] = [
    "Improve air quality",
    "Sleep better",
    "Eat healthy",
    "Be active",
];
const HEALTHY_SUGGESTIONS: [&str; 3] = ["Keep it up!", "Avoid pollution", "Maintain rest routines"];

/// Display label for a survey feature; unknown names are shown as-is.
fn pretty_label(feature: &str) -> String {
    match feature {
        "Age" => "Age (years)".into(),
        "PollutionExposure" => "Pollution Exposure (0-9)".into(),
        "PollenExposure" => "Pollen Exposure (0-9)".into(),
        "SleepQuality" => "Sleep Quality (0-9)".into(),
        "PhysicalActivity" => "Physical Activity (0-9)".into(),
        "DustExposure" => "Dust Exposure (0-9)".into(),
        "DietQuality" => "Diet Quality (0-9)".into(),
        other => other.into(),
    }
}

/// A rendered-on-demand prediction report.
///
/// `Display` produces the document: title, one line per parameter, class
/// probabilities as percentages, the verdict and lifestyle suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    language: Language,
    parameters: Vec<(String, f64)>,
    prediction: usize,
    probabilities: Vec<f64>,
}

impl Report {
    /// `features` and `values` must be parallel.
    #[must_use]
    pub fn new(language: Language, features: &[String], values: &[f64], prediction: &Prediction) -> Self {
        Self {
            language,
            parameters: features.iter().cloned().zip(values.iter().copied()).collect(),
            prediction: prediction.prediction,
            probabilities: prediction.probabilities.clone(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let texts = self.language.texts();
        writeln!(f, "{}", texts.title)?;
        writeln!(f, "{}", "=".repeat(texts.title.chars().count()))?;
        writeln!(f, "{}", texts.description)?;
        writeln!(f)?;
        for (name, value) in &self.parameters {
            writeln!(f, "{}: {value}", pretty_label(name))?;
        }
        writeln!(f)?;
        writeln!(f, "Prediction Probability")?;
        for (class, name) in ["No Asthma", "Asthma"].iter().enumerate() {
            let p = self.probabilities.get(class).copied().unwrap_or(0.0);
            writeln!(f, "  {name}: {:.2}%", p * 100.0)?;
        }
        writeln!(f)?;
        let asthma = self.prediction == 1;
        writeln!(f, "Prediction: {}", if asthma { "Asthma" } else { "No Asthma" })?;
        writeln!(f, "{}", if asthma { texts.asthma } else { texts.no_asthma })?;
        writeln!(f)?;
        writeln!(f, "Lifestyle Suggestions")?;
        let suggestions: &[&str] = if asthma {
            &ASTHMA_SUGGESTIONS
        } else {
            &HEALTHY_SUGGESTIONS
        };
        for s in suggestions {
            writeln!(f, "  - {s}")?;
        }
        Ok(())
    }
}
