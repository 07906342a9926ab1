use serde::Deserialize;
use std::collections::BTreeMap;

/// Parsed analysis response.
///
/// One shape serves every endpoint: similarity replies carry a score with
/// feedback and detail lines, pitch replies add the contour and note
/// distribution, timbre replies add spectral traits. Anything the server
/// omits stays `None`/empty and the renderer falls back to defaults, so a
/// partially-populated payload can never fail to display.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisReport {
    #[serde(default, alias = "accuracy")]
    pub score: Option<f64>,
    /// Pitch endpoint reports accuracy as a 0..1 fraction.
    #[serde(default)]
    pub pitch_accuracy: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub details: Option<Vec<String>>,

    // Pitch payload
    #[serde(default)]
    pub pitches: Vec<f64>,
    #[serde(default)]
    pub note_distribution: BTreeMap<String, f64>,
    #[serde(default)]
    pub mean_pitch: Option<f64>,
    #[serde(default)]
    pub vibrato_rate: Option<f64>,

    // Timbre payload
    #[serde(default)]
    pub formants: Vec<f64>,
    #[serde(default)]
    pub brightness: Option<f64>,
    #[serde(default)]
    pub richness: Option<f64>,
    #[serde(default)]
    pub hnr: Option<f64>,
    #[serde(default)]
    pub voice_type: Option<String>,
}

impl AnalysisReport {
    /// The 0..100 score used for banding, if the payload carries one.
    ///
    /// Fractional pitch accuracy is normalized so one band mapping serves
    /// every endpoint.
    pub fn display_score(&self) -> Option<f64> {
        self.score.or_else(|| {
            self.pitch_accuracy
                .map(|a| if a <= 1.0 { a * 100.0 } else { a })
        })
    }

    pub fn band(&self) -> Option<Band> {
        self.display_score().map(Band::from_score)
    }
}

/// Qualitative classification of a numeric score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Excellent,
    Good,
    Partial,
    Low,
}

impl Band {
    pub fn from_score(score: f64) -> Self {
        if score > 85.0 {
            Band::Excellent
        } else if score > 70.0 {
            Band::Good
        } else if score > 50.0 {
            Band::Partial
        } else {
            Band::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Band::Excellent => "excellent",
            Band::Good => "good",
            Band::Partial => "partial",
            Band::Low => "low",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Band::Excellent => "★",
            Band::Good => "✔",
            Band::Partial => "◐",
            Band::Low => "✖",
        }
    }

    /// Feedback text when the server supplied none.
    pub fn default_feedback(self) -> &'static str {
        match self {
            Band::Excellent => "An excellent match.",
            Band::Good => "A good match.",
            Band::Partial => "A partial match.",
            Band::Low => "Not much of a match.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries_are_exact() {
        let cases = [
            (0.0, Band::Low),
            (50.0, Band::Low),
            (51.0, Band::Partial),
            (70.0, Band::Partial),
            (71.0, Band::Good),
            (85.0, Band::Good),
            (86.0, Band::Excellent),
            (100.0, Band::Excellent),
        ];
        for (score, expected) in cases {
            assert_eq!(Band::from_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_fractional_pitch_accuracy_is_normalized() {
        let report: AnalysisReport =
            serde_json::from_str(r#"{"pitch_accuracy": 0.85, "pitches": [220.0]}"#).unwrap();
        assert_eq!(report.display_score(), Some(85.0));
        assert_eq!(report.band(), Some(Band::Good));
    }

    #[test]
    fn test_accuracy_alias_maps_to_score() {
        let report: AnalysisReport = serde_json::from_str(r#"{"accuracy": 92}"#).unwrap();
        assert_eq!(report.display_score(), Some(92.0));
        assert_eq!(report.band(), Some(Band::Excellent));
    }

    #[test]
    fn test_partial_payload_deserializes() {
        let report: AnalysisReport = serde_json::from_str(r#"{"score": 42.5}"#).unwrap();
        assert!(report.title.is_none());
        assert!(report.feedback.is_none());
        assert!(report.details.is_none());
        assert!(report.pitches.is_empty());
        assert_eq!(report.band(), Some(Band::Low));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let report: AnalysisReport =
            serde_json::from_str(r#"{"status": "success", "score": 92, "feedback": "Nice"}"#)
                .unwrap();
        assert_eq!(report.display_score(), Some(92.0));
        assert_eq!(report.feedback.as_deref(), Some("Nice"));
    }

    #[test]
    fn test_scoreless_payload_has_no_band() {
        let report: AnalysisReport =
            serde_json::from_str(r#"{"voice_type": "lyric baritone"}"#).unwrap();
        assert!(report.band().is_none());
    }
}
