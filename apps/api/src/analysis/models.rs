use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Match score, always within 0..=100. Serialized as `"N/100"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    /// Clamps `value` into 0..=100. Returns the score and whether clamping happened.
    pub fn clamped(value: i64) -> (Self, bool) {
        let clamped = value.clamp(0, Self::MAX as i64);
        (Score(clamped as u8), clamped != value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Fraction of a full match, for progress indicators.
    pub fn progress(self) -> f32 {
        self.0 as f32 / Self::MAX as f32
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryEstimation {
    pub min: String,
    pub max: String,
    pub currency: String,
    pub notes: String,
}

impl SalaryEstimation {
    /// `<min> - <max> <currency>`
    pub fn range_line(&self) -> String {
        format!("{} - {} {}", self.min, self.max, self.currency)
    }
}

/// The validated analysis returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub score: Score,
    pub missing_keywords: Vec<String>,
    pub existing_keywords: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub summary: String,
    pub suggestions: Vec<String>,
    pub salary_estimation: SalaryEstimation,
}

/// Non-fatal findings from validating model output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    ScoreClamped { raw: String, clamped_to: u8 },
    ScoreUnparsable { raw: String },
    FewerThanExpected {
        field: String,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::ScoreClamped { raw, clamped_to } => {
                write!(f, "score '{raw}' was out of range and clamped to {clamped_to}")
            }
            ValidationWarning::ScoreUnparsable { raw } => {
                write!(f, "score '{raw}' could not be read and was set to 0")
            }
            ValidationWarning::FewerThanExpected {
                field,
                expected,
                actual,
            } => write!(f, "{field}: expected at least {expected}, got {actual}"),
        }
    }
}

/// Output of schema validation: the result plus anything worth flagging.
#[derive(Debug, Clone)]
pub struct ValidatedAnalysis {
    pub result: AnalysisResult,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisDepth {
    Basic,
    #[default]
    Standard,
    Detailed,
}

impl AnalysisDepth {
    pub fn instruction(self) -> &'static str {
        match self {
            AnalysisDepth::Basic => "Keep the summary to two or three sentences.",
            AnalysisDepth::Standard => "Write a focused summary of one short paragraph.",
            AnalysisDepth::Detailed => {
                "Write a thorough summary covering strengths, weaknesses and fit for seniority."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Industry {
    #[default]
    Tech,
    Finance,
    Healthcare,
    Manufacturing,
}

/// Knobs the user can set alongside the documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub depth: AnalysisDepth,
    pub industry: Industry,
}

impl std::str::FromStr for AnalysisDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AnalysisDepth::Basic),
            "standard" => Ok(AnalysisDepth::Standard),
            "detailed" => Ok(AnalysisDepth::Detailed),
            other => Err(format!("unknown analysis depth '{other}'")),
        }
    }
}

impl std::str::FromStr for Industry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tech" => Ok(Industry::Tech),
            "finance" => Ok(Industry::Finance),
            "healthcare" => Ok(Industry::Healthcare),
            "manufacturing" => Ok(Industry::Manufacturing),
            other => Err(format!("unknown industry '{other}'")),
        }
    }
}

impl fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
