// Prompt template for the ATS analysis call.

use crate::analysis::models::AnalysisSettings;

/// Minimum list sizes the prompt asks for. Shortfalls are warnings, not errors.
pub const MIN_MISSING_KEYWORDS: usize = 5;
pub const EXPECTED_SKILL_GAPS: usize = 3;
pub const EXPECTED_SUGGESTIONS: usize = 3;

/// Builds the analysis prompt. Pure; inputs are interpolated verbatim in a
/// single pass, so placeholder-like text inside them is never re-expanded.
pub fn build_prompt(resume_text: &str, job_description: &str, settings: AnalysisSettings) -> String {
    format!(
        r#"Act as a highly experienced ATS (Applicant Tracking System) specialist with deep knowledge of
{industry} industry roles. Analyze this resume against the job description and provide detailed feedback.

Resume: {resume_text}
Job Description: {job_description}

Return ONLY a JSON object in this EXACT format:
{{
  "score": "X/100",
  "missing_keywords": ["keyword1", "keyword2"],
  "existing_keywords": ["keyword3", "keyword4"],
  "skill_gaps": ["skill1", "skill2"],
  "summary": "Detailed analysis summary...",
  "suggestions": [
    "Suggestion 1...",
    "Suggestion 2..."
  ],
  "salary_estimation": {{
    "min": "X",
    "max": "Y",
    "currency": "USD",
    "notes": "Salary estimation based on skills and industry standards."
  }}
}}

Important:
1. Score is an integer from 0 to 100 reflecting the overall match percentage, written as "X/100"
2. List at least {min_missing} missing keywords from the job description
3. Identify {skill_gaps} key skill gaps
4. Provide {suggestions} actionable suggestions
5. Estimate a salary range based on skills and industry standards
6. {depth_instruction}
7. Never use markdown formatting and never add text outside the JSON object
"#,
        industry = settings.industry,
        min_missing = MIN_MISSING_KEYWORDS,
        skill_gaps = EXPECTED_SKILL_GAPS,
        suggestions = EXPECTED_SUGGESTIONS,
        depth_instruction = settings.depth.instruction(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::{AnalysisDepth, Industry};

    #[test]
    fn test_prompt_contains_inputs_and_schema() {
        let prompt = build_prompt(
            "Experienced Python engineer",
            "Looking for a senior backend engineer with Go and Kubernetes experience",
            AnalysisSettings::default(),
        );
        assert!(prompt.contains("Resume: Experienced Python engineer"));
        assert!(prompt.contains("Job Description: Looking for a senior backend engineer"));
        for field in [
            "\"score\"",
            "\"missing_keywords\"",
            "\"existing_keywords\"",
            "\"skill_gaps\"",
            "\"summary\"",
            "\"suggestions\"",
            "\"salary_estimation\"",
            "\"currency\"",
        ] {
            assert!(prompt.contains(field), "prompt lacks {field}");
        }
        assert!(prompt.contains("at least 5 missing keywords"));
        assert!(prompt.contains("3 key skill gaps"));
        assert!(prompt.contains("3 actionable suggestions"));
        assert!(prompt.contains("Never use markdown formatting"));
    }

    #[test]
    fn test_empty_inputs_pass_through() {
        let prompt = build_prompt("", "", AnalysisSettings::default());
        assert!(prompt.contains("Resume: \nJob Description: \n"));
    }

    #[test]
    fn test_placeholders_in_inputs_are_not_expanded() {
        let prompt = build_prompt("{job_description}", "{resume_text}", AnalysisSettings::default());
        assert!(prompt.contains("Resume: {job_description}"));
        assert!(prompt.contains("Job Description: {resume_text}"));
    }

    #[test]
    fn test_settings_shape_prompt() {
        let prompt = build_prompt(
            "resume",
            "jd",
            AnalysisSettings {
                depth: AnalysisDepth::Detailed,
                industry: Industry::Finance,
            },
        );
        assert!(prompt.contains("Finance industry roles"));
        assert!(prompt.contains(AnalysisDepth::Detailed.instruction()));
    }
}
