// Prompt templates for rubric extraction and criteria scoring.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::models::Rubric;

/// Rubric extraction prompt template. Replace `{job_posting}` before sending.
pub const RUBRIC_EXTRACTION_PROMPT_TEMPLATE: &str = r#"You are an expert recruiter. Extract a weighted scoring rubric from the job posting below.

Pick 6-10 criteria, only from categories that matter for this role:
- Job Title Match (10-20)
- Experience Years (15-25)
- Seniority Level (5-15)
- Technical Skills (20-35 in total), one criterion per technology, e.g. "Technical Skills - React"
- Soft Skills (5-15)
- Industry Experience (5-15)
- Languages (5-20)
- Location (0-10)
- Education (0-10)

Rules:
- The description MUST state the required level when one applies, e.g. "Senior level, 5+ years".
- is_required = true for must-haves, false for nice-to-haves.
- Criterion names must be unique and specific. Avoid vague names like "Generic" or "Technical Skills".
- Weights should add up to 100.

Return ONLY a JSON object with this exact schema:
{
  "criteria": [
    {
      "name": "Technical Skills - React",
      "weight": 20.0,
      "description": "Advanced React (Senior level, 5+ years)",
      "is_required": true
    }
  ]
}

Job Posting:
{job_posting}"#;

/// Criteria scoring prompt template. Replace `{rubric_text}` and `{cv_profile}` before sending.
pub const CRITERIA_SCORING_PROMPT_TEMPLATE: &str = r#"You are evaluating a candidate against criteria extracted from a job posting.

Score the candidate 0-100 on EACH criterion, relative to what THIS job requires, not in absolute terms.
- 90-100: exceeds the requirement
- 80-89: fully meets
- 60-79: partially meets, notable gaps
- 30-59: does not meet
- 0-29: no evidence at all

Count only professional experience at the level the criterion asks for. Internships and school
projects do not count toward medior or senior requirements.

**Evaluation Criteria:**
{rubric_text}

**Candidate CV:**
{cv_profile}

For EACH criterion return:
1. "criteria_name": the criterion name ONLY, without the "(Weight: ...)" part.
   "Seniority Level (Weight: 15.0%): ..." -> "Seniority Level"
2. "score": number between 0 and 100
3. "evidence": specific evidence from the CV (quote or paraphrase). Never leave it empty.
4. "gap": what is missing when score < 80, otherwise "".

Return ONLY a JSON object with this exact schema:
{
  "criteria_scores": [
    {"criteria_name": "Seniority Level", "score": 75, "evidence": "...", "gap": "..."}
  ]
}"#;

pub fn build_rubric_prompt(job_posting: &str) -> String {
    RUBRIC_EXTRACTION_PROMPT_TEMPLATE.replace("{job_posting}", job_posting)
}

pub fn build_scoring_prompt(rubric: &Rubric, cv_profile: &str) -> String {
    CRITERIA_SCORING_PROMPT_TEMPLATE
        .replace("{rubric_text}", &rubric.summary())
        .replace("{cv_profile}", cv_profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Criterion;

    #[test]
    fn test_rubric_prompt_embeds_posting() {
        let prompt = build_rubric_prompt("Senior Rust Engineer, Berlin");
        assert!(prompt.ends_with("Senior Rust Engineer, Berlin"));
        assert!(!prompt.contains("{job_posting}"));
    }

    #[test]
    fn test_scoring_prompt_lists_annotated_criteria() {
        let rubric = Rubric::normalized(vec![Criterion {
            name: "Seniority Level".to_string(),
            weight: 15.0,
            description: "Team lead experience".to_string(),
            is_required: true,
        }])
        .unwrap();
        let prompt = build_scoring_prompt(&rubric, "8 years leading platform teams");
        assert!(prompt.contains("- Seniority Level (Weight: 100.0%): Team lead experience"));
        assert!(prompt.contains("8 years leading platform teams"));
        assert!(!prompt.contains("{rubric_text}"));
        assert!(!prompt.contains("{cv_profile}"));
    }
}
