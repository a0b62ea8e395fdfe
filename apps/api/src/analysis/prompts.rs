// Prompt text for resume screening.
// The document texts are spliced between the fixed fragments below in a single
// pass, so placeholder-looking text inside a document is never re-expanded.

use std::fmt;

/// Marker the model is asked to put before its structured answer.
/// The result parser prefers JSON blocks that follow it.
pub const OUTPUT_MARKER: &str = "[OUTPUT]";

const TASK_PREAMBLE: &str = r#"Analyze the resume to identify and categorize details into sections such as Headline, Work Experience, Education, Awards/Certifications, Technical Skills, and Areas of Expertise. Compare these details against the job requirements specified in the provided job description. Calculate a match percentage for each of the following categories: Technical Skills, Soft Skills, and Relevant Experience, based on the degree of alignment between the resume content and job specifications. Extract and list matched items within each category to demonstrate how well the resume aligns with the job criteria. Highlight both the matches and the overall suitability score so the result can be used for resume screening and candidate assessment.
---

[FORMAT]
Follow the following format:

[INPUT]
resume: The user's complete resume document
job_description: The complete job description for which the resume is being evaluated

[OUTPUT]
keywords: Extracted categories from the resume: Headline, Work Experience, Education, Awards/Certifications, Technical Skills, Areas of Expertise
skills_experience_match: Matching skills and experiences between the resume and job description, per category, with the matched items and a short explanation
percentage_scores: Percentage scores for each category, evaluating the resume against the job description

---
Use the following formulas to compute the match percentages:

Technical Skills Score (T)
T = (Matched Technical Skills / Total Required Technical Skills) * 100

Soft Skills Score (S)
S = (Matched Soft Skills / Total Required Soft Skills) * 100

Relevant Experience Score (E)
E = (Matched Experience Keywords / Total Experience Keywords) * 100

Overall Match Score (M)
M = (0.4 * T) + (0.3 * S) + (0.3 * E)

---

For the given inputs, first generate your reasoning and then generate the outputs.

[INPUT]
resume: "#;

const JOB_DESCRIPTION_LABEL: &str = "\njob_description: ";

const OUTPUT_INSTRUCTIONS: &str = r#"

[REASONING]
my_reasoning: <Your careful and step-by-step reasoning before you return the desired outputs for the given inputs>

[OUTPUT]
Return the outputs as a single JSON object in one fenced code block labeled json, using exactly these three top-level keys. Scores are numbers between 0 and 100 without a percent sign.

```json
{
  "keywords": {
    "Headline": "Senior Backend Engineer",
    "Work Experience": ["Backend Engineer, Acme Corp (2019-2024)"],
    "Education": ["B.Sc. Computer Science, State University"],
    "Awards/Certifications": ["AWS Certified Solutions Architect"],
    "Technical Skills": ["Rust", "PostgreSQL", "Kubernetes"],
    "Areas of Expertise": ["Distributed systems"]
  },
  "skills_experience_match": {
    "Technical Skills": {
      "matched_items": ["Rust", "PostgreSQL"],
      "explanation": "2 of 3 required technical skills are present."
    },
    "Soft Skills": {
      "matched_items": ["Mentoring"],
      "explanation": "1 of 2 required soft skills are present."
    },
    "Relevant Experience": {
      "matched_items": ["5 years backend development"],
      "explanation": "Experience level matches the role."
    }
  },
  "percentage_scores": {
    "Technical Skills Match": 66.7,
    "Soft Skills Match": 50.0,
    "Relevant Experience Match": 100.0,
    "Overall Suitability Score": 71.7
  }
}
```"#;

/// A fully assembled instruction prompt for one resume / job-description pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt(String);

impl AnalysisPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalysisPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Embeds both documents verbatim into the screening instructions.
pub fn build_prompt(resume_text: &str, job_text: &str) -> AnalysisPrompt {
    let mut prompt = String::with_capacity(
        TASK_PREAMBLE.len()
            + resume_text.len()
            + JOB_DESCRIPTION_LABEL.len()
            + job_text.len()
            + OUTPUT_INSTRUCTIONS.len(),
    );
    prompt.push_str(TASK_PREAMBLE);
    prompt.push_str(resume_text);
    prompt.push_str(JOB_DESCRIPTION_LABEL);
    prompt.push_str(job_text);
    prompt.push_str(OUTPUT_INSTRUCTIONS);
    AnalysisPrompt(prompt)
}
