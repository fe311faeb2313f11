use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptVariant {
    Primary,
    Simplified,
}

impl PromptVariant {
    pub fn temperature(&self) -> f32 {
        match self {
            PromptVariant::Primary => 0.1,
            PromptVariant::Simplified => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptVariant::Primary => "primary",
            PromptVariant::Simplified => "simplified",
        }
    }
}

/// Payload handed to an [`crate::ExtractionClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub prompt: String,
    pub variant: PromptVariant,
    pub temperature: f32,
}

pub fn build_request(text: &str, variant: PromptVariant, prefix_chars: usize) -> ExtractionRequest {
    let prompt = match variant {
        PromptVariant::Primary => build_extraction_prompt(text),
        PromptVariant::Simplified => build_simplified_prompt(text, prefix_chars),
    };

    ExtractionRequest {
        prompt,
        variant,
        temperature: variant.temperature(),
    }
}

pub fn build_extraction_prompt(chunk_text: &str) -> String {
    format!(
        r#"Extract every bench and every case from the following court cause list.

INSTRUCTIONS:
1. Identify each bench / court sitting (e.g. "COURT NO. 2", "BENCH A", "DIVISION BENCH")
2. List EVERY case under its bench, in the order printed
3. For each case output exactly two fields: "sr_no" and "case_number"
4. Output ONLY valid JSON, nothing else
5. Use the exact schema below

SCHEMA:
{{
  "court_name": "name of the court or list",
  "list_date": "date exactly as printed",
  "benches": [
    {{"bench_number": "2", "bench_name": "COURT NO. 2", "cases": [
      {{"sr_no": "1", "case_number": "WP/100/2025"}}
    ]}}
  ]
}}

EXAMPLE INPUT:
HIGH COURT OF JUDICATURE - CAUSE LIST FOR 06-01-2025
COURT NO. 1
1. WP/100/2025  A vs State
2. CRL.A/55/2024  B vs C
BENCH B
1. FA/7/2023  D vs E

EXAMPLE OUTPUT:
{{"court_name": "HIGH COURT OF JUDICATURE", "list_date": "06-01-2025", "benches": [
  {{"bench_number": "1", "bench_name": "COURT NO. 1", "cases": [
    {{"sr_no": "1", "case_number": "WP/100/2025"}},
    {{"sr_no": "2", "case_number": "CRL.A/55/2024"}}
  ]}},
  {{"bench_number": null, "bench_name": "BENCH B", "cases": [
    {{"sr_no": "1", "case_number": "FA/7/2023"}}
  ]}}
]}}

RULES:
- Use null for "bench_number" when the bench has no printed number
- Do not add party names, advocates, or any other field
- Do not skip, merge, or renumber cases
- If the text contains no cases, output {{"court_name": "", "list_date": "", "benches": []}}
- Output ONLY the JSON object, no markdown, no explanations

TEXT:
{}

JSON OUTPUT:"#,
        chunk_text
    )
}

/// Shorter fallback prompt over a bounded prefix of the text.
pub fn build_simplified_prompt(chunk_text: &str, prefix_chars: usize) -> String {
    format!(
        r#"List the cases in this court cause list as JSON.

Output format:
{{"court_name": "", "list_date": "", "benches": [{{"bench_number": "1", "bench_name": "", "cases": [{{"sr_no": "1", "case_number": ""}}]}}]}}

Only the JSON object. No other text.

TEXT:
{}

JSON OUTPUT:"#,
        truncate_on_line(chunk_text, prefix_chars)
    )
}

/// First `max_chars` characters of `text`, cut back to the last full line when
/// one exists inside the limit.
pub fn truncate_on_line(text: &str, max_chars: usize) -> &str {
    let Some((byte_end, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };

    let prefix = &text[..byte_end];
    match prefix.rfind('\n') {
        Some(pos) if pos > 0 => &prefix[..=pos],
        _ => prefix,
    }
}
