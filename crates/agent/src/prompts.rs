//! Prompt text and tool schemas for the advisor.
//!
//! The system prompt carries the six-step guidance framework; the user prompt
//! is rebuilt every turn from the conversation window and the profile JSON.
//! The model is contractually asked for a JSON envelope
//! (`next_responses` + `updated_user_info_state`) which `runtime::parse_reply`
//! decodes.

use serde_json::{json, Value};

use tia_core::profile::CustomerProfile;

pub const ADVISOR_SYSTEM: &str = r#"You are TIA, a proactive and energetic assistant who helps Indian customers understand term insurance and settle on the right term policy. You only advise on term insurance; politely decline other products.

Be proactive: suggest first, then ask for the customer's view. Educate as you go: term insurance is pure protection - a yearly premium in exchange for a lump sum (for example Rs. 1-10 Crores) paid to the family if the policyholder dies during the term, with no maturity value.

Follow this framework to keep the conversation on track:

Step 1: Basic profile and education - learn name, age, gender; explain what term insurance is and why it matters.
Step 2: Policy term - aim for cover until age 60-70, when dependents typically stop relying on the customer's income; going past 70 spikes premiums.
Step 3: Coverage amount - the cover should replace income. Rule of thumb: (annual income x years to retirement) + liabilities + financial goals - existing savings. Gather annual income, liabilities, goals, savings, and family situation conversationally, not as a questionnaire.
Step 4: Riders - explain Critical Illness cover and Accidental Death benefit; judge from the customer's situation whether they are worth adding.
Step 5: Shortlisting - once term and coverage are decided, proactively fetch and recommend plans. Be transparent about the priority factors you apply: insurer metrics (claim settlement ratio, amount settlement ratio, complaints volume) and affordability.
Step 6: Finalising - share full plan details including the plan link for purchase, thank the customer, and close warmly.

Use the provided tools only when you have enough inputs to query with. Update user_info_state with information the customer has explicitly given; never fill a field from guesswork.

Return your reply strictly as JSON parseable by a standard parser:

{
  "next_responses": ["...", "..."],
  "updated_user_info_state": { ... }
}

Keep each response short, friendly, and WhatsApp-ready, and ask exactly one question at a time."#;

/// Per-turn user prompt: the rendered recent transcript plus the current
/// profile record.
pub fn build_user_prompt(transcript: &str, profile: &CustomerProfile) -> String {
    let profile_json =
        serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Recent conversation between you and the customer:\n\n{transcript}\n\n\
         Information collected about the customer so far:\n\n{profile_json}\n\n\
         Trigger tools proactively if the collected information supports a useful lookup.\n\
         Then answer in the required JSON envelope."
    )
}

/// Function schemas advertised to the model, one per catalog operation.
pub fn tool_schemas() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "basic_plan_and_premium_lookup",
                "description": "Retrieve annual premiums of eligible plans for a customer given age, term (years), coverage_amount, and income. Checks plan eligibility and the required minimum income.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "age": {"type": "integer", "description": "Customer's current age in whole years."},
                        "term": {"type": "integer", "description": "Desired policy term in years."},
                        "coverage_amount": {"type": "integer", "description": "Desired coverage in rupees (e.g. 10000000 for 1 Cr)."},
                        "income": {"type": "integer", "description": "Customer's annual income in rupees."}
                    },
                    "required": ["age", "term", "coverage_amount", "income"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_recommended_plans_based_on_priority_factors",
                "description": "Rank eligible plans by ordered priority factors: 'premium' (lowest price), 'csr' (claim settlement ratio), 'asr' (amount settlement ratio), 'complaints' (low complaints volume). Returns the top ranked plans.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "age": {"type": "integer"},
                        "term": {"type": "integer"},
                        "coverage_amount": {"type": "integer"},
                        "income": {"type": "integer"},
                        "priority_factors": {
                            "type": "array",
                            "items": {"type": "string", "enum": ["premium", "csr", "asr", "complaints"]},
                            "description": "Factors in priority order, most important first."
                        }
                    },
                    "required": ["age", "term", "coverage_amount", "income", "priority_factors"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "list_insurers_and_metrics",
                "description": "List every insurer with its claim settlement ratio, amount settlement ratio, and complaints volume.",
                "parameters": {"type": "object", "properties": {}}
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_insurer_details",
                "description": "Fetch one insurer's metrics by name; tolerant of partial or colloquial names.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "insurer_name": {"type": "string", "description": "Name or partial name of the insurer."}
                    },
                    "required": ["insurer_name"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_plan_details",
                "description": "Fetch one plan's details (insurer metrics, riders, purchase link) by name; tolerant of partial names.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "plan_name": {"type": "string", "description": "Name or partial name of the plan."}
                    },
                    "required": ["plan_name"]
                }
            }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_cover_all_five_tools() {
        let schemas = tool_schemas();
        let names: Vec<&str> = schemas
            .as_array()
            .expect("array")
            .iter()
            .map(|tool| tool["function"]["name"].as_str().expect("name"))
            .collect();
        assert_eq!(
            names,
            vec![
                "basic_plan_and_premium_lookup",
                "get_recommended_plans_based_on_priority_factors",
                "list_insurers_and_metrics",
                "get_insurer_details",
                "get_plan_details",
            ]
        );
    }

    #[test]
    fn user_prompt_embeds_transcript_and_profile() {
        let mut profile = CustomerProfile::default();
        profile.name = Some("Ravi".to_string());
        let prompt = build_user_prompt("Customer: hi", &profile);
        assert!(prompt.contains("Customer: hi"));
        assert!(prompt.contains("\"Ravi\""));
    }
}
