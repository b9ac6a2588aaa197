use serde::{Deserialize, Deserializer, Serialize};

/// The structured record of everything the advisor has learned about one
/// customer. Owned by a session, serialized into every prompt, and updated
/// through [`CustomerProfile::apply`] only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub family_situation: Option<String>,
    pub annual_income: Option<i64>,
    pub liabilities: Option<i64>,
    pub financial_goals: Option<Vec<String>>,
    pub existing_savings_investments: Option<i64>,
    pub decided_coverage_amount: Option<i64>,
    pub decided_term: Option<i64>,
    #[serde(default = "default_framework_step")]
    pub framework_step: u32,
    pub additional_notes: Option<String>,
    /// Incremented once per applied update; lets callers detect staleness.
    #[serde(default)]
    pub version: u64,
}

fn default_framework_step() -> u32 {
    1
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self {
            name: None,
            age: None,
            gender: None,
            family_situation: None,
            annual_income: None,
            liabilities: None,
            financial_goals: None,
            existing_savings_investments: None,
            decided_coverage_amount: None,
            decided_term: None,
            framework_step: default_framework_step(),
            additional_notes: None,
            version: 0,
        }
    }
}

/// A partial profile as returned by the model. Absent fields leave the
/// current value untouched; a merge never clears anything.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub family_situation: Option<String>,
    pub annual_income: Option<i64>,
    pub liabilities: Option<i64>,
    pub financial_goals: Option<Vec<String>>,
    pub existing_savings_investments: Option<i64>,
    pub decided_coverage_amount: Option<i64>,
    pub decided_term: Option<i64>,
    #[serde(default, deserialize_with = "lenient_step")]
    pub framework_step: Option<u32>,
    pub additional_notes: Option<String>,
}

// The model is asked for an integer step but occasionally sends "3".
fn lenient_step<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_u64().map(|step| step as u32),
        Some(serde_json::Value::String(text)) => text.trim().parse::<u32>().ok(),
        _ => None,
    })
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl CustomerProfile {
    /// Shallow merge: each supplied field overwrites, absent fields persist.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if update.is_empty() {
            return;
        }

        macro_rules! merge {
            ($field:ident) => {
                if let Some(value) = update.$field {
                    self.$field = Some(value);
                }
            };
        }

        merge!(name);
        merge!(age);
        merge!(gender);
        merge!(family_situation);
        merge!(annual_income);
        merge!(liabilities);
        merge!(financial_goals);
        merge!(existing_savings_investments);
        merge!(decided_coverage_amount);
        merge!(decided_term);
        merge!(additional_notes);
        if let Some(step) = update.framework_step {
            self.framework_step = step;
        }
        self.version += 1;
    }
}
