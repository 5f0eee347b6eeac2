use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, Time};

////////////////////////////////////////////////////////////////////////////////////////////////////
// Client
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub activity: String,
    #[serde(default, alias = "contact", skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub fees_accounting: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub fees_social: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub fees_legal: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub theoretical_time: f64,
    #[serde(
        default,
        rename = "collaborator",
        alias = "collaboratorRef",
        deserialize_with = "reference_id"
    )]
    pub collaborator_ref: Option<String>,
}

impl Client {
    pub fn total_fees(&self) -> f64 {
        self.fees_accounting + self.fees_social + self.fees_legal
    }

    pub fn is_assigned_to(&self, collaborator_id: &str) -> bool {
        self.collaborator_ref.as_deref() == Some(collaborator_id)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Collaborator
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    /// Job title, not the application role of a user account.
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: String,
    #[serde(default, alias = "salary", deserialize_with = "lenient_amount")]
    pub annual_salary: f64,
    /// `None` when no cost was ever recorded, as opposed to a recorded zero.
    #[serde(default, alias = "cost", deserialize_with = "lenient_optional_amount")]
    pub annual_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub weekly_hours: f64,
    #[serde(
        default,
        rename = "managers",
        alias = "managerRefs",
        deserialize_with = "reference_ids"
    )]
    pub manager_refs: Vec<String>,
}

impl Collaborator {
    pub fn cost(&self) -> f64 {
        self.annual_cost.unwrap_or(0.0)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Timesheets
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Task {
    Saisie,
    Revision,
    Tva,
    Bilan,
    Social,
    Juridique,
    Fiscal,
    Conseil,
    Administratif,
    Formation,
    /// A label outside the fixed list, kept verbatim so grouping stays exact.
    Other(String),
}

impl Task {
    pub const FIXED: [Task; 10] = [
        Task::Saisie,
        Task::Revision,
        Task::Tva,
        Task::Bilan,
        Task::Social,
        Task::Juridique,
        Task::Fiscal,
        Task::Conseil,
        Task::Administratif,
        Task::Formation,
    ];

    pub fn label(&self) -> &str {
        match self {
            Task::Saisie => "Saisie",
            Task::Revision => "Révision",
            Task::Tva => "TVA",
            Task::Bilan => "Bilan",
            Task::Social => "Social",
            Task::Juridique => "Juridique",
            Task::Fiscal => "Fiscal",
            Task::Conseil => "Conseil",
            Task::Administratif => "Administratif",
            Task::Formation => "Formation",
            Task::Other(label) => label,
        }
    }
}

/// An entry logged without a task groups under an empty label.
impl Default for Task {
    fn default() -> Self {
        Task::Other(String::new())
    }
}

impl From<String> for Task {
    fn from(value: String) -> Self {
        Task::FIXED
            .into_iter()
            .find(|task| task.label() == value)
            .unwrap_or(Task::Other(value))
    }
}

impl From<Task> for String {
    fn from(value: Task) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(with = "calendar_date")]
    pub date: Date,
    #[serde(
        default,
        rename = "collaborator",
        alias = "collaboratorRef",
        deserialize_with = "reference_id"
    )]
    pub collaborator_ref: Option<String>,
    /// `None` is time that cannot be assigned to any client.
    #[serde(
        default,
        rename = "client",
        alias = "clientRef",
        deserialize_with = "reference_id"
    )]
    pub client_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_task")]
    pub task: Task,
    #[serde(default, rename = "start", alias = "startTime")]
    pub start_time: String,
    #[serde(default, rename = "end", alias = "endTime")]
    pub end_time: String,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, alias = "facturable")]
    pub billable: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_amount"
    )]
    pub billable_amount: Option<f64>,
}

impl TimesheetEntry {
    /// Logged minutes: the stored duration, or the span between start and end when the
    /// upstream record carries no duration.
    pub fn minutes(&self) -> u64 {
        if self.duration > 0 {
            return u64::from(self.duration);
        }

        minutes_between(&self.start_time, &self.end_time).unwrap_or(0)
    }

    pub fn billed_amount(&self) -> f64 {
        if self.billable {
            self.billable_amount.unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

pub fn parse_clock(value: &str) -> Option<Time> {
    Time::parse(value.trim(), format_description!("[hour]:[minute]")).ok()
}

/// Minutes from `start` to `end` (`HH:MM`), `None` unless `end` is strictly after `start`.
pub fn minutes_between(start: &str, end: &str) -> Option<u64> {
    let start = parse_clock(start)?;
    let end = parse_clock(end)?;
    if end <= start {
        return None;
    }

    u64::try_from((end - start).whole_minutes()).ok()
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Fixed costs
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FixedCostCategory {
    PetitsMateriels,
    Energies,
    SousTraitance,
    Loyers,
    LeasingsMateriels,
    LeasingsVehicules,
    EntretienReparations,
    LogicielsProduction,
    Assurances,
    Honoraires,
    FraisGeneraux,
    FraisActes,
    TelecomFraisPostaux,
    ServicesBancaires,
    ImpotsTaxes,
    Amortissements,
    AutresFraisFixes,
}

impl FixedCostCategory {
    pub const ALL: [FixedCostCategory; 17] = [
        FixedCostCategory::PetitsMateriels,
        FixedCostCategory::Energies,
        FixedCostCategory::SousTraitance,
        FixedCostCategory::Loyers,
        FixedCostCategory::LeasingsMateriels,
        FixedCostCategory::LeasingsVehicules,
        FixedCostCategory::EntretienReparations,
        FixedCostCategory::LogicielsProduction,
        FixedCostCategory::Assurances,
        FixedCostCategory::Honoraires,
        FixedCostCategory::FraisGeneraux,
        FixedCostCategory::FraisActes,
        FixedCostCategory::TelecomFraisPostaux,
        FixedCostCategory::ServicesBancaires,
        FixedCostCategory::ImpotsTaxes,
        FixedCostCategory::Amortissements,
        FixedCostCategory::AutresFraisFixes,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FixedCostCategory::PetitsMateriels => "petitsMateriels",
            FixedCostCategory::Energies => "energies",
            FixedCostCategory::SousTraitance => "sousTraitance",
            FixedCostCategory::Loyers => "loyers",
            FixedCostCategory::LeasingsMateriels => "leasingsMateriels",
            FixedCostCategory::LeasingsVehicules => "leasingsVehicules",
            FixedCostCategory::EntretienReparations => "entretienReparations",
            FixedCostCategory::LogicielsProduction => "logicielsProduction",
            FixedCostCategory::Assurances => "assurances",
            FixedCostCategory::Honoraires => "honoraires",
            FixedCostCategory::FraisGeneraux => "fraisGeneraux",
            FixedCostCategory::FraisActes => "fraisActes",
            FixedCostCategory::TelecomFraisPostaux => "telecomFraisPostaux",
            FixedCostCategory::ServicesBancaires => "servicesBancaires",
            FixedCostCategory::ImpotsTaxes => "impotsTaxes",
            FixedCostCategory::Amortissements => "amortissements",
            FixedCostCategory::AutresFraisFixes => "autresFraisFixes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fixed cost category {0}")]
pub struct UnknownFixedCostCategory(pub String);

impl FromStr for FixedCostCategory {
    type Err = UnknownFixedCostCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixedCostCategory::ALL
            .into_iter()
            .find(|category| category.key() == s)
            .ok_or_else(|| UnknownFixedCostCategory(s.to_string()))
    }
}

/// Firm-level recurring expenses, one amount per category in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCosts {
    amounts: Vec<(FixedCostCategory, f64)>,
}

impl Default for FixedCosts {
    fn default() -> Self {
        Self {
            amounts: FixedCostCategory::ALL
                .into_iter()
                .map(|category| (category, 0.0))
                .collect(),
        }
    }
}

impl FixedCosts {
    /// Reads the upstream document, ignoring bookkeeping keys such as `_id` or `__v`.
    pub fn from_document(document: &Value) -> Self {
        let Some(object) = document.as_object() else {
            tracing::warn!("fixed costs payload is not an object, using zero amounts");
            return Self::default();
        };

        Self {
            amounts: FixedCostCategory::ALL
                .into_iter()
                .map(|category| (category, amount(object.get(category.key()))))
                .collect(),
        }
    }

    pub fn amount(&self, category: FixedCostCategory) -> f64 {
        self.amounts
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, amount)| *amount)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FixedCostCategory, f64)> + '_ {
        self.amounts.iter().copied()
    }

    pub fn total(&self) -> f64 {
        self.amounts.iter().map(|(_, amount)| amount).sum()
    }
}

impl Serialize for FixedCosts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.amounts.len()))?;
        for (category, amount) in &self.amounts {
            map.serialize_entry(category.key(), amount)?;
        }
        map.end()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Upstream collections
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Parses an upstream collection. A payload that is not an array yields an empty list and
/// elements that do not parse are skipped; both cases are logged.
pub fn collection<T: DeserializeOwned>(payload: &Value, name: &str) -> Vec<T> {
    let Some(items) = payload.as_array() else {
        tracing::warn!(collection = name, "upstream payload is not a list");
        return vec![];
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(collection = name, index, "skipping malformed item: {}", e);
                None
            }
        })
        .collect()
}

fn amount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    };

    if parsed.is_finite() && parsed > 0.0 {
        parsed
    } else {
        0.0
    }
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(amount(value.as_ref()))
}

fn lenient_optional_amount<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(match value {
        None | Some(Value::Null) => None,
        Some(value) => Some(amount(Some(&value))),
    })
}

fn lenient_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let minutes = lenient_amount(deserializer)?;

    Ok(minutes.round().min(f64::from(u32::MAX)) as u32)
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_task<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Task, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .map(Task::from)
        .unwrap_or_default())
}

fn id_of(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(id) => id.trim().to_string(),
        Value::Object(object) => object
            .get("_id")
            .or_else(|| object.get("id"))
            .and_then(Value::as_str)?
            .trim()
            .to_string(),
        _ => return None,
    };

    if id.is_empty() || id == "none" {
        None
    } else {
        Some(id)
    }
}

fn reference_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(id_of))
}

fn reference_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items.iter().filter_map(id_of).collect(),
        Some(single) => id_of(&single).into_iter().collect(),
        None => vec![],
    })
}

pub mod calendar_date {
    use super::*;
    use serde::de::Error;

    pub fn parse(value: &str) -> Option<Date> {
        let day = value.trim().get(..10)?;

        Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
    }

    pub fn format(date: &Date) -> String {
        date.format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default()
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let value = String::deserialize(deserializer)?;

        parse(&value).ok_or_else(|| D::Error::custom(format!("invalid date {value}")))
    }
}
