use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantifierFormat {
    Number,
    Boolean,
    Text,
    DateRange,
}

impl std::fmt::Display for QuantifierFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantifierFormat::Number => write!(f, "number"),
            QuantifierFormat::Boolean => write!(f, "boolean"),
            QuantifierFormat::Text => write!(f, "text"),
            QuantifierFormat::DateRange => write!(f, "daterange"),
        }
    }
}

impl std::str::FromStr for QuantifierFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "number" => Ok(QuantifierFormat::Number),
            "boolean" | "bool" => Ok(QuantifierFormat::Boolean),
            "text" => Ok(QuantifierFormat::Text),
            "daterange" => Ok(QuantifierFormat::DateRange),
            _ => Err(format!("Invalid quantifier format: {}", s)),
        }
    }
}

/// A typed measurement defined under a criteria, filled in per idea
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quantifier {
    pub id: Uuid,
    pub criteria_id: Uuid,
    pub name: String,
    pub format: QuantifierFormat,
}

impl Quantifier {
    pub fn new(name: String, criteria_id: Uuid, format: QuantifierFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            criteria_id,
            name,
            format,
        }
    }
}

/// A measured value; the variant carries the format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "value", rename_all = "lowercase")]
pub enum QuantifierInput {
    Number(i64),
    Boolean(bool),
    Text(String),
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl QuantifierInput {
    pub fn format(&self) -> QuantifierFormat {
        match self {
            QuantifierInput::Number(_) => QuantifierFormat::Number,
            QuantifierInput::Boolean(_) => QuantifierFormat::Boolean,
            QuantifierInput::Text(_) => QuantifierFormat::Text,
            QuantifierInput::DateRange { .. } => QuantifierFormat::DateRange,
        }
    }

    /// Parse the textual form for a given format.
    ///
    /// Booleans accept `true/false/yes/no/1/0`, date ranges `YYYY-MM-DD..YYYY-MM-DD`.
    pub fn parse(format: QuantifierFormat, raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        match format {
            QuantifierFormat::Number => raw
                .parse()
                .map(QuantifierInput::Number)
                .map_err(|_| format!("Invalid number: {}", raw)),
            QuantifierFormat::Boolean => match raw.to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(QuantifierInput::Boolean(true)),
                "false" | "no" | "0" => Ok(QuantifierInput::Boolean(false)),
                _ => Err(format!("Invalid boolean: {}", raw)),
            },
            QuantifierFormat::Text => Ok(QuantifierInput::Text(raw.to_string())),
            QuantifierFormat::DateRange => {
                let (start, end) = raw
                    .split_once("..")
                    .ok_or_else(|| format!("Invalid date range: {}", raw))?;
                let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
                    .map_err(|e| format!("Invalid start date '{}': {}", start, e))?;
                let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
                    .map_err(|e| format!("Invalid end date '{}': {}", end, e))?;
                Ok(QuantifierInput::DateRange { start, end })
            }
        }
    }
}

impl std::fmt::Display for QuantifierInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantifierInput::Number(n) => write!(f, "{}", n),
            QuantifierInput::Boolean(b) => write!(f, "{}", b),
            QuantifierInput::Text(s) => write!(f, "{}", s),
            QuantifierInput::DateRange { start, end } => write!(f, "{}..{}", start, end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantifierValue {
    pub quantifier_id: Uuid,
    pub idea_id: Uuid,
    pub value: QuantifierInput,
}
