use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityBase, UserId};

/// What kind of value ideas supply for a criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaFormat {
    #[default]
    Number,
    /// Minor currency units (cents)
    Currency,
    Scale,
    Time,
    Boolean,
}

impl std::fmt::Display for CriteriaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriteriaFormat::Number => write!(f, "number"),
            CriteriaFormat::Currency => write!(f, "currency"),
            CriteriaFormat::Scale => write!(f, "scale"),
            CriteriaFormat::Time => write!(f, "time"),
            CriteriaFormat::Boolean => write!(f, "boolean"),
        }
    }
}

impl std::str::FromStr for CriteriaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "number" => Ok(CriteriaFormat::Number),
            "currency" => Ok(CriteriaFormat::Currency),
            "scale" => Ok(CriteriaFormat::Scale),
            "time" => Ok(CriteriaFormat::Time),
            "boolean" | "bool" => Ok(CriteriaFormat::Boolean),
            _ => Err(format!("Invalid criteria format: {}", s)),
        }
    }
}

/// How idea values are rolled up per alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    #[default]
    Sum,
    Average,
    Absolute,
}

impl std::fmt::Display for ResultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultMode::Sum => write!(f, "sum"),
            ResultMode::Average => write!(f, "average"),
            ResultMode::Absolute => write!(f, "absolute"),
        }
    }
}

impl std::str::FromStr for ResultMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(ResultMode::Sum),
            "average" | "avg" => Ok(ResultMode::Average),
            "absolute" => Ok(ResultMode::Absolute),
            _ => Err(format!("Invalid result mode: {}", s)),
        }
    }
}

/// Comparison order: `Asc` means the higher the better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid comparison order: {}", s)),
        }
    }
}

/// A weighted dimension ideas and alternatives are scored against.
///
/// `base.title` is the criteria name and `base.content` its description.
/// `parent_id` allows nesting, which no rule looks at. `min` and `max`
/// bound the values of a `scale` criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(flatten)]
    pub base: EntityBase,
    pub problem_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub format: CriteriaFormat,
    pub weight: Option<u32>,
    pub result: ResultMode,
    pub order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl Criteria {
    pub fn new(name: String, problem_id: Uuid, author: UserId, sequence_number: u32) -> Self {
        Self {
            base: EntityBase::new(name, author, sequence_number),
            problem_id,
            parent_id: None,
            format: CriteriaFormat::default(),
            weight: None,
            result: ResultMode::default(),
            order: SortOrder::default(),
            min: None,
            max: None,
        }
    }

    /// Scale bounds must not cross, and only scale criteria carry them
    pub fn check_bounds(&self) -> Result<(), String> {
        if self.format != CriteriaFormat::Scale && (self.min.is_some() || self.max.is_some()) {
            return Err(format!("{} criteria take no scale bounds", self.format));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(format!("scale minimum {} is above maximum {}", min, max));
            }
        }
        Ok(())
    }

    /// Whether an idea may be scored `value` on this criteria
    pub fn check_value(&self, value: i64) -> Result<(), String> {
        match self.format {
            CriteriaFormat::Boolean if value != 0 && value != 1 => Err(format!(
                "'{}' is a yes/no criteria, expected 0 or 1, got {}",
                self.base.title, value
            )),
            CriteriaFormat::Scale => {
                let below = self.min.is_some_and(|min| value < min);
                let above = self.max.is_some_and(|max| value > max);
                if below || above {
                    Err(format!(
                        "{} is outside the scale of '{}' ({}..={})",
                        value,
                        self.base.title,
                        self.min.map_or("".to_string(), |v| v.to_string()),
                        self.max.map_or("".to_string(), |v| v.to_string()),
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Weight multiplier; unset or zero counts as 1
    pub fn effective_weight(&self) -> i64 {
        match self.weight {
            Some(w) if w > 0 => i64::from(w),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_weight() {
        let mut criteria = Criteria::new("Cost".to_string(), Uuid::new_v4(), 1, 1);
        assert_eq!(criteria.effective_weight(), 1);
        criteria.weight = Some(0);
        assert_eq!(criteria.effective_weight(), 1);
        criteria.weight = Some(3);
        assert_eq!(criteria.effective_weight(), 3);
    }

    #[test]
    fn test_boolean_values() {
        let mut criteria = Criteria::new("Legal".to_string(), Uuid::new_v4(), 1, 1);
        criteria.format = CriteriaFormat::Boolean;
        assert!(criteria.check_value(0).is_ok());
        assert!(criteria.check_value(1).is_ok());
        assert!(criteria.check_value(42).is_err());
        assert!(criteria.check_value(-1).is_err());
    }

    #[test]
    fn test_scale_values() {
        let mut criteria = Criteria::new("Comfort".to_string(), Uuid::new_v4(), 1, 1);
        criteria.format = CriteriaFormat::Scale;
        criteria.min = Some(1);
        criteria.max = Some(5);
        assert!(criteria.check_bounds().is_ok());
        assert!(criteria.check_value(1).is_ok());
        assert!(criteria.check_value(5).is_ok());
        assert!(criteria.check_value(0).is_err());
        assert!(criteria.check_value(6).is_err());

        // open-ended on one side
        criteria.max = None;
        assert!(criteria.check_value(1000).is_ok());
    }

    #[test]
    fn test_other_formats_accept_any_value() {
        let criteria = Criteria::new("Cost".to_string(), Uuid::new_v4(), 1, 1);
        assert!(criteria.check_value(i64::MAX).is_ok());
        assert!(criteria.check_value(-7).is_ok());
    }

    #[test]
    fn test_check_bounds() {
        let mut criteria = Criteria::new("Comfort".to_string(), Uuid::new_v4(), 1, 1);
        criteria.min = Some(1);
        assert!(criteria.check_bounds().is_err());

        criteria.format = CriteriaFormat::Scale;
        assert!(criteria.check_bounds().is_ok());
        criteria.max = Some(0);
        assert!(criteria.check_bounds().is_err());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Currency".parse::<CriteriaFormat>().unwrap(), CriteriaFormat::Currency);
        assert_eq!("avg".parse::<ResultMode>().unwrap(), ResultMode::Average);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("median".parse::<ResultMode>().is_err());
    }
}
