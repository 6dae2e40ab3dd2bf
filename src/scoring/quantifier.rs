use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::entity::{QuantifierFormat, QuantifierInput, QuantifierValue};

/// Rolled-up value of one quantifier across a set of ideas: the sum for
/// numbers, the count of `true` for booleans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantifierTotal {
    pub total: i64,
    pub format: QuantifierFormat,
}

/// Roll up quantifier values per quantifier id.
///
/// Text and date range values have no numeric meaning and are left out
/// entirely. A boolean quantifier whose values are all `false` still gets
/// an entry with a zero count.
pub fn aggregate_quantifiers<'a, I>(values: I) -> BTreeMap<Uuid, QuantifierTotal>
where
    I: IntoIterator<Item = &'a QuantifierValue>,
{
    let mut totals: BTreeMap<Uuid, QuantifierTotal> = BTreeMap::new();
    for value in values {
        let amount = match value.value {
            QuantifierInput::Number(n) => n,
            QuantifierInput::Boolean(b) => i64::from(b),
            QuantifierInput::Text(_) | QuantifierInput::DateRange { .. } => continue,
        };
        let entry = totals.entry(value.quantifier_id).or_insert(QuantifierTotal {
            total: 0,
            format: value.value.format(),
        });
        entry.total = entry.total.saturating_add(amount);
    }
    totals
}
