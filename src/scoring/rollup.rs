use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::entity::{Alternative, Criteria, CriteriaFormat, ResultMode, SortOrder};

/// Combine the values of an alternative's ideas for one criteria.
///
/// `sum` and `average` weight every value by the criteria weight; average
/// divides by the number of ideas, rounding toward zero. `absolute` keeps
/// the best raw value: the largest for `asc`, the smallest for `desc`.
/// An alternative without ideas scores 0. Totals saturate at the `i64`
/// bounds.
pub fn criteria_result(criteria: &Criteria, values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    match criteria.result {
        ResultMode::Sum => weighted_sum(criteria, values),
        ResultMode::Average => weighted_sum(criteria, values) / values.len() as i64,
        ResultMode::Absolute => match criteria.order {
            SortOrder::Asc => values.iter().copied().max().unwrap_or(0),
            SortOrder::Desc => values.iter().copied().min().unwrap_or(0),
        },
    }
}

fn weighted_sum(criteria: &Criteria, values: &[i64]) -> i64 {
    let weight = criteria.effective_weight();
    values
        .iter()
        .fold(0i64, |acc, v| acc.saturating_add(v.saturating_mul(weight)))
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreColumn {
    pub criteria_id: Uuid,
    pub name: String,
    pub format: CriteriaFormat,
    pub result: ResultMode,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreRow {
    pub alternative_id: Uuid,
    pub name: String,
    pub idea_count: usize,
    /// One result per column, same order as [`ScoreTable::columns`]
    pub results: Vec<i64>,
}

/// Alternatives against criteria.
///
/// Columns are ordered by criteria name, rows by the alternative's
/// position in the problem.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreTable {
    pub columns: Vec<ScoreColumn>,
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    /// `values` maps (idea id, criteria id) to the idea's value; a missing
    /// pair counts as 0
    pub fn build(
        criteria: &[Criteria],
        alternatives: &[Alternative],
        values: &HashMap<(Uuid, Uuid), i64>,
    ) -> Self {
        let mut criteria: Vec<&Criteria> = criteria.iter().collect();
        criteria.sort_by(|a, b| a.base.title.cmp(&b.base.title));
        let mut alternatives: Vec<&Alternative> = alternatives.iter().collect();
        alternatives.sort_by_key(|a| a.order);

        let columns = criteria
            .iter()
            .map(|c| ScoreColumn {
                criteria_id: c.base.id,
                name: c.base.title.clone(),
                format: c.format,
                result: c.result,
                order: c.order,
            })
            .collect();

        let rows = alternatives
            .iter()
            .map(|alternative| {
                let results = criteria
                    .iter()
                    .map(|c| {
                        let idea_values: Vec<i64> = alternative
                            .idea_ids
                            .iter()
                            .map(|idea| values.get(&(*idea, c.base.id)).copied().unwrap_or(0))
                            .collect();
                        criteria_result(c, &idea_values)
                    })
                    .collect();
                ScoreRow {
                    alternative_id: alternative.base.id,
                    name: alternative.name().to_string(),
                    idea_count: alternative.idea_ids.len(),
                    results,
                }
            })
            .collect();

        Self { columns, rows }
    }

    /// Alternative with the best result in a column, honouring the
    /// criteria's comparison order. Ties go to the earlier row.
    pub fn best(&self, column: usize) -> Option<&ScoreRow> {
        let order = self.columns.get(column)?.order;
        let mut best: Option<&ScoreRow> = None;
        for row in &self.rows {
            let value = *row.results.get(column)?;
            let better = match best {
                None => true,
                Some(current) => match order {
                    SortOrder::Asc => value > current.results[column],
                    SortOrder::Desc => value < current.results[column],
                },
            };
            if better {
                best = Some(row);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(result: ResultMode, order: SortOrder, weight: Option<u32>) -> Criteria {
        let mut c = Criteria::new("Cost".to_string(), Uuid::new_v4(), 1, 1);
        c.result = result;
        c.order = order;
        c.weight = weight;
        c
    }

    #[test]
    fn test_sum_is_weighted() {
        let c = criteria(ResultMode::Sum, SortOrder::Asc, Some(2));
        assert_eq!(criteria_result(&c, &[1, 2, 3]), 12);
    }

    #[test]
    fn test_average_rounds_toward_zero() {
        let c = criteria(ResultMode::Average, SortOrder::Asc, None);
        assert_eq!(criteria_result(&c, &[1, 2]), 1);
        assert_eq!(criteria_result(&c, &[-1, -2]), -1);
        let c = criteria(ResultMode::Average, SortOrder::Asc, Some(3));
        assert_eq!(criteria_result(&c, &[1, 2]), 4);
    }

    #[test]
    fn test_absolute_follows_order() {
        let asc = criteria(ResultMode::Absolute, SortOrder::Asc, Some(5));
        let desc = criteria(ResultMode::Absolute, SortOrder::Desc, Some(5));
        assert_eq!(criteria_result(&asc, &[4, 9, 2]), 9);
        assert_eq!(criteria_result(&desc, &[4, 9, 2]), 2);
    }

    #[test]
    fn test_extreme_values_saturate() {
        let c = criteria(ResultMode::Sum, SortOrder::Asc, Some(2));
        assert_eq!(criteria_result(&c, &[i64::MAX / 2 + 1]), i64::MAX);
        let c = criteria(ResultMode::Sum, SortOrder::Asc, None);
        assert_eq!(criteria_result(&c, &[i64::MAX, 1]), i64::MAX);
        assert_eq!(criteria_result(&c, &[i64::MIN, -1]), i64::MIN);
        let c = criteria(ResultMode::Average, SortOrder::Asc, Some(3));
        assert_eq!(criteria_result(&c, &[i64::MAX, i64::MAX]), i64::MAX / 2);
    }

    #[test]
    fn test_no_ideas_scores_zero() {
        for result in [ResultMode::Sum, ResultMode::Average, ResultMode::Absolute] {
            assert_eq!(criteria_result(&criteria(result, SortOrder::Desc, None), &[]), 0);
        }
    }

    #[test]
    fn test_table() {
        let problem = Uuid::new_v4();
        let mut speed = Criteria::new("Speed".to_string(), problem, 1, 1);
        speed.order = SortOrder::Desc;
        let cost = Criteria::new("Cost".to_string(), problem, 1, 2);

        let idea_a = Uuid::new_v4();
        let idea_b = Uuid::new_v4();
        let mut plan_a = Alternative::new("Plan A".to_string(), problem, 1, 1);
        plan_a.idea_ids = vec![idea_a, idea_b];
        let mut plan_b = Alternative::new("Plan B".to_string(), problem, 1, 2);
        plan_b.idea_ids = vec![idea_b];

        let values = HashMap::from([
            ((idea_a, cost.base.id), 10),
            ((idea_b, cost.base.id), 5),
            ((idea_a, speed.base.id), 3),
        ]);

        let table = ScoreTable::build(&[speed, cost], &[plan_b, plan_a], &values);
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Cost", "Speed"]);
        assert_eq!(table.rows[0].name, "Plan A");
        assert_eq!(table.rows[0].results, vec![15, 3]);
        assert_eq!(table.rows[1].results, vec![5, 0]);

        assert_eq!(table.best(0).unwrap().name, "Plan A");
        // lower is better for speed
        assert_eq!(table.best(1).unwrap().name, "Plan B");
        assert!(table.best(5).is_none());
    }
}
