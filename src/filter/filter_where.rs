use super::filter::TicketFilter;
use super::types::{FilterCondition, FilterValue, SqlResult};

/// Renders a [`TicketFilter`] as a parameterised SQL WHERE clause. Column names come
/// from [`super::FilterField::column`], values are always bound as parameters.
pub struct FilterWhere {
    param_index: usize,
    result: SqlResult,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_index: starting_param_index,
            result: SqlResult { query: String::new(), params: vec![] },
        }
    }

    pub fn generate(filter: &TicketFilter, starting_param_index: usize) -> SqlResult {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(filter);
        filter_where.result
    }

    fn build(&mut self, filter: &TicketFilter) {
        let mut sql_conditions = vec![];
        for condition in filter.conditions() {
            if let Some(sql) = self.build_sql_condition(condition) {
                sql_conditions.push(sql);
            }
        }
        self.result.query = if sql_conditions.is_empty() {
            "1=1".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
    }

    fn build_sql_condition(&mut self, condition: &FilterCondition) -> Option<String> {
        if condition.values.is_empty() {
            return None;
        }

        let column = condition.field.column();
        let alternatives: Vec<String> = condition
            .values
            .iter()
            .map(|value| {
                let placeholder = self.next_param(value.clone());
                if condition.field.is_array() {
                    format!("{} = ANY(\"{}\")", placeholder, column)
                } else {
                    format!("\"{}\" = {}", column, placeholder)
                }
            })
            .collect();

        if alternatives.len() == 1 {
            alternatives.into_iter().next()
        } else {
            Some(format!("({})", alternatives.join(" OR ")))
        }
    }

    fn next_param(&mut self, value: FilterValue) -> String {
        self.param_index += 1;
        self.result.params.push(value);
        format!("${}", self.param_index)
    }
}
