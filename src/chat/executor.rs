//! Runs a [`QueryPlan`] against a table.

use crate::analysis::aggregate::{aggregate, group_by, Group};
use crate::analysis::chart::XScale;
use crate::analysis::stats::describe;
use crate::analysis::{format_amount, AggFunc, ChartData, ChartKind};
use crate::data::Table;
use crate::error::Result;

use super::plan::QueryPlan;

/// Result of running a plan: printed text, a chart, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answer {
    pub text: Option<String>,
    pub chart: Option<ChartData>,
}

impl Answer {
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, str::is_empty) && self.chart.is_none()
    }
}

pub fn execute(plan: &QueryPlan, table: &Table) -> Result<Answer> {
    match plan {
        QueryPlan::Answer { text } => Ok(Answer {
            text: Some(text.clone()),
            chart: None,
        }),
        QueryPlan::Describe { column } => {
            let d = describe(table, column)?;
            let lines: Vec<String> = d
                .entries()
                .into_iter()
                .map(|(label, v)| {
                    let v = v.map(format_amount).unwrap_or_else(|| "NaN".into());
                    format!("{label:<6} {v}")
                })
                .collect();
            Ok(Answer {
                text: Some(format!("{column}\n{}", lines.join("\n"))),
                chart: None,
            })
        }
        QueryPlan::Aggregate {
            column,
            func,
            group_by: None,
            ..
        } => {
            let value = aggregate(table, column, *func)?;
            let shown = value.map(format_amount).unwrap_or_else(|| "NaN".into());
            Ok(Answer {
                text: Some(format!("{func} {column}: {shown}")),
                chart: None,
            })
        }
        QueryPlan::Aggregate {
            column,
            func,
            group_by: Some(key),
            top,
            ascending,
            chart,
        } => {
            let groups = group_by(table, key, Some(column), *func)?;
            let title = format!("{func} {column} by {key}");
            Ok(grouped_answer(groups, title, *top, *ascending, *chart))
        }
        QueryPlan::Count { group_by: None, .. } => Ok(Answer {
            text: Some(format!("Rows: {}", table.row_count())),
            chart: None,
        }),
        QueryPlan::Count {
            group_by: Some(key),
            top,
            ascending,
            chart,
        } => {
            let groups = group_by(table, key, None, AggFunc::Count)?;
            let title = format!("Count by {key}");
            Ok(grouped_answer(groups, title, *top, *ascending, *chart))
        }
    }
}

/// Rank groups by value, cut to `top`, and render text plus an optional chart
fn grouped_answer(
    groups: Vec<Group>,
    title: String,
    top: Option<usize>,
    ascending: bool,
    chart: Option<ChartKind>,
) -> Answer {
    let mut ranked: Vec<(String, f64)> = groups
        .into_iter()
        .filter_map(|g| g.value.map(|v| (g.key.to_string(), v)))
        .collect();
    ranked.sort_by(|a, b| {
        let ord = a.1.total_cmp(&b.1);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    if let Some(n) = top {
        ranked.truncate(n);
    }

    if ranked.is_empty() {
        return Answer::default();
    }

    let width = ranked.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let lines: Vec<String> = ranked
        .iter()
        .map(|(k, v)| format!("{k:<width$}  {}", format_amount(*v)))
        .collect();
    let text = format!("{title}\n{}", lines.join("\n"));

    let chart = chart.map(|kind| match kind {
        ChartKind::Bar => ChartData::Bars {
            title: title.clone(),
            bars: ranked.clone(),
        },
        ChartKind::Line | ChartKind::Scatter => {
            let names: Vec<String> = ranked.iter().map(|(k, _)| k.clone()).collect();
            ChartData::Series {
                title: title.clone(),
                kind,
                x_label: String::new(),
                y_label: String::new(),
                x_scale: XScale::Categorical(names),
                points: ranked
                    .iter()
                    .enumerate()
                    .map(|(i, (_, v))| (i as f64, *v))
                    .collect(),
            }
        }
    });

    Answer {
        text: Some(text),
        chart,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv;
    use crate::error::AnalystError;

    fn table() -> Table {
        read_csv(
            "region,product,sales\nNorth,a,10\nSouth,b,40\nEast,a,25\nNorth,b,5\nWest,a,\n".as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_scalar_aggregate() {
        let plan = QueryPlan::Aggregate {
            column: "sales".into(),
            func: AggFunc::Sum,
            group_by: None,
            top: None,
            ascending: false,
            chart: None,
        };
        let answer = execute(&plan, &table()).unwrap();
        assert_eq!(answer.text.as_deref(), Some("Total sales: 80.00"));
        assert!(answer.chart.is_none());
    }

    #[test]
    fn test_top_groups_with_bar_chart() {
        let plan = QueryPlan::Aggregate {
            column: "sales".into(),
            func: AggFunc::Sum,
            group_by: Some("region".into()),
            top: Some(2),
            ascending: false,
            chart: Some(ChartKind::Bar),
        };
        let answer = execute(&plan, &table()).unwrap();
        let Some(ChartData::Bars { bars, .. }) = answer.chart else {
            panic!("expected bars");
        };
        assert_eq!(bars, vec![("South".into(), 40.0), ("East".into(), 25.0)]);
        let text = answer.text.unwrap();
        assert!(text.starts_with("Total sales by region\n"));
        assert!(!text.contains("North"));
    }

    #[test]
    fn test_count_ascending() {
        let plan = QueryPlan::Count {
            group_by: Some("product".into()),
            top: None,
            ascending: true,
            chart: None,
        };
        let answer = execute(&plan, &table()).unwrap();
        let text = answer.text.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "b  2.00");
        assert_eq!(lines[2], "a  3.00");
    }

    #[test]
    fn test_describe_and_answer() {
        let describe = execute(&QueryPlan::Describe { column: "sales".into() }, &table()).unwrap();
        assert!(describe.text.unwrap().contains("count  4.00"));

        let answer = execute(&QueryPlan::Answer { text: "42".into() }, &table()).unwrap();
        assert_eq!(answer.text.as_deref(), Some("42"));
    }

    #[test]
    fn test_unknown_column_errors() {
        let plan = QueryPlan::Describe { column: "profit".into() };
        assert!(matches!(
            execute(&plan, &table()),
            Err(AnalystError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_empty_groups_give_empty_answer() {
        let empty = read_csv("k,v\n".as_bytes()).unwrap();
        let plan = QueryPlan::Count {
            group_by: Some("k".into()),
            top: None,
            ascending: false,
            chart: Some(ChartKind::Bar),
        };
        assert!(execute(&plan, &empty).unwrap().is_empty());
    }
}
