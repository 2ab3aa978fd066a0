//! Query plans: the JSON instructions a model returns for a question.
//!
//! The model never writes code. It picks one operation from a closed
//! vocabulary and the executor runs it against the active table.

use serde::{Deserialize, Serialize};

use crate::analysis::{AggFunc, ChartKind};
use crate::data::{export::render_text, Table};
use crate::error::{AnalystError, Result};

/// Rows of sample data shown to the model
const SAMPLE_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum QueryPlan {
    /// Aggregate a column, optionally per group
    Aggregate {
        column: String,
        func: AggFunc,
        #[serde(default)]
        group_by: Option<String>,
        #[serde(default)]
        top: Option<usize>,
        #[serde(default)]
        ascending: bool,
        #[serde(default)]
        chart: Option<ChartKind>,
    },
    /// Count rows, optionally per group
    Count {
        #[serde(default)]
        group_by: Option<String>,
        #[serde(default)]
        top: Option<usize>,
        #[serde(default)]
        ascending: bool,
        #[serde(default)]
        chart: Option<ChartKind>,
    },
    /// Summary statistics of a numeric column
    Describe { column: String },
    /// A direct textual answer
    Answer { text: String },
}

/// Pull the JSON payload out of a reply: a ```json fence, any fence, or the raw text
pub fn extract_block(raw: &str) -> &str {
    let body = if let Some((_, rest)) = raw.split_once("```json") {
        rest
    } else if let Some((_, rest)) = raw.split_once("```") {
        rest
    } else {
        return raw.trim();
    };
    body.split("```").next().unwrap_or(body).trim()
}

/// Parse a model reply into a plan
pub fn parse_plan(raw: &str) -> Result<QueryPlan> {
    let block = extract_block(raw);
    serde_json::from_str(block).map_err(|e| AnalystError::Plan(e.to_string()))
}

/// System prompt describing the table and the plan vocabulary
pub fn system_prompt(table: &Table) -> String {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("{} ({})", c.name, c.kind))
        .collect();
    let sample = render_text(&table.head(SAMPLE_ROWS));

    format!(
        r#"You are a Data Analyst. Your goal is to answer questions about a table.
Columns: {columns}
Sample:
{sample}

RULES:
1. Reply with ONE JSON object inside a ```json``` block and nothing else.
2. The object has an "op" field, one of:
   - {{"op": "aggregate", "column": <numeric column>, "func": "sum"|"mean"|"min"|"max"|"count", "group_by": <column or null>, "top": <n or null>, "ascending": false, "chart": "bar"|"line"|"scatter"|null}}
   - {{"op": "count", "group_by": <column or null>, "top": <n or null>, "ascending": false, "chart": "bar"|"line"|"scatter"|null}}
   - {{"op": "describe", "column": <numeric column>}}
   - {{"op": "answer", "text": <plain answer when no computation is needed>}}
3. If asked for a plot, set "chart". If asked for a value, leave "chart" null.
4. Use column names exactly as listed."#,
        columns = columns.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read_csv;

    #[test]
    fn test_extract_block_variants() {
        assert_eq!(extract_block("x ```json\n{\"a\":1}\n``` y"), "{\"a\":1}");
        assert_eq!(extract_block("```\n{\"b\":2}\n```"), "{\"b\":2}");
        assert_eq!(extract_block("  {\"c\":3} "), "{\"c\":3}");
    }

    #[test]
    fn test_parse_aggregate_plan_with_defaults() {
        let raw = "Here you go:\n```json\n{\"op\": \"aggregate\", \"column\": \"sales\", \"func\": \"sum\", \"group_by\": \"region\", \"top\": 5, \"chart\": \"bar\"}\n```";
        let plan = parse_plan(raw).unwrap();
        assert_eq!(
            plan,
            QueryPlan::Aggregate {
                column: "sales".into(),
                func: AggFunc::Sum,
                group_by: Some("region".into()),
                top: Some(5),
                ascending: false,
                chart: Some(ChartKind::Bar),
            }
        );
    }

    #[test]
    fn test_parse_answer_and_reject_garbage() {
        let plan = parse_plan(r#"{"op": "answer", "text": "hi"}"#).unwrap();
        assert_eq!(plan, QueryPlan::Answer { text: "hi".into() });
        assert!(matches!(
            parse_plan("print(df.sum())"),
            Err(AnalystError::Plan(_))
        ));
    }

    #[test]
    fn test_system_prompt_lists_columns_and_sample() {
        let table = read_csv("region,sales\nNorth,1\nSouth,2\nEast,3\nWest,4\n".as_bytes()).unwrap();
        let prompt = system_prompt(&table);
        assert!(prompt.contains("Columns: region (text), sales (number)"));
        assert!(prompt.contains("East"));
        assert!(!prompt.contains("West"));
    }
}
