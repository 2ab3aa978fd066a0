//! Headless commands: summary, clean and ask.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::analysis::format::format_optional;
use crate::analysis::stats::{kpis, overview, profile};
use crate::analysis::{format_amount, ChartData};
use crate::chat::{Answer, ChatSession, GroqClient, NO_OUTPUT};
use crate::cli::LlmSettings;
use crate::data::export::{render_text, save_csv};
use crate::data::{auto_clean, Dataset, Table};

fn load(file: &Path, clean: bool) -> Result<(Dataset, Table)> {
    let dataset = Dataset::open(file).with_context(|| format!("Failed to load {file:?}"))?;
    let table = if clean {
        auto_clean(&dataset.table).0
    } else {
        dataset.table.clone()
    };
    Ok((dataset, table))
}

pub fn run_summary(
    out: &mut impl Write,
    file: &Path,
    clean: bool,
    metric: Option<String>,
    preview_rows: usize,
) -> Result<()> {
    let (dataset, table) = load(file, clean)?;
    let o = overview(&table);

    writeln!(out, "Dataset: {} ({})", dataset.name(), dataset.format)?;
    writeln!(
        out,
        "Total Rows: {}  Total Columns: {}  Missing Values: {}",
        o.rows, o.columns, o.missing
    )?;
    writeln!(out)?;
    writeln!(out, "{}", render_text(&table.head(preview_rows)))?;
    writeln!(out)?;

    writeln!(out, "Columns:")?;
    let width = table
        .column_names()
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);
    for p in profile(&table) {
        writeln!(
            out,
            "  {:<width$}  {:<6}  missing {:>5}  distinct {:>5}",
            p.name, p.kind.to_string(), p.missing, p.distinct
        )?;
    }

    let metric = metric.or_else(|| table.numeric_columns().into_iter().next());
    match metric {
        Some(metric) => {
            let k = kpis(&table, &metric)?;
            writeln!(out)?;
            writeln!(
                out,
                "KPIs for {metric}: Total Sum {} | Average {} | Max Value {}",
                format_amount(k.total),
                format_optional(k.average),
                format_optional(k.max)
            )?;
        }
        None => {
            writeln!(out)?;
            writeln!(out, "No numeric columns found to generate dashboards.")?;
        }
    }
    Ok(())
}

pub fn run_clean(out: &mut impl Write, file: &Path, output: &Path) -> Result<()> {
    let dataset = Dataset::open(file).with_context(|| format!("Failed to load {file:?}"))?;
    let (cleaned, report) = auto_clean(&dataset.table);
    save_csv(&cleaned, &output).with_context(|| format!("Failed to write {output:?}"))?;
    info!(
        duplicates_removed = report.duplicates_removed,
        rows = report.rows_after(),
        "cleaned data saved"
    );
    writeln!(
        out,
        "Data Cleaned! Removed {} duplicate rows, filled {} numeric and {} text cells -> {}",
        report.duplicates_removed,
        report.numeric_filled,
        report.text_filled,
        output.display()
    )?;
    Ok(())
}

pub fn run_ask(
    out: &mut impl Write,
    file: &Path,
    question: &str,
    clean: bool,
    llm: &LlmSettings,
) -> Result<()> {
    let Some(api_key) = llm.api_key.clone() else {
        bail!("No API key configured. Set GROQ_API_KEY, pass --api-key, or add it to the config file.");
    };
    let (_, table) = load(file, clean)?;

    let client = GroqClient::new(api_key)
        .with_api_base(llm.api_base.clone())
        .with_model(llm.model.clone())
        .with_temperature(llm.temperature);
    info!(model = client.model(), rows = table.row_count(), "asking question");

    let mut session = ChatSession::new();
    let answer = session
        .ask_blocking(&client, &table, question)
        .context("Query Error")?;
    print_answer(out, &answer)
}

fn print_answer(out: &mut impl Write, answer: &Answer) -> Result<()> {
    if answer.is_empty() {
        writeln!(out, "{NO_OUTPUT}")?;
        return Ok(());
    }
    if let Some(text) = &answer.text {
        writeln!(out, "{text}")?;
    }
    if let Some(chart) = &answer.chart {
        print_chart(out, chart)?;
    }
    Ok(())
}

fn print_chart(out: &mut impl Write, chart: &ChartData) -> Result<()> {
    writeln!(out, "\n[chart] {}", chart.title())?;
    let points = chart.points_as_text();
    let width = points.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (label, value) in points {
        writeln!(out, "  {label:<width$}  {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_sample(dir: &Path) -> PathBuf {
        let path = dir.join("sales.csv");
        std::fs::write(&path, "region,sales\nNorth,10\nNorth,10\nSouth,\n").unwrap();
        path
    }

    #[test]
    fn test_summary_reports_kpis() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let mut out = Vec::new();
        run_summary(&mut out, &path, true, None, 5).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Total Rows: 2  Total Columns: 2  Missing Values: 0"));
        assert!(text.contains("KPIs for sales: Total Sum 10.00 | Average 5.00 | Max Value 10.00"));
    }

    #[test]
    fn test_clean_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let output = dir.path().join("out.csv");
        let mut out = Vec::new();
        run_clean(&mut out, &path, &output).unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "region,sales\nNorth,10\nSouth,0\n");

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Data Cleaned! Removed 1 duplicate rows, filled 1 numeric and 0 text cells"));
    }

    #[test]
    fn test_ask_without_key_fails_early() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path());
        let llm = LlmSettings {
            api_key: None,
            api_base: "http://localhost".into(),
            model: "m".into(),
            temperature: None,
        };
        let mut out = Vec::new();
        assert!(run_ask(&mut out, &path, "total?", false, &llm).is_err());
    }

    #[test]
    fn test_print_chart_answer() {
        let answer = Answer {
            text: None,
            chart: Some(ChartData::Bars {
                title: "t".into(),
                bars: vec![("a".into(), 1.0)],
            }),
        };
        let mut out = Vec::new();
        print_answer(&mut out, &answer).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n[chart] t\n  a  1.00\n");
    }
}
