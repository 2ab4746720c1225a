use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::services::{Config, DataSource, Evaluator, PivotLookups, ResultsClient};
use crate::types::{Aggregation, Analysis, CellStat, Filter, PeriodChoice, Selection};

/// Running-event statistics dashboard
#[derive(Parser)]
#[command(name = "runstat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui {
        /// Read rows from a local JSON file instead of the results service
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print the pivot grid to stdout
    Table {
        /// Measure family: participants, pct-participants, pct-total, times, age
        #[arg(long, default_value = "participants")]
        analysis: String,

        /// Cohort filter: all, tourists, super-tourists, volunteers,
        /// regulars, first-timers, event-number, coeff
        #[arg(long, default_value = "all")]
        filter: String,

        /// Aggregation: avg, total, max, min, range, growth
        #[arg(long, default_value = "avg")]
        aggregation: String,

        /// Period: recent, last50, since, all, annual, monthseason, quarterseason
        #[arg(long, default_value = "recent")]
        period: String,

        /// Times cell statistic: avg, within12, within5
        #[arg(long, default_value = "avg")]
        cell_stat: String,

        /// Read rows from a local JSON file instead of the results service
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            None => crate::tui::run(data_source(None)?),
            Some(Commands::Tui { input }) => crate::tui::run(data_source(input)?),
            Some(Commands::Table {
                analysis,
                filter,
                aggregation,
                period,
                cell_stat,
                input,
                json,
            }) => run_table(
                &analysis,
                &filter,
                &aggregation,
                &period,
                &cell_stat,
                input,
                json,
            ),
        }
    }
}

fn data_source(input: Option<PathBuf>) -> anyhow::Result<DataSource> {
    match input {
        Some(path) => Ok(DataSource::File(path)),
        None => {
            let config = Config::load();
            Ok(DataSource::Remote(ResultsClient::new(&config)?))
        }
    }
}

fn parse_key<T: Copy>(name: &str, key: &str, parse: fn(&str) -> Option<T>, default: T) -> T {
    match parse(key) {
        Some(value) => value,
        None => {
            eprintln!("[runstat] Warning: unknown {} '{}', using default", name, key);
            default
        }
    }
}

/// Build a legal selection from CLI keys. Unknown keys warn and fall back;
/// illegal combinations snap exactly like the interactive controls.
fn parse_selection(
    analysis: &str,
    filter: &str,
    aggregation: &str,
    period: &str,
    cell_stat: &str,
) -> Selection {
    let mut selection = Selection {
        analysis: parse_key("analysis", analysis, Analysis::from_key, Analysis::default()),
        filter: parse_key("filter", filter, Filter::from_key, Filter::default()),
        aggregation: parse_key(
            "aggregation",
            aggregation,
            Aggregation::from_key,
            Aggregation::default(),
        ),
        period: parse_key("period", period, PeriodChoice::from_key, PeriodChoice::default()),
        cell_stat: parse_key("cell-stat", cell_stat, CellStat::from_key, CellStat::default()),
        ..Selection::default()
    };
    selection.snap();
    selection
}

fn run_table(
    analysis: &str,
    filter: &str,
    aggregation: &str,
    period: &str,
    cell_stat: &str,
    input: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let selection = parse_selection(analysis, filter, aggregation, period, cell_stat);
    let source = data_source(input)?;
    let rows = source.load(selection.period)?;

    let lookups = PivotLookups::build(&rows, selection.period);
    let evaluator = Evaluator::new(&lookups, selection);

    if json {
        print_json(&lookups, &evaluator, selection)?;
    } else {
        print_text(&lookups, &evaluator, selection);
    }
    Ok(())
}

fn print_json(
    lookups: &PivotLookups,
    evaluator: &Evaluator,
    selection: Selection,
) -> anyhow::Result<()> {
    let cells: Vec<Vec<serde_json::Value>> = lookups
        .events
        .iter()
        .map(|event| {
            lookups
                .periods
                .iter()
                .map(|period| {
                    let cell = evaluator.cell_value(period, &event.code);
                    serde_json::json!({"display": cell.display, "raw": cell.raw})
                })
                .collect()
        })
        .collect();

    let row_aggregates: Vec<serde_json::Value> = lookups
        .events
        .iter()
        .map(|event| {
            let agg = evaluator.row_aggregate(&event.code);
            serde_json::json!({"display": agg.display, "raw": agg.raw})
        })
        .collect();

    let column_aggregates: Vec<serde_json::Value> = lookups
        .periods
        .iter()
        .map(|period| {
            let agg = evaluator.column_aggregate(period);
            serde_json::json!({"display": agg.display, "raw": agg.raw})
        })
        .collect();

    let events: Vec<serde_json::Value> = lookups
        .events
        .iter()
        .map(|e| serde_json::json!({"code": e.code, "name": e.name}))
        .collect();

    let output = serde_json::json!({
        "selection": selection,
        "periods": lookups.periods,
        "events": events,
        "cells": cells,
        "row_aggregates": row_aggregates,
        "column_aggregates": column_aggregates,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(lookups: &PivotLookups, evaluator: &Evaluator, selection: Selection) {
    const NAME_WIDTH: usize = 24;
    const COL_WIDTH: usize = 11;

    let fit = |label: &str| -> String {
        if label.len() <= COL_WIDTH - 1 {
            label.to_string()
        } else {
            label.chars().take(COL_WIDTH - 1).collect()
        }
    };

    let mut header = format!("{:<NAME_WIDTH$}", "Event");
    for period in &lookups.periods {
        let label = if period.is_empty() { "?" } else { period };
        header.push_str(&format!("{:>COL_WIDTH$}", fit(label)));
    }
    header.push_str(&format!("{:>COL_WIDTH$}", selection.aggregation.label()));
    println!("{}", header);

    let mut summary = format!("{:<NAME_WIDTH$}", "All events");
    for period in &lookups.periods {
        let agg = evaluator.column_aggregate(period);
        summary.push_str(&format!("{:>COL_WIDTH$}", fit(&agg.display)));
    }
    println!("{}", summary);

    for event in &lookups.events {
        let mut line = format!("{:<NAME_WIDTH$}", fit_name(&event.name, NAME_WIDTH));
        for period in &lookups.periods {
            let cell = evaluator.cell_value(period, &event.code);
            line.push_str(&format!("{:>COL_WIDTH$}", fit(&cell.display)));
        }
        let agg = evaluator.row_aggregate(&event.code);
        line.push_str(&format!("{:>COL_WIDTH$}", fit(&agg.display)));
        println!("{}", line);
    }
}

fn fit_name(name: &str, width: usize) -> String {
    if name.len() < width {
        name.to_string()
    } else {
        name.chars().take(width - 1).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["runstat"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_table_defaults() {
        let cli = Cli::try_parse_from(["runstat", "table"]).unwrap();
        match cli.command {
            Some(Commands::Table {
                analysis,
                filter,
                aggregation,
                period,
                json,
                ..
            }) => {
                assert_eq!(analysis, "participants");
                assert_eq!(filter, "all");
                assert_eq!(aggregation, "avg");
                assert_eq!(period, "recent");
                assert!(!json);
            }
            _ => panic!("expected table command"),
        }
    }

    #[test]
    fn test_cli_parse_table_json() {
        let cli = Cli::try_parse_from([
            "runstat",
            "table",
            "--analysis",
            "pct-total",
            "--filter",
            "tourists",
            "--json",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Table { json: true, .. })
        ));
    }

    #[test]
    fn test_parse_selection_valid_keys() {
        let selection = parse_selection("pct-total", "tourists", "total", "annual", "avg");
        assert_eq!(selection.analysis, Analysis::PctTotal);
        assert_eq!(selection.filter, Filter::Tourists);
        assert_eq!(selection.aggregation, Aggregation::Total);
        assert_eq!(selection.period, PeriodChoice::Annual);
    }

    #[test]
    fn test_parse_selection_unknown_key_falls_back() {
        let selection = parse_selection("bogus", "all", "avg", "recent", "avg");
        assert_eq!(selection.analysis, Analysis::Participants);
    }

    #[test]
    fn test_parse_selection_snaps_illegal_combination() {
        // Growth is not allowed for %Total: snaps to first legal value
        let selection = parse_selection("pct-total", "tourists", "growth", "recent", "avg");
        assert_eq!(selection.aggregation, Aggregation::Avg);
    }

    #[test]
    fn test_parse_selection_times_cell_stat() {
        let selection = parse_selection("times", "all", "avg", "recent", "within5");
        assert_eq!(selection.analysis, Analysis::Times);
        assert_eq!(selection.cell_stat, CellStat::Within5);
    }
}
