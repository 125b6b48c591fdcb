// src/render/mod.rs
//
// Prints a materialized TableSet as boxed text tables, JSON or CSV.

use anyhow::{Context, Result};
use clap::ValueEnum;
use indexmap::IndexMap;
use prettytable::{format, Cell, Row, Table as PrettyTable};
use std::io::Write;

use crate::process::{QueryOutcome, Table, TableSet, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One text table per result table (default)
    #[default]
    Table,
    /// A JSON object of table name → list of row objects
    Json,
    /// CSV, one `# name` section per table
    Csv,
}

/// Write the outcome of a query to `out`, and any decode warnings to `err`.
pub fn write_outcome<W, E>(
    outcome: &QueryOutcome,
    format: OutputFormat,
    out: &mut W,
    err: &mut E,
) -> Result<()>
where
    W: Write + ?Sized,
    E: Write + ?Sized,
{
    match outcome {
        QueryOutcome::NoResults => writeln!(out, "No results found")?,
        QueryOutcome::Rows(materialized) => {
            write_tables(&materialized.tables, format, out)?;
            if materialized.decode_errors > 0 {
                writeln!(
                    err,
                    "warning: {} of {} row(s) could not be decoded and were skipped",
                    materialized.decode_errors, materialized.rows
                )?;
            }
        }
    }
    out.flush().context("flushing output")?;
    Ok(())
}

pub fn write_tables<W>(tables: &TableSet, format: OutputFormat, out: &mut W) -> Result<()>
where
    W: Write + ?Sized,
{
    match format {
        OutputFormat::Table => write_text(tables, out),
        OutputFormat::Json => write_json(tables, out),
        OutputFormat::Csv => write_csv(tables, out),
    }
}

fn write_text<W: Write + ?Sized>(tables: &TableSet, out: &mut W) -> Result<()> {
    for table in tables {
        writeln!(out)?;
        writeln!(out, "{}", table.name())?;
        text_table(table)
            .print(out)
            .with_context(|| format!("printing table {}", table.name()))?;
    }
    Ok(())
}

fn text_table(table: &Table) -> PrettyTable {
    let mut pretty = PrettyTable::new();
    pretty.set_format(*format::consts::FORMAT_DEFAULT);
    pretty.set_titles(Row::new(
        table.header().iter().map(|name| Cell::new(name)).collect(),
    ));
    for row in table.rows() {
        pretty.add_row(Row::new(
            row.iter()
                .map(|value| {
                    let cell = Cell::new(&value.to_string());
                    if matches!(value, Value::Number(_)) {
                        cell.style_spec("r")
                    } else {
                        cell
                    }
                })
                .collect(),
        ));
    }
    pretty
}

fn write_json<W: Write + ?Sized>(tables: &TableSet, out: &mut W) -> Result<()> {
    let document: IndexMap<&str, Vec<IndexMap<&str, &Value>>> = tables
        .iter()
        .map(|table| {
            let records = table
                .records()
                .map(|record| record.into_iter().collect())
                .collect();
            (table.name(), records)
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &document).context("writing JSON")?;
    writeln!(out)?;
    Ok(())
}

fn write_csv<W: Write + ?Sized>(tables: &TableSet, out: &mut W) -> Result<()> {
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "# {}", table.name())?;
        let mut writer = csv::Writer::from_writer(&mut *out);
        writer.write_record(table.header())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        writer
            .flush()
            .with_context(|| format!("writing CSV for {}", table.name()))?;
    }
    Ok(())
}
