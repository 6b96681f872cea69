use crate::core::{
    command_init::{BlameCommandContext, BlameCommandInit},
    display::{DisplayState, RowDisplay},
    error::Result,
    output::{format_annotation_line, print_info},
};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

/// One line of `blame --json` output
#[derive(Debug, Serialize)]
pub struct LineReport {
    pub line: usize,
    pub revision: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub text: String,
}

pub async fn execute_blame(
    file: &Path,
    line: Option<usize>,
    json: bool,
    date_format: Option<&str>,
) -> Result<()> {
    let context = BlameCommandInit::initialize(file, date_format).await?;

    let rows: Vec<usize> = match line {
        Some(line) => {
            context.select_line(line)?;
            vec![line - 1]
        }
        None => (0..context.line_count()).collect(),
    };

    if !context.session.has_repository() {
        print_info("File is not in a git repository");
        return Ok(());
    }

    let reports = collect_reports(&context, &rows);
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let width = context.line_count().to_string().len();
    for report in &reports {
        let hash = report.revision.as_deref().unwrap_or("");
        println!(
            "{}",
            format_annotation_line(report.line, hash, &report.text, width)
        );
    }
    Ok(())
}

fn collect_reports(context: &BlameCommandContext, rows: &[usize]) -> Vec<LineReport> {
    let now = Utc::now();
    rows.iter()
        .map(|&row| {
            let display = context.session.lookup_row(row);
            let state = DisplayState::from_row(&display, &context.dates, now);
            let (revision, author, date) = match (&display, &state) {
                (
                    RowDisplay::Annotated { annotation, .. },
                    DisplayState::Annotated {
                        author,
                        date_text,
                        is_dirty: false,
                    },
                ) => (
                    Some(annotation.short_hash()),
                    Some(author.clone()),
                    Some(date_text.clone()),
                ),
                _ => (None, None, None),
            };
            LineReport {
                line: row + 1,
                revision,
                author,
                date,
                text: state.text(),
            }
        })
        .collect()
}
