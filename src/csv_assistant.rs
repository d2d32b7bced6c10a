//! CSV data assistant.
//!
//! Loads a CSV file, summarises its shape, and asks the chat endpoint a
//! question about it. Only the first [`PREVIEW_ROWS`] rows are sent, rendered
//! as a Markdown table, to keep the prompt short.

use crate::api::{ChatCompletion, ChatMessage, ChatRequest};
use crate::utils::strip_think;
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

/// Number of rows included in the preview and the prompt.
pub const PREVIEW_ROWS: usize = 10;

/// Cell values read as missing, like empty cells.
pub const MISSING_VALUES: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Descriptive statistics for one column, over its non-missing values.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnStats {
    Numeric {
        count: usize,
        mean: f64,
        min: f64,
        max: f64,
    },
    /// `top` is the most frequent value; ties go to the alphabetically first.
    Categorical {
        count: usize,
        unique: usize,
        top: Option<(String, usize)>,
    },
}

/// The head of a CSV file plus per-column type information over all rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvPreview {
    pub headers: Vec<String>,
    /// The first [`PREVIEW_ROWS`] rows, padded or cut to the header width.
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    /// Columns whose non-missing values all parse as numbers.
    pub numeric_columns: Vec<String>,
    /// Every other column.
    pub categorical_columns: Vec<String>,
    /// One entry per header, in header order.
    pub column_stats: Vec<ColumnStats>,
}

#[derive(Debug)]
struct ColumnAccumulator {
    count: usize,
    all_numeric: bool,
    sum: f64,
    min: f64,
    max: f64,
    frequencies: HashMap<String, usize>,
}

impl ColumnAccumulator {
    fn new() -> Self {
        Self {
            count: 0,
            all_numeric: true,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            frequencies: HashMap::new(),
        }
    }

    fn push(&mut self, value: &str) {
        if MISSING_VALUES.iter().any(|missing| *missing == value) {
            return;
        }
        self.count += 1;
        *self.frequencies.entry(value.to_string()).or_default() += 1;
        if !self.all_numeric {
            return;
        }
        match value.parse::<f64>() {
            Ok(n) => {
                self.sum += n;
                self.min = self.min.min(n);
                self.max = self.max.max(n);
            }
            Err(_) => self.all_numeric = false,
        }
    }

    fn finish(self) -> ColumnStats {
        if self.count > 0 && self.all_numeric {
            return ColumnStats::Numeric {
                count: self.count,
                mean: self.sum / self.count as f64,
                min: self.min,
                max: self.max,
            };
        }
        let unique = self.frequencies.len();
        let top = self
            .frequencies
            .into_iter()
            .min_by(|(a, fa), (b, fb)| fb.cmp(fa).then_with(|| a.cmp(b)));
        ColumnStats::Categorical {
            count: self.count,
            unique,
            top,
        }
    }
}

impl CsvPreview {
    /// Read a CSV file. Invalid UTF-8 is replaced rather than rejected.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| format!("cannot read CSV file {}: {e}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let preview = Self::from_reader(text.as_bytes())?;
        info!(
            rows = preview.total_rows,
            columns = preview.headers.len(),
            "Loaded CSV"
        );
        Ok(preview)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Box<dyn Error>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err("CSV file has no header row".into());
        }

        let width = headers.len();
        let mut rows = Vec::new();
        let mut total_rows = 0usize;
        let mut columns: Vec<ColumnAccumulator> =
            (0..width).map(|_| ColumnAccumulator::new()).collect();

        for record in csv_reader.records() {
            let record = record?;
            total_rows += 1;

            for (column, value) in columns.iter_mut().zip(record.iter()) {
                column.push(value);
            }

            if rows.len() < PREVIEW_ROWS {
                let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
                row.resize(width, String::new());
                rows.push(row);
            }
        }

        let column_stats: Vec<ColumnStats> =
            columns.into_iter().map(ColumnAccumulator::finish).collect();
        let (numeric_columns, categorical_columns): (Vec<String>, Vec<String>) = headers
            .iter()
            .zip(&column_stats)
            .partition_map(|(name, stats)| match stats {
                ColumnStats::Numeric { .. } => itertools::Either::Left(name.clone()),
                ColumnStats::Categorical { .. } => itertools::Either::Right(name.clone()),
            });

        Ok(Self {
            headers,
            rows,
            total_rows,
            numeric_columns,
            categorical_columns,
            column_stats,
        })
    }

    /// The preview rows as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = vec![markdown_row(self.headers.as_slice()), separator(self.headers.len())];
        out.extend(self.rows.iter().map(|row| markdown_row(row.as_slice())));
        out.join("\n")
    }

    /// Per-column statistics as a Markdown table, numeric and categorical columns side by side.
    pub fn stats_markdown(&self) -> String {
        const HEADER: [&str; 8] = ["column", "count", "mean", "min", "max", "unique", "top", "freq"];
        let mut out = vec![markdown_row(HEADER.as_slice()), separator(HEADER.len())];
        for (name, stats) in self.headers.iter().zip(&self.column_stats) {
            let cells = match stats {
                ColumnStats::Numeric {
                    count,
                    mean,
                    min,
                    max,
                } => vec![
                    name.clone(),
                    count.to_string(),
                    format!("{mean:.2}"),
                    format!("{min:.2}"),
                    format!("{max:.2}"),
                    String::new(),
                    String::new(),
                    String::new(),
                ],
                ColumnStats::Categorical { count, unique, top } => {
                    let (top, freq) = match top {
                        Some((value, freq)) => (value.clone(), freq.to_string()),
                        None => (String::new(), String::new()),
                    };
                    vec![
                        name.clone(),
                        count.to_string(),
                        String::new(),
                        String::new(),
                        String::new(),
                        unique.to_string(),
                        top,
                        freq,
                    ]
                }
            };
            out.push(markdown_row(cells.as_slice()));
        }
        out.join("\n")
    }

    /// The file's shape followed by the per-column statistics.
    pub fn summary(&self) -> String {
        format!(
            "{} rows, {} columns\nnumeric: {}\ncategorical: {}\n\n{}",
            self.total_rows,
            self.headers.len(),
            display_list(&self.numeric_columns),
            display_list(&self.categorical_columns),
            self.stats_markdown(),
        )
    }

    /// Whether the data has both a category and a value column to plot against each other.
    pub fn chartable(&self) -> bool {
        !self.numeric_columns.is_empty() && !self.categorical_columns.is_empty()
    }
}

fn markdown_row<S: AsRef<str>>(cells: &[S]) -> String {
    format!(
        "| {} |",
        cells
            .iter()
            .map(|c| c.as_ref().replace('|', "\\|"))
            .join(" | ")
    )
}

fn separator(width: usize) -> String {
    format!("|{}|", vec![" --- "; width].join("|"))
}

fn display_list(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// Answers questions about a CSV preview.
#[derive(Debug)]
pub struct CsvAssistant<C> {
    chat: C,
    model: Option<String>,
}

impl<C: ChatCompletion> CsvAssistant<C> {
    pub fn new(chat: C, model: Option<String>) -> Self {
        Self { chat, model }
    }

    pub fn request(&self, preview: &CsvPreview, question: &str) -> ChatRequest {
        let prompt = format!(
            "You are a data analyst. Answer the question using the DataFrame below \
             (shown as a Markdown table).\n\n\
             Data:\n{}\n\n\
             Question:\n{}\n\n\
             Reply in concise bullet points, with key insights and, where useful, \
             suggested next steps for analysis.",
            preview.to_markdown(),
            question.trim()
        );
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: Some(0.5),
            max_tokens: None,
        }
    }

    /// Ask `question` about `preview`, with any `<think>` block removed from the answer.
    #[instrument(level = "info", skip_all)]
    pub async fn ask(&self, preview: &CsvPreview, question: &str) -> Result<String, Box<dyn Error>> {
        if question.trim().is_empty() {
            return Err("question is empty".into());
        }
        let raw = self.chat.complete(&self.request(preview, question)).await?;
        Ok(strip_think(&raw))
    }
}
