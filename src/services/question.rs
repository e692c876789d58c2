//! Question service
//!
//! Business rules for the question bank: creation with translation and
//! tags, filtered listing, and the admin CSV bulk import. Each imported
//! row is inserted in its own transaction, so a bad row never leaves a
//! partial question behind and never disturbs the rows around it.

use crate::db::repositories::QuestionRepository;
use crate::models::{
    CreateQuestionInput, CreateTranslationInput, Language, ListParams, OptionKey, PagedResult,
    QuestionFilter, QuestionWithTranslation,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Headers every import file must carry, in any column order
const CSV_REQUIRED_HEADERS: [&str; 11] = [
    "questionType",
    "category",
    "difficulty",
    "tags",
    "questionText",
    "explanation",
    "optionA",
    "optionB",
    "optionC",
    "optionD",
    "correctOptionKey",
];

/// Difficulty applied when an imported row leaves the column empty
const CSV_DEFAULT_DIFFICULTY: &str = "medium";

/// Error types for question service operations
#[derive(Debug, thiserror::Error)]
pub enum QuestionServiceError {
    /// Question not found
    #[error("Question not found: {0}")]
    NotFound(i64),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The uploaded CSV cannot be processed at all
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Outcome of a CSV bulk import
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkImportReport {
    /// Data rows in the file
    pub total: usize,
    /// Rows imported
    pub success: usize,
    /// Rows rejected
    pub failed: usize,
    /// One message per rejected row, `Row N: ...` with N counting the
    /// header as line 1
    pub errors: Vec<String>,
}

/// One CSV data row, mapped by header name
#[derive(Debug, Deserialize)]
struct CsvQuestionRow {
    #[serde(rename = "questionType", default)]
    question_type: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    tags: String,
    #[serde(rename = "questionText", default)]
    question_text: String,
    #[serde(default)]
    explanation: String,
    #[serde(rename = "optionA", default)]
    option_a: String,
    #[serde(rename = "optionB", default)]
    option_b: String,
    #[serde(rename = "optionC", default)]
    option_c: String,
    #[serde(rename = "optionD", default)]
    option_d: String,
    #[serde(rename = "correctOptionKey", default)]
    correct_option_key: String,
}

/// Question service for the bank and its bulk import
pub struct QuestionService {
    repo: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    /// Create a new question service
    pub fn new(repo: Arc<dyn QuestionRepository>) -> Self {
        Self { repo }
    }

    /// Create a question with its first translation and tags
    ///
    /// # Errors
    ///
    /// - `ValidationError` if question type, category, or question text is
    ///   missing
    /// - `InternalError` for database errors
    pub async fn create_question(
        &self,
        input: CreateQuestionInput,
        created_by: Option<i64>,
    ) -> Result<QuestionWithTranslation, QuestionServiceError> {
        if input.question_type.trim().is_empty() {
            return Err(QuestionServiceError::ValidationError(
                "Question type cannot be empty".to_string(),
            ));
        }

        if input.category.as_deref().unwrap_or("").trim().is_empty() {
            return Err(QuestionServiceError::ValidationError(
                "Category cannot be empty".to_string(),
            ));
        }

        if input.translation.question_text.trim().is_empty() {
            return Err(QuestionServiceError::ValidationError(
                "Question text cannot be empty".to_string(),
            ));
        }

        let created = self
            .repo
            .create(&input, created_by)
            .await
            .context("Failed to create question")?;

        Ok(created)
    }

    /// One question with its translation for the given language
    pub async fn get_question(
        &self,
        id: i64,
        language: Language,
    ) -> Result<QuestionWithTranslation, QuestionServiceError> {
        self.repo
            .get(id, language)
            .await
            .context("Failed to get question")?
            .ok_or(QuestionServiceError::NotFound(id))
    }

    /// Filtered listing of active questions, newest first
    pub async fn list_questions(
        &self,
        filter: &QuestionFilter,
        params: &ListParams,
    ) -> Result<PagedResult<QuestionWithTranslation>, QuestionServiceError> {
        let result = self
            .repo
            .list(filter, params)
            .await
            .context("Failed to list questions")?;

        Ok(result)
    }

    /// Import questions from CSV text
    ///
    /// The header line must carry all expected columns (any order). Every
    /// data row is validated and inserted independently: a rejected row is
    /// reported with its file line number and has no effect on the rows
    /// before or after it.
    ///
    /// # Errors
    ///
    /// - `InvalidCsv` when the header is wrong or the file has no data rows
    /// - `InternalError` only for failures outside row processing
    pub async fn import_csv(
        &self,
        csv_text: &str,
        language: Language,
        created_by: Option<i64>,
    ) -> Result<BulkImportReport, QuestionServiceError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(csv_text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| QuestionServiceError::InvalidCsv(format!("Unreadable header: {}", e)))?
            .clone();

        let missing: Vec<&str> = CSV_REQUIRED_HEADERS
            .iter()
            .filter(|required| !headers.iter().any(|h| h == **required))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(QuestionServiceError::InvalidCsv(format!(
                "Missing required headers: {}",
                missing.join(", ")
            )));
        }

        let mut report = BulkImportReport::default();

        for (index, record) in reader.deserialize::<CsvQuestionRow>().enumerate() {
            // Header is line 1, so the first data row is line 2
            let line = index + 2;
            report.total += 1;

            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    report.failed += 1;
                    report.errors.push(format!("Row {}: {}", line, e));
                    continue;
                }
            };

            match self.import_row(row, language, created_by).await {
                Ok(()) => report.success += 1,
                Err(message) => {
                    report.failed += 1;
                    report.errors.push(format!("Row {}: {}", line, message));
                }
            }
        }

        if report.total == 0 {
            return Err(QuestionServiceError::InvalidCsv(
                "CSV file must contain at least one data row".to_string(),
            ));
        }

        tracing::info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            "CSV question import finished"
        );

        Ok(report)
    }

    /// Validate and insert one CSV row; the error string is the per-row
    /// report message
    async fn import_row(
        &self,
        row: CsvQuestionRow,
        language: Language,
        created_by: Option<i64>,
    ) -> Result<(), String> {
        if row.question_type.is_empty() || row.category.is_empty() || row.question_text.is_empty()
        {
            return Err("Missing required fields".to_string());
        }

        let correct_option_key = OptionKey::from_str(&row.correct_option_key)
            .map_err(|_| format!("Invalid correct option key: {}", row.correct_option_key))?;

        let difficulty = if row.difficulty.is_empty() {
            CSV_DEFAULT_DIFFICULTY.to_string()
        } else {
            row.difficulty
        };

        let tags: Vec<String> = row
            .tags
            .split(';')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        let input = CreateQuestionInput {
            question_type: row.question_type,
            category: Some(row.category),
            difficulty: Some(difficulty),
            is_active: true,
            tags,
            translation: CreateTranslationInput {
                language,
                question_text: row.question_text,
                explanation: if row.explanation.is_empty() {
                    None
                } else {
                    Some(row.explanation)
                },
                option_a: row.option_a,
                option_b: row.option_b,
                option_c: row.option_c,
                option_d: row.option_d,
                correct_option_key,
            },
        };

        // The repository inserts question, translation, and tags in one
        // transaction, so a failure here leaves nothing behind for this row
        self.repo
            .create(&input, created_by)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}


// ============================================================================
// Property-based tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::SqlxQuestionRepository;
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    async fn setup_property_test_service() -> QuestionService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        QuestionService::new(SqlxQuestionRepository::boxed(pool))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Whatever mix of valid and broken rows arrives, the report adds
        /// up: every row is counted exactly once and every failure carries
        /// a message.
        #[test]
        fn property_import_report_is_consistent(
            rows in proptest::collection::vec(
                (any::<bool>(), "[a-z]{1,12}", 0u8..6),
                1..8
            )
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_property_test_service().await;

                let mut csv_text = String::from(
                    "questionType,category,difficulty,tags,questionText,explanation,optionA,optionB,optionC,optionD,correctOptionKey",
                );
                let mut expected_valid = 0usize;
                let keys = ["A", "B", "C", "D", "E", ""];
                for (valid, text, key_index) in &rows {
                    let key = keys[*key_index as usize];
                    let key_is_valid = *key_index < 4;
                    if *valid && key_is_valid {
                        expected_valid += 1;
                        csv_text.push_str(&format!(
                            "\nmcq,polity,easy,,{}?,,a,b,c,d,{}",
                            text, key
                        ));
                    } else if *valid {
                        // Valid fields but broken correct key
                        csv_text.push_str(&format!(
                            "\nmcq,polity,easy,,{}?,,a,b,c,d,{}",
                            text, key
                        ));
                    } else {
                        // Missing question text
                        csv_text.push_str("\nmcq,polity,easy,,,,a,b,c,d,A");
                    }
                }

                let report = service
                    .import_csv(&csv_text, Language::En, None)
                    .await
                    .expect("Import failed");

                prop_assert_eq!(report.total, rows.len());
                prop_assert_eq!(report.success + report.failed, report.total);
                prop_assert_eq!(report.errors.len(), report.failed);
                prop_assert_eq!(report.success, expected_valid);
                Ok(())
            });
            result?;
        }
    }
}
