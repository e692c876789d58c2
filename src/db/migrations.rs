//! Database migrations module
//!
//! Code-based migrations for the Pariksha exam-preparation platform. All
//! migrations are embedded as SQL strings with variants for both SQLite and
//! MySQL, so a single binary can bootstrap either backend.
//!
//! # Usage
//!
//! ```ignore
//! use pariksha::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the Pariksha platform, embedded in the binary.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create users table (Google sign-in accounts)
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(100),
                google_id VARCHAR(64) UNIQUE,
                avatar VARCHAR(500),
                role VARCHAR(20) NOT NULL DEFAULT 'USER',
                is_email_verified INTEGER NOT NULL DEFAULT 0,
                preferred_language VARCHAR(10) NOT NULL DEFAULT 'en',
                last_login_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_users_google_id ON users(google_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(100),
                google_id VARCHAR(64) UNIQUE,
                avatar VARCHAR(500),
                role VARCHAR(20) NOT NULL DEFAULT 'USER',
                is_email_verified TINYINT NOT NULL DEFAULT 0,
                preferred_language VARCHAR(10) NOT NULL DEFAULT 'en',
                last_login_at TIMESTAMP NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_email ON users(email);
            CREATE INDEX idx_users_google_id ON users(google_id);
        "#,
    },
    // Migration 2: Create sessions table (cookie-backed login sessions)
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    // Migration 3: Create exams catalog with starter rows
    Migration {
        version: 3,
        name: "create_exams",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS exams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                image_url VARCHAR(500),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            INSERT OR IGNORE INTO exams (id, title, image_url)
            VALUES (1, 'UPSC Civil Services Exam', 'https://picsum.photos/400/300?random=1');
            INSERT OR IGNORE INTO exams (id, title, image_url)
            VALUES (2, 'SSC CGL', 'https://picsum.photos/400/300?random=2');
            INSERT OR IGNORE INTO exams (id, title, image_url)
            VALUES (3, 'IBPS PO', 'https://picsum.photos/400/300?random=3');
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS exams (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                image_url VARCHAR(500),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            INSERT IGNORE INTO exams (id, title, image_url)
            VALUES (1, 'UPSC Civil Services Exam', 'https://picsum.photos/400/300?random=1');
            INSERT IGNORE INTO exams (id, title, image_url)
            VALUES (2, 'SSC CGL', 'https://picsum.photos/400/300?random=2');
            INSERT IGNORE INTO exams (id, title, image_url)
            VALUES (3, 'IBPS PO', 'https://picsum.photos/400/300?random=3');
        "#,
    },
    // Migration 4: Create test series catalog with starter rows
    Migration {
        version: 4,
        name: "create_test_series",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS test_series (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                image_url VARCHAR(500),
                exam_id INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (exam_id) REFERENCES exams(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_test_series_exam_id ON test_series(exam_id);
            INSERT OR IGNORE INTO test_series (id, title, image_url, exam_id)
            VALUES (1, 'UPSC Prelims Test Series', 'https://picsum.photos/400/300?random=4', 1);
            INSERT OR IGNORE INTO test_series (id, title, image_url, exam_id)
            VALUES (2, 'SSC CGL Mock Tests', 'https://picsum.photos/400/300?random=5', 2);
            INSERT OR IGNORE INTO test_series (id, title, image_url, exam_id)
            VALUES (3, 'IBPS PO Practice', 'https://picsum.photos/400/300?random=6', 3);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS test_series (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                image_url VARCHAR(500),
                exam_id BIGINT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (exam_id) REFERENCES exams(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_test_series_exam_id ON test_series(exam_id);
            INSERT IGNORE INTO test_series (id, title, image_url, exam_id)
            VALUES (1, 'UPSC Prelims Test Series', 'https://picsum.photos/400/300?random=4', 1);
            INSERT IGNORE INTO test_series (id, title, image_url, exam_id)
            VALUES (2, 'SSC CGL Mock Tests', 'https://picsum.photos/400/300?random=5', 2);
            INSERT IGNORE INTO test_series (id, title, image_url, exam_id)
            VALUES (3, 'IBPS PO Practice', 'https://picsum.photos/400/300?random=6', 3);
        "#,
    },
    // Migration 5: Create notes catalog with starter rows
    Migration {
        version: 5,
        name: "create_notes",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                image_url VARCHAR(500),
                user_id INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notes_user_id ON notes(user_id);
            INSERT OR IGNORE INTO notes (id, title, image_url)
            VALUES (1, 'Indian Polity Notes', 'https://picsum.photos/400/300?random=7');
            INSERT OR IGNORE INTO notes (id, title, image_url)
            VALUES (2, 'Quantitative Aptitude Shortcuts', 'https://picsum.photos/400/300?random=8');
            INSERT OR IGNORE INTO notes (id, title, image_url)
            VALUES (3, 'IBPS PO Notes', 'https://picsum.photos/400/300?random=9');
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS notes (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                image_url VARCHAR(500),
                user_id BIGINT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_notes_user_id ON notes(user_id);
            INSERT IGNORE INTO notes (id, title, image_url)
            VALUES (1, 'Indian Polity Notes', 'https://picsum.photos/400/300?random=7');
            INSERT IGNORE INTO notes (id, title, image_url)
            VALUES (2, 'Quantitative Aptitude Shortcuts', 'https://picsum.photos/400/300?random=8');
            INSERT IGNORE INTO notes (id, title, image_url)
            VALUES (3, 'IBPS PO Notes', 'https://picsum.photos/400/300?random=9');
        "#,
    },
    // Migration 6: Create question bank
    Migration {
        version: 6,
        name: "create_questions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_type VARCHAR(20) NOT NULL DEFAULT 'MCQ',
                category VARCHAR(100),
                difficulty VARCHAR(20),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_questions_category ON questions(category);
            CREATE INDEX IF NOT EXISTS idx_questions_difficulty ON questions(difficulty);
            CREATE INDEX IF NOT EXISTS idx_questions_is_active ON questions(is_active);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS questions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                question_type VARCHAR(20) NOT NULL DEFAULT 'MCQ',
                category VARCHAR(100),
                difficulty VARCHAR(20),
                is_active TINYINT NOT NULL DEFAULT 1,
                created_by BIGINT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_questions_category ON questions(category);
            CREATE INDEX idx_questions_difficulty ON questions(difficulty);
            CREATE INDEX idx_questions_is_active ON questions(is_active);
        "#,
    },
    // Migration 7: Create per-language question translations.
    // One row per (question, language); the options and answer key live here.
    Migration {
        version: 7,
        name: "create_question_translations",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS question_translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id INTEGER NOT NULL,
                language VARCHAR(10) NOT NULL DEFAULT 'en',
                question_text TEXT NOT NULL,
                explanation TEXT,
                option_a TEXT NOT NULL,
                option_b TEXT NOT NULL,
                option_c TEXT NOT NULL,
                option_d TEXT NOT NULL,
                correct_option_key VARCHAR(1) NOT NULL,
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
                UNIQUE(question_id, language)
            );
            CREATE INDEX IF NOT EXISTS idx_question_translations_question_id
                ON question_translations(question_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS question_translations (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                question_id BIGINT NOT NULL,
                language VARCHAR(10) NOT NULL DEFAULT 'en',
                question_text TEXT NOT NULL,
                explanation TEXT,
                option_a TEXT NOT NULL,
                option_b TEXT NOT NULL,
                option_c TEXT NOT NULL,
                option_d TEXT NOT NULL,
                correct_option_key VARCHAR(1) NOT NULL,
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
                UNIQUE KEY uk_question_translations (question_id, language)
            );
            CREATE INDEX idx_question_translations_question_id
                ON question_translations(question_id);
        "#,
    },
    // Migration 8: Create question tags
    Migration {
        version: 8,
        name: "create_question_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS question_tags (
                question_id INTEGER NOT NULL,
                tag VARCHAR(100) NOT NULL,
                PRIMARY KEY (question_id, tag),
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_question_tags_tag ON question_tags(tag);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS question_tags (
                question_id BIGINT NOT NULL,
                tag VARCHAR(100) NOT NULL,
                PRIMARY KEY (question_id, tag),
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_question_tags_tag ON question_tags(tag);
        "#,
    },
    // Migration 9: Create quizzes
    Migration {
        version: 9,
        name: "create_quizzes",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                quiz_type VARCHAR(50),
                category VARCHAR(100),
                time_limit INTEGER,
                is_active INTEGER NOT NULL DEFAULT 1,
                is_public INTEGER NOT NULL DEFAULT 1,
                created_by INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_quizzes_quiz_type ON quizzes(quiz_type);
            CREATE INDEX IF NOT EXISTS idx_quizzes_category ON quizzes(category);
            CREATE INDEX IF NOT EXISTS idx_quizzes_created_by ON quizzes(created_by);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                quiz_type VARCHAR(50),
                category VARCHAR(100),
                time_limit INTEGER,
                is_active TINYINT NOT NULL DEFAULT 1,
                is_public TINYINT NOT NULL DEFAULT 1,
                created_by BIGINT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (created_by) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_quizzes_quiz_type ON quizzes(quiz_type);
            CREATE INDEX idx_quizzes_category ON quizzes(category);
            CREATE INDEX idx_quizzes_created_by ON quizzes(created_by);
        "#,
    },
    // Migration 10: Create quiz_questions junction.
    // `position` is the 1-based order of the question within the quiz.
    Migration {
        version: 10,
        name: "create_quiz_questions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS quiz_questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id INTEGER NOT NULL,
                question_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                points INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE,
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
                UNIQUE(quiz_id, question_id)
            );
            CREATE INDEX IF NOT EXISTS idx_quiz_questions_quiz_id ON quiz_questions(quiz_id);
            CREATE INDEX IF NOT EXISTS idx_quiz_questions_question_id ON quiz_questions(question_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS quiz_questions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                quiz_id BIGINT NOT NULL,
                question_id BIGINT NOT NULL,
                position INTEGER NOT NULL,
                points INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE,
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
                UNIQUE KEY uk_quiz_questions (quiz_id, question_id)
            );
            CREATE INDEX idx_quiz_questions_quiz_id ON quiz_questions(quiz_id);
            CREATE INDEX idx_quiz_questions_question_id ON quiz_questions(question_id);
        "#,
    },
    // Migration 11: Create quiz attempts.
    // An attempt belongs to either a user or a guest; both columns are
    // nullable and the merge flow moves guest rows onto a user.
    Migration {
        version: 11,
        name: "create_quiz_attempts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS quiz_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id INTEGER NOT NULL,
                user_id INTEGER,
                guest_id VARCHAR(64),
                score INTEGER,
                total_points INTEGER NOT NULL DEFAULT 0,
                time_taken INTEGER,
                is_completed INTEGER NOT NULL DEFAULT 0,
                started_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                completed_at TIMESTAMP,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_quiz_attempts_quiz_id ON quiz_attempts(quiz_id);
            CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user_id ON quiz_attempts(user_id);
            CREATE INDEX IF NOT EXISTS idx_quiz_attempts_guest_id ON quiz_attempts(guest_id);
            CREATE INDEX IF NOT EXISTS idx_quiz_attempts_started ON quiz_attempts(is_completed, started_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS quiz_attempts (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                quiz_id BIGINT NOT NULL,
                user_id BIGINT,
                guest_id VARCHAR(64),
                score INTEGER,
                total_points INTEGER NOT NULL DEFAULT 0,
                time_taken INTEGER,
                is_completed TINYINT NOT NULL DEFAULT 0,
                started_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                completed_at TIMESTAMP NULL,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_quiz_attempts_quiz_id ON quiz_attempts(quiz_id);
            CREATE INDEX idx_quiz_attempts_user_id ON quiz_attempts(user_id);
            CREATE INDEX idx_quiz_attempts_guest_id ON quiz_attempts(guest_id);
            CREATE INDEX idx_quiz_attempts_started ON quiz_attempts(is_completed, started_at);
        "#,
    },
    // Migration 12: Create per-question answers.
    // One row per (attempt, question); re-answering replaces the row.
    Migration {
        version: 12,
        name: "create_question_attempts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS question_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                attempt_id INTEGER NOT NULL,
                question_id INTEGER NOT NULL,
                selected_option VARCHAR(1),
                is_correct INTEGER,
                time_spent INTEGER,
                answered_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (attempt_id) REFERENCES quiz_attempts(id) ON DELETE CASCADE,
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
                UNIQUE(attempt_id, question_id)
            );
            CREATE INDEX IF NOT EXISTS idx_question_attempts_attempt_id
                ON question_attempts(attempt_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS question_attempts (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                attempt_id BIGINT NOT NULL,
                question_id BIGINT NOT NULL,
                selected_option VARCHAR(1),
                is_correct TINYINT,
                time_spent INTEGER,
                answered_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (attempt_id) REFERENCES quiz_attempts(id) ON DELETE CASCADE,
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE,
                UNIQUE KEY uk_question_attempts (attempt_id, question_id)
            );
            CREATE INDEX idx_question_attempts_attempt_id
                ON question_attempts(attempt_id);
        "#,
    },
    // Migration 13: Create hero sections (homepage carousel) with starter rows
    Migration {
        version: 13,
        name: "create_hero_sections",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS hero_sections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                image_url VARCHAR(500) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            INSERT OR IGNORE INTO hero_sections (id, text, image_url)
            VALUES (1, 'Welcome to Pariksha Hub! Prepare for your exams with the best resources.', 'https://picsum.photos/600/220?random=101');
            INSERT OR IGNORE INTO hero_sections (id, text, image_url)
            VALUES (2, 'Join our test series and boost your confidence.', 'https://picsum.photos/600/220?random=102');
            INSERT OR IGNORE INTO hero_sections (id, text, image_url)
            VALUES (3, 'Get expert notes and shortcuts for quick revision.', 'https://picsum.photos/600/220?random=103');
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS hero_sections (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                `text` TEXT NOT NULL,
                image_url VARCHAR(500) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            INSERT IGNORE INTO hero_sections (id, `text`, image_url)
            VALUES (1, 'Welcome to Pariksha Hub! Prepare for your exams with the best resources.', 'https://picsum.photos/600/220?random=101');
            INSERT IGNORE INTO hero_sections (id, `text`, image_url)
            VALUES (2, 'Join our test series and boost your confidence.', 'https://picsum.photos/600/220?random=102');
            INSERT IGNORE INTO hero_sections (id, `text`, image_url)
            VALUES (3, 'Get expert notes and shortcuts for quick revision.', 'https://picsum.photos/600/220?random=103');
        "#,
    },
];

/// Run all pending migrations
///
/// Creates the tracking table if needed, then applies any migration whose
/// version is not yet recorded, in order.
///
/// # Returns
///
/// Number of migrations applied
///
/// # Errors
///
/// Returns an error if any migration fails to apply
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.as_sqlite().unwrap()).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.as_mysql().unwrap()).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await
        }
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split migration SQL into individual statements.
///
/// Statements are separated by semicolons; none of the embedded migration
/// SQL carries semicolons inside string literals.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

/// Get migration by version
pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}
