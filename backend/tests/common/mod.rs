//! Shared fixtures for the integration tests: a scratch configuration, a
//! session on disk and fake renderers.

// Each test binary compiles this module separately and none of them uses
// every fixture.
#![allow(dead_code)]

use backend::config::Config;
use backend::services::render::{RenderJob, Renderer};
use backend::services::sessions::SessionFiles;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Renderer that writes a tiny fake document, optionally failing whenever a
/// row value equals `fail_for`.
pub struct FakeRenderer {
    pub fail_for: Option<String>,
}

impl FakeRenderer {
    pub fn succeeding() -> Self {
        Self { fail_for: None }
    }

    pub fn failing_on(value: &str) -> Self {
        Self {
            fail_for: Some(value.to_string()),
        }
    }
}

impl Renderer for FakeRenderer {
    fn render(&self, job: &RenderJob<'_>) -> Result<(), Box<dyn Error>> {
        if let Some(fail_for) = &self.fail_for {
            if job.values.values().any(|v| v == fail_for) {
                return Err(format!("rendering failed for {fail_for}").into());
            }
        }
        if let Some(parent) = job.output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(job.output_path, b"%PDF-1.4 fake certificate")?;
        Ok(())
    }
}

/// Renderer that fails for every row.
pub struct AlwaysFailRenderer;

impl Renderer for AlwaysFailRenderer {
    fn render(&self, _job: &RenderJob<'_>) -> Result<(), Box<dyn Error>> {
        Err("renderer is broken".into())
    }
}

/// Configuration rooted in a scratch directory, with its own database.
pub fn scratch_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.base_dir = dir.path().to_path_buf();
    config.db_path = dir.path().join("certificates.sqlite");
    config.ensure_dirs().unwrap();
    config
}

/// Writes a template and dataset for `session_id` the way the analyze
/// endpoint would, returning their locations.
pub fn write_session(
    config: &Config,
    session_id: &str,
    template: &str,
    csv: &str,
) -> SessionFiles {
    let template_path: PathBuf = config
        .uploads_dir()
        .join(format!("{session_id}_template.txt"));
    let data_path: PathBuf = config.uploads_dir().join(format!("{session_id}_data.csv"));
    fs::write(&template_path, template).unwrap();
    fs::write(&data_path, csv).unwrap();
    SessionFiles {
        template: template_path,
        data: data_path,
        signature: None,
    }
}

/// A 10-row dataset whose fifth row carries the given marker value.
pub fn ten_row_csv(marker_row5: &str) -> String {
    let mut csv = String::from("Name,Course,Date\n");
    for i in 1..=10 {
        if i == 5 {
            csv.push_str(&format!("{marker_row5},Rust,2026-08-0{}\n", (i % 9) + 1));
        } else {
            csv.push_str(&format!("Person {i},Rust,2026-08-0{}\n", (i % 9) + 1));
        }
    }
    csv
}
