use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use geoclip_core::config::LayeredConfig;
use geoclip_core::error::GeoclipError;
use geoclip_core::models::{JobRequest, JobResult};
use geoclip_core::ports::ObjectStore;
use geoclip_pipeline::{Pipeline, PipelineSettings};
use geoclip_store::LocalObjectStore;
use serde_json::Value;

use crate::cli::RunArgs;
use crate::envelope::{job_from_event, Response};
use crate::output::OutputWriter;

pub fn execute(args: RunArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let text = read_event(&args.job)?;

    match run_job(&text, config, output) {
        Ok(result) => {
            output.data(&Response::ok(&result)?)?;
            Ok(())
        }
        Err(e) => {
            output.data(&Response::error(&e))?;
            Err(anyhow::Error::new(e).context("Job failed"))
        }
    }
}

fn read_event(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("Failed to read job from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read job file {}", path.display()))
    }
}

fn run_job(text: &str, config: &LayeredConfig, output: &OutputWriter) -> geoclip_core::Result<JobResult> {
    let event: Value = serde_json::from_str(text)
        .map_err(|e| GeoclipError::input(format!("event is not valid JSON: {}", e)))?;
    let request = JobRequest::from_json(&job_from_event(event)?)?;

    let pipeline = Pipeline::new(build_store(config), PipelineSettings::from_config(config));
    let outcome = pipeline.run(&request)?;

    if let Some(warning) = &outcome.cleanup_warning {
        output.warning(warning);
    }
    output.success(format!("Job {} completed", request.request_id));

    Ok(outcome.result)
}

fn build_store(config: &LayeredConfig) -> Arc<dyn ObjectStore> {
    let store = LocalObjectStore::new(config.store_root.value.clone());
    match &config.public_url.value {
        Some(url) => Arc::new(store.with_public_url(url.clone())),
        None => Arc::new(store),
    }
}
