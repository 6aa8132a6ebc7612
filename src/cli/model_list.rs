//! Model listing functionality

use std::error::Error;

use chrono::{DateTime, Utc};

use crate::api::{sort_models, Model};
use crate::core::controller::ChatController;
use crate::core::storage::KeyValueStore;

pub async fn list_models<S: KeyValueStore + Clone>(
    controller: &ChatController<S>,
) -> Result<(), Box<dyn Error>> {
    let config = controller.config();
    println!("🤖 Available Models for {}", config.base_url);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    let models = controller.models().await;
    print_models(&models, &config.model);
    Ok(())
}

/// Print `models` newest first, marking `current`.
pub fn print_models(models: &[Model], current: &str) {
    if models.is_empty() {
        println!("No models found.");
        return;
    }

    println!("Found {} models (sorted newest first):", models.len());
    println!();

    let mut models = models.to_vec();
    sort_models(&mut models);

    for model in &models {
        for line in describe_model(model, current) {
            println!("{line}");
        }
        println!();
    }
}

pub fn describe_model(model: &Model, current: &str) -> Vec<String> {
    let marker = if model.id == current { " (current)" } else { "" };
    let mut lines = vec![format!("  • {}{marker}", model.id)];

    if !model.name.is_empty() && model.name != model.id {
        lines.push(format!("    Name: {}", model.name));
    }
    if let Some(description) = &model.description {
        lines.push(format!("    {description}"));
    }
    if let Some(owned_by) = &model.owned_by {
        if !owned_by.is_empty() && owned_by != "system" {
            lines.push(format!("    Owner: {owned_by}"));
        }
    }
    if let Some(created) = model.created.filter(|c| *c > 0) {
        // Some APIs report milliseconds rather than seconds.
        let timestamp_secs = if created > 10_000_000_000 {
            created / 1000
        } else {
            created
        };
        if let Some(dt) = DateTime::<Utc>::from_timestamp(timestamp_secs as i64, 0) {
            lines.push(format!("    Created: {}", dt.format("%Y-%m-%d %H:%M:%S UTC")));
        }
    }

    lines
}
