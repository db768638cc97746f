//! /model command - list and switch models

use super::CommandResult;
use coinpilot_ai::Model;

pub struct ModelCommand;

impl ModelCommand {
    /// Execute /model command - lists models if no args, or switches to a matching model
    pub fn execute(args: &str, current_model: &Model, available_models: &[Model]) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(list_models(current_model, available_models));
        }

        match find_model(args, available_models) {
            Some(model) => CommandResult::ChangeModel(model),
            None => CommandResult::Message(format!(
                "No model found matching '{}'\nUse /model to list available models",
                args
            )),
        }
    }
}

fn list_models(current: &Model, models: &[Model]) -> String {
    if models.is_empty() {
        return "No models available".to_string();
    }

    let mut output = String::from("Available models:\n");
    for model in models {
        let marker = if model.id == current.id { " *" } else { "" };
        let vision = if model.vision { "" } else { " (text only)" };
        output.push_str(&format!("  {}{}{}\n", model.id, vision, marker));
    }

    output.push_str("\nSwitch with: /model <name>");
    output
}

fn find_model(query: &str, models: &[Model]) -> Option<Model> {
    let query_lower = query.to_lowercase();

    // Exact match first
    if let Some(model) = models.iter().find(|m| m.id.to_lowercase() == query_lower) {
        return Some(model.clone());
    }

    // Partial match
    if let Some(model) = models
        .iter()
        .find(|m| m.id.to_lowercase().contains(&query_lower))
    {
        return Some(model.clone());
    }

    models
        .iter()
        .find(|m| m.name.to_lowercase().contains(&query_lower))
        .cloned()
}
