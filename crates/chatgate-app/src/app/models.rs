use colored::Colorize;

use chatgate_models::ModelRegistry;

/// Print the registry grouped by provider, marking the default model
pub fn print_models(registry: &ModelRegistry) {
    for (provider, models) in registry.providers() {
        println!(
            "{} {}",
            provider.display_name().bright_cyan().bold(),
            format!("({})", provider.credential_key()).dimmed()
        );
        for (model_id, name) in models {
            let marker = if name == registry.default_model() {
                " (default)".green().to_string()
            } else {
                String::new()
            };
            println!("  {:<20} {}{}", name, model_id.dimmed(), marker);
        }
    }
}
