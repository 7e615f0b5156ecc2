use crate::logger;
use crate::GlobalOpts;
use clap::Subcommand;
use colored::*;
use rbuild_config::Settings;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Print the settings file location
    Path,
}

pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => match Settings::load(opts.config.as_deref()) {
            Ok(settings) => {
                println!("{}", "Configuration:".bold().green());
                for (key, value) in settings.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
            Err(e) => {
                logger::error(&format!("Failed to load config: {}", e));
            }
        },
        ConfigAction::Path => match Settings::path(opts.config.as_deref()) {
            Some(path) => {
                logger::debug(&format!("Reading config from: {}", path.display()));
                println!("{}", path.display());
            }
            None => logger::error("Could not determine the settings file location"),
        },
    }
}
