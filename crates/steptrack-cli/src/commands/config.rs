use clap::Subcommand;
use steptrack_core::storage::GOAL_RANGE;
use steptrack_core::Config;

const SECTIONS: &str = "goal, source, notifications";

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "goal.default_steps", "source.sample_db")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Show where the config file and the sample store live
    Path,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key} (sections: {SECTIONS})").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            if key == "goal.default_steps" {
                println!(
                    "ok (goal {} of {}..={})",
                    config.goal.default_steps,
                    GOAL_RANGE.start(),
                    GOAL_RANGE.end()
                );
            } else {
                println!("ok");
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Path => {
            let config = Config::load()?;
            let sample_store = config.sample_db_path()?;
            let paths = serde_json::json!({
                "config": Config::path()?.display().to_string(),
                "sample_store": sample_store.display().to_string(),
                "sample_store_exists": sample_store.exists(),
            });
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
