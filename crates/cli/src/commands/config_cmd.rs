//! `huddle config`: Configuration management commands.

use huddle_config::AppConfig;
use std::path::Path;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    println!("{toml_str}");

    if !config.has_api_key() {
        println!("# warning: no API key set (AZURE_OPENAI_API_KEY, OPENAI_API_KEY or HUDDLE_API_KEY)");
    }
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    if write_default_config(&config_dir)? {
        println!("✅ Created config.toml at: {}", config_dir.join("config.toml").display());
        println!("\n📝 Next steps:");
        println!("   1. Set AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY (or edit the file)");
        println!("   2. Put your log files in ./sample_logs");
        println!("   3. Run: huddle run\n");
    } else {
        println!(
            "⚠️  Config already exists at: {}",
            config_dir.join("config.toml").display()
        );
        println!("   Edit it manually or delete and re-run `huddle config init`.\n");
    }
    Ok(())
}

/// Write the default config into `dir` unless one is already there.
/// Returns whether a file was written.
fn write_default_config(dir: &Path) -> std::io::Result<bool> {
    let config_path = dir.join("config.toml");
    if config_path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".huddle"));
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".huddle");

        assert!(write_default_config(&config_dir).unwrap());
        let written = std::fs::read_to_string(config_dir.join("config.toml")).unwrap();
        let parsed: AppConfig = toml::from_str(&written).unwrap();
        assert_eq!(parsed.group_chat.max_iterations, 10);

        std::fs::write(config_dir.join("config.toml"), "default_model = \"custom\"").unwrap();
        assert!(!write_default_config(&config_dir).unwrap());
        let kept = std::fs::read_to_string(config_dir.join("config.toml")).unwrap();
        assert!(kept.contains("custom"));
    }
}
