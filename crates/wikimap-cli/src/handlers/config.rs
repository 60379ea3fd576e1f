//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs, OutputFormat};
use crate::config::{Config, ConfigBuilder};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Path => handle_config_path(output),
    }
}

/// Build the config `config init` writes
fn initial_config(args: &ConfigInitArgs) -> Config {
    let mut builder = ConfigBuilder::new().skip_empty(!args.keep_empty);
    if let Some(dir) = &args.mappings_dir {
        builder = builder.mappings_dir(dir.clone());
    }
    if let Some(file) = &args.log_file {
        builder = builder.log_file(file.clone());
    }
    builder.build()
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    initial_config(&args).save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to customize settings for your environment.")?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    // Reuse the file serializer by naming a file of the requested kind
    let target = match args.format {
        ConfigFormat::Toml => Path::new("config.toml"),
        ConfigFormat::Json => Path::new("config.json"),
        ConfigFormat::Yaml => Path::new("config.yaml"),
    };
    let content = config.to_string_for(target)?;
    output.writeln(content.trim_end())
}

/// A searched config location
#[derive(Debug, Serialize)]
struct ConfigLocation {
    path: PathBuf,
    exists: bool,
}

/// Handle config path subcommand
fn handle_config_path(output: &mut OutputWriter) -> Result<()> {
    let locations: Vec<ConfigLocation> = Config::default_config_paths()
        .into_iter()
        .map(|path| ConfigLocation {
            exists: path.is_file(),
            path,
        })
        .collect();

    if output.format() != OutputFormat::Human {
        return output.data(&locations);
    }

    output.section("Configuration Search Path")?;
    for location in &locations {
        let marker = if location.exists { "✓" } else { "✗" };
        output.writeln(&format!("{} {}", marker, location.path.display()))?;
    }
    if let Ok(env_path) = std::env::var("WIKIMAP_CONFIG") {
        output.info(&format!("WIKIMAP_CONFIG = {}", env_path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_args(path: PathBuf) -> ConfigInitArgs {
        ConfigInitArgs {
            path: Some(path),
            mappings_dir: Some(PathBuf::from("/srv/mappings")),
            log_file: None,
            keep_empty: true,
            force: false,
        }
    }

    fn sink(format: OutputFormat) -> OutputWriter {
        OutputWriter::with_writer(format, false, false, 0, Box::new(std::io::sink()))
    }

    #[test]
    fn test_init_writes_builder_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wikimap.toml");

        handle_config_init(init_args(path.clone()), &mut sink(OutputFormat::Human)).unwrap();

        let written = Config::from_file(&path).unwrap();
        assert_eq!(written.paths.mappings_dir, PathBuf::from("/srv/mappings"));
        assert!(!written.apply.skip_empty);
    }

    #[test]
    fn test_init_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wikimap.yaml");
        std::fs::write(&path, "apply:\n  skip_empty: true\n").unwrap();

        handle_config_init(init_args(path.clone()), &mut sink(OutputFormat::Human)).unwrap();
        assert!(Config::from_file(&path).unwrap().apply.skip_empty);

        let mut args = init_args(path.clone());
        args.force = true;
        handle_config_init(args, &mut sink(OutputFormat::Human)).unwrap();
        assert!(!Config::from_file(&path).unwrap().apply.skip_empty);
    }
}
