//! Command line definition and argument validators

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use trastformer_core::{Language, TransformerConfig};

/// Extensions accepted for the `--parse` file
pub const SOURCE_EXTENSIONS: &[&str] = &["java", "py", "js", "json", "txt"];

/// Build the `trastformer` command
pub fn build_command() -> Command {
    Command::new("trastformer")
        .version(trastformer_core::VERSION)
        .about("Rewrites syntax trees with DSL rules and stores the result as JSON")
        .arg(
            Arg::new("parse")
                .long("parse")
                .short('p')
                .visible_alias("code")
                .value_name("FILE")
                .help("The file with source code, or a JSON tree from a previous run")
                .required(true)
                .allow_hyphen_values(true)
                .value_parser(source_file),
        )
        .arg(
            Arg::new("rules")
                .long("rules")
                .short('r')
                .visible_alias("dsl")
                .value_name("FILE")
                .help("Text file with DSL rule descriptions")
                .required(true)
                .allow_hyphen_values(true)
                .value_parser(rules_file),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .value_name("FILE")
                .help("The name (possibly path) of the json file with extension")
                .required(true)
                .allow_hyphen_values(true)
                .value_parser(json_file),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .short('l')
                .value_name("LANG")
                .help("The programming language of the source file (java, python, javascript)")
                .allow_hyphen_values(true)
                .value_parser(language),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

/// Turn parsed arguments into a run configuration
pub fn config_from_matches(matches: &ArgMatches) -> Result<TransformerConfig> {
    let source = matches
        .get_one::<PathBuf>("parse")
        .context("The option [--parse] is required")?;
    let rules = matches
        .get_one::<PathBuf>("rules")
        .context("The option [--rules] is required")?;
    let json = matches
        .get_one::<PathBuf>("json")
        .context("The option [--json] is required")?;

    let mut config = TransformerConfig::new(source, rules, json);
    config.language = matches.get_one::<Language>("lang").copied();
    config.debug = matches.get_flag("debug");

    // fail before any file is read
    config.input_kind()?;
    Ok(config)
}

fn missed_parameter(option: &str, value: &str) -> Result<(), String> {
    if value.is_empty() || value.starts_with('-') {
        return Err(format!("Missed parameter for the option [--{option}]"));
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn source_file(value: &str) -> Result<PathBuf, String> {
    missed_parameter("parse", value)?;
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!(
            "The parameter for the option [--parse] should be a path to a source file, found: {value}"
        ));
    }
    if !SOURCE_EXTENSIONS.contains(&extension(&path).as_str()) {
        return Err(format!("The parameter [{value}] should be a source file"));
    }
    Ok(path)
}

fn rules_file(value: &str) -> Result<PathBuf, String> {
    missed_parameter("rules", value)?;
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!(
            "The parameter for the option [--rules] should be a path to a file with rules, found: {value}"
        ));
    }
    Ok(path)
}

fn json_file(value: &str) -> Result<PathBuf, String> {
    missed_parameter("json", value)?;
    let path = PathBuf::from(value);
    if extension(&path) != "json" || path.is_dir() {
        return Err(format!(
            "The parameter [{value}] should be a path to a file with the json extension"
        ));
    }
    Ok(path)
}

fn language(value: &str) -> Result<Language, String> {
    missed_parameter("lang", value)?;
    value.parse().map_err(|e: trastformer_core::ParseError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        build_command().debug_assert();
    }

    #[test]
    fn test_help_lists_aliases() {
        let help = build_command().render_help().to_string();
        assert!(help.contains("--code"), "{help}");
        assert!(help.contains("--dsl"), "{help}");
    }

    #[test]
    fn test_missed_parameter() {
        assert_eq!(
            json_file("--debug").unwrap_err(),
            "Missed parameter for the option [--json]"
        );
        assert_eq!(
            language("-x").unwrap_err(),
            "Missed parameter for the option [--lang]"
        );
    }

    #[test]
    fn test_json_extension() {
        assert!(json_file("out/result.json").is_ok());
        assert!(json_file("result.JSON").is_ok());
        assert_eq!(
            json_file("result.txt").unwrap_err(),
            "The parameter [result.txt] should be a path to a file with the json extension"
        );
    }

    #[test]
    fn test_source_validation() {
        let dir = tempfile::tempdir().unwrap();
        let markdown = dir.path().join("notes.md");
        std::fs::write(&markdown, "# notes").unwrap();
        let markdown = markdown.to_str().unwrap();
        assert_eq!(
            source_file(markdown).unwrap_err(),
            format!("The parameter [{markdown}] should be a source file")
        );

        let missing = dir.path().join("Missing.java");
        let missing = missing.to_str().unwrap();
        assert_eq!(
            source_file(missing).unwrap_err(),
            format!("The parameter for the option [--parse] should be a path to a source file, found: {missing}")
        );
    }

    #[test]
    fn test_language_names() {
        assert_eq!(language("py"), Ok(Language::Python));
        assert_eq!(language("cobol").unwrap_err(), "Unsupported language: cobol");
    }
}
