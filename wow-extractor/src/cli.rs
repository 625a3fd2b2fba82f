//! Command line of the extractor

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use clap::builder::BoolishValueParser;

use crate::config::ExtractorConfig;

#[derive(Parser, Debug)]
#[command(name = "wow-extractor")]
#[command(about = "Extracts game data (DBCs, maps, vmaps) from the client archives", long_about = None)]
#[command(version)]
pub struct Cli {
    /// YAML configuration file, applied before the options below
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Game folder location
    #[arg(short, long, value_name = "PATH")]
    pub client_path: Option<PathBuf>,

    /// Folder the data is extracted into
    #[arg(short, long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Extract DBCs from the game archives
    #[arg(short = 'd', long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub extract_dbc: Option<bool>,

    /// Extract maps from the game archives
    #[arg(short = 'm', long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub extract_map: Option<bool>,

    /// Generate collision data (vmaps)
    #[arg(long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub generate_vmap: Option<bool>,

    /// Generate movement maps (not available in this build)
    #[arg(long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub generate_mmap: Option<bool>,

    /// Store heights as integers when the range allows it
    #[arg(short, long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub flat_map: Option<bool>,

    /// Skip the continents
    #[arg(long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub skip_continents: Option<bool>,

    /// Skip test and unused maps
    #[arg(long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub skip_junk: Option<bool>,

    /// Skip battlegrounds
    #[arg(long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub skip_battlegrounds: Option<bool>,

    /// Keep render-only WMO triangles in the collision data
    #[arg(long, value_name = "0|1", value_parser = BoolishValueParser::new())]
    pub precise_vectors: Option<bool>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// The configuration file (or defaults) with every given option applied.
    pub fn resolve_config(&self) -> Result<ExtractorConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractorConfig::load(path)?,
            None => ExtractorConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut ExtractorConfig) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        set(&mut config.client_path, self.client_path.as_ref());
        set(&mut config.output_path, self.output_path.as_ref());
        set(&mut config.extract_dbc, self.extract_dbc.as_ref());
        set(&mut config.extract_maps, self.extract_map.as_ref());
        set(&mut config.generate_vmaps, self.generate_vmap.as_ref());
        set(&mut config.generate_mmaps, self.generate_mmap.as_ref());
        set(&mut config.map.allow_float_to_int, self.flat_map.as_ref());
        set(&mut config.skip.continents, self.skip_continents.as_ref());
        set(&mut config.skip.junk, self.skip_junk.as_ref());
        set(&mut config.skip.battlegrounds, self.skip_battlegrounds.as_ref());
        set(&mut config.vmap.precise_vector_data, self.precise_vectors.as_ref());
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "wow-extractor",
            "-c",
            "/wow",
            "-d",
            "0",
            "--flat-map",
            "0",
            "--skip-continents",
            "1",
            "-vv",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.client_path, PathBuf::from("/wow"));
        assert!(!config.extract_dbc);
        assert!(config.extract_maps);
        assert!(!config.map.allow_float_to_int);
        assert!(config.skip.continents);
        assert_eq!(cli.log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn quiet_only_shows_errors() {
        let cli = Cli::parse_from(["wow-extractor", "-q"]);
        assert_eq!(cli.log_level(), log::LevelFilter::Error);
    }

    #[test]
    fn file_values_survive_unless_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extractor.yaml");
        std::fs::write(&path, "extract_maps: false\nskip:\n  junk: false\n").unwrap();
        let cli = Cli::parse_from([
            "wow-extractor",
            "--config",
            path.to_str().unwrap(),
            "--skip-junk",
            "true",
        ]);
        let config = cli.resolve_config().unwrap();
        assert!(!config.extract_maps);
        assert!(config.skip.junk);
    }
}
