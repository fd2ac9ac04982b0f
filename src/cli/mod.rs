// FILE: src/cli/mod.rs

mod config;
mod handlers;

use crate::catalog::{CatalogIndex, JsonCatalogSource};
use crate::error::Result;
use crate::validator::ValidatorOptions;
use crate::PipelineOptions;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Component source
    Tsx,
    /// Mapped tree, source, validation and stats as JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SkipCheck {
    Imports,
    Props,
    Accessibility,
    Performance,
    BestPractices,
}

pub struct EnhancedCli {
    config: config::ConfigFile,
    start_time: Instant,
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        self.setup_logging(matches.get_count("verbose"))?;

        let result = match matches.subcommand() {
            Some(("convert", sub_matches)) => handlers::handle_convert_command(self, sub_matches),
            Some(("validate", sub_matches)) => handlers::handle_validate_command(self, sub_matches),
            Some(("inspect", sub_matches)) => handlers::handle_inspect_command(self, sub_matches),
            Some(("catalog", sub_matches)) => handlers::handle_catalog_command(self, sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };

        log::debug!("Finished in {}ms", self.start_time.elapsed().as_millis());
        result
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .author("Antforge Development Team")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("convert")
                    .about("Convert a design document into an antd component")
                    .arg(Arg::new("input").help("Exported design document (JSON)").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Output file"))
                    .arg(Arg::new("node").short('n').long("node").value_name("ID").help("Convert only the subtree rooted at this node (1:2 or 1-2)"))
                    .arg(Arg::new("name").long("name").value_name("NAME").help("Component name"))
                    .arg(Arg::new("catalog").long("catalog").value_name("FILE").help("JSON component catalog"))
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(OutputFormat)).default_value("tsx").help("Output format"))
                    .arg(Arg::new("debug").short('d').long("debug").help("Log every pipeline phase").action(ArgAction::SetTrue))
                    .arg(Arg::new("no-validate").long("no-validate").help("Skip validation of the generated source").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed conversion statistics").action(ArgAction::SetTrue))
                    .arg(Arg::new("watch").short('w').long("watch").help("Watch for file changes and reconvert").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("validate")
                    .about("Check component source for antd usage, accessibility and style issues")
                    .arg(Arg::new("input").help("Input .tsx/.jsx file or directory").required(true).index(1))
                    .arg(Arg::new("recursive").short('r').long("recursive").help("Validate all .tsx/.jsx files in directory recursively").action(ArgAction::SetTrue))
                    .arg(Arg::new("catalog").long("catalog").value_name("FILE").help("JSON component catalog"))
                    .arg(Arg::new("skip").long("skip").value_name("CHECK").value_parser(clap::value_parser!(SkipCheck)).help("Disable a group of checks").action(ArgAction::Append)),
            )
            .subcommand(
                Command::new("inspect")
                    .about("Print the semantic tree of a design document")
                    .arg(Arg::new("input").help("Exported design document (JSON)").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Write the tree to a file"))
                    .arg(Arg::new("node").short('n').long("node").value_name("ID").help("Inspect only the subtree rooted at this node"))
                    .arg(Arg::new("catalog").long("catalog").value_name("FILE").help("JSON component catalog"))
                    .arg(Arg::new("mappings").short('m').long("mappings").help("Include candidate components for every node").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("catalog")
                    .about("List catalog components or show one entry")
                    .arg(Arg::new("name").help("Component name, e.g. Form.Item").index(1))
                    .arg(Arg::new("catalog").long("catalog").value_name("FILE").help("JSON component catalog")),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
        Ok(())
    }

    /// Flags first, then the config file, then defaults
    pub fn build_pipeline_options(&self, matches: &clap::ArgMatches) -> Result<PipelineOptions> {
        let mut options = PipelineOptions::default();

        if let Some(mapping) = &self.config.mapping {
            options.mapping = mapping.clone();
        }
        if let Some(synthesis) = &self.config.synthesis {
            options.synthesis = synthesis.clone();
        }
        if let Some(validator) = &self.config.validator {
            options.validator = validator.clone();
        }

        options.catalog_path = self.catalog_path(matches);
        options.component_name = optional_string(matches, "name").or_else(|| self.config.component_name.clone());
        options.debug_mode = flag(matches, "debug");
        options.validate_output = !flag(matches, "no-validate") && self.config.validate_output.unwrap_or(true);

        Ok(options)
    }

    pub fn build_validator_options(&self, matches: &clap::ArgMatches) -> ValidatorOptions {
        let mut options = self.config.validator.clone().unwrap_or_default();
        if let Some(skips) = matches.get_many::<SkipCheck>("skip") {
            for skip in skips {
                match skip {
                    SkipCheck::Imports => options.check_imports = false,
                    SkipCheck::Props => options.check_props = false,
                    SkipCheck::Accessibility => options.check_accessibility = false,
                    SkipCheck::Performance => options.check_performance = false,
                    SkipCheck::BestPractices => options.check_best_practices = false,
                }
            }
        }
        options
    }

    /// `--catalog`, else the config file's catalog, else the built-in table
    pub fn load_catalog(&self, matches: &clap::ArgMatches) -> Result<Arc<CatalogIndex>> {
        let catalog = match self.catalog_path(matches) {
            Some(path) => CatalogIndex::new(JsonCatalogSource::load(&path)?),
            None => CatalogIndex::builtin(),
        };
        Ok(Arc::new(catalog))
    }

    pub fn output_directory(&self) -> Option<&str> {
        self.config.output_directory.as_deref()
    }

    fn catalog_path(&self, matches: &clap::ArgMatches) -> Option<String> {
        optional_string(matches, "catalog").or_else(|| self.config.catalog.clone())
    }
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

// Subcommands define different arguments; absent ids read as unset.
fn optional_string(matches: &clap::ArgMatches, id: &str) -> Option<String> {
    matches.try_get_one::<String>(id).ok().flatten().cloned()
}

fn flag(matches: &clap::ArgMatches, id: &str) -> bool {
    matches.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false)
}
