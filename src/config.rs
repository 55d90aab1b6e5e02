use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::cli::CliArgs;
use crate::optimizer::SolverType;
use crate::scenario::ScenarioConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "BUS_DISPATCH__";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub solver: SolverConfig,
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub scenario: ScenarioConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SolverConfig {
    #[validate(length(min = 1))]
    pub name: String,
    pub tee: bool,
    #[validate(range(min = 1))]
    pub time_limit_seconds: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            name: SolverType::default().to_string(),
            tee: false,
            time_limit_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub plot: bool,
    pub results_json: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plot: true,
            results_json: None,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `BUS_DISPATCH__*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("config file not found: {}", path.display());
                }
                figment.merge(Toml::file(path))
            }
            None => figment.merge(Toml::file(DEFAULT_CONFIG_PATH)),
        };
        let cfg: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("reading configuration")?;
        Ok(cfg)
    }

    /// Load every layer, apply CLI flags on top and validate the result
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let mut cfg = Self::load(args.config.as_deref())?;

        if let Some(solver) = &args.solver {
            cfg.solver.name = solver.clone();
        }
        if args.tee {
            cfg.solver.tee = true;
        }
        if args.quiet {
            cfg.logging.level = "warn".to_string();
        }
        if args.no_plot {
            cfg.output.plot = false;
        }
        if let Some(output) = &args.output {
            cfg.output.results_json = Some(output.clone());
        }

        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
