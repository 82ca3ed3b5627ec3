//! Command-line configuration.
//!
//! Flags use the `--key=value` form:
//! `--obj=<path>` (or a bare path), `--strategy=tokens|lines|both`,
//! `--texture=<path>`, `--vertex-shader=<path>`, `--fragment-shader=<path>`,
//! `--repeat=<n>`.

use std::path::PathBuf;

use anyhow::{Result, bail};
use asset::ObjStrategy;

const DEFAULT_OBJ: &str = "resources/mushroom.obj";

/// Which OBJ parser(s) to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyChoice {
    One(ObjStrategy),
    /// Run both parsers and check they agree.
    Both,
}

impl StrategyChoice {
    pub fn strategies(self) -> Vec<ObjStrategy> {
        match self {
            StrategyChoice::One(s) => vec![s],
            StrategyChoice::Both => ObjStrategy::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub obj: PathBuf,
    pub strategy: StrategyChoice,
    pub texture: Option<PathBuf>,
    pub shaders: Option<ShaderPaths>,
    /// Loads per strategy; the fastest run is reported.
    pub repeat: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            obj: PathBuf::from(DEFAULT_OBJ),
            strategy: StrategyChoice::One(ObjStrategy::default()),
            texture: None,
            shaders: None,
            repeat: 1,
        }
    }
}

impl AppConfig {
    /// Build from program arguments, excluding the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        let mut vertex: Option<PathBuf> = None;
        let mut fragment: Option<PathBuf> = None;

        for arg in args {
            let arg = arg.as_ref();
            if let Some(v) = arg.strip_prefix("--obj=") {
                config.obj = PathBuf::from(v);
            } else if let Some(v) = arg.strip_prefix("--strategy=") {
                config.strategy = parse_strategy(v);
            } else if let Some(v) = arg.strip_prefix("--texture=") {
                config.texture = Some(PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("--vertex-shader=") {
                vertex = Some(PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("--fragment-shader=") {
                fragment = Some(PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("--repeat=") {
                match v.parse::<u32>() {
                    Ok(n) => config.repeat = n.max(1),
                    Err(_) => log::warn!("Invalid --repeat value '{}', using {}", v, config.repeat),
                }
            } else if arg.starts_with("--") {
                log::warn!("Ignoring unknown flag '{}'", arg);
            } else {
                config.obj = PathBuf::from(arg);
            }
        }

        config.shaders = match (vertex, fragment) {
            (Some(vertex), Some(fragment)) => Some(ShaderPaths { vertex, fragment }),
            (None, None) => None,
            _ => bail!("--vertex-shader and --fragment-shader must be given together"),
        };

        Ok(config)
    }
}

fn parse_strategy(value: &str) -> StrategyChoice {
    if value.eq_ignore_ascii_case("both") {
        return StrategyChoice::Both;
    }
    match value.parse::<ObjStrategy>() {
        Ok(s) => StrategyChoice::One(s),
        Err(e) => {
            log::warn!("{}, falling back to {}.", e, ObjStrategy::default());
            StrategyChoice::One(ObjStrategy::default())
        }
    }
}
