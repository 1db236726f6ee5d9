use std::{fs, path::Path};

use anyhow::Context as _;
use ir_graph::{GraphOptions, DEFAULT_APPEND_INTERVAL, MAX_APPEND_INTERVAL};
use serde::Deserialize;

/// Session is a struct that holds the options of a single compilation.
#[derive(Debug, Default)]
pub struct Session {
    pub ir_options: IrOptions,
}

impl Session {
    pub fn new(ir_options: IrOptions) -> Self {
        Self { ir_options }
    }

    /// Reads options from a TOML document like
    ///
    /// ```toml
    /// [ir]
    /// topo_append_interval = 1024
    /// check_invariants = true
    /// ```
    pub fn from_toml_str(config: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(config).context("malformed session config")?;
        log::debug!("loaded {:?}", config.ir);
        let interval = config.ir.topo_append_interval;
        anyhow::ensure!(
            (1..=MAX_APPEND_INTERVAL).contains(&interval),
            "topo_append_interval must be in 1..={MAX_APPEND_INTERVAL}, got {interval}"
        );
        Ok(Self::new(config.ir))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config).with_context(|| format!("in {}", path.display()))
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions::from(&self.ir_options)
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct Config {
    #[serde(default)]
    ir: IrOptions,
}

/// Options of the graph IR and its analyses.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IrOptions {
    /// Distance between the topological positions of appended nodes.
    pub topo_append_interval: i64,
    /// Lint graphs after validated moves and node destruction.
    pub check_invariants: bool,
    /// Give up on loop alias analysis after this many iterations of a body.
    pub max_loop_iterations: Option<usize>,
}

impl Default for IrOptions {
    fn default() -> Self {
        Self {
            topo_append_interval: DEFAULT_APPEND_INTERVAL,
            check_invariants: false,
            max_loop_iterations: None,
        }
    }
}

impl From<&IrOptions> for GraphOptions {
    fn from(options: &IrOptions) -> Self {
        Self {
            topo_append_interval: options.topo_append_interval,
            check_invariants: options.check_invariants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let session = Session::from_toml_str("[ir]\ncheck_invariants = true\n").unwrap();
        assert_eq!(
            session.ir_options,
            IrOptions {
                check_invariants: true,
                ..Default::default()
            }
        );
        assert_eq!(session.graph_options().topo_append_interval, DEFAULT_APPEND_INTERVAL);

        let empty = Session::from_toml_str("").unwrap();
        assert_eq!(empty.ir_options, IrOptions::default());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(Session::from_toml_str("[ir]\ntopo_append_interval = 0\n").is_err());
        let err = Session::from_toml_str("[ir]\ntopo_append_interval = 4611686018427387904\n")
            .unwrap_err();
        assert!(err.to_string().contains("got 4611686018427387904"));
        let max = format!("[ir]\ntopo_append_interval = {MAX_APPEND_INTERVAL}\n");
        assert!(Session::from_toml_str(&max).is_ok());
        assert!(Session::from_toml_str("[ir]\nunknown = 1\n").is_err());
        assert!(Session::from_toml_str("[ir]\ncheck_invariants = \"yes\"\n").is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let err = Session::load("/nonexistent/session.toml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/session.toml"));
    }
}
