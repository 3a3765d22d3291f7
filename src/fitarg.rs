//! Keyword-style fit arguments.
//!
//! A [`FitArg`] maps keywords to values, the way a fit is described in a
//! configuration file or reproduced from an earlier fit:
//!
//! | keyword          | value                       |
//! |------------------|-----------------------------|
//! | `<name>`         | initial value (number)      |
//! | `error_<name>`   | initial step/error (number) |
//! | `limit_<name>`   | `[low, high]`, either may be `null` |
//! | `fix_<name>`     | fixed flag (bool)           |
//! | `errordef`, `tol`, `strategy`, `print_level`, `max_calls` | numbers |
//! | `pedantic`       | bool                        |
//!
//! # Examples
//!
//! ```
//! use minopt_rs::fitarg::FitArg;
//!
//! let fitarg = FitArg::from_json(r#"{"x": 1.5, "error_x": 0.1, "limit_x": [0.0, null]}"#).unwrap();
//! assert_eq!(fitarg.len(), 3);
//! ```

use crate::config::{MinuitConfig, Strategy};
use crate::error::{MinOptError, NumericalWarning, Result};
use crate::parameters::{Parameter, Parameters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const GLOBAL_KEYWORDS: [&str; 6] = [
    "errordef",
    "tol",
    "strategy",
    "print_level",
    "pedantic",
    "max_calls",
];

/// Value of a single keyword.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FitArgValue {
    Bool(bool),
    Number(f64),
    Limit(Option<f64>, Option<f64>),
}

impl From<f64> for FitArgValue {
    fn from(v: f64) -> Self {
        FitArgValue::Number(v)
    }
}

impl From<bool> for FitArgValue {
    fn from(v: bool) -> Self {
        FitArgValue::Bool(v)
    }
}

impl From<(Option<f64>, Option<f64>)> for FitArgValue {
    fn from((low, high): (Option<f64>, Option<f64>)) -> Self {
        FitArgValue::Limit(low, high)
    }
}

/// Keyword arguments describing parameters and fit settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FitArg {
    entries: BTreeMap<String, FitArgValue>,
}

/// Parameters and configuration built from a [`FitArg`].
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub params: Parameters,
    pub config: MinuitConfig,
    pub warnings: Vec<NumericalWarning>,
}

impl FitArg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary keyword, returning the previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<FitArgValue>) -> Option<FitArgValue> {
        self.entries.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FitArgValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FitArgValue)> {
        self.entries.iter()
    }

    pub fn with_value(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_error(mut self, name: &str, error: f64) -> Self {
        self.insert(&format!("error_{}", name), error);
        self
    }

    pub fn with_limit(mut self, name: &str, low: Option<f64>, high: Option<f64>) -> Self {
        self.insert(&format!("limit_{}", name), (low, high));
        self
    }

    pub fn with_fix(mut self, name: &str, fixed: bool) -> Self {
        self.insert(&format!("fix_{}", name), fixed);
        self
    }

    pub fn with_errordef(mut self, errordef: f64) -> Self {
        self.insert("errordef", errordef);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.insert("strategy", strategy.level() as f64);
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.insert("tol", tol);
        self
    }

    pub fn with_print_level(mut self, print_level: u32) -> Self {
        self.insert("print_level", print_level as f64);
        self
    }

    pub fn with_pedantic(mut self, pedantic: bool) -> Self {
        self.insert("pedantic", pedantic);
        self
    }

    pub fn with_max_calls(mut self, max_calls: usize) -> Self {
        self.insert("max_calls", max_calls as f64);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Snapshot of every parameter's value, error, limits and fixed flag.
    pub(crate) fn from_parameters(params: &Parameters) -> Self {
        let mut fitarg = Self::new();
        for p in params.iter() {
            fitarg.insert(p.name(), p.value());
            fitarg.insert(&format!("error_{}", p.name()), p.error());
            if let Some(limits) = p.limits() {
                fitarg.insert(&format!("limit_{}", p.name()), limits);
            }
            fitarg.insert(&format!("fix_{}", p.name()), p.is_fixed());
        }
        fitarg
    }

    /// Build the parameter store and configuration for `names`.
    ///
    /// Global keywords override the matching settings of `base`. Limits are
    /// taken as given; inverted limits are reported when a fit starts.
    pub(crate) fn resolve(&self, names: &[&str], base: MinuitConfig) -> Result<Resolved> {
        #[derive(Default)]
        struct Declared {
            value: Option<f64>,
            error: Option<f64>,
            limits: Option<(Option<f64>, Option<f64>)>,
            fixed: bool,
        }

        let mut declared: BTreeMap<&str, Declared> = BTreeMap::new();
        let mut config = base;

        for (key, value) in &self.entries {
            let key = key.as_str();
            if GLOBAL_KEYWORDS.contains(&key) {
                config = apply_global(config, key, *value)?;
                continue;
            }
            if let Some(&name) = names.iter().find(|&&n| n == key) {
                declared.entry(name).or_default().value = Some(number(key, *value)?);
                continue;
            }
            match split_keyword(key, names) {
                Some(("error", name)) => {
                    declared.entry(name).or_default().error = Some(number(key, *value)?);
                }
                Some(("limit", name)) => match value {
                    FitArgValue::Limit(low, high) => {
                        declared.entry(name).or_default().limits = Some((*low, *high));
                    }
                    _ => return Err(wrong_type(key, "a pair of limits")),
                },
                Some(("fix", name)) => match value {
                    FitArgValue::Bool(b) => declared.entry(name).or_default().fixed = *b,
                    _ => return Err(wrong_type(key, "a bool")),
                },
                _ => {
                    return Err(MinOptError::ConfigError(format!(
                        "unknown keyword '{}'",
                        key
                    )))
                }
            }
        }

        let mut params = Parameters::new();
        let mut warnings = Vec::new();
        for &name in names {
            let d = declared.remove(name).unwrap_or_default();
            if config.pedantic() {
                if d.value.is_none() {
                    warnings.push(
                        NumericalWarning::MissingInitialValue {
                            name: name.to_string(),
                        }
                        .emit(),
                    );
                }
                if d.error.is_none() {
                    warnings.push(
                        NumericalWarning::MissingInitialError {
                            name: name.to_string(),
                        }
                        .emit(),
                    );
                }
            }
            params.add(Parameter::declared(
                name,
                d.value.unwrap_or(0.0),
                d.error.unwrap_or(1.0),
                d.limits,
                d.fixed,
            )?)?;
        }

        Ok(Resolved {
            params,
            config,
            warnings,
        })
    }
}

/// Split `error_x`, `limit_x` or `fix_x` into prefix and a known name.
fn split_keyword<'n>(key: &str, names: &[&'n str]) -> Option<(&'static str, &'n str)> {
    for prefix in ["error", "limit", "fix"] {
        if let Some(rest) = key.strip_prefix(prefix).and_then(|r| r.strip_prefix('_')) {
            if let Some(&name) = names.iter().find(|&&n| n == rest) {
                return Some((prefix, name));
            }
        }
    }
    None
}

fn wrong_type(key: &str, expected: &str) -> MinOptError {
    MinOptError::ConfigError(format!("keyword '{}' expects {}", key, expected))
}

fn number(key: &str, value: FitArgValue) -> Result<f64> {
    match value {
        FitArgValue::Number(v) => Ok(v),
        _ => Err(wrong_type(key, "a number")),
    }
}

fn non_negative_integer(key: &str, value: FitArgValue) -> Result<u64> {
    let v = number(key, value)?;
    if v < 0.0 || v.fract() != 0.0 || !v.is_finite() {
        return Err(wrong_type(key, "a non-negative integer"));
    }
    Ok(v as u64)
}

fn apply_global(config: MinuitConfig, key: &str, value: FitArgValue) -> Result<MinuitConfig> {
    match key {
        "errordef" => config.with_errordef(number(key, value)?),
        "tol" => config.with_tol(number(key, value)?),
        "strategy" => {
            let level = non_negative_integer(key, value)?;
            let strategy = Strategy::try_from(level as u32)?;
            Ok(config.with_strategy(strategy))
        }
        "print_level" => Ok(config.with_print_level(non_negative_integer(key, value)? as u32)),
        "max_calls" => Ok(config.with_max_calls(Some(non_negative_integer(key, value)? as usize))),
        "pedantic" => match value {
            FitArgValue::Bool(b) => Ok(config.with_pedantic(b)),
            _ => Err(wrong_type(key, "a bool")),
        },
        _ => Err(MinOptError::ConfigError(format!("unknown keyword '{}'", key))),
    }
}
