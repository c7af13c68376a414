use crate::{Error, Result};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Values for `${NAME}` placeholders, usually credentials passed with `-P`.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse `KEY=VALUE` arguments. Only the first `=` separates.
    pub fn from_args(args: &[String]) -> Result<Self> {
        args.iter().try_fold(Self::new(), |params, arg| {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected KEY=VALUE", arg))
            })?;
            Ok(params.set(key, value))
        })
    }

    /// Value for `name`: explicit param, then environment variable, then the
    /// declared default. `Ok(None)` means the placeholder stays as written.
    fn resolve(&self, name: &str, defs: &HashMap<String, ParamDef>) -> Result<Option<String>> {
        if let Some(value) = self.get(name) {
            return Ok(Some(value.to_string()));
        }
        if let Ok(value) = std::env::var(name) {
            return Ok(Some(value));
        }
        match defs.get(name) {
            Some(ParamDef {
                default: Some(default),
                ..
            }) => Ok(Some(default.clone())),
            Some(ParamDef { required: true, .. }) => Err(Error::Config(format!(
                "missing required parameter: {}",
                name
            ))),
            Some(_) => Ok(Some(String::new())),
            None => Ok(None),
        }
    }
}

/// Declared parameter in the config's `params` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    #[serde(default)]
    pub required: bool,
    pub default: Option<String>,
    /// Shown by `--check`.
    pub description: Option<String>,
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]*)\}").expect("valid placeholder pattern"))
}

/// Replace every `${NAME}` in `template`. Undeclared names with no value
/// anywhere are left untouched.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder().captures_iter(template) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&template[last..whole.start]);
        match params.resolve(name_of(&caps), defs)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(&template[whole.clone()]),
        }
        last = whole.end;
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn name_of<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1).map_or("", |m| m.as_str())
}

/// Apply [`substitute`] to every string scalar in a YAML document.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    use serde_yaml::Value;
    match value {
        Value::String(s) => *s = substitute(s, params, defs)?,
        Value::Mapping(map) => map
            .iter_mut()
            .try_for_each(|(_, v)| substitute_value(v, params, defs))?,
        Value::Sequence(seq) => seq
            .iter_mut()
            .try_for_each(|v| substitute_value(v, params, defs))?,
        _ => {}
    }
    Ok(())
}
