use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, sysfs::BackingStore, transform::Transform};

/// User-facing value: one component per backing path, or a single component
/// that is broadcast to every path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ValueRepr", into = "ValueRepr")]
pub struct Value(Vec<i64>);

// Scalars stay plain numbers in JSON, triplets become arrays.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Scalar(i64),
    List(Vec<i64>),
}

impl From<ValueRepr> for Value {
    fn from(r: ValueRepr) -> Self {
        match r {
            ValueRepr::Scalar(v) => Value(vec![v]),
            ValueRepr::List(v) => Value(v),
        }
    }
}

impl From<Value> for ValueRepr {
    fn from(v: Value) -> Self {
        match v.0.as_slice() {
            [one] => ValueRepr::Scalar(*one),
            _ => ValueRepr::List(v.0),
        }
    }
}

impl Value {
    pub fn components(&self) -> &[i64] {
        &self.0
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value(vec![v])
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value(vec![v as i64])
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value(vec![v as i64])
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value(v)
    }
}

impl<const N: usize> From<[i64; N]> for Value {
    fn from(v: [i64; N]) -> Self {
        Value(v.to_vec())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl FromStr for Value {
    type Err = String;

    /// "50", "255 230 200", "true"/"false" (switches).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = Vec::new();
        for part in s.split(|c: char| c.is_whitespace() || c == ',') {
            if part.is_empty() {
                continue;
            }
            let v = match part {
                "true" | "on" => 1,
                "false" | "off" => 0,
                _ => part
                    .parse::<i64>()
                    .map_err(|_| format!("not an integer: `{}`", part))?,
            };
            out.push(v);
        }
        if out.is_empty() {
            return Err("empty value".to_string());
        }
        Ok(Value(out))
    }
}

/// Inclusive user-facing bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

impl Range {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: i64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn clamp(&self, v: i64) -> i64 {
        v.clamp(self.min, self.max)
    }
}

fn default_true() -> bool {
    true
}

/// Static description of one tunable. Built once from configuration, never
/// from user input; the registry only hands out shared references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Stable identifier; also the preference key.
    pub key: String,
    #[serde(default)]
    pub title: String,
    /// Written in order, as one logical value.
    pub paths: Vec<PathBuf>,
    pub range: Range,
    #[serde(default)]
    pub transform: Transform,
    /// Per-component fallback when neither hardware nor preferences have a value.
    pub default: i64,
    /// Re-applied by the boot restore.
    #[serde(default = "default_true")]
    pub restore: bool,
}

impl Descriptor {
    pub fn new<P: AsRef<Path>>(
        key: &str,
        title: &str,
        paths: &[P],
        range: Range,
        transform: Transform,
        default: i64,
    ) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            range,
            transform,
            default,
            restore: true,
        }
    }

    pub fn without_restore(mut self) -> Self {
        self.restore = false;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidDescriptor {
            key: self.key.clone(),
            reason,
        };

        if self.key.trim().is_empty() {
            return Err(invalid("empty key".to_string()));
        }
        if self.paths.is_empty() {
            return Err(invalid("no backing paths".to_string()));
        }
        if self.range.min > self.range.max {
            return Err(invalid(format!(
                "range min {} is above max {}",
                self.range.min, self.range.max
            )));
        }
        if let Transform::Boolean = self.transform {
            if self.range.min < 0 || self.range.max > 1 {
                return Err(invalid("switch range must stay within 0..=1".to_string()));
            }
        }
        self.transform.check().map_err(invalid)?;
        if !self.range.contains(self.default) {
            return Err(invalid(format!(
                "default {} outside {}..={}",
                self.default, self.range.min, self.range.max
            )));
        }
        Ok(())
    }

    /// Every backing path must exist.
    pub fn is_supported<S: BackingStore + ?Sized>(&self, store: &S) -> bool {
        self.paths.iter().all(|p| store.exists(p))
    }

    pub fn default_value(&self) -> Value {
        Value(vec![self.default; self.paths.len()])
    }

    /// Spread `value` over the backing paths and clamp every component.
    pub fn expand(&self, value: &Value) -> Result<Vec<i64>, String> {
        let n = self.paths.len();
        let comps = value.components();
        let spread = match comps.len() {
            1 => vec![comps[0]; n],
            len if len == n => comps.to_vec(),
            len => {
                return Err(format!(
                    "expected 1 or {} components, got {}",
                    n, len
                ))
            }
        };
        Ok(spread.into_iter().map(|v| self.range.clamp(v)).collect())
    }
}

/// All known tunables, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    descriptors: Vec<Descriptor>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new(descriptors: Vec<Descriptor>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            d.validate()?;
            if index.insert(d.key.clone(), i).is_some() {
                return Err(ConfigError::DuplicateKey(d.key.clone()));
            }
        }
        Ok(Self { descriptors, index })
    }

    pub fn get(&self, key: &str) -> Option<&Descriptor> {
        self.index.get(key).map(|&i| &self.descriptors[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// False for unknown keys.
    pub fn is_supported<S: BackingStore + ?Sized>(&self, key: &str, store: &S) -> bool {
        self.get(key).map(|d| d.is_supported(store)).unwrap_or(false)
    }
}
