//! Build configuration store.
//!
//! [`BuildEnv`] is the explicit configuration object every probe receives.
//! Probes mutate it only through a [`Transaction`], which restores the
//! touched keys unless the probe commits.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{Case, CompilerRole, FortranRole, ManglingScheme};

mod transaction;

pub use transaction::{ConfigSnapshot, Transaction};

/// Well-known configuration keys.
pub mod keys {
    use crate::core::{CompilerRole, FortranRole};

    pub const CC: &str = "CC";
    pub const CXX: &str = "CXX";
    pub const F77: &str = "F77";
    pub const F90: &str = "F90";
    pub const AR: &str = "AR";
    pub const LINK: &str = "LINK";
    pub const LINKCOM: &str = "LINKCOM";
    pub const LINKFLAGS: &str = "LINKFLAGS";
    pub const LINKFLAGSEND: &str = "LINKFLAGSEND";
    pub const LIBS: &str = "LIBS";
    pub const LIBPATH: &str = "LIBPATH";
    pub const CFLAGS: &str = "CFLAGS";
    pub const CXXFLAGS: &str = "CXXFLAGS";
    pub const F77FLAGS: &str = "F77FLAGS";
    pub const F90FLAGS: &str = "F90FLAGS";
    pub const CPPDEFINES: &str = "CPPDEFINES";

    /// Keys naming a single program. Their values are paths and may
    /// contain spaces.
    pub const PROGRAMS: &[&str] = &[CC, CXX, F77, F90, AR, LINK];

    pub fn family(role: CompilerRole) -> String {
        format!("{}_COMPILER_FAMILY", role.compiler_key())
    }

    pub fn version(role: CompilerRole) -> String {
        format!("{}_VERSION", role.compiler_key())
    }

    pub fn flavor(role: CompilerRole) -> String {
        format!("{}_FLAVOR", role.compiler_key())
    }

    pub fn dummy_main(role: FortranRole) -> String {
        format!("{}_DUMMY_MAIN", role.prefix())
    }

    pub fn underscore_g77(role: FortranRole) -> String {
        format!("{}_UNDERSCORE_G77", role.prefix())
    }

    pub fn prepend_fortran(role: FortranRole) -> String {
        format!("{}_PREPEND_FORTRAN", role.prefix())
    }

    pub fn uppercase_fortran(role: FortranRole) -> String {
        format!("{}_UPPERCASE_FORTRAN", role.prefix())
    }

    pub fn link_vflag(role: FortranRole) -> String {
        format!("{}LINK_VFLAG", role.prefix())
    }

    pub fn ldflags(role: FortranRole) -> String {
        format!("{}_LDFLAGS", role.prefix())
    }

    /// Flags key for a compiler role.
    pub fn flags(role: CompilerRole) -> &'static str {
        match role {
            CompilerRole::C => CFLAGS,
            CompilerRole::Cxx => CXXFLAGS,
            CompilerRole::Fortran77 => F77FLAGS,
            CompilerRole::Fortran90 => F90FLAGS,
        }
    }
}

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Command-line tokens for this value. Strings split on whitespace.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Value::Bool(b) => vec![if *b { "1" } else { "0" }.to_string()],
            Value::Str(s) => s.split_whitespace().map(str::to_string).collect(),
            Value::List(items) => items.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<&Path> for Value {
    fn from(path: &Path) -> Self {
        Value::Str(path.display().to_string())
    }
}

/// Required alternate entry point of a Fortran runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DummyMain {
    NoneRequired,
    Symbol(String),
}

impl DummyMain {
    /// Stored form: the symbol, or an empty string for "none required".
    pub fn to_value(&self) -> Value {
        match self {
            DummyMain::NoneRequired => Value::Str(String::new()),
            DummyMain::Symbol(sym) => Value::Str(sym.clone()),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        let sym = value.as_str()?;
        if sym.is_empty() {
            Some(DummyMain::NoneRequired)
        } else {
            Some(DummyMain::Symbol(sym.to_string()))
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            DummyMain::NoneRequired => None,
            DummyMain::Symbol(sym) => Some(sym),
        }
    }
}

impl std::fmt::Display for DummyMain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DummyMain::NoneRequired => f.write_str("none"),
            DummyMain::Symbol(sym) => f.write_str(sym),
        }
    }
}

/// The build configuration map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildEnv {
    vars: BTreeMap<String, Value>,
}

impl BuildEnv {
    pub fn new() -> Self {
        BuildEnv::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Tokens for `key`; empty when absent.
    pub fn tokens(&self, key: &str) -> Vec<String> {
        self.get(key).map(Value::tokens).unwrap_or_default()
    }

    /// Append items to a list value, converting a string value to a list.
    pub fn append<I, S>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = self.tokens(key);
        list.extend(items.into_iter().map(Into::into));
        self.set(key, Value::List(list));
    }

    /// Append items not already present.
    pub fn append_unique<I, S>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = self.tokens(key);
        for item in items {
            let item = item.into();
            if !list.contains(&item) {
                list.push(item);
            }
        }
        self.set(key, Value::List(list));
    }

    /// Start a transaction over `keys`.
    pub fn transaction(&mut self, keys: &[&str]) -> Transaction<'_> {
        Transaction::begin(self, keys)
    }

    /// Run `body` with `keys` saved.
    ///
    /// The keys are restored when `body` fails, even after a
    /// [`Transaction::commit`], or when it returns without committing.
    pub fn with_saved_keys<T, E, F>(&mut self, keys: &[&str], body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> std::result::Result<T, E>,
    {
        let saved = ConfigSnapshot::capture(self, keys);
        let out = {
            let mut tx = self.transaction(keys);
            body(&mut tx)
        };
        if out.is_err() {
            saved.restore(self);
        }
        out
    }

    /// Compiler configured for `role`.
    pub fn compiler(&self, role: CompilerRole) -> Option<&str> {
        self.get_str(role.compiler_key()).filter(|s| !s.is_empty())
    }

    /// Committed dummy-main answer for `role`.
    pub fn dummy_main(&self, role: FortranRole) -> Option<DummyMain> {
        self.get(&keys::dummy_main(role)).and_then(DummyMain::from_value)
    }

    /// Committed mangling scheme for `role`.
    pub fn mangling_scheme(&self, role: FortranRole) -> Option<ManglingScheme> {
        let double = self.get_bool(&keys::underscore_g77(role))?;
        let leading = self.get_bool(&keys::prepend_fortran(role))?;
        let upper = self.get_bool(&keys::uppercase_fortran(role))?;
        let case = if upper { Case::Upper } else { Case::Lower };
        Some(ManglingScheme::new(leading, double, case))
    }

    /// Load an environment saved with [`BuildEnv::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read environment: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse environment: {}", path.display()))
    }

    /// Save the environment as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).with_context(|| "failed to serialize environment")?;

        crate::util::fs::write_string(path, &contents)
    }
}
