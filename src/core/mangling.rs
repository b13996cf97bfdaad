//! Fortran symbol decoration schemes.
//!
//! A [`ManglingScheme`] is a plain value; [`decorate`] is the only way to
//! turn an identifier into the symbol the linker sees. The search orders are
//! materialized tables so the order itself can be inspected and tested.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::platform::Platform;

/// Case applied to Fortran identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Lower,
    Upper,
}

impl Case {
    pub fn apply(&self, ident: &str) -> String {
        match self {
            Case::Lower => ident.to_lowercase(),
            Case::Upper => ident.to_uppercase(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Case::Lower => "lower",
            Case::Upper => "upper",
        }
    }
}

impl std::str::FromStr for Case {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lower" => Ok(Case::Lower),
            "upper" => Ok(Case::Upper),
            _ => Err(format!("invalid case '{}'; expected 'lower' or 'upper'", s)),
        }
    }
}

/// How a Fortran compiler decorates external subroutine names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManglingScheme {
    /// Prepend `_` to every symbol
    pub leading_underscore: bool,
    /// Append a second `_` to names containing an internal `_`
    pub double_trailing_underscore_on_compound: bool,
    pub case: Case,
}

impl ManglingScheme {
    pub const fn new(leading: bool, double: bool, case: Case) -> Self {
        ManglingScheme {
            leading_underscore: leading,
            double_trailing_underscore_on_compound: double,
            case,
        }
    }

    /// Shorthand for [`decorate`].
    pub fn decorate(&self, ident: &str) -> String {
        decorate(self, ident)
    }

    /// Preprocessor defines describing this scheme for the given key prefix.
    ///
    /// With `f2py_compat`, the unprefixed spelling is emitted as well.
    pub fn cpp_defines(&self, prefix: &str, f2py_compat: bool) -> Vec<String> {
        let mut macros = Vec::new();
        let mut push = |name: &str| {
            macros.push(format!("{}_{}", prefix, name));
            if f2py_compat {
                macros.push(name.to_string());
            }
        };

        if self.double_trailing_underscore_on_compound {
            push("UNDERSCORE_G77");
        }
        if self.leading_underscore {
            push("PREPEND_FORTRAN");
        }
        if self.case == Case::Upper {
            push("UPPERCASE_FORTRAN");
        }

        macros
    }
}

impl fmt::Display for ManglingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "leading '{}', compound '{}', {}-case",
            if self.leading_underscore { "_" } else { "" },
            if self.double_trailing_underscore_on_compound { "_" } else { "" },
            self.case.as_str()
        )
    }
}

/// Decorate `ident` as the linker sees it under `scheme`.
///
/// Case is applied first, then the trailing underscore (doubled for
/// compound names when the scheme says so), then the leading underscore.
pub fn decorate(scheme: &ManglingScheme, ident: &str) -> String {
    let mut symbol = scheme.case.apply(ident);
    symbol.push('_');
    if scheme.double_trailing_underscore_on_compound && ident.contains('_') {
        symbol.push('_');
    }
    if scheme.leading_underscore {
        symbol.insert(0, '_');
    }
    symbol
}

use Case::{Lower, Upper};

/// POSIX-family order: no leading underscore first, lowercase first.
pub const POSIX_SEARCH_ORDER: [ManglingScheme; 8] = [
    ManglingScheme::new(false, false, Lower),
    ManglingScheme::new(false, false, Upper),
    ManglingScheme::new(false, true, Lower),
    ManglingScheme::new(false, true, Upper),
    ManglingScheme::new(true, false, Lower),
    ManglingScheme::new(true, false, Upper),
    ManglingScheme::new(true, true, Lower),
    ManglingScheme::new(true, true, Upper),
];

/// Windows-family order: leading underscore first, uppercase first.
pub const WINDOWS_SEARCH_ORDER: [ManglingScheme; 8] = [
    ManglingScheme::new(true, false, Upper),
    ManglingScheme::new(true, false, Lower),
    ManglingScheme::new(true, true, Upper),
    ManglingScheme::new(true, true, Lower),
    ManglingScheme::new(false, false, Upper),
    ManglingScheme::new(false, false, Lower),
    ManglingScheme::new(false, true, Upper),
    ManglingScheme::new(false, true, Lower),
];

/// The scheme order probed on `platform`.
pub fn search_order(platform: &Platform) -> &'static [ManglingScheme; 8] {
    if platform.is_windows() {
        &WINDOWS_SEARCH_ORDER
    } else {
        &POSIX_SEARCH_ORDER
    }
}
