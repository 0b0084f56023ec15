//! Required permission codes

use serde::{Deserialize, Serialize};

/// A conjunctive set of required codes: one code or several, all of which
/// must be granted. An empty set is trivially satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CodesRepr", into = "Vec<String>")]
pub struct RequiredCodes(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum CodesRepr {
    One(String),
    Many(Vec<String>),
}

impl From<CodesRepr> for RequiredCodes {
    fn from(repr: CodesRepr) -> Self {
        match repr {
            CodesRepr::One(code) => Self(vec![code]),
            CodesRepr::Many(codes) => Self(codes),
        }
    }
}

impl From<RequiredCodes> for Vec<String> {
    fn from(codes: RequiredCodes) -> Self {
        codes.0
    }
}

impl RequiredCodes {
    pub fn codes(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every required code satisfies `granted`
    pub fn all<F>(&self, mut granted: F) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        self.0.iter().all(|code| granted(code))
    }
}

impl From<&str> for RequiredCodes {
    fn from(code: &str) -> Self {
        Self(vec![code.to_string()])
    }
}

impl From<String> for RequiredCodes {
    fn from(code: String) -> Self {
        Self(vec![code])
    }
}

impl From<&[&str]> for RequiredCodes {
    fn from(codes: &[&str]) -> Self {
        Self(codes.iter().map(|c| c.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RequiredCodes {
    fn from(codes: [&str; N]) -> Self {
        Self(codes.iter().map(|c| c.to_string()).collect())
    }
}

impl From<Vec<&str>> for RequiredCodes {
    fn from(codes: Vec<&str>) -> Self {
        Self(codes.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for RequiredCodes {
    fn from(codes: Vec<String>) -> Self {
        Self(codes)
    }
}

impl From<&[String]> for RequiredCodes {
    fn from(codes: &[String]) -> Self {
        Self(codes.to_vec())
    }
}
