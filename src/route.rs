use std::fmt::{self, Display};
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// How a record screen is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    View,
    Edit,
    #[default]
    Create,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::View => "view",
            Mode::Edit => "edit",
            Mode::Create => "create",
        }
    }

    /// Only `view` disables the inputs.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Mode::View)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "view" => Ok(Mode::View),
            "edit" => Ok(Mode::Edit),
            "create" => Ok(Mode::Create),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// A navigation target such as `/grn?id=3&mode=view`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: String,
    pub id: Option<String>,
    pub mode: Mode,
}

impl Route {
    /// Fails with `MissingId` when `mode` is `view` or `edit` and there is
    /// no id.
    pub fn new(path: &str, id: Option<String>, mode: Mode) -> Result<Route> {
        if mode != Mode::Create && id.is_none() {
            return Err(Error::MissingId(mode.as_str()));
        }
        Ok(Route {
            path: path.to_string(),
            id,
            mode,
        })
    }

    /// A create screen for `path`.
    pub fn create(path: &str) -> Route {
        Route {
            path: path.to_string(),
            id: None,
            mode: Mode::Create,
        }
    }

    pub fn view(path: &str, id: &str) -> Route {
        Route {
            path: path.to_string(),
            id: Some(id.to_string()),
            mode: Mode::View,
        }
    }

    pub fn edit(path: &str, id: &str) -> Route {
        Route {
            path: path.to_string(),
            id: Some(id.to_string()),
            mode: Mode::Edit,
        }
    }
}

impl FromStr for Route {
    type Err = Error;

    /// Unknown query keys are ignored; an absent mode means `create`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (path, query) = s.split_once('?').unwrap_or((s, ""));
        if path.is_empty() || !path.starts_with('/') {
            return Err(Error::InvalidRoute(s.to_string()));
        }

        let mut id = None;
        let mut mode = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let Some((k, v)) = pair.split_once('=') else {
                return Err(Error::InvalidRoute(s.to_string()));
            };
            match k {
                "id" if !v.is_empty() => {
                    id = Some(unescape(v).ok_or_else(|| Error::InvalidRoute(s.to_string()))?)
                }
                "id" => {}
                "mode" => mode = Some(v.parse::<Mode>()?),
                _ => {}
            }
        }

        Route::new(path, id, mode.unwrap_or_default())
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.id, self.mode) {
            (None, Mode::Create) => write!(f, "{}", self.path),
            (None, mode) => write!(f, "{}?mode={}", self.path, mode),
            (Some(id), mode) => write!(f, "{}?id={}&mode={}", self.path, escape(id), mode),
        }
    }
}

/// Percent-encodes the characters that would end or split a query value.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' | '&' | '=' | '?' | '#' | '+' | ' ' => out.push_str(&format!("%{:02X}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses `escape`; `None` on a malformed `%XX` sequence.
fn unescape(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = value.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
