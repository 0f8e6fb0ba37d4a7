//! Address selectors used when querying node addresses.

use serde::{Deserialize, Serialize};

/// Extended (EUI-64) address value that no node ever holds.
pub const INVALID_EXT_ADDR: u64 = u64::MAX;

/// Which of a node's IPv6 addresses to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddrType {
    Any,
    Mleid,
    Rloc,
    #[serde(rename = "linklocal")]
    LinkLocal,
}

impl AddrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddrType::Any => "any",
            AddrType::Mleid => "mleid",
            AddrType::Rloc => "rloc",
            AddrType::LinkLocal => "linklocal",
        }
    }
}

impl std::fmt::Display for AddrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AddrType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(AddrType::Any),
            "mleid" => Ok(AddrType::Mleid),
            "rloc" => Ok(AddrType::Rloc),
            "linklocal" => Ok(AddrType::LinkLocal),
            other => Err(format!("unknown address type: {other}")),
        }
    }
}
