#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a resource points at.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Uploaded bytes, backed by a storage object.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "file"))]
    File,
    /// External URL stored inline.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "link"))]
    Link,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "note"))]
    Note,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Link => "link",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "link" => Ok(Self::Link),
            "note" => Ok(Self::Note),
            other => Err(format!("unknown resource kind: {other}")),
        }
    }
}
