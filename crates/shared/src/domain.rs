use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(TemplateId);

/// Role granted to the signed-in account. Unknown roles are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRole {
    User,
    Admin,
    Other(String),
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "USER" => Self::User,
            "ADMIN" => Self::Admin,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UserRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering offered by the public template listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Recent,
    MostShared,
    Alphabetical,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [Self::Recent, Self::MostShared, Self::Alphabetical];

    /// Server-side field and direction for this ordering.
    pub fn sort_key(self) -> (&'static str, SortDirection) {
        match self {
            Self::Recent => ("createdAt", SortDirection::Desc),
            Self::MostShared => ("shareCount", SortDirection::Desc),
            Self::Alphabetical => ("title", SortDirection::Asc),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recent => "최신 순",
            Self::MostShared => "공유 순",
            Self::Alphabetical => "가나다 순",
        }
    }
}
