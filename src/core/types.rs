use std::fmt;
use std::str::FromStr;

/// User subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Plan {
    #[default]
    Free,
    Paid,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Paid => "paid",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "paid" => Ok(Plan::Paid),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

// rusqlite FromSql: read plan from DB text column
impl rusqlite::types::FromSql for Plan {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        Plan::from_str(s).map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

// rusqlite ToSql: write plan as text to DB
impl rusqlite::types::ToSql for Plan {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

/// Per-user persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Telegram user id
    pub id: i64,
    pub plan: Plan,
    /// Usage credit, decremented per received photo. Not floored at zero.
    pub counter: i64,
    /// Language code keying into the localization table
    pub language: String,
}

/// Values given to a profile on first contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub plan: Plan,
    pub counter: i64,
    pub language: String,
}

impl ProfileDefaults {
    /// `free` plan, one credit, the given language.
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            plan: Plan::Free,
            counter: 1,
            language: language.into(),
        }
    }
}

impl UserProfile {
    pub fn new(id: i64, defaults: &ProfileDefaults) -> Self {
        Self {
            id,
            plan: defaults.plan,
            counter: defaults.counter,
            language: defaults.language.clone(),
        }
    }
}
