use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One CSV line: the item code plus the optional dimensional columns.
///
/// Numeric columns stay string-encoded until update time; `None` means the
/// column was blank and the remote field must not be touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub code: String,
    pub length: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    /// 1-based line number in the source file.
    pub line: u64,
}

impl ItemRecord {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            length: None,
            width: None,
            height: None,
            weight: None,
            line: 0,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Length => self.length.as_deref(),
            Dimension::Width => self.width.as_deref(),
            Dimension::Height => self.height.as_deref(),
            Dimension::Weight => self.weight.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Width,
    Height,
    Weight,
}

impl Dimension {
    /// Column order in the CSV file, after the item code.
    pub const ALL: [Dimension; 4] = [
        Dimension::Length,
        Dimension::Width,
        Dimension::Height,
        Dimension::Weight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Length => "length",
            Dimension::Width => "width",
            Dimension::Height => "height",
            Dimension::Weight => "weight",
        }
    }
}

/// Business object types the remote API exposes to this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    ItemMaster,
}

impl ObjectKind {
    /// Entity set name on the Service Layer.
    pub fn entity_set(&self) -> &'static str {
        match self {
            ObjectKind::ItemMaster => "Items",
        }
    }

    pub fn key_field(&self) -> &'static str {
        match self {
            ObjectKind::ItemMaster => "ItemCode",
        }
    }
}

/// Database server type of the company database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Mssql2012,
    Mssql2014,
    #[default]
    Mssql2016,
    Mssql2017,
    Mssql2019,
    Hana,
}

impl ServerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerKind::Mssql2012 => "mssql2012",
            ServerKind::Mssql2014 => "mssql2014",
            ServerKind::Mssql2016 => "mssql2016",
            ServerKind::Mssql2017 => "mssql2017",
            ServerKind::Mssql2019 => "mssql2019",
            ServerKind::Hana => "hana",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mssql2012" => Ok(ServerKind::Mssql2012),
            "mssql2014" => Ok(ServerKind::Mssql2014),
            "mssql2016" => Ok(ServerKind::Mssql2016),
            "mssql2017" => Ok(ServerKind::Mssql2017),
            "mssql2019" => Ok(ServerKind::Mssql2019),
            "hana" => Ok(ServerKind::Hana),
            other => Err(format!(
                "unknown server kind '{}' (expected mssql2012, mssql2014, mssql2016, mssql2017, mssql2019 or hana)",
                other
            )),
        }
    }
}

/// Everything needed to open a session on the remote system.
#[derive(Clone)]
pub struct ConnectionParams {
    pub server: String,
    pub server_kind: ServerKind,
    pub db_user: String,
    pub db_password: String,
    pub company_db: String,
    pub api_user: String,
    pub api_password: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("server", &self.server)
            .field("server_kind", &self.server_kind)
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("company_db", &self.company_db)
            .field("api_user", &self.api_user)
            .field("api_password", &"***")
            .finish()
    }
}

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Updated,
    NotFound,
    /// Commit rejected; holds the remote system's last-error text.
    UpdateFailed(String),
    /// Anything else that went wrong while processing the record.
    Failed(String),
}

impl RecordStatus {
    pub fn describe(&self, code: &str) -> String {
        match self {
            RecordStatus::Updated => format!("OK for [{}]", code),
            RecordStatus::NotFound => format!("could not load [{}]", code),
            RecordStatus::UpdateFailed(description) => format!("remote error: {}", description),
            RecordStatus::Failed(message) => message.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecordStatus::Updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// 1-based position in the batch.
    pub index: usize,
    pub code: String,
    pub status: RecordStatus,
}

impl ItemOutcome {
    pub fn status_line(&self, total: usize) -> String {
        format!("[{} or {}] {}", self.index, total, self.status.describe(&self.code))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn updated(&self) -> usize {
        self.count(RecordStatus::is_success)
    }

    pub fn not_found(&self) -> usize {
        self.count(|s| matches!(s, RecordStatus::NotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RecordStatus::UpdateFailed(_) | RecordStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&RecordStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}
