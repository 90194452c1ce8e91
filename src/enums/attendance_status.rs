use std::fmt;
use std::str::FromStr;

use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde_derive::{Deserialize, Serialize};

/// Per-user attendance state. Stored as `time-in` / `time-out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsExpression, FromSqlRow, Serialize, Deserialize)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    TimeIn,
    TimeOut,
}

impl AttendanceStatus {
    /// A user with no records, or whose last record is a time-out, checks in next.
    pub fn next_after(last: Option<AttendanceStatus>) -> AttendanceStatus {
        match last {
            None | Some(AttendanceStatus::TimeOut) => AttendanceStatus::TimeIn,
            Some(AttendanceStatus::TimeIn) => AttendanceStatus::TimeOut,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::TimeIn => "time-in",
            AttendanceStatus::TimeOut => "time-out",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time-in" => Ok(AttendanceStatus::TimeIn),
            "time-out" => Ok(AttendanceStatus::TimeOut),
            other => Err(format!("Unknown attendance status: {}", other)),
        }
    }
}

impl ToSql<Text, Sqlite> for AttendanceStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for AttendanceStatus {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(value.parse()?)
    }
}
