use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use serde_derive::Serialize;

use crate::enums::attendance_status::AttendanceStatus;
use crate::schema::{attendance, users};

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AttendanceRecord {
    pub id: i32,
    pub user_id: i32,
    pub timestamp: NaiveDateTime,
    pub status: AttendanceStatus,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = attendance)]
pub struct NewAttendanceRecord {
    pub user_id: i32,
    pub timestamp: NaiveDateTime,
    pub status: AttendanceStatus,
}

/// One row of the attendance listing, joined with the user it belongs to.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub user_id: i32,
    pub name: String,
    pub office: String,
    pub designation: String,
    pub timestamp: NaiveDateTime,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn last_status(uid: i32, conn: &mut SqliteConnection) -> QueryResult<Option<AttendanceStatus>> {
        attendance::table
            .filter(attendance::user_id.eq(uid))
            .order((attendance::timestamp.desc(), attendance::id.desc()))
            .select(attendance::status)
            .first::<AttendanceStatus>(conn)
            .optional()
    }

    /// Appends the next status for `uid`. Reading the last status and inserting
    /// happen under one write lock, so concurrent scans of the same user
    /// still alternate.
    pub fn record_next(uid: i32, conn: &mut SqliteConnection) -> QueryResult<AttendanceRecord> {
        conn.immediate_transaction(|conn| {
            let last = Self::last_status(uid, conn)?;

            let record = NewAttendanceRecord {
                user_id: uid,
                timestamp: Utc::now().naive_utc(),
                status: AttendanceStatus::next_after(last),
            };

            diesel::insert_into(attendance::table)
                .values(&record)
                .returning(AttendanceRecord::as_returning())
                .get_result(conn)
        })
    }
}

impl AttendanceEntry {
    /// Full listing, newest first.
    pub fn all(conn: &mut SqliteConnection) -> QueryResult<Vec<AttendanceEntry>> {
        attendance::table
            .inner_join(users::table)
            .order((attendance::timestamp.desc(), attendance::id.desc()))
            .select((
                attendance::user_id,
                users::name,
                users::office,
                users::designation,
                attendance::timestamp,
                attendance::status,
            ))
            .load::<AttendanceEntry>(conn)
    }
}
