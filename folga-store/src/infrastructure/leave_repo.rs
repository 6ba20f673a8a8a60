use std::collections::BTreeSet;

use chrono::NaiveDate;
use folga_core::calendar_date::parse_iso_date;
use folga_core::{EligibilityError, ValidationResult};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::domain::models::*;
use crate::error::StoreError;

pub struct LeaveRepository {
    pool: SqlitePool,
}

/// What the store knows about one staff member at the moment a leave is
/// being written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeaveSnapshot {
    /// Most recent leave strictly before the requested date, from records
    /// or the registered historical last leave.
    pub last_leave: Option<NaiveDate>,
    /// Earliest leave strictly after the requested date.
    pub next_leave: Option<NaiveDate>,
    /// Days taken by other staff in the same schedule.
    pub occupied: BTreeSet<NaiveDate>,
    /// Days already taken by this staff member in the schedule.
    pub own_dates: BTreeSet<NaiveDate>,
    pub leaves_taken: u32,
}

/// A leave written after the validator accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedWrite {
    pub record: LeaveRecord,
    pub snapshot: LeaveSnapshot,
    pub validation: ValidationResult,
}

const SELECT_LEAVE: &str =
    "SELECT id, schedule_id, staff_id, leave_date, status, justification FROM leaves";

// =====================
// Connection-level queries
// =====================
//
// Shared by the pool-backed reads and the transactional writes.

async fn fetch_leave(conn: &mut SqliteConnection, id: LeaveId) -> Result<Option<LeaveRecord>, StoreError> {
    let record = sqlx::query_as::<_, LeaveRecord>(&format!("{SELECT_LEAVE} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

async fn last_leave_before(
    conn: &mut SqliteConnection,
    staff_id: StaffMemberId,
    before: Option<NaiveDate>,
    exclude_leave: Option<LeaveId>,
) -> Result<Option<NaiveDate>, StoreError> {
    let latest: Option<String> = sqlx::query_scalar(
        "SELECT MAX(d) FROM (
            SELECT leave_date AS d FROM leaves
             WHERE staff_id = ?1 AND (?2 IS NULL OR leave_date < ?2) AND (?3 IS NULL OR id <> ?3)
            UNION ALL
            SELECT last_leave AS d FROM staff_members
             WHERE id = ?1 AND last_leave IS NOT NULL AND (?2 IS NULL OR last_leave < ?2)
        )",
    )
    .bind(staff_id)
    .bind(before)
    .bind(exclude_leave)
    .fetch_one(&mut *conn)
    .await?;

    latest.map(|raw| parse_stored(staff_id, &raw)).transpose()
}

async fn next_leave_after(
    conn: &mut SqliteConnection,
    staff_id: StaffMemberId,
    after: NaiveDate,
    exclude_leave: Option<LeaveId>,
) -> Result<Option<NaiveDate>, StoreError> {
    let earliest: Option<String> = sqlx::query_scalar(
        "SELECT MIN(d) FROM (
            SELECT leave_date AS d FROM leaves
             WHERE staff_id = ?1 AND leave_date > ?2 AND (?3 IS NULL OR id <> ?3)
            UNION ALL
            SELECT last_leave AS d FROM staff_members
             WHERE id = ?1 AND last_leave IS NOT NULL AND last_leave > ?2
        )",
    )
    .bind(staff_id)
    .bind(after)
    .bind(exclude_leave)
    .fetch_one(&mut *conn)
    .await?;

    earliest.map(|raw| parse_stored(staff_id, &raw)).transpose()
}

// aggregates come back as plain TEXT
fn parse_stored(staff_id: StaffMemberId, raw: &str) -> Result<NaiveDate, StoreError> {
    parse_iso_date(raw).map_err(|e| {
        StoreError::Eligibility(EligibilityError::InvalidHistory {
            reason: format!("stored leave date for staff {staff_id}: {e}"),
        })
    })
}

async fn leave_dates(
    conn: &mut SqliteConnection,
    schedule_id: ScheduleId,
    staff_id: StaffMemberId,
    own: bool,
    exclude_leave: Option<LeaveId>,
) -> Result<BTreeSet<NaiveDate>, StoreError> {
    let sql = if own {
        "SELECT leave_date FROM leaves WHERE schedule_id = ?1 AND staff_id = ?2 AND (?3 IS NULL OR id <> ?3)"
    } else {
        "SELECT leave_date FROM leaves WHERE schedule_id = ?1 AND staff_id <> ?2 AND (?3 IS NULL OR id <> ?3)"
    };

    let dates: Vec<NaiveDate> = sqlx::query_scalar(sql)
        .bind(schedule_id)
        .bind(staff_id)
        .bind(exclude_leave)
        .fetch_all(&mut *conn)
        .await?;
    Ok(dates.into_iter().collect())
}

async fn load_snapshot(
    conn: &mut SqliteConnection,
    schedule_id: ScheduleId,
    staff_id: StaffMemberId,
    requested: NaiveDate,
    exclude_leave: Option<LeaveId>,
) -> Result<LeaveSnapshot, StoreError> {
    let last_leave = last_leave_before(conn, staff_id, Some(requested), exclude_leave).await?;
    let next_leave = next_leave_after(conn, staff_id, requested, exclude_leave).await?;
    let occupied = leave_dates(conn, schedule_id, staff_id, false, exclude_leave).await?;
    let own_dates = leave_dates(conn, schedule_id, staff_id, true, exclude_leave).await?;
    let leaves_taken = u32::try_from(own_dates.len()).unwrap_or(u32::MAX);

    Ok(LeaveSnapshot { last_leave, next_leave, occupied, own_dates, leaves_taken })
}

fn to_count(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

impl LeaveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =================================================================
    // 1. Reads
    // =================================================================

    pub async fn find(&self, id: LeaveId) -> Result<Option<LeaveRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        fetch_leave(&mut conn, id).await
    }

    pub async fn list_for_schedule(&self, schedule_id: ScheduleId) -> Result<Vec<LeaveRecord>, StoreError> {
        let records = sqlx::query_as::<_, LeaveRecord>(&format!(
            "{SELECT_LEAVE} WHERE schedule_id = ? ORDER BY leave_date, staff_id"
        ))
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Latest leave strictly before `before`, counting the registered
    /// historical last leave as well.
    pub async fn last_leave_before(
        &self,
        staff_id: StaffMemberId,
        before: NaiveDate,
    ) -> Result<Option<NaiveDate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        last_leave_before(&mut conn, staff_id, Some(before), None).await
    }

    pub async fn latest_leave(&self, staff_id: StaffMemberId) -> Result<Option<NaiveDate>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        last_leave_before(&mut conn, staff_id, None, None).await
    }

    /// Every leave of the staff member across schedules, plus the registered
    /// historical one. Neighbours of any day are read from this set.
    pub async fn leave_timeline(&self, staff_id: StaffMemberId) -> Result<BTreeSet<NaiveDate>, StoreError> {
        let raw: Vec<String> = sqlx::query_scalar(
            "SELECT leave_date FROM leaves WHERE staff_id = ?1
             UNION
             SELECT last_leave FROM staff_members WHERE id = ?1 AND last_leave IS NOT NULL",
        )
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        raw.iter().map(|d| parse_stored(staff_id, d)).collect()
    }

    pub async fn snapshot(
        &self,
        schedule_id: ScheduleId,
        staff_id: StaffMemberId,
        requested: NaiveDate,
    ) -> Result<LeaveSnapshot, StoreError> {
        let mut conn = self.pool.acquire().await?;
        load_snapshot(&mut conn, schedule_id, staff_id, requested, None).await
    }

    pub async fn count_for_staff(&self, schedule_id: ScheduleId, staff_id: StaffMemberId) -> Result<u32, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leaves WHERE schedule_id = ? AND staff_id = ?")
            .bind(schedule_id)
            .bind(staff_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(n))
    }

    pub async fn count_on_date(&self, schedule_id: ScheduleId, date: NaiveDate) -> Result<u32, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leaves WHERE schedule_id = ? AND leave_date = ?")
            .bind(schedule_id)
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(to_count(n))
    }

    pub async fn has_sunday_leave(&self, schedule_id: ScheduleId, staff_id: StaffMemberId) -> Result<bool, StoreError> {
        // strftime('%w') is '0' on Sundays
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM leaves
                 WHERE schedule_id = ? AND staff_id = ? AND strftime('%w', leave_date) = '0'
            )",
        )
        .bind(schedule_id)
        .bind(staff_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    // =================================================================
    // 2. Checked writes
    // =================================================================
    //
    // History and occupancy are re-read inside the write transaction, so the
    // decision is made on the same state the write lands on.

    pub async fn insert_checked<F>(&self, new: &NewLeave, decide: F) -> Result<CheckedWrite, StoreError>
    where
        F: FnOnce(&LeaveSnapshot) -> Result<ValidationResult, StoreError>,
    {
        // 1. Open the transaction
        let mut tx = self.pool.begin().await?;

        // 2. Re-read history and occupancy
        let snapshot = load_snapshot(&mut tx, new.schedule_id, new.staff_id, new.leave_date, None).await?;

        // 3. Decide; dropping the transaction rolls it back
        let validation = decide(&snapshot)?;
        if !validation.is_valid() {
            debug!(staff_id = new.staff_id, date = %new.leave_date, reason = ?validation.reason_code, "leave rejected");
            return Err(StoreError::Rejected(validation));
        }

        // 4. Write
        let id = sqlx::query(
            "INSERT INTO leaves (schedule_id, staff_id, leave_date, status, justification)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(new.schedule_id)
        .bind(new.staff_id)
        .bind(new.leave_date)
        .bind(LeaveStatus::Pending)
        .bind(new.justification.as_deref())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let record = fetch_leave(&mut tx, id).await?.ok_or_else(|| StoreError::not_found("leave", id))?;

        // 5. Commit
        tx.commit().await?;
        info!(leave_id = id, staff_id = new.staff_id, date = %new.leave_date, "leave recorded");

        Ok(CheckedWrite { record, snapshot, validation })
    }

    /// Moves a pending leave to `new_date`. The leave being moved is ignored
    /// when history and occupancy are re-read.
    pub async fn update_checked<F>(&self, id: LeaveId, new_date: NaiveDate, decide: F) -> Result<CheckedWrite, StoreError>
    where
        F: FnOnce(&LeaveRecord, &LeaveSnapshot) -> Result<ValidationResult, StoreError>,
    {
        let mut tx = self.pool.begin().await?;

        let current = fetch_leave(&mut tx, id).await?.ok_or_else(|| StoreError::not_found("leave", id))?;
        if !current.is_pending() {
            return Err(StoreError::business(format!("leave {id} is already approved and cannot be changed")));
        }

        let snapshot = load_snapshot(&mut tx, current.schedule_id, current.staff_id, new_date, Some(id)).await?;
        let validation = decide(&current, &snapshot)?;
        if !validation.is_valid() {
            return Err(StoreError::Rejected(validation));
        }

        sqlx::query("UPDATE leaves SET leave_date = ? WHERE id = ?")
            .bind(new_date)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let record = fetch_leave(&mut tx, id).await?.ok_or_else(|| StoreError::not_found("leave", id))?;
        tx.commit().await?;
        info!(leave_id = id, from = %current.leave_date, to = %new_date, "leave moved");

        Ok(CheckedWrite { record, snapshot, validation })
    }

    // =================================================================
    // 3. Status and removal
    // =================================================================

    pub async fn approve(&self, id: LeaveId) -> Result<LeaveRecord, StoreError> {
        let affected = sqlx::query("UPDATE leaves SET status = ? WHERE id = ?")
            .bind(LeaveStatus::Approved)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(StoreError::not_found("leave", id));
        }
        self.find(id).await?.ok_or_else(|| StoreError::not_found("leave", id))
    }

    /// Only pending leaves can be removed.
    pub async fn delete_pending(&self, id: LeaveId) -> Result<LeaveRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_leave(&mut tx, id).await?.ok_or_else(|| StoreError::not_found("leave", id))?;
        if !current.is_pending() {
            return Err(StoreError::business(format!("leave {id} is already approved and cannot be removed")));
        }

        sqlx::query("DELETE FROM leaves WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(leave_id = id, "leave removed");

        Ok(current)
    }
}
