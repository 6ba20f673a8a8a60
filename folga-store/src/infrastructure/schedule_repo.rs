use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

use crate::domain::models::*;
use crate::error::StoreError;

/// Departments, staff and monthly schedules. These are the policy source
/// for the leave use-cases.
pub struct ScheduleRepository {
    pool: SqlitePool,
}

impl ScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =================================================================
    // 1. Departments
    // =================================================================

    pub async fn create_department(&self, name: &str) -> Result<DepartmentId, StoreError> {
        let id = sqlx::query("INSERT INTO departments (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    pub async fn find_department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        let department = sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(department)
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        let departments = sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(departments)
    }

    // =================================================================
    // 2. Staff
    // =================================================================

    pub async fn add_staff_member(
        &self,
        department_id: DepartmentId,
        name: &str,
        shift: Shift,
    ) -> Result<StaffMemberId, StoreError> {
        let id = sqlx::query("INSERT INTO staff_members (department_id, name, shift) VALUES (?, ?, ?)")
            .bind(department_id)
            .bind(name)
            .bind(shift)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    pub async fn find_staff(&self, id: StaffMemberId) -> Result<Option<StaffMember>, StoreError> {
        let staff = sqlx::query_as::<_, StaffMember>(
            "SELECT id, department_id, name, shift, last_leave FROM staff_members WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn list_staff(&self, department_id: DepartmentId, shift: Shift) -> Result<Vec<StaffMember>, StoreError> {
        let staff = sqlx::query_as::<_, StaffMember>(
            "SELECT id, department_id, name, shift, last_leave FROM staff_members
             WHERE department_id = ? AND shift = ? ORDER BY name",
        )
        .bind(department_id)
        .bind(shift)
        .fetch_all(&self.pool)
        .await?;
        Ok(staff)
    }

    pub async fn count_staff_in_shift(&self, department_id: DepartmentId, shift: Shift) -> Result<u32, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff_members WHERE department_id = ? AND shift = ?")
            .bind(department_id)
            .bind(shift)
            .fetch_one(&self.pool)
            .await?;
        Ok(u32::try_from(n).unwrap_or(u32::MAX))
    }

    /// Overwrites the registered historical last leave.
    pub async fn set_last_leave(&self, staff_id: StaffMemberId, date: NaiveDate) -> Result<(), StoreError> {
        let affected = sqlx::query("UPDATE staff_members SET last_leave = ? WHERE id = ?")
            .bind(date)
            .bind(staff_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(StoreError::not_found("staff member", staff_id));
        }
        info!(staff_id, %date, "last leave registered");
        Ok(())
    }

    // =================================================================
    // 3. Schedules
    // =================================================================

    pub async fn create_schedule(&self, new: &NewSchedule) -> Result<ScheduleId, StoreError> {
        let id = sqlx::query(
            "INSERT INTO schedules (
                department_id,
                shift,
                month,
                year,
                leaves_allowed,
                max_consecutive_working_days
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(new.department_id)
        .bind(new.shift)
        .bind(new.month)
        .bind(new.year)
        .bind(new.leaves_allowed)
        .bind(new.max_consecutive_working_days)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn find_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, StoreError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            "SELECT id, department_id, shift, month, year, leaves_allowed, max_consecutive_working_days
             FROM schedules WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    /// The staff member's schedule for one month, found through their department and shift.
    pub async fn find_schedule_for(&self, staff: &StaffMember, month: u32, year: i32) -> Result<Option<Schedule>, StoreError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            "SELECT id, department_id, shift, month, year, leaves_allowed, max_consecutive_working_days
             FROM schedules WHERE department_id = ? AND shift = ? AND month = ? AND year = ?",
        )
        .bind(staff.department_id)
        .bind(staff.shift)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }
}
