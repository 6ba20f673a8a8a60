#[cfg(test)]
mod leave_service_tests {
    use chrono::NaiveDate;
    use folga_core::alerts::AlertKind;
    use folga_core::{EligibilityError, ReasonCode};

    use folga_store::{application::dto::DayStatus, config::StoreConfig, domain::models::*, error::StoreError, AppServices};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Ward {
        services: AppServices,
        november: ScheduleId,
        december: ScheduleId,
        ana: StaffMemberId,
        bruno: StaffMemberId,
        carla: StaffMemberId,
    }

    /// Three morning staff in one department, November and December 2024
    /// schedules, Ana's last leave registered on 2024-11-20.
    async fn ward(leaves_allowed: u32) -> Ward {
        let services = AppServices::connect(&StoreConfig::in_memory()).await.unwrap();
        let repo = &services.schedule;

        let department = repo.create_department("Emergency").await.unwrap();
        let ana = repo.add_staff_member(department, "Ana", Shift::Morning).await.unwrap();
        let bruno = repo.add_staff_member(department, "Bruno", Shift::Morning).await.unwrap();
        let carla = repo.add_staff_member(department, "Carla", Shift::Morning).await.unwrap();

        let schedule = |month, year| NewSchedule {
            department_id: department,
            shift: Shift::Morning,
            month,
            year,
            leaves_allowed,
            max_consecutive_working_days: 6,
        };
        let november = repo.create_schedule(&schedule(11, 2024)).await.unwrap();
        let december = repo.create_schedule(&schedule(12, 2024)).await.unwrap();

        repo.set_last_leave(ana, ymd(2024, 11, 20)).await.unwrap();

        Ward { services, november, december, ana, bruno, carla }
    }

    // ========================================================================
    // Calendar
    // ========================================================================

    #[tokio::test]
    async fn test_calendar_after_a_same_month_leave() {
        let w = ward(8).await;
        let view = w.services.leaves().calendar(w.november, w.ana).await.unwrap();

        assert_eq!(view.last_leave, Some(ymd(2024, 11, 20)));
        assert_eq!(view.window.eligible_days_in_month, vec![27, 28, 29, 30]);
        assert_eq!(view.days.len(), 30);
        assert_eq!(view.weeks_in_month, 5);
        assert!(view.has_valid_history);

        // days a full rest cycle before the 20th stay open, and the registered
        // day itself can still be recorded
        let eligible: Vec<u32> = view.days.iter().filter(|d| d.eligible).map(|d| d.day).collect();
        assert_eq!(eligible, (1..=13).chain([20]).chain(27..=30).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_calendar_marks_colleagues_and_own_leaves() {
        let w = ward(8).await;
        let service = w.services.leaves();
        service.request_leave(w.november, w.bruno, ymd(2024, 11, 28), None).await.unwrap();
        service.request_leave(w.november, w.ana, ymd(2024, 11, 27), None).await.unwrap();

        let view = service.calendar(w.november, w.ana).await.unwrap();
        let day = |n: u32| &view.days[(n - 1) as usize];

        assert!(day(28).occupied);
        assert!(!day(28).own_leave);
        assert!(day(27).own_leave);
        assert!(!day(27).occupied);
        // the window now opens after the 27th
        assert!(view.window.eligible_days_in_month.is_empty());

        // 3 staff, 8 leaves each, 4 Sundays: one leave fills any day
        assert_eq!(day(28).leaves_on_day, 1);
        assert_eq!(day(28).daily_quota, 1);
        assert_eq!(day(28).status, DayStatus::Full);
        assert_eq!(day(3).daily_quota, 1);
        assert_eq!(day(1).status, DayStatus::Open);
    }

    #[tokio::test]
    async fn test_calendar_and_request_agree_between_two_leaves() {
        let w = ward(8).await;
        let service = w.services.leaves();
        w.services.schedule.set_last_leave(w.carla, ymd(2024, 10, 30)).await.unwrap();
        service.request_leave(w.november, w.carla, ymd(2024, 11, 6), None).await.unwrap();
        service.request_leave(w.november, w.carla, ymd(2024, 11, 20), None).await.unwrap();

        let view = service.calendar(w.november, w.carla).await.unwrap();
        let eligible: Vec<u32> = view.days.iter().filter(|d| d.eligible).map(|d| d.day).collect();
        assert_eq!(eligible, vec![13, 27, 28, 29, 30]);

        for day in &view.days {
            let accepted = match service.request_leave(w.november, w.carla, day.date, None).await {
                Ok(outcome) => {
                    service.delete_leave(outcome.leave.id).await.unwrap();
                    true
                }
                Err(_) => false,
            };
            assert_eq!(accepted, day.eligible, "day {}", day.date);
        }
    }

    #[tokio::test]
    async fn test_request_too_close_to_a_later_leave_is_refused() {
        let w = ward(8).await;
        let service = w.services.leaves();
        w.services.schedule.set_last_leave(w.carla, ymd(2024, 10, 30)).await.unwrap();
        let first = service.request_leave(w.november, w.carla, ymd(2024, 11, 6), None).await.unwrap();
        service.request_leave(w.november, w.carla, ymd(2024, 11, 20), None).await.unwrap();

        // the 15th is past the window of the 6th but only 5 days before the 20th
        let err = service.request_leave(w.november, w.carla, ymd(2024, 11, 15), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));

        let err = service.update_leave(first.leave.id, ymd(2024, 11, 15)).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));

        let moved = service.update_leave(first.leave.id, ymd(2024, 11, 13)).await.unwrap();
        assert_eq!(moved.leave.leave_date, ymd(2024, 11, 13));
    }

    #[tokio::test]
    async fn test_calendar_rejects_staff_outside_the_schedule() {
        let w = ward(8).await;
        let department = w.services.schedule.create_department("Pediatrics").await.unwrap();
        let outsider = w.services.schedule.add_staff_member(department, "Davi", Shift::Night).await.unwrap();

        let err = w.services.leaves().calendar(w.november, outsider).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));

        let err = w.services.leaves().calendar(999, w.ana).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "schedule", .. }));
    }

    // ========================================================================
    // Schedule overview
    // ========================================================================

    #[tokio::test]
    async fn test_overview_summarizes_the_schedule() {
        let w = ward(8).await;
        let service = w.services.leaves();

        let before = service.overview(w.november).await.unwrap();
        assert_eq!(before.staff_without_history, vec![w.bruno, w.carla]);
        assert!(before.history_warning.as_deref().unwrap().contains("2024-10-25"));

        service.request_leave(w.november, w.bruno, ymd(2024, 11, 4), None).await.unwrap();
        service.request_leave(w.november, w.ana, ymd(2024, 11, 27), None).await.unwrap();

        let overview = service.overview(w.november).await.unwrap();
        assert_eq!(overview.department_name, "Emergency");
        assert_eq!(overview.shift, Shift::Morning);
        assert_eq!(overview.staff_without_history, vec![w.carla]);

        let names: Vec<&str> = overview.staff.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);

        let ana = &overview.staff[0];
        assert_eq!(ana.last_leave, Some(ymd(2024, 11, 27)));
        assert_eq!(ana.next_available, Some(ymd(2024, 12, 4)));
        assert_eq!((ana.leaves_taken, ana.leaves_remaining), (1, 7));
        assert!(ana.has_valid_history);
        assert!(!ana.has_sunday_leave);

        assert_eq!(overview.staff[1].next_available, Some(ymd(2024, 11, 11)));
        assert_eq!(overview.staff[2].next_available, None);

        let summary = &overview.summary;
        assert_eq!(summary.total_staff, 3);
        assert_eq!(summary.leaves_taken, 2);
        assert_eq!(summary.leaves_remaining, 22);
        assert_eq!(summary.percent_allocated, 8);
        assert_eq!((summary.open_days, summary.near_limit_days, summary.full_days), (28, 0, 2));
    }

    #[tokio::test]
    async fn test_overview_of_a_missing_schedule() {
        let w = ward(8).await;
        let err = w.services.leaves().overview(999).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "schedule", .. }));

        let departments = w.services.schedule.list_departments().await.unwrap();
        assert_eq!(departments.len(), 1);
        assert_eq!(w.services.schedule.find_department(departments[0].id).await.unwrap(), Some(departments[0].clone()));
    }

    // ========================================================================
    // Request leave
    // ========================================================================

    #[tokio::test]
    async fn test_request_before_window_is_rejected_with_minimum_date() {
        let w = ward(8).await;
        let err = w.services.leaves().request_leave(w.november, w.ana, ymd(2024, 11, 25), None).await.unwrap_err();

        match err {
            StoreError::Rejected(result) => {
                assert_eq!(result.reason_code, ReasonCode::BeforeWindow);
                assert_eq!(result.minimum_permitted_date, Some(ymd(2024, 11, 27)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(w.services.leave.list_for_schedule(w.november).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_on_a_colleagues_day_is_occupied() {
        let w = ward(8).await;
        let service = w.services.leaves();
        service.request_leave(w.november, w.bruno, ymd(2024, 11, 28), None).await.unwrap();

        let err = service.request_leave(w.november, w.ana, ymd(2024, 11, 28), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(r) if r.reason_code == ReasonCode::DateOccupied));
    }

    #[tokio::test]
    async fn test_accepted_request_is_stored_with_alerts() {
        let w = ward(8).await;
        let outcome = w
            .services
            .leaves()
            .request_leave(w.november, w.ana, ymd(2024, 11, 27), Some("family".to_string()))
            .await
            .unwrap();

        assert!(outcome.validation.is_valid());
        assert_eq!(outcome.leave.leave_date, ymd(2024, 11, 27));
        assert_eq!(outcome.leave.status, LeaveStatus::Pending);
        assert_eq!(outcome.leave.justification.as_deref(), Some("family"));

        // no Sunday yet, 1 of 3 staff away keeps coverage above 60%
        let kinds: Vec<AlertKind> = outcome.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::MissingSunday]);
    }

    #[tokio::test]
    async fn test_low_coverage_raises_an_imbalance_alert() {
        let w = ward(8).await;
        let repo = &w.services.schedule;
        let department = repo.create_department("Night ward").await.unwrap();
        let elisa = repo.add_staff_member(department, "Elisa", Shift::Night).await.unwrap();
        repo.add_staff_member(department, "Fabio", Shift::Night).await.unwrap();
        let night = repo
            .create_schedule(&NewSchedule {
                department_id: department,
                shift: Shift::Night,
                month: 11,
                year: 2024,
                leaves_allowed: 8,
                max_consecutive_working_days: 6,
            })
            .await
            .unwrap();

        // 2024-11-03 is a Sunday; one of two away leaves 50% coverage
        let outcome = w.services.leaves().request_leave(night, elisa, ymd(2024, 11, 3), None).await.unwrap();
        let kinds: Vec<AlertKind> = outcome.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::ShiftImbalance]);
    }

    #[tokio::test]
    async fn test_leave_limit_is_enforced() {
        let w = ward(1).await;
        let service = w.services.leaves();
        service.request_leave(w.november, w.bruno, ymd(2024, 11, 2), None).await.unwrap();

        let err = service.request_leave(w.november, w.bruno, ymd(2024, 11, 20), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));
    }

    #[tokio::test]
    async fn test_same_day_twice_is_refused() {
        let w = ward(8).await;
        let service = w.services.leaves();
        service.request_leave(w.november, w.bruno, ymd(2024, 11, 2), None).await.unwrap();

        let err = service.request_leave(w.november, w.bruno, ymd(2024, 11, 2), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));
    }

    // ========================================================================
    // Update / delete
    // ========================================================================

    #[tokio::test]
    async fn test_update_and_delete_pending_leave() {
        let w = ward(8).await;
        let service = w.services.leaves();
        let outcome = service.request_leave(w.november, w.ana, ymd(2024, 11, 27), None).await.unwrap();
        let id = outcome.leave.id;

        let moved = service.update_leave(id, ymd(2024, 11, 29)).await.unwrap();
        assert_eq!(moved.leave.leave_date, ymd(2024, 11, 29));

        let err = service.update_leave(id, ymd(2024, 11, 25)).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(r) if r.reason_code == ReasonCode::BeforeWindow));

        let removed = service.delete_leave(id).await.unwrap();
        assert_eq!(removed.leave_date, ymd(2024, 11, 29));
        assert!(w.services.leave.find(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_approved_leave_cannot_be_moved() {
        let w = ward(8).await;
        let service = w.services.leaves();
        let outcome = service.request_leave(w.november, w.bruno, ymd(2024, 11, 4), None).await.unwrap();
        service.approve_leave(outcome.leave.id).await.unwrap();

        let err = service.update_leave(outcome.leave.id, ymd(2024, 11, 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));
        let err = service.delete_leave(outcome.leave.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));
    }

    // ========================================================================
    // History / upcoming
    // ========================================================================

    #[tokio::test]
    async fn test_register_last_leave_checks_the_schedule() {
        let w = ward(8).await;
        let service = w.services.leaves();
        let today = ymd(2024, 11, 30);

        // December needs a last leave on or after 2024-11-24
        let err = service.register_last_leave(w.bruno, ymd(2024, 11, 20), Some(w.december), today).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));

        let registration = service
            .register_last_leave(w.bruno, ymd(2024, 11, 25), Some(w.december), today)
            .await
            .unwrap();
        let check = registration.check.unwrap();
        assert!(check.valid);
        assert_eq!(check.minimum_permitted_date, ymd(2024, 11, 24));

        let bruno = w.services.schedule.find_staff(w.bruno).await.unwrap().unwrap();
        assert_eq!(bruno.last_leave, Some(ymd(2024, 11, 25)));
    }

    #[tokio::test]
    async fn test_register_last_leave_in_the_future_is_invalid_history() {
        let w = ward(8).await;
        let err = w
            .services
            .leaves()
            .register_last_leave(w.carla, ymd(2024, 12, 2), None, ymd(2024, 11, 30))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Eligibility(EligibilityError::InvalidHistory { .. })));
    }

    #[tokio::test]
    async fn test_upcoming_follows_the_latest_leave() {
        let w = ward(8).await;
        let service = w.services.leaves();
        service.request_leave(w.november, w.ana, ymd(2024, 11, 27), None).await.unwrap();

        let upcoming = service.upcoming(w.ana, ymd(2024, 11, 27)).await.unwrap();
        assert_eq!(upcoming.next_available, ymd(2024, 12, 4));
        assert_eq!(upcoming.next_dates.len(), 5);
        assert_eq!(upcoming.days_until_next, 7);

        let err = service.upcoming(w.carla, ymd(2024, 11, 27)).await.unwrap_err();
        assert!(matches!(err, StoreError::Business(_)));
    }
}
