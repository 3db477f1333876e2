use tracing::warn;

use crate::model::schedule::{Schedule, ScheduleType};

use super::time_of_day::TimeOfDay;

const MINUTES_PER_HOUR: f64 = 60.0;

/// Derived totals for a completed day, all in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTotals {
    /// Gross elapsed time between effective in and effective out.
    pub time_total: f64,
    /// Net worked time after the lunch deduction.
    pub time_hours_worked: f64,
    pub over_time_total: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeOutResolution {
    pub effective_time_out: TimeOfDay,
    pub totals: DayTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LunchWindowViolation {
    TooEarly,
    TooLate,
}

/// Effective clock-in for a raw event. FIXED schedules do not credit early
/// arrival: the event is clamped forward to the scheduled start.
pub fn effective_time_in(raw: TimeOfDay, schedule: &Schedule) -> TimeOfDay {
    let start = TimeOfDay::from(schedule.start_time);
    if schedule.schedule_type.is_fixed() && raw < start {
        start
    } else {
        raw
    }
}

/// FIXED schedules only accept lunch-in inside the configured window.
/// Flexible schedules take lunch whenever.
pub fn check_lunch_window(
    raw: TimeOfDay,
    schedule: &Schedule,
) -> Result<(), LunchWindowViolation> {
    if !schedule.schedule_type.is_fixed() {
        return Ok(());
    }

    if raw < TimeOfDay::from(schedule.lunch_start_time) {
        Err(LunchWindowViolation::TooEarly)
    } else if raw > TimeOfDay::from(schedule.lunch_end_time) {
        Err(LunchWindowViolation::TooLate)
    } else {
        Ok(())
    }
}

/// Effective lunch-out. On FIXED schedules break time past the scheduled
/// lunch end is capped, not penalized.
pub fn clamp_lunch_out(raw: TimeOfDay, schedule: &Schedule) -> TimeOfDay {
    let lunch_end = TimeOfDay::from(schedule.lunch_end_time);
    if schedule.schedule_type.is_fixed() && raw > lunch_end {
        lunch_end
    } else {
        raw
    }
}

/// Lunch duration in hours between lunch-in and the (possibly clamped)
/// lunch-out.
pub fn lunch_hours(lunch_in: TimeOfDay, lunch_out: TimeOfDay) -> f64 {
    non_negative_hours(lunch_out.minutes_since(lunch_in), "lunch duration")
}

/// Resolve a raw clock-out against the schedule and produce the day's
/// totals.
///
/// FIXED: past the scheduled end, the excess is overtime when
/// `allowed_overtime` is set, otherwise the clock-out is clamped back to
/// the scheduled end and the excess is neither paid nor recorded.
/// FLEXI/SUPER_FLEXI: anything past the nominal end is overtime, never
/// clamped.
pub fn resolve_time_out(
    time_in: TimeOfDay,
    raw_time_out: TimeOfDay,
    lunch_total_hours: f64,
    schedule: &Schedule,
) -> TimeOutResolution {
    let scheduled_end = TimeOfDay::from(schedule.end_time);
    let mut effective_time_out = raw_time_out;
    let mut over_time_total = 0.0;

    if raw_time_out > scheduled_end {
        match schedule.schedule_type {
            ScheduleType::Fixed if schedule.allowed_overtime => {
                over_time_total = raw_time_out.minutes_since(scheduled_end) as f64 / MINUTES_PER_HOUR;
            }
            ScheduleType::Fixed => {
                effective_time_out = scheduled_end;
            }
            ScheduleType::Flexi | ScheduleType::SuperFlexi => {
                over_time_total = raw_time_out.minutes_since(scheduled_end) as f64 / MINUTES_PER_HOUR;
            }
        }
    }

    let time_total = non_negative_hours(
        effective_time_out.minutes_since(time_in),
        "gross worked duration",
    );

    let mut time_hours_worked = time_total - lunch_total_hours;
    if time_hours_worked < 0.0 {
        warn!(
            time_total,
            lunch_total_hours, "negative net worked duration clamped to zero"
        );
        time_hours_worked = 0.0;
    }

    TimeOutResolution {
        effective_time_out,
        totals: DayTotals {
            time_total,
            time_hours_worked,
            over_time_total,
        },
    }
}

/// Durations are non-negative by contract; a negative delta means the pair
/// of events is inconsistent after clamping, so it is flattened to zero
/// rather than propagated.
fn non_negative_hours(minutes: i64, what: &str) -> f64 {
    if minutes < 0 {
        warn!(minutes, what, "negative duration clamped to zero");
        0.0
    } else {
        minutes as f64 / MINUTES_PER_HOUR
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn nt(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    /// 09:00-17:00, lunch 12:00-13:00.
    fn schedule(schedule_type: ScheduleType, allowed_overtime: bool) -> Schedule {
        Schedule {
            id: 1,
            schedule_type,
            start_time: nt(9, 0),
            end_time: nt(17, 0),
            lunch_start_time: nt(12, 0),
            lunch_end_time: nt(13, 0),
            limit_work_hours_day: None,
            allowed_overtime,
        }
    }

    #[test]
    fn fixed_early_arrival_is_clamped_to_scheduled_start() {
        let s = schedule(ScheduleType::Fixed, false);
        assert_eq!(effective_time_in(t(8, 45), &s), t(9, 0));
        assert_eq!(effective_time_in(t(9, 10), &s), t(9, 10));
    }

    #[test]
    fn flexi_arrival_is_taken_verbatim() {
        let s = schedule(ScheduleType::Flexi, false);
        assert_eq!(effective_time_in(t(7, 30), &s), t(7, 30));
    }

    #[test]
    fn fixed_lunch_window_rejects_outside_bounds() {
        let s = schedule(ScheduleType::Fixed, false);
        assert_eq!(
            check_lunch_window(t(11, 0), &s),
            Err(LunchWindowViolation::TooEarly)
        );
        assert_eq!(
            check_lunch_window(t(13, 1), &s),
            Err(LunchWindowViolation::TooLate)
        );
        assert_eq!(check_lunch_window(t(12, 10), &s), Ok(()));
        assert_eq!(check_lunch_window(t(13, 0), &s), Ok(()));
    }

    #[test]
    fn flexi_lunch_window_is_unrestricted() {
        let s = schedule(ScheduleType::SuperFlexi, false);
        assert_eq!(check_lunch_window(t(9, 30), &s), Ok(()));
    }

    #[test]
    fn fixed_lunch_out_is_capped_at_scheduled_lunch_end() {
        let s = schedule(ScheduleType::Fixed, false);
        assert_eq!(clamp_lunch_out(t(13, 20), &s), t(13, 0));
        assert_eq!(clamp_lunch_out(t(12, 50), &s), t(12, 50));
        assert_eq!(lunch_hours(t(12, 0), clamp_lunch_out(t(13, 20), &s)), 1.0);
    }

    #[test]
    fn fixed_without_overtime_clamps_and_records_none() {
        let s = schedule(ScheduleType::Fixed, false);
        let resolved = resolve_time_out(t(9, 0), t(17, 30), 1.0, &s);

        assert_eq!(resolved.effective_time_out, t(17, 0));
        assert_eq!(resolved.totals.over_time_total, 0.0);
        assert_eq!(resolved.totals.time_total, 8.0);
        assert_eq!(resolved.totals.time_hours_worked, 7.0);
    }

    #[test]
    fn fixed_with_overtime_keeps_raw_out_and_records_excess() {
        let s = schedule(ScheduleType::Fixed, true);
        let resolved = resolve_time_out(t(9, 0), t(18, 0), 1.0, &s);

        assert_eq!(resolved.effective_time_out, t(18, 0));
        assert_eq!(resolved.totals.over_time_total, 1.0);
        assert_eq!(resolved.totals.time_total, 9.0);
        assert_eq!(resolved.totals.time_hours_worked, 8.0);
    }

    #[test]
    fn flexi_accrues_overtime_regardless_of_flag() {
        let s = schedule(ScheduleType::Flexi, false);
        let resolved = resolve_time_out(t(10, 0), t(18, 30), 0.5, &s);

        assert_eq!(resolved.effective_time_out, t(18, 30));
        assert_eq!(resolved.totals.over_time_total, 1.5);
        assert_eq!(resolved.totals.time_total, 8.5);
        assert_eq!(resolved.totals.time_hours_worked, 8.0);
    }

    #[test]
    fn early_departure_accrues_no_overtime() {
        let s = schedule(ScheduleType::Fixed, true);
        let resolved = resolve_time_out(t(9, 0), t(16, 0), 1.0, &s);

        assert_eq!(resolved.effective_time_out, t(16, 0));
        assert_eq!(resolved.totals.over_time_total, 0.0);
        assert_eq!(resolved.totals.time_total, 7.0);
        assert_eq!(resolved.totals.time_hours_worked, 6.0);
    }

    #[test]
    fn worked_plus_lunch_equals_total() {
        let s = schedule(ScheduleType::Fixed, true);
        let lunch = lunch_hours(t(12, 10), t(12, 55));
        let resolved = resolve_time_out(t(9, 0), t(17, 45), lunch, &s);

        let round_trip = resolved.totals.time_hours_worked + lunch;
        assert!((round_trip - resolved.totals.time_total).abs() < 1e-9);
    }

    #[test]
    fn inconsistent_pairs_flatten_to_zero() {
        let s = schedule(ScheduleType::Fixed, false);
        // Out before in after clamping.
        let resolved = resolve_time_out(t(18, 0), t(17, 30), 0.0, &s);
        assert_eq!(resolved.totals.time_total, 0.0);
        assert_eq!(resolved.totals.time_hours_worked, 0.0);

        // Lunch longer than the gross duration.
        let resolved = resolve_time_out(t(16, 0), t(16, 30), 2.0, &s);
        assert_eq!(resolved.totals.time_hours_worked, 0.0);

        assert_eq!(lunch_hours(t(13, 0), t(12, 0)), 0.0);
    }
}
