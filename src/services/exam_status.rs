//! Derived per-student exam status. Pure time arithmetic over the exam's
//! schedule plus the student's completion state; nothing here is persisted.

use chrono::{DateTime, Duration, Utc};

use crate::models::exam::{Exam, ExamStatus, UserExamStatus};
use crate::utils::time::combine_date_time;

/// Effective start instant: startDate combined with the optional "HH:MM"
/// startTime.
pub fn exam_start(exam: &Exam) -> Option<DateTime<Utc>> {
    combine_date_time(exam.start_date, exam.start_time.as_deref())
}

/// Effective end instant: explicit endDate/endTime, falling back to
/// start + duration minutes when no explicit end is authored.
pub fn exam_end(exam: &Exam) -> Option<DateTime<Utc>> {
    if let Some(end) = combine_date_time(exam.end_date, exam.end_time.as_deref()) {
        return Some(end);
    }
    if exam.duration > 0 {
        if let Some(start) = exam_start(exam) {
            return Some(start + Duration::minutes(exam.duration));
        }
    }
    None
}

/// Classify an exam for one student at one instant.
///
/// Completion always wins: a student who already submitted sees `previous`
/// even while the window is technically still open, so late or early
/// submissions are never re-flagged as live.
pub fn derive_user_status(exam: &Exam, now: DateTime<Utc>, completed: bool) -> UserExamStatus {
    if completed {
        return UserExamStatus::Previous;
    }

    let start = exam_start(exam);
    let end = exam_end(exam);

    if let Some(start) = start {
        if now < start {
            return UserExamStatus::Upcoming;
        }
    }

    let in_window = match (start, end) {
        (Some(start), Some(end)) => now >= start && now <= end,
        (Some(start), None) => now >= start,
        _ => false,
    };
    if in_window || (start.is_none() && end.is_none() && exam.status == ExamStatus::Live) {
        return UserExamStatus::Live;
    }

    if let Some(end) = end {
        if now > end {
            return UserExamStatus::Previous;
        }
    }

    UserExamStatus::Upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn exam_at(start_date: Option<DateTime<Utc>>, start_time: Option<&str>) -> Exam {
        let mut exam = Exam::new("Status test".to_string(), 60, 100.0, Utc::now());
        exam.start_date = start_date;
        exam.start_time = start_time.map(str::to_string);
        exam
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn future_start_is_upcoming() {
        let exam = exam_at(Some(day(12)), None);
        let now = day(11);
        assert_eq!(derive_user_status(&exam, now, false), UserExamStatus::Upcoming);
    }

    #[test]
    fn completion_wins_over_any_schedule() {
        let exam = exam_at(Some(day(12)), None);
        let now = day(11);
        assert_eq!(derive_user_status(&exam, now, true), UserExamStatus::Previous);

        // even inside an open window
        let exam = exam_at(Some(day(10)), None);
        let now = day(10) + Duration::minutes(30);
        assert_eq!(derive_user_status(&exam, now, true), UserExamStatus::Previous);
    }

    #[test]
    fn end_derives_from_start_plus_duration() {
        let exam = exam_at(Some(day(10)), Some("09:00"));
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        assert_eq!(exam_start(&exam), Some(start));
        assert_eq!(exam_end(&exam), Some(start + Duration::minutes(60)));

        // live inside the derived window
        let now = start + Duration::minutes(30);
        assert_eq!(derive_user_status(&exam, now, false), UserExamStatus::Live);

        // previous once the derived end passes
        let now = start + Duration::minutes(61);
        assert_eq!(derive_user_status(&exam, now, false), UserExamStatus::Previous);
    }

    #[test]
    fn explicit_end_beats_derived_end() {
        let mut exam = exam_at(Some(day(10)), Some("09:00"));
        exam.end_date = Some(day(10));
        exam.end_time = Some("11:00".to_string());
        let end = Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap();
        assert_eq!(exam_end(&exam), Some(end));
    }

    #[test]
    fn no_schedule_follows_authored_status() {
        let mut exam = exam_at(None, None);
        let now = day(10);
        assert_eq!(derive_user_status(&exam, now, false), UserExamStatus::Upcoming);

        exam.status = ExamStatus::Live;
        assert_eq!(derive_user_status(&exam, now, false), UserExamStatus::Live);
    }

    #[test]
    fn boundary_instants_count_as_live() {
        let exam = exam_at(Some(day(10)), Some("09:00"));
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        assert_eq!(derive_user_status(&exam, start, false), UserExamStatus::Live);
        let end = start + Duration::minutes(60);
        assert_eq!(derive_user_status(&exam, end, false), UserExamStatus::Live);
    }
}
