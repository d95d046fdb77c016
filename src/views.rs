use crate::model::{LessonStatus, Occurrence, Session, Weekday};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub upcoming: Vec<Session>,
    pub awaiting_payment: Vec<Occurrence>,
    pub paid_history: Vec<Occurrence>,
    pub total_pending: f64,
    pub total_earned: f64,
    pub total_clients: usize,
}

/// Amounts are summed in whole cents so totals do not depend on the order
/// records arrive in.
fn to_cents(amount: f64) -> i64 {
    if amount.is_finite() {
        (amount * 100.0).round() as i64
    } else {
        0
    }
}

pub fn sum_amounts<'a, I>(records: I) -> f64
where
    I: IntoIterator<Item = &'a Occurrence>,
{
    let cents: i64 = records
        .into_iter()
        .map(|r| to_cents(r.amount))
        .fold(0i64, |acc, c| acc.saturating_add(c));
    cents as f64 / 100.0
}

/// Most advanced state recorded for `session_id` on `date`.
pub fn state_of(history: &[Occurrence], session_id: &str, date: NaiveDate) -> LessonStatus {
    history
        .iter()
        .filter(|h| h.session_id == session_id && h.is_on(date))
        .fold(LessonStatus::Scheduled, |acc, h| match (acc, h.status) {
            (LessonStatus::Paid, _) | (_, LessonStatus::Paid) => LessonStatus::Paid,
            (LessonStatus::TaughtUnpaid, _) | (_, LessonStatus::TaughtUnpaid) => {
                LessonStatus::TaughtUnpaid
            }
            _ => LessonStatus::Scheduled,
        })
}

fn newest_first(a: &Occurrence, b: &Occurrence) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

fn oldest_first(a: &Occurrence, b: &Occurrence) -> Ordering {
    newest_first(b, a)
}

pub fn partition(sessions: &[Session], history: &[Occurrence], today: NaiveDate) -> Partition {
    let today_day = Weekday::from_chrono(today.weekday());
    let processed_today: HashSet<&str> = history
        .iter()
        .filter(|h| h.status != LessonStatus::Scheduled && h.is_on(today))
        .map(|h| h.session_id.as_str())
        .collect();

    let mut upcoming: Vec<Session> = sessions
        .iter()
        .filter(|s| s.day == today_day && !processed_today.contains(s.id.as_str()))
        .cloned()
        .collect();
    upcoming.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut awaiting_payment: Vec<Occurrence> = history
        .iter()
        .filter(|h| h.status == LessonStatus::TaughtUnpaid)
        .cloned()
        .collect();
    awaiting_payment.sort_by(oldest_first);

    let mut paid_history: Vec<Occurrence> = history
        .iter()
        .filter(|h| h.status == LessonStatus::Paid)
        .cloned()
        .collect();
    paid_history.sort_by(newest_first);

    Partition {
        total_pending: sum_amounts(&awaiting_payment),
        total_earned: sum_amounts(&paid_history),
        total_clients: sessions.len(),
        upcoming,
        awaiting_payment,
        paid_history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_amount;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("date")
    }

    fn session(id: &str, day: Weekday, start: &str) -> Session {
        Session {
            id: id.to_string(),
            name: format!("Client {}", id),
            phone: "555".to_string(),
            email: None,
            day,
            start_time: start.parse().expect("start"),
            end_time: "23:00".parse().expect("end"),
            grade: "Grade 9".to_string(),
            payment_amount: 40.0,
            kind: "client".to_string(),
            added_date: None,
        }
    }

    fn occ(
        id: &str,
        session_id: &str,
        date: &str,
        status: LessonStatus,
        amount: f64,
    ) -> Occurrence {
        Occurrence {
            id: id.to_string(),
            session_id: session_id.to_string(),
            client_name: format!("Client {}", session_id),
            amount,
            raw_date: date.to_string(),
            date: crate::calendar::parse_iso_date(date),
            status,
        }
    }

    // 2026-03-11 is a Wednesday.
    fn today() -> NaiveDate {
        d(2026, 3, 11)
    }

    #[test]
    fn upcoming_excludes_sessions_processed_today() {
        let sessions = vec![
            session("late", Weekday::Wednesday, "18:00"),
            session("early", Weekday::Wednesday, "08:30"),
            session("done", Weekday::Wednesday, "10:00"),
            session("tue", Weekday::Tuesday, "10:00"),
        ];
        let history = vec![
            occ("h1", "done", "2026-03-11", LessonStatus::TaughtUnpaid, 40.0),
            occ("h2", "early", "2026-03-04", LessonStatus::Paid, 40.0),
        ];
        let p = partition(&sessions, &history, today());
        let ids: Vec<&str> = p.upcoming.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(p.total_clients, 4);
    }

    #[test]
    fn sunday_today_matches_sunday_sessions() {
        let sessions = vec![session("sun", Weekday::Sunday, "10:00")];
        let p = partition(&sessions, &[], d(2026, 3, 15));
        assert_eq!(p.upcoming.len(), 1);
    }

    #[test]
    fn totals_split_by_status_and_ignore_order() {
        let mut history = vec![
            occ("a", "s1", "2026-03-01", LessonStatus::TaughtUnpaid, 40.0),
            occ("b", "s2", "2026-03-02", LessonStatus::TaughtUnpaid, 0.1),
            occ("c", "s1", "2026-02-01", LessonStatus::Paid, 35.5),
            occ("d", "s3", "2026-02-08", LessonStatus::Paid, 0.2),
        ];
        let p = partition(&[], &history, today());
        assert_eq!(p.total_pending, 40.1);
        assert_eq!(p.total_earned, 35.7);

        history.reverse();
        let q = partition(&[], &history, today());
        assert_eq!(q.total_pending, p.total_pending);
        assert_eq!(q.total_earned, p.total_earned);
    }

    #[test]
    fn malformed_amount_contributes_zero() {
        let bad = parse_amount(Some(&json!("twelve")));
        let history = vec![
            occ("a", "s1", "2026-03-01", LessonStatus::Paid, bad),
            occ("b", "s2", "2026-03-02", LessonStatus::Paid, 25.0),
        ];
        let p = partition(&[], &history, today());
        assert_eq!(p.paid_history.len(), 2);
        assert_eq!(p.total_earned, 25.0);
    }

    #[test]
    fn paid_history_is_newest_first_with_stable_ties() {
        let history = vec![
            occ("z", "s1", "2026-03-01", LessonStatus::Paid, 1.0),
            occ("x", "s2", "not a date", LessonStatus::Paid, 1.0),
            occ("b", "s3", "2026-03-05", LessonStatus::Paid, 1.0),
            occ("a", "s4", "2026-03-01", LessonStatus::Paid, 1.0),
        ];
        let p = partition(&[], &history, today());
        let ids: Vec<&str> = p.paid_history.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "z", "x"]);
    }

    #[test]
    fn marking_paid_never_lowers_earnings() {
        let mut history = vec![
            occ("a", "s1", "2026-03-01", LessonStatus::TaughtUnpaid, 40.0),
            occ("b", "s2", "2026-03-02", LessonStatus::TaughtUnpaid, 30.0),
        ];
        let mut last = partition(&[], &history, today()).total_earned;
        for idx in 0..history.len() {
            history[idx].status = history[idx].status.advance();
            let now = partition(&[], &history, today()).total_earned;
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 70.0);
    }

    #[test]
    fn state_of_reports_most_advanced_record() {
        let history = vec![
            occ("a", "s1", "2026-03-11", LessonStatus::TaughtUnpaid, 1.0),
            occ("b", "s1", "2026-03-11", LessonStatus::Paid, 1.0),
        ];
        assert_eq!(state_of(&history, "s1", today()), LessonStatus::Paid);
        assert_eq!(state_of(&history, "s1", d(2026, 3, 10)), LessonStatus::Scheduled);
        assert_eq!(state_of(&history, "s2", today()), LessonStatus::Scheduled);
    }
}
