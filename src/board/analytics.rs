//! Month-over-month task counters.
//!
//! Only tasks created inside a window count toward it. The current window is
//! the calendar month containing `now` (UTC); the previous window is the
//! month before it. Every `*_difference` is current minus previous.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use super::models::{Analytics, Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    total: i64,
    assigned: i64,
    completed: i64,
    incomplete: i64,
    overdue: i64,
}

/// `(year, month)` moved by `delta` months.
fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn start_of_month(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn month_window(now: DateTime<Utc>, delta: i32) -> Window {
    let (year, month) = shift_month(now.year(), now.month(), delta);
    let (next_year, next_month) = shift_month(year, month, 1);
    Window {
        start: start_of_month(year, month),
        end: start_of_month(next_year, next_month),
    }
}

fn count(tasks: &[Task], window: Window, member_id: Option<i64>, now: DateTime<Utc>) -> Counts {
    let mut counts = Counts::default();
    for task in tasks.iter().filter(|t| window.contains(t.created_at)) {
        counts.total += 1;
        if member_id.is_some() && task.assignee_id == member_id {
            counts.assigned += 1;
        }
        if task.status == TaskStatus::Done {
            counts.completed += 1;
        } else {
            counts.incomplete += 1;
            if task.due_date < now {
                counts.overdue += 1;
            }
        }
    }
    counts
}

/// Analytics over `tasks` (one workspace or project) for the requesting
/// member.
pub fn compute(tasks: &[Task], member_id: Option<i64>, now: DateTime<Utc>) -> Analytics {
    let this_month = count(tasks, month_window(now, 0), member_id, now);
    let last_month = count(tasks, month_window(now, -1), member_id, now);

    Analytics {
        task_count: this_month.total,
        task_difference: this_month.total - last_month.total,
        assigned_task_count: this_month.assigned,
        assigned_task_difference: this_month.assigned - last_month.assigned,
        completed_task_count: this_month.completed,
        completed_task_difference: this_month.completed - last_month.completed,
        incomplete_task_count: this_month.incomplete,
        incomplete_task_difference: this_month.incomplete - last_month.incomplete,
        overdue_task_count: this_month.overdue,
        overdue_task_difference: this_month.overdue - last_month.overdue,
    }
}
