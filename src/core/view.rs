use chrono::NaiveDate;

use super::filter::Filter;
use super::task::Task;

/// Derive the task set for a view from the full per-user collection.
///
/// The search narrowing applies before every filter branch; an empty or
/// whitespace-only query is a no-op. `today` is the local calendar day,
/// injected so day-boundary behavior is testable.
pub fn filter_tasks(tasks: &[Task], filter: &Filter, search: &str, today: NaiveDate) -> Vec<Task> {
    let query = search.trim();
    let narrowed = tasks
        .iter()
        .filter(|task| query.is_empty() || task.title_matches(query));

    match filter {
        Filter::Today => narrowed.filter(|t| t.occurs_on(today)).cloned().collect(),
        Filter::Completed => narrowed.filter(|t| t.completed).cloned().collect(),
        Filter::Important => narrowed.filter(|t| t.important).cloned().collect(),
        Filter::Inbox => narrowed.filter(|t| t.in_inbox()).cloned().collect(),
        // There is no dedicated calendar predicate; the view matches the
        // literal list id, which no real list uses, so it stays empty.
        Filter::Calendar => narrowed
            .filter(|t| t.list_id.as_deref() == Some("calendar"))
            .cloned()
            .collect(),
        Filter::ByList(id) => narrowed
            .filter(|t| t.list_id.as_deref() == Some(id.as_str()))
            .cloned()
            .collect(),
        Filter::ById(id) => narrowed.filter(|t| &t.id == id).cloned().collect(),
    }
}

/// Display ordering: incomplete tasks first, then newest creation first
/// within each group.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then(b.created_at.cmp(&a.created_at))
    });
}

/// Filter and order in one step; what the view actually renders.
pub fn visible_tasks(tasks: &[Task], filter: &Filter, search: &str, today: NaiveDate) -> Vec<Task> {
    let mut visible = filter_tasks(tasks, filter, search, today);
    sort_tasks(&mut visible);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Local, Utc};

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            completed: false,
            created_at: Utc::now(),
            user_id: "u1".to_string(),
            due_date: None,
            list_id: None,
            important: false,
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn last_week() -> DateTime<Utc> {
        Utc::now() - Duration::days(7)
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn completed_filter_keeps_exactly_the_completed() {
        let mut done = task("1", "Pay rent");
        done.completed = true;
        let tasks = vec![done, task("2", "Buy milk")];

        let result = filter_tasks(&tasks, &Filter::Completed, "", today());
        assert_eq!(ids(&result), ["1"]);
    }

    #[test]
    fn important_filter_keeps_exactly_the_flagged() {
        let mut starred = task("1", "Call mom");
        starred.important = true;
        let tasks = vec![starred, task("2", "Buy milk")];

        let result = filter_tasks(&tasks, &Filter::Important, "", today());
        assert_eq!(ids(&result), ["1"]);
    }

    #[test]
    fn inbox_keeps_unlisted_incomplete_tasks_only() {
        let mut done = task("2", "Pay rent");
        done.completed = true;
        let mut listed = task("3", "Buy flour");
        listed.list_id = Some("groceries".to_string());
        let tasks = vec![task("1", "Buy milk"), done, listed];

        let result = filter_tasks(&tasks, &Filter::Inbox, "", today());
        assert_eq!(ids(&result), ["1"]);
    }

    #[test]
    fn today_is_union_of_created_today_and_due_today() {
        let created_today = task("1", "Fresh");

        let mut due_today = task("2", "Old but due");
        due_today.created_at = last_week();
        due_today.due_date = Some(Utc::now());

        let mut stale = task("3", "Old");
        stale.created_at = last_week();

        let tasks = vec![created_today, due_today, stale];
        let mut result = filter_tasks(&tasks, &Filter::Today, "", today());
        result.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(ids(&result), ["1", "2"]);
    }

    #[test]
    fn today_includes_completed_tasks() {
        // Unlike inbox, the today view does not hide completed tasks.
        let mut done_today = task("1", "Done already");
        done_today.completed = true;

        let result = filter_tasks(&[done_today], &Filter::Today, "", today());
        assert_eq!(ids(&result), ["1"]);
    }

    #[test]
    fn by_list_matches_membership() {
        let mut listed = task("1", "Buy flour");
        listed.list_id = Some("groceries".to_string());
        let tasks = vec![listed, task("2", "Buy milk")];

        let filter = Filter::ByList("groceries".to_string());
        let result = filter_tasks(&tasks, &filter, "", today());
        assert_eq!(ids(&result), ["1"]);
    }

    #[test]
    fn by_id_keeps_the_single_task() {
        let tasks = vec![task("1", "Buy milk"), task("2", "Pay rent")];
        let filter = Filter::ById("2".to_string());
        let result = filter_tasks(&tasks, &filter, "", today());
        assert_eq!(ids(&result), ["2"]);
    }

    #[test]
    fn unknown_list_selector_yields_empty_view() {
        let tasks = vec![task("1", "Buy milk")];
        let filter = Filter::ByList("no-such-list".to_string());
        assert!(filter_tasks(&tasks, &filter, "", today()).is_empty());
    }

    #[test]
    fn search_narrows_before_any_branch() {
        let mut done_milk = task("1", "Buy milk");
        done_milk.completed = true;
        let mut done_rent = task("2", "Pay rent");
        done_rent.completed = true;
        let tasks = vec![done_milk, done_rent, task("3", "Buy bread")];

        let result = filter_tasks(&tasks, &Filter::Completed, "buy", today());
        assert_eq!(ids(&result), ["1"]);
    }

    #[test]
    fn blank_search_is_a_no_op() {
        let tasks = vec![task("1", "Buy milk")];
        let all = filter_tasks(&tasks, &Filter::Inbox, "", today());
        let blank = filter_tasks(&tasks, &Filter::Inbox, "   ", today());
        assert_eq!(all, blank);
    }

    #[test]
    fn search_is_idempotent() {
        let tasks = vec![task("1", "Buy milk"), task("2", "Pay rent")];
        let once = filter_tasks(&tasks, &Filter::Inbox, "milk", today());
        let twice = filter_tasks(&once, &Filter::Inbox, "milk", today());
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_puts_incomplete_first_then_newest_first() {
        let mut old_done = task("old-done", "a");
        old_done.completed = true;
        old_done.created_at = last_week();
        let mut new_done = task("new-done", "b");
        new_done.completed = true;
        let mut old_open = task("old-open", "c");
        old_open.created_at = last_week();
        let new_open = task("new-open", "d");

        let mut tasks = vec![old_done, new_done, old_open, new_open];
        sort_tasks(&mut tasks);
        assert_eq!(ids(&tasks), ["new-open", "old-open", "new-done", "old-done"]);
    }

    #[test]
    fn sorted_sequence_satisfies_the_ordering_postcondition() {
        let mut tasks = Vec::new();
        for i in 0..8 {
            let mut t = task(&format!("t{i}"), "x");
            t.completed = i % 3 == 0;
            t.created_at = Utc::now() - Duration::hours(i);
            tasks.push(t);
        }
        sort_tasks(&mut tasks);

        for pair in tasks.windows(2) {
            assert!(!pair[0].completed || pair[1].completed);
            if pair[0].completed == pair[1].completed {
                assert!(pair[0].created_at >= pair[1].created_at);
            }
        }
    }

    #[test]
    fn inbox_scenario_from_two_task_collection() {
        let mut rent = task("2", "Pay rent");
        rent.completed = true;
        let tasks = vec![task("1", "Buy milk"), rent];

        let result = visible_tasks(&tasks, &Filter::Inbox, "", today());
        assert_eq!(ids(&result), ["1"]);
    }
}
