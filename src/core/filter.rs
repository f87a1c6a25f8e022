use super::list::List;
use super::task::Task;

/// Raw selector values reserved for the built-in views. Anything else names a
/// list or a task.
pub const BUILT_IN_TAGS: [&str; 5] = ["inbox", "today", "completed", "calendar", "important"];

/// The active filter, decided once when the user picks it.
///
/// The sidebar hands around a single selector string that doubles as a
/// built-in tag, a list id, or a task id. Resolving it up front into a
/// variant keeps every later consumer (predicate, label, task creation) from
/// re-running the lookup on each render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Inbox,
    Today,
    Completed,
    Calendar,
    Important,
    ByList(String),
    ById(String),
}

impl Filter {
    /// Resolve a raw selector string against the current collections.
    ///
    /// A list-id match takes priority over a task-id match. A string matching
    /// neither still becomes `ByList`, which selects nothing until a list
    /// with that id appears.
    pub fn parse(raw: &str, lists: &[List], tasks: &[Task]) -> Filter {
        match raw {
            "inbox" => Filter::Inbox,
            "today" => Filter::Today,
            "completed" => Filter::Completed,
            "calendar" => Filter::Calendar,
            "important" => Filter::Important,
            other => {
                if lists.iter().any(|list| list.id == other) {
                    Filter::ByList(other.to_string())
                } else if tasks.iter().any(|task| task.id == other) {
                    Filter::ById(other.to_string())
                } else {
                    Filter::ByList(other.to_string())
                }
            }
        }
    }

    /// The list id a task created under this filter should be filed into.
    /// Built-in views imply no list; non-built-in selectors carry theirs.
    pub fn implied_list_id(&self) -> Option<&str> {
        match self {
            Filter::ByList(id) | Filter::ById(id) => Some(id),
            _ => None,
        }
    }

    /// True if this filter currently selects the given list.
    pub fn selects_list(&self, list_id: &str) -> bool {
        matches!(self, Filter::ByList(id) if id == list_id)
    }

    /// Display heading for the view.
    ///
    /// Built-ins have fixed labels. A `ByList` filter resolves the list name,
    /// a `ById` filter the task title. An unresolvable id (e.g. a list
    /// deleted while still selected, or a lists snapshot that has not caught
    /// up with the tasks snapshot yet) falls back to "Lista".
    pub fn label(&self, lists: &[List], tasks: &[Task]) -> String {
        match self {
            Filter::Inbox => "Inbox".to_string(),
            Filter::Today => "Hoje".to_string(),
            Filter::Completed => "Completado".to_string(),
            Filter::Calendar => "Calendário".to_string(),
            Filter::Important => "Importante".to_string(),
            Filter::ByList(id) => lists
                .iter()
                .find(|list| &list.id == id)
                .map(|list| list.name.clone())
                .unwrap_or_else(|| "Lista".to_string()),
            Filter::ById(id) => tasks
                .iter()
                .find(|task| &task.id == id)
                .map(|task| task.title.clone())
                .unwrap_or_else(|| "Lista".to_string()),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Inbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn list(id: &str, name: &str) -> List {
        List {
            id: id.to_string(),
            name: name.to_string(),
            user_id: "u1".to_string(),
            created_at: Utc::now(),
        }
    }

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

    #[test]
    fn built_in_tags_parse_to_their_variants() {
        assert_eq!(Filter::parse("inbox", &[], &[]), Filter::Inbox);
        assert_eq!(Filter::parse("today", &[], &[]), Filter::Today);
        assert_eq!(Filter::parse("completed", &[], &[]), Filter::Completed);
        assert_eq!(Filter::parse("calendar", &[], &[]), Filter::Calendar);
        assert_eq!(Filter::parse("important", &[], &[]), Filter::Important);
    }

    #[test]
    fn list_id_match_wins_over_task_id_match() {
        let lists = vec![list("x1", "Groceries")];
        let tasks = vec![task("x1", "Buy milk")];
        assert_eq!(
            Filter::parse("x1", &lists, &tasks),
            Filter::ByList("x1".to_string())
        );
    }

    #[test]
    fn task_id_parses_when_no_list_matches() {
        let tasks = vec![task("t9", "Buy milk")];
        assert_eq!(
            Filter::parse("t9", &[], &tasks),
            Filter::ById("t9".to_string())
        );
    }

    #[test]
    fn unknown_selector_falls_back_to_by_list() {
        assert_eq!(
            Filter::parse("nowhere", &[], &[]),
            Filter::ByList("nowhere".to_string())
        );
    }

    #[test]
    fn built_in_labels_are_fixed() {
        assert_eq!(Filter::Inbox.label(&[], &[]), "Inbox");
        assert_eq!(Filter::Today.label(&[], &[]), "Hoje");
        assert_eq!(Filter::Completed.label(&[], &[]), "Completado");
        assert_eq!(Filter::Calendar.label(&[], &[]), "Calendário");
        assert_eq!(Filter::Important.label(&[], &[]), "Importante");
    }

    #[test]
    fn custom_list_label_is_the_list_name() {
        let lists = vec![list("L1", "Groceries")];
        let filter = Filter::parse("L1", &lists, &[]);
        assert_eq!(filter.label(&lists, &[]), "Groceries");
    }

    #[test]
    fn task_filter_label_is_the_task_title() {
        let tasks = vec![task("t1", "Buy milk")];
        let filter = Filter::ById("t1".to_string());
        assert_eq!(filter.label(&[], &tasks), "Buy milk");
    }

    #[test]
    fn stale_selection_falls_back_to_generic_label() {
        // A list deleted while still selected must render, not crash.
        let filter = Filter::ByList("gone".to_string());
        assert_eq!(filter.label(&[], &[]), "Lista");
        let filter = Filter::ById("gone".to_string());
        assert_eq!(filter.label(&[], &[]), "Lista");
    }

    #[test]
    fn implied_list_id_only_for_non_built_ins() {
        assert_eq!(Filter::Inbox.implied_list_id(), None);
        assert_eq!(Filter::Calendar.implied_list_id(), None);
        assert_eq!(
            Filter::ByList("L1".to_string()).implied_list_id(),
            Some("L1")
        );
        assert_eq!(Filter::ById("t1".to_string()).implied_list_id(), Some("t1"));
    }
}
