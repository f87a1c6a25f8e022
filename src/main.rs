use std::time::Duration;

use chrono::Local;

use taskmaster::auth::{AuthClient, Session};
use taskmaster::config::TaskmasterConfig;
use taskmaster::core::filter::Filter;
use taskmaster::core::task::Task;
use taskmaster::ops::{self, LoadingHandle};
use taskmaster::store::rest::RestStore;
use taskmaster::store::DocumentStore;
use taskmaster::view::ViewModel;

// Set up logging to the systemd user journal (`journalctl --user -t taskmaster -f`).
// Wrapper filters: taskmaster crate at info/debug (per config), everything else at warn.
fn setup_logging(config: &TaskmasterConfig) {
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("taskmaster") {
                let max = if taskmaster::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    taskmaster::set_debug_logging(config.debug_logging);

    if let Ok(journal) = systemd_journal_logger::JournalLog::new() {
        let journal = journal.with_syslog_identifier("taskmaster".to_string());
        if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
            // Global max must be Debug so debug logs can pass through when toggled
            log::set_max_level(log::LevelFilter::Debug);
        }
    }
}

fn print_usage() {
    eprintln!("usage: taskmaster [command]");
    eprintln!();
    eprintln!("  view [selector] [--search <q>]   show a view (default: inbox)");
    eprintln!("  watch [selector]                 follow a view live");
    eprintln!("  add <title> [--filter <sel>]     create a task under a filter");
    eprintln!("  toggle <task-id>                 flip a task's completion");
    eprintln!("  rm <task-id>                     delete a task");
    eprintln!("  lists                            show your lists");
    eprintln!("  newlist <name>                   create a list");
    eprintln!("  rmlist <list-id>                 delete a list and its tasks");
    eprintln!("  register                         create an account and sign in");
    eprintln!();
    eprintln!("credentials come from TASKMASTER_EMAIL and TASKMASTER_PASSWORD");
}

fn print_tasks(heading: &str, tasks: &[Task]) {
    println!("{}", heading);
    println!(
        "{} {}",
        tasks.len(),
        if tasks.len() == 1 { "tarefa" } else { "tarefas" }
    );
    if tasks.is_empty() {
        println!("Nenhuma tarefa encontrada.");
        return;
    }
    for task in tasks {
        let star = if task.important { " *" } else { "" };
        let due = task
            .due_date
            .map(|d| format!("  (vence {})", d.with_timezone(&Local).date_naive()))
            .unwrap_or_default();
        println!(
            "[{}] {}{}{}  {}",
            if task.completed { "x" } else { " " },
            task.title,
            star,
            due,
            task.id
        );
    }
}

/// One positional value following the command, skipping `--flag value` pairs.
fn positional(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            return Some(arg.as_str());
        }
    }
    None
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

async fn resolve_filter(store: &RestStore, session: &Session, raw: &str) -> Result<Filter, String> {
    let (tasks, lists) = futures::try_join!(
        store.tasks_for_user(&session.user_id),
        store.lists_for_user(&session.user_id),
    )
    .map_err(|e| e.to_string())?;
    Ok(Filter::parse(raw, &lists, &tasks))
}

async fn show_view(
    store: &RestStore,
    session: &Session,
    selector: &str,
    search: &str,
) -> Result<(), String> {
    let (tasks, lists) = futures::try_join!(
        store.tasks_for_user(&session.user_id),
        store.lists_for_user(&session.user_id),
    )
    .map_err(|e| e.to_string())?;

    let filter = Filter::parse(selector, &lists, &tasks);
    let visible = taskmaster::core::view::visible_tasks(
        &tasks,
        &filter,
        search,
        Local::now().date_naive(),
    );
    print_tasks(&filter.label(&lists, &tasks), &visible);
    Ok(())
}

async fn watch_view(store: &RestStore, session: &Session, selector: &str) -> Result<(), String> {
    let mut vm = ViewModel::new(
        store.watch_tasks(&session.user_id),
        store.watch_lists(&session.user_id),
    );
    vm.select_filter(selector);
    loop {
        print_tasks(&vm.heading(), &vm.visible(Local::now().date_naive()));
        println!("---");
        if !vm.changed().await {
            return Ok(());
        }
        // Re-resolve in case the selector's list or task just appeared.
        vm.select_filter(selector);
    }
}

async fn run(args: Vec<String>) -> Result<(), String> {
    let config = TaskmasterConfig::load();
    setup_logging(&config);

    if config.database_url.is_empty() {
        return Err(format!(
            "no database_url configured; edit {}",
            TaskmasterConfig::path().display()
        ));
    }

    let command = args.first().map(String::as_str).unwrap_or("view");
    let rest = if args.is_empty() { &args[..] } else { &args[1..] };

    if command == "help" || command == "--help" {
        print_usage();
        return Ok(());
    }

    let email = std::env::var("TASKMASTER_EMAIL").unwrap_or_default();
    let password = std::env::var("TASKMASTER_PASSWORD").unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err("TASKMASTER_EMAIL and TASKMASTER_PASSWORD must be set".to_string());
    }

    let auth = AuthClient::new(&config.auth_url, &config.api_key).map_err(|e| e.to_string())?;
    let loading = LoadingHandle::new();
    let session = if command == "register" {
        let session = auth.sign_up(&email, &password).await.map_err(|e| e.to_string())?;
        println!("conta criada: {}", session.email);
        session
    } else {
        auth.sign_in(&email, &password).await.map_err(|e| e.to_string())?
    };

    let store = RestStore::new(&config.database_url, Some(session.id_token.clone()))
        .map_err(|e| e.to_string())?
        .with_poll_interval(Duration::from_secs(config.poll_interval_secs.max(1)));

    match command {
        "view" | "register" => {
            let selector = positional(rest).unwrap_or("inbox");
            let search = flag_value(rest, "--search").unwrap_or("");
            show_view(&store, &session, selector, search).await?;
        }
        "watch" => {
            let selector = positional(rest).unwrap_or("inbox");
            watch_view(&store, &session, selector).await?;
        }
        "add" => {
            let title = positional(rest).ok_or("add: missing title")?;
            let raw = flag_value(rest, "--filter").unwrap_or("inbox");
            let filter = resolve_filter(&store, &session, raw).await?;
            let id = ops::create_task(&store, Some(&session), title, &filter, false)
                .await
                .map_err(|e| e.to_string())?;
            println!("tarefa criada: {}", id);
        }
        "toggle" => {
            let task_id = positional(rest).ok_or("toggle: missing task id")?;
            let tasks = store
                .tasks_for_user(&session.user_id)
                .await
                .map_err(|e| e.to_string())?;
            let task = tasks
                .iter()
                .find(|t| t.id == task_id)
                .ok_or_else(|| format!("no task with id {}", task_id))?;
            ops::toggle_task_completion(&store, task_id, task.completed)
                .await
                .map_err(|e| e.to_string())?;
        }
        "rm" => {
            let task_id = positional(rest).ok_or("rm: missing task id")?;
            ops::delete_task(&store, task_id).await.map_err(|e| e.to_string())?;
        }
        "lists" => {
            let lists = store
                .lists_for_user(&session.user_id)
                .await
                .map_err(|e| e.to_string())?;
            for list in &lists {
                println!("{}  {}", list.name, list.id);
            }
            if lists.is_empty() {
                println!("Nenhuma lista.");
            }
        }
        "newlist" => {
            let name = positional(rest).ok_or("newlist: missing name")?;
            let id = ops::create_list(&store, Some(&session), name)
                .await
                .map_err(|e| e.to_string())?;
            println!("lista criada: {}", id);
        }
        "rmlist" => {
            let list_id = positional(rest).ok_or("rmlist: missing list id")?;
            let mut active = Filter::ByList(list_id.to_string());
            let cascaded = ops::delete_list(&store, Some(&session), list_id, &mut active)
                .await
                .map_err(|e| e.to_string())?;
            println!("lista apagada ({} tarefas)", cascaded);
        }
        other => {
            print_usage();
            return Err(format!("unknown command: {}", other));
        }
    }

    ops::log_out(&auth, session, &loading);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(message) = run(args).await {
        eprintln!("Erro: {}", message);
        std::process::exit(1);
    }
}
