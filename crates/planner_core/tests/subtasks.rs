use chrono::NaiveDate;
use planner_core::db::open_db_in_memory;
use planner_core::{
    ErrorKind, NewTask, PlannerService, RepoError, SqliteTaskRepository, TaskPatch,
    TaskRepository,
};
use rusqlite::Connection;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn subtasks_are_grouped_under_their_parent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let date = ymd(2024, 5, 6);

    let trip = repo.create_task(&NewTask::new("trip", date)).unwrap();
    let laundry = repo.create_task(&NewTask::new("laundry", date)).unwrap();
    let pack = repo
        .create_task(&NewTask::subtask(trip.id, "pack", date))
        .unwrap();
    let tickets = repo
        .create_task(&NewTask::subtask(trip.id, "tickets", date))
        .unwrap();

    let listed = repo.list_for_date(date).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].task.id, trip.id);
    assert_eq!(
        listed[0].subtasks.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![pack.id, tickets.id]
    );
    assert_eq!(listed[0].row_count(), 3);
    assert_eq!(
        listed[0].iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
        vec!["trip", "pack", "tickets"]
    );
    assert_eq!(listed[1].task.id, laundry.id);
    assert!(listed[1].subtasks.is_empty());
    assert_eq!(pack.parent_id, Some(trip.id));
    assert!(pack.is_subtask());
}

#[test]
fn subtask_dated_away_from_parent_shows_on_its_own_day() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let monday = ymd(2024, 5, 6);
    let tuesday = ymd(2024, 5, 7);

    let parent = repo.create_task(&NewTask::new("report", monday)).unwrap();
    let same_day = repo
        .create_task(&NewTask::subtask(parent.id, "outline", monday))
        .unwrap();
    let next_day = repo
        .create_task(&NewTask::subtask(parent.id, "proofread", tuesday))
        .unwrap();

    let monday_tasks = repo.list_for_date(monday).unwrap();
    assert_eq!(monday_tasks.len(), 1);
    assert!(monday_tasks[0].scheduled_here);
    assert_eq!(
        monday_tasks[0].subtasks.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![same_day.id]
    );

    let tuesday_tasks = repo.list_for_date(tuesday).unwrap();
    assert_eq!(tuesday_tasks.len(), 1);
    assert_eq!(tuesday_tasks[0].task.id, parent.id);
    assert!(!tuesday_tasks[0].scheduled_here);
    assert_eq!(
        tuesday_tasks[0].subtasks.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![next_day.id]
    );

    let all = repo.list_subtasks(parent.id).unwrap();
    assert_eq!(
        all.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![same_day.id, next_day.id]
    );
}

#[test]
fn service_subtask_on_other_day_is_visible_in_week_agenda() {
    let conn = open_db_in_memory().unwrap();
    let service = PlannerService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let monday = ymd(2024, 5, 6);

    let parent = service.add_task("trip", "", monday).unwrap();
    let tickets = service
        .add_subtask(parent.id, "tickets", Some(ymd(2024, 5, 8)))
        .unwrap();

    let agenda = service.week_agenda(monday).unwrap();
    let visible: Vec<_> = agenda
        .iter()
        .flat_map(|day| day.tasks.iter().flat_map(|entry| entry.subtasks.iter()))
        .map(|task| task.id)
        .collect();
    assert_eq!(visible, vec![tickets.id]);
    assert_eq!(agenda[2].tasks[0].task.id, parent.id);
    assert!(!agenda[2].tasks[0].scheduled_here);
    assert!(agenda[1].tasks.is_empty());
}

#[test]
fn moving_parent_keeps_subtasks_visible_on_their_day() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let monday = ymd(2024, 5, 6);
    let thursday = ymd(2024, 5, 9);

    let parent = repo.create_task(&NewTask::new("party", monday)).unwrap();
    let cake = repo
        .create_task(&NewTask::subtask(parent.id, "cake", monday))
        .unwrap();

    repo.update_task(
        parent.id,
        &TaskPatch {
            date: Some(thursday),
            ..TaskPatch::default()
        },
    )
    .unwrap();

    let old_day = repo.list_for_date(monday).unwrap();
    assert_eq!(old_day.len(), 1);
    assert_eq!(old_day[0].task.id, parent.id);
    assert!(!old_day[0].scheduled_here);
    assert_eq!(old_day[0].subtasks[0].id, cake.id);

    let new_day = repo.list_for_date(thursday).unwrap();
    assert_eq!(new_day.len(), 1);
    assert!(new_day[0].scheduled_here);
    assert!(new_day[0].subtasks.is_empty());

    let days: Vec<_> = repo
        .list_dates_with_tasks(5, 2024)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(days, vec![monday, thursday]);
}

#[test]
fn subtask_with_missing_parent_fails_and_inserts_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo
        .create_task(&NewTask::subtask(404, "orphan", ymd(2024, 5, 6)))
        .unwrap_err();
    assert!(matches!(err, RepoError::ParentNotFound(404)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(row_count(&conn), 0);
}

#[test]
fn subtask_of_subtask_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let date = ymd(2024, 5, 6);

    let parent = repo.create_task(&NewTask::new("parent", date)).unwrap();
    let child = repo
        .create_task(&NewTask::subtask(parent.id, "child", date))
        .unwrap();

    let err = repo
        .create_task(&NewTask::subtask(child.id, "grandchild", date))
        .unwrap_err();
    assert!(matches!(err, RepoError::ParentNotFound(id) if id == child.id));
    assert_eq!(row_count(&conn), 2);
}

#[test]
fn deleting_parent_removes_parent_and_all_subtasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let monday = ymd(2024, 5, 6);
    let friday = ymd(2024, 5, 10);

    let parent = repo.create_task(&NewTask::new("move house", monday)).unwrap();
    for (title, date) in [("boxes", monday), ("van", friday), ("keys", friday)] {
        repo.create_task(&NewTask::subtask(parent.id, title, date))
            .unwrap();
    }
    let bystander = repo.create_task(&NewTask::new("gym", friday)).unwrap();

    let removed = repo.delete_task(parent.id).unwrap();
    assert_eq!(removed, 4);
    assert_eq!(row_count(&conn), 1);

    assert!(repo.list_for_date(monday).unwrap().is_empty());
    let friday_tasks = repo.list_for_date(friday).unwrap();
    assert_eq!(friday_tasks.len(), 1);
    assert_eq!(friday_tasks[0].task.id, bystander.id);
}

#[test]
fn deleting_subtask_leaves_parent_and_siblings() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let date = ymd(2024, 5, 6);

    let parent = repo.create_task(&NewTask::new("groceries", date)).unwrap();
    let eggs = repo
        .create_task(&NewTask::subtask(parent.id, "eggs", date))
        .unwrap();
    let bread = repo
        .create_task(&NewTask::subtask(parent.id, "bread", date))
        .unwrap();

    assert_eq!(repo.delete_task(eggs.id).unwrap(), 1);

    let listed = repo.list_for_date(date).unwrap();
    assert_eq!(listed[0].task.id, parent.id);
    assert_eq!(listed[0].subtasks.len(), 1);
    assert_eq!(listed[0].subtasks[0].id, bread.id);
}

#[test]
fn parent_and_subtask_completion_are_independent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let date = ymd(2024, 5, 6);

    let parent = repo.create_task(&NewTask::new("essay", date)).unwrap();
    let child = repo
        .create_task(&NewTask::subtask(parent.id, "draft", date))
        .unwrap();

    repo.set_completed(child.id, true).unwrap();
    assert!(!repo.get_task(parent.id).unwrap().unwrap().completed);

    repo.set_completed(parent.id, true).unwrap();
    repo.set_completed(child.id, false).unwrap();
    assert!(repo.get_task(parent.id).unwrap().unwrap().completed);
}

#[test]
fn list_subtasks_of_missing_parent_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo.list_subtasks(5).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(5)));
}

#[test]
fn month_highlights_include_subtask_only_days() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let parent = repo.create_task(&NewTask::new("plan", ymd(2024, 5, 6))).unwrap();
    repo.create_task(&NewTask::subtask(parent.id, "later", ymd(2024, 5, 20)))
        .unwrap();
    repo.create_task(&NewTask::subtask(parent.id, "next month", ymd(2024, 6, 3)))
        .unwrap();

    let days: Vec<_> = repo
        .list_dates_with_tasks(5, 2024)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(days, vec![ymd(2024, 5, 6), ymd(2024, 5, 20)]);
    for day in days {
        assert!(!repo.list_for_date(day).unwrap().is_empty());
    }
}
