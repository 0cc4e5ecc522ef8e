use sqlx::SqlitePool;
use tracing::error;

use crate::models::{NewStudent, NewTask, Student, Task};

/// Students for the dashboard: newest intake year first, then semester name,
/// then most recently assigned.
pub async fn fetch_students_for_dashboard(db: &SqlitePool) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT id, first_name, last_name, dob, citizenship, intended_major,
            entry_semester, entry_year, assigned_date
        FROM students
        ORDER BY
            entry_year DESC NULLS LAST,
            entry_semester ASC NULLS FIRST,
            assigned_date DESC NULLS LAST
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn find_student_by_id(db: &SqlitePool, id: i64) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, first_name, last_name, dob, citizenship, intended_major, entry_semester, entry_year, assigned_date FROM students WHERE id = ?1"
    )
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_student(db: &SqlitePool, new: NewStudent) -> Result<Student, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO students
            (first_name, last_name, dob, citizenship, intended_major,
            entry_semester, entry_year, assigned_date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.dob)
    .bind(&new.citizenship)
    .bind(&new.intended_major)
    .bind(&new.entry_semester)
    .bind(new.entry_year)
    .bind(&new.assigned_date)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(Student {
        id,
        first_name: new.first_name,
        last_name: new.last_name,
        dob: new.dob,
        citizenship: new.citizenship,
        intended_major: new.intended_major,
        entry_semester: new.entry_semester,
        entry_year: new.entry_year,
        assigned_date: new.assigned_date,
    })
}

/// Removes a student; the schema cascades the delete to its tasks.
pub async fn delete_student(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM students WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_tasks_for_dashboard(db: &SqlitePool) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, student_id, description, completed, deadline FROM tasks ORDER BY deadline ASC NULLS LAST, id ASC"
    )
    .fetch_all(db)
    .await
}

pub async fn fetch_tasks_for_student(
    db: &SqlitePool,
    student_id: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, student_id, description, completed, deadline FROM tasks WHERE student_id = ?1 ORDER BY id ASC"
    )
    .bind(student_id)
    .fetch_all(db)
    .await
}

pub async fn find_task_by_id(db: &SqlitePool, id: i64) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, student_id, description, completed, deadline FROM tasks WHERE id = ?1"
    )
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_task(db: &SqlitePool, new: NewTask) -> Result<Task, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO tasks (student_id, description, completed, deadline)
        VALUES (?1, ?2, 0, ?3)
        "#,
    )
    .bind(new.student_id)
    .bind(&new.description)
    .bind(new.deadline)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(Task {
        id,
        student_id: new.student_id,
        description: new.description,
        completed: false,
        deadline: new.deadline,
    })
}

/// Flips the completion flag and returns the task as stored afterwards.
pub async fn toggle_task(db: &SqlitePool, id: i64) -> Result<Option<Task>, sqlx::Error> {
    let updated = sqlx::query("UPDATE tasks SET completed = NOT completed WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    find_task_by_id(db, id).await
}

pub async fn update_task_description(
    db: &SqlitePool,
    id: i64,
    description: &str,
) -> Result<Option<Task>, sqlx::Error> {
    let updated = sqlx::query("UPDATE tasks SET description = ?1 WHERE id = ?2")
        .bind(description)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    find_task_by_id(db, id).await
}

/// Deletes a task inside its own transaction. Any failure rolls the
/// transaction back and the delete error is returned, even when the
/// rollback itself fails.
pub async fn delete_task(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await;

    match result {
        Ok(done) => {
            tx.commit().await?;
            Ok(done.rows_affected() > 0)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("rollback after failed delete of task {} failed: {}", id, rollback_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::connect_in_memory;

    async fn setup_test_db() -> SqlitePool {
        connect_in_memory().await.expect("Failed to create test db")
    }

    fn new_student(
        first_name: &str,
        entry_year: Option<i64>,
        entry_semester: Option<&str>,
        assigned_date: &str,
    ) -> NewStudent {
        NewStudent {
            first_name: first_name.to_string(),
            last_name: "Lee".to_string(),
            dob: None,
            citizenship: None,
            intended_major: None,
            entry_semester: entry_semester.map(str::to_string),
            entry_year,
            assigned_date: assigned_date.to_string(),
        }
    }

    fn new_task(student_id: i64, description: &str, deadline: Option<(i32, u32, u32)>) -> NewTask {
        NewTask {
            student_id,
            description: description.to_string(),
            deadline: deadline.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_student() {
        let pool = setup_test_db().await;

        let mut req = new_student("Ana", Some(2024), Some("Fall"), "2024-01-10");
        req.dob = Some("2005-03-04".to_string());
        req.intended_major = Some("Biology".to_string());

        let student = insert_student(&pool, req).await.expect("Failed to insert student");
        assert_eq!(student.id, 1);

        let found = find_student_by_id(&pool, student.id)
            .await
            .expect("Failed to fetch student")
            .expect("Student not found");
        assert_eq!(found.first_name, "Ana");
        assert_eq!(found.dob.as_deref(), Some("2005-03-04"));
        assert_eq!(found.intended_major.as_deref(), Some("Biology"));
        assert_eq!(found.entry_year, Some(2024));
        assert_eq!(found.citizenship, None);

        assert!(find_student_by_id(&pool, 99).await.expect("query failed").is_none());
    }

    #[tokio::test]
    async fn test_dashboard_student_order() {
        let pool = setup_test_db().await;

        // inserted deliberately out of order
        for (name, year, semester, assigned) in [
            ("no-year", None, Some("Fall"), "2024-05-01"),
            ("2023-fall", Some(2023), Some("Fall"), "2024-01-01"),
            ("2024-spring", Some(2024), Some("Spring"), "2024-01-01"),
            ("2024-none-old", Some(2024), None, "2023-01-01"),
            ("2024-fall", Some(2024), Some("Fall"), "2024-01-01"),
            ("2024-none-new", Some(2024), None, "2024-02-01"),
        ] {
            insert_student(&pool, new_student(name, year, semester, assigned))
                .await
                .expect("Failed to insert student");
        }

        let names: Vec<String> = fetch_students_for_dashboard(&pool)
            .await
            .expect("Failed to fetch students")
            .into_iter()
            .map(|s| s.first_name)
            .collect();

        assert_eq!(
            names,
            vec![
                "2024-none-new",
                "2024-none-old",
                "2024-fall",
                "2024-spring",
                "2023-fall",
                "no-year",
            ]
        );
    }

    #[tokio::test]
    async fn test_dashboard_tasks_sorted_by_deadline_nulls_last() {
        let pool = setup_test_db().await;
        let student = insert_student(&pool, new_student("Ana", None, None, "2024-01-10"))
            .await
            .expect("Failed to insert student");

        for (desc, deadline) in [
            ("none-a", None),
            ("march", Some((2024, 3, 1))),
            ("none-b", None),
            ("january", Some((2024, 1, 15))),
            ("december", Some((2023, 12, 31))),
        ] {
            insert_task(&pool, new_task(student.id, desc, deadline))
                .await
                .expect("Failed to insert task");
        }

        let tasks = fetch_tasks_for_dashboard(&pool).await.expect("Failed to fetch tasks");
        let order: Vec<&str> = tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["december", "january", "march", "none-a", "none-b"]);
    }

    #[tokio::test]
    async fn test_toggle_task_twice_restores_state() {
        let pool = setup_test_db().await;
        let student = insert_student(&pool, new_student("Ana", None, None, "2024-01-10"))
            .await
            .expect("Failed to insert student");
        let task = insert_task(&pool, new_task(student.id, "Submit transcript", Some((2024, 2, 1))))
            .await
            .expect("Failed to insert task");
        assert!(!task.completed);

        let once = toggle_task(&pool, task.id).await.expect("toggle failed").expect("Task not found");
        assert!(once.completed);
        let twice = toggle_task(&pool, task.id).await.expect("toggle failed").expect("Task not found");
        assert!(!twice.completed);
        assert_eq!(twice.deadline, NaiveDate::from_ymd_opt(2024, 2, 1));

        assert!(toggle_task(&pool, 42).await.expect("toggle failed").is_none());
    }

    #[tokio::test]
    async fn test_update_task_description() {
        let pool = setup_test_db().await;
        let student = insert_student(&pool, new_student("Ana", None, None, "2024-01-10"))
            .await
            .expect("Failed to insert student");
        let task = insert_task(&pool, new_task(student.id, "Old", None))
            .await
            .expect("Failed to insert task");

        let updated = update_task_description(&pool, task.id, "New")
            .await
            .expect("update failed")
            .expect("Task not found");
        assert_eq!(updated.description, "New");

        assert!(update_task_description(&pool, 42, "New").await.expect("update failed").is_none());
    }

    #[tokio::test]
    async fn test_delete_task() {
        let pool = setup_test_db().await;
        let student = insert_student(&pool, new_student("Ana", None, None, "2024-01-10"))
            .await
            .expect("Failed to insert student");
        let keep = insert_task(&pool, new_task(student.id, "Keep", None))
            .await
            .expect("Failed to insert task");
        let gone = insert_task(&pool, new_task(student.id, "Drop", None))
            .await
            .expect("Failed to insert task");

        assert!(delete_task(&pool, gone.id).await.expect("delete failed"));
        assert!(!delete_task(&pool, gone.id).await.expect("delete failed"));

        let remaining = fetch_tasks_for_student(&pool, student.id).await.expect("fetch failed");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_failed_delete_rolls_back_and_keeps_error() {
        let pool = setup_test_db().await;
        let student = insert_student(&pool, new_student("Ana", None, None, "2024-01-10"))
            .await
            .expect("Failed to insert student");
        let task = insert_task(&pool, new_task(student.id, "Keep", None))
            .await
            .expect("Failed to insert task");

        sqlx::query(
            "CREATE TRIGGER refuse_task_delete BEFORE DELETE ON tasks \
             BEGIN SELECT RAISE(ABORT, 'delete refused'); END",
        )
        .execute(&pool)
        .await
        .expect("Failed to create trigger");

        let err = delete_task(&pool, task.id).await.expect_err("delete should fail");
        assert!(err.to_string().contains("delete refused"), "unexpected error: {err}");

        let still_there = find_task_by_id(&pool, task.id)
            .await
            .expect("pool unusable after rollback");
        assert!(still_there.is_some());
    }

    #[tokio::test]
    async fn test_delete_student_cascades_to_tasks() {
        let pool = setup_test_db().await;
        let ana = insert_student(&pool, new_student("Ana", None, None, "2024-01-10"))
            .await
            .expect("Failed to insert student");
        let ben = insert_student(&pool, new_student("Ben", None, None, "2024-01-11"))
            .await
            .expect("Failed to insert student");
        for desc in ["one", "two"] {
            insert_task(&pool, new_task(ana.id, desc, None)).await.expect("Failed to insert task");
        }
        insert_task(&pool, new_task(ben.id, "other", None)).await.expect("Failed to insert task");

        assert!(delete_student(&pool, ana.id).await.expect("delete failed"));

        let tasks = fetch_tasks_for_dashboard(&pool).await.expect("fetch failed");
        assert_eq!(tasks.len(), 1);
        assert!(tasks.iter().all(|t| t.student_id != ana.id));
        assert!(!delete_student(&pool, ana.id).await.expect("delete failed"));
    }

    #[tokio::test]
    async fn test_task_requires_existing_student() {
        let pool = setup_test_db().await;
        let result = insert_task(&pool, new_task(7, "orphan", None)).await;
        assert!(result.is_err());
    }
}
