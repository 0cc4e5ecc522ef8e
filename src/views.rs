//! Server-rendered pages. Every value that came from a user goes through
//! [`html_escape`] before it is placed in markup.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Student, Task};

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn opt(value: Option<&str>) -> String {
    value.map(html_escape).unwrap_or_else(|| "&mdash;".to_string())
}

fn deadline_cell(deadline: Option<NaiveDate>) -> String {
    deadline
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "&mdash;".to_string())
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <script src="/static/js/main.js" defer></script>
</head>
<body>
    <nav><a href="/">Dashboard</a> | <a href="/add">Add student</a></nav>
    <main>
{body}
    </main>
</body>
</html>"##,
        title = html_escape(title),
    )
}

fn render_student_row(student: &Student) -> String {
    format!(
        r##"<tr>
            <td><a href="/student/{id}">{name}</a></td>
            <td>{major}</td>
            <td>{semester}</td>
            <td>{year}</td>
            <td>{assigned}</td>
        </tr>"##,
        id = student.id,
        name = html_escape(&student.full_name()),
        major = opt(student.intended_major.as_deref()),
        semester = opt(student.entry_semester.as_deref()),
        year = student
            .entry_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "&mdash;".to_string()),
        assigned = html_escape(&student.assigned_date),
    )
}

fn render_task_item(task: &Task) -> String {
    let checked = if task.completed { " checked" } else { "" };
    let class = if task.completed { "task done" } else { "task" };
    format!(
        r##"<li id="task-{id}" class="{class}">
            <input type="checkbox" onchange="toggleTask({id})"{checked}>
            <span class="description" id="task-{id}-description">{description}</span>
            <span class="deadline">{deadline}</span>
            <button type="button" onclick="editTask({id})">Edit</button>
            <button type="button" onclick="deleteTask({id})">Delete</button>
        </li>"##,
        id = task.id,
        description = html_escape(&task.description),
        deadline = deadline_cell(task.deadline),
    )
}

pub fn dashboard_page(students: &[Student], tasks: &[Task]) -> String {
    let owners: HashMap<i64, &Student> = students.iter().map(|s| (s.id, s)).collect();

    let student_rows = if students.is_empty() {
        r#"<tr><td colspan="5">No students yet.</td></tr>"#.to_string()
    } else {
        students.iter().map(render_student_row).collect()
    };

    let task_rows: String = if tasks.is_empty() {
        r#"<tr><td colspan="4">No tasks.</td></tr>"#.to_string()
    } else {
        tasks
            .iter()
            .map(|task| {
                let owner = owners
                    .get(&task.student_id)
                    .map(|s| {
                        format!(
                            r#"<a href="/student/{}">{}</a>"#,
                            s.id,
                            html_escape(&s.full_name())
                        )
                    })
                    .unwrap_or_default();
                format!(
                    r##"<tr id="task-{id}">
            <td><input type="checkbox" onchange="toggleTask({id})"{checked}></td>
            <td>{description}</td>
            <td>{owner}</td>
            <td>{deadline}</td>
        </tr>"##,
                    id = task.id,
                    checked = if task.completed { " checked" } else { "" },
                    description = html_escape(&task.description),
                    deadline = deadline_cell(task.deadline),
                )
            })
            .collect()
    };

    let body = format!(
        r##"<h1>Students</h1>
    <table class="students">
        <thead><tr><th>Name</th><th>Intended major</th><th>Semester</th><th>Year</th><th>Assigned</th></tr></thead>
        <tbody>{student_rows}</tbody>
    </table>
    <h2>All tasks</h2>
    <table class="tasks">
        <thead><tr><th>Done</th><th>Task</th><th>Student</th><th>Deadline</th></tr></thead>
        <tbody>{task_rows}</tbody>
    </table>"##
    );

    layout("Dashboard", &body)
}

pub fn student_detail_page(student: &Student, tasks: &[Task]) -> String {
    let items: String = if tasks.is_empty() {
        r#"<li class="empty">No tasks.</li>"#.to_string()
    } else {
        tasks.iter().map(render_task_item).collect()
    };

    let body = format!(
        r##"<h1>{name}</h1>
    <dl class="profile">
        <dt>Date of birth</dt><dd>{dob}</dd>
        <dt>Citizenship</dt><dd>{citizenship}</dd>
        <dt>Intended major</dt><dd>{major}</dd>
        <dt>Entry</dt><dd>{semester} {year}</dd>
        <dt>Assigned</dt><dd>{assigned}</dd>
    </dl>
    <h2>Tasks</h2>
    <ul class="tasks">{items}</ul>
    <form method="post" action="/student/{id}/add_task">
        <input type="text" name="description" maxlength="200" required placeholder="New task">
        <input type="date" name="deadline">
        <button type="submit">Add task</button>
    </form>"##,
        id = student.id,
        name = html_escape(&student.full_name()),
        dob = opt(student.dob.as_deref()),
        citizenship = opt(student.citizenship.as_deref()),
        major = opt(student.intended_major.as_deref()),
        semester = opt(student.entry_semester.as_deref()),
        year = student.entry_year.map(|y| y.to_string()).unwrap_or_default(),
        assigned = html_escape(&student.assigned_date),
    );

    layout(&student.full_name(), &body)
}

pub fn add_student_page() -> String {
    let body = r##"<h1>Add student</h1>
    <form method="post" action="/add">
        <label>First name <input type="text" name="first_name" required></label>
        <label>Last name <input type="text" name="last_name" required></label>
        <label>Date of birth <input type="date" name="dob"></label>
        <label>Citizenship <input type="text" name="citizenship"></label>
        <label>Intended major <input type="text" name="intended_major"></label>
        <label>Entry semester
            <select name="entry_semester">
                <option value=""></option>
                <option>Spring</option>
                <option>Summer</option>
                <option>Fall</option>
            </select>
        </label>
        <label>Entry year <input type="number" name="entry_year"></label>
        <label>Assigned date <input type="date" name="assigned_date" required></label>
        <button type="submit">Save</button>
    </form>"##;

    layout("Add student", body)
}

pub fn not_found_page() -> String {
    layout("Not found", "<h1>Not found</h1>\n    <p>The requested record does not exist.</p>")
}
