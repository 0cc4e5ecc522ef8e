pub mod student;
pub mod task;

pub use student::{NewStudent, NewStudentForm, Student};
pub use task::{EditTaskForm, NewTask, NewTaskForm, Task};
