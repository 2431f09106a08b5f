//! In-memory to-do storage.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow status of an item. Toggling cycles `todo -> in_progress -> done -> todo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Todo,
    InProgress,
    Done,
}

impl TodoStatus {
    pub fn next(self) -> Self {
        match self {
            TodoStatus::Todo => TodoStatus::InProgress,
            TodoStatus::InProgress => TodoStatus::Done,
            TodoStatus::Done => TodoStatus::Todo,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Todo => "todo",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Done => "done",
        }
    }

    /// Label of the button that advances this status.
    pub fn action_label(self) -> &'static str {
        match self {
            TodoStatus::Todo => "Start",
            TodoStatus::InProgress => "Complete",
            TodoStatus::Done => "Reset",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub task: String,
    /// Mirrors `status == Done`
    pub done: bool,
    pub status: TodoStatus,
    pub assignee: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    fn set_status(&mut self, status: TodoStatus) {
        self.status = status;
        self.done = status == TodoStatus::Done;
        self.updated_at = Utc::now();
    }
}

/// Partial update applied by `PUT /todos/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoUpdate {
    pub task: Option<String>,
    pub done: Option<bool>,
}

impl TodoUpdate {
    pub fn is_empty(&self) -> bool {
        self.task.is_none() && self.done.is_none()
    }
}

#[derive(Debug)]
struct StoreInner {
    next_id: u64,
    todos: Vec<Todo>,
}

/// Thread-safe store shared by all handlers.
#[derive(Debug)]
pub struct TodoStore {
    inner: Mutex<StoreInner>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                next_id: 1,
                todos: Vec::new(),
            }),
        }
    }

    /// Items in creation order.
    pub fn list(&self) -> Vec<Todo> {
        self.inner.lock().todos.clone()
    }

    pub fn get(&self, id: u64) -> Option<Todo> {
        self.inner.lock().todos.iter().find(|t| t.id == id).cloned()
    }

    /// Create an item. The caller guarantees `task` is not blank.
    pub fn create(&self, task: &str) -> Todo {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        let todo = Todo {
            id: inner.next_id,
            task: task.trim().to_string(),
            done: false,
            status: TodoStatus::Todo,
            assignee: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        inner.next_id += 1;
        inner.todos.push(todo.clone());
        todo
    }

    /// Advance the status of an item.
    pub fn toggle(&self, id: u64) -> Option<Todo> {
        self.modify(id, |todo| todo.set_status(todo.status.next()))
    }

    /// Apply a partial update. A blank `task` is ignored.
    pub fn update(&self, id: u64, update: TodoUpdate) -> Option<Todo> {
        self.modify(id, |todo| {
            if let Some(task) = update.task.as_deref().map(str::trim) {
                if !task.is_empty() {
                    todo.task = task.to_string();
                    todo.updated_at = Utc::now();
                }
            }
            match update.done {
                Some(true) => todo.set_status(TodoStatus::Done),
                Some(false) if todo.status == TodoStatus::Done => todo.set_status(TodoStatus::Todo),
                _ => {}
            }
        })
    }

    /// Set assignee and notes. Blank values clear the field; `None` leaves it.
    pub fn update_details(
        &self,
        id: u64,
        assignee: Option<&str>,
        notes: Option<&str>,
    ) -> Option<Todo> {
        fn normalize(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        self.modify(id, |todo| {
            if let Some(assignee) = assignee {
                todo.assignee = normalize(assignee);
            }
            if let Some(notes) = notes {
                todo.notes = normalize(notes);
            }
            todo.updated_at = Utc::now();
        })
    }

    pub fn delete(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.todos.len();
        inner.todos.retain(|t| t.id != id);
        inner.todos.len() != before
    }

    /// Drop every item and restart ids at 1.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.todos.clear();
        inner.next_id = 1;
    }

    fn modify<F>(&self, id: u64, f: F) -> Option<Todo>
    where
        F: FnOnce(&mut Todo),
    {
        let mut inner = self.inner.lock();
        let todo = inner.todos.iter_mut().find(|t| t.id == id)?;
        f(todo);
        Some(todo.clone())
    }
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}
