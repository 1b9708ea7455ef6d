/// DataGrid Board
///
/// Column membership for a kanban-style board. Each task belongs to exactly
/// one column and the membership map is the single source of truth: moving a
/// task replaces its entry in one step, so a task can never be seen in two
/// columns or in none. When several moves for the same task arrive, the last
/// one wins.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

pub type TaskId = String;
pub type ColumnId = String;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unknown column '{0}'")]
    UnknownColumn(ColumnId),

    #[error("unknown task '{0}'")]
    UnknownTask(TaskId),

    #[error("column '{0}' already exists")]
    DuplicateColumn(ColumnId),

    #[error("task '{0}' already exists")]
    DuplicateTask(TaskId),

    #[error("column '{column}' is at its limit of {limit} tasks")]
    WipLimitReached { column: ColumnId, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub id: ColumnId,
    /// Maximum number of tasks, if any
    pub wip_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    columns: Vec<Column>,
    membership: IndexMap<TaskId, ColumnId>,
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    /// Board with the given columns, in display order.
    pub fn with_columns<I, S>(columns: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut board = Board::new();
        for column in columns {
            board.add_column(column, None)?;
        }
        Ok(board)
    }

    pub fn add_column(
        &mut self,
        id: impl Into<String>,
        wip_limit: Option<usize>,
    ) -> Result<(), BoardError> {
        let id = id.into();
        if self.column(&id).is_some() {
            return Err(BoardError::DuplicateColumn(id));
        }
        self.columns.push(Column { id, wip_limit });
        Ok(())
    }

    pub fn add_task(&mut self, task: impl Into<String>, column: &str) -> Result<(), BoardError> {
        let task = task.into();
        if self.membership.contains_key(&task) {
            return Err(BoardError::DuplicateTask(task));
        }
        self.check_capacity(column)?;
        self.membership.insert(task, column.to_string());
        Ok(())
    }

    /// Moves `task` into `column` and returns the column it left.
    ///
    /// Moving a task to the column it is already in is a no-op and never
    /// trips the WIP limit.
    pub fn move_task(&mut self, task: &str, column: &str) -> Result<ColumnId, BoardError> {
        let current = self
            .membership
            .get(task)
            .cloned()
            .ok_or_else(|| BoardError::UnknownTask(task.to_string()))?;

        if current != column {
            self.check_capacity(column)?;
        }

        if let Some(entry) = self.membership.get_mut(task) {
            *entry = column.to_string();
        }
        log::trace!("moved task {} from {} to {}", task, current, column);
        Ok(current)
    }

    /// Removes a task and returns the column it was in.
    pub fn remove_task(&mut self, task: &str) -> Option<ColumnId> {
        self.membership.shift_remove(task)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_of(&self, task: &str) -> Option<&str> {
        self.membership.get(task).map(String::as_str)
    }

    /// Tasks in `column`, in the order they were added to the board.
    pub fn tasks_in(&self, column: &str) -> Vec<&str> {
        self.membership
            .iter()
            .filter(|(_, c)| c.as_str() == column)
            .map(|(t, _)| t.as_str())
            .collect()
    }

    /// Task count per column, in column order.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.columns
            .iter()
            .map(|c| (c.id.as_str(), self.count_in(&c.id)))
            .collect()
    }

    pub fn task_count(&self) -> usize {
        self.membership.len()
    }

    fn count_in(&self, column: &str) -> usize {
        self.membership.values().filter(|c| c.as_str() == column).count()
    }

    fn check_capacity(&self, column: &str) -> Result<(), BoardError> {
        let col = self
            .column(column)
            .ok_or_else(|| BoardError::UnknownColumn(column.to_string()))?;
        if let Some(limit) = col.wip_limit {
            if self.count_in(column) >= limit {
                log::warn!("column {} is full ({} tasks)", column, limit);
                return Err(BoardError::WipLimitReached {
                    column: column.to_string(),
                    limit,
                });
            }
        }
        Ok(())
    }
}
