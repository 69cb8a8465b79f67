use crate::task::{Stage, Task, TaskId};
use tracing::debug;

/// A stage transition for one task, remembered so it can be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageChange {
    pub task_id: TaskId,
    pub from: Stage,
    pub to: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Forward,
    Backward,
}

/// Local, possibly stale copy of the signed-in user's tasks.
#[derive(Debug, Default)]
pub struct KanbanBoard {
    tasks: Vec<Task>,
    pub selected_stage: Stage,
    pub selected_task: usize,
    dragging: Option<TaskId>,
}

impl KanbanBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache with the tasks owned by `owner_id`.
    pub fn load(&mut self, tasks: Vec<Task>, owner_id: &str) {
        self.tasks = tasks.into_iter().filter(|t| t.user_id == owner_id).collect();
        if let Some(id) = &self.dragging {
            if self.task(id).is_none() {
                self.dragging = None;
            }
        }
        self.clamp_selection();
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.dragging = None;
        self.selected_task = 0;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn tasks_in(&self, stage: Stage) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.stage == stage).collect()
    }

    pub fn selected(&self) -> Option<&Task> {
        self.tasks_in(self.selected_stage)
            .get(self.selected_task)
            .copied()
    }

    pub fn select_column(&mut self, direction: isize) {
        let index = (self.selected_stage.index() as isize + direction).clamp(0, 3);
        if let Some(stage) = Stage::new(index as u8) {
            self.selected_stage = stage;
        }
        self.clamp_selection();
    }

    pub fn select_task(&mut self, direction: isize) {
        let count = self.tasks_in(self.selected_stage).len();
        if count == 0 {
            self.selected_task = 0;
            return;
        }
        self.selected_task =
            (self.selected_task as isize + direction).clamp(0, count as isize - 1) as usize;
    }

    /// Moves the cursor onto `id` wherever it currently sits.
    pub fn focus(&mut self, id: &str) {
        if let Some(task) = self.task(id) {
            let stage = task.stage;
            if let Some(pos) = self.tasks_in(stage).iter().position(|t| t.id == id) {
                self.selected_stage = stage;
                self.selected_task = pos;
            }
        }
    }

    /// The ±1 transition for a task; `None` at either end of the board.
    pub fn step(&self, id: &str, step: Step) -> Option<StageChange> {
        let task = self.task(id)?;
        let to = match step {
            Step::Forward => task.stage.forward(),
            Step::Backward => task.stage.backward(),
        }?;
        Some(StageChange {
            task_id: task.id.clone(),
            from: task.stage,
            to,
        })
    }

    /// The transition for dropping `id` on `target`; `None` when it is already there.
    pub fn drop_change(&self, id: &str, target: Stage) -> Option<StageChange> {
        let task = self.task(id)?;
        (task.stage != target).then(|| StageChange {
            task_id: task.id.clone(),
            from: task.stage,
            to: target,
        })
    }

    /// Optimistically moves the task to `change.to`.
    pub fn apply(&mut self, change: &StageChange) {
        debug!(task = %change.task_id, from = %change.from, to = %change.to, "optimistic stage change");
        self.set_stage(&change.task_id, change.to);
    }

    /// Puts the task back where it was before `change`.
    pub fn rollback(&mut self, change: &StageChange) {
        debug!(task = %change.task_id, stage = %change.from, "rolling back stage change");
        self.set_stage(&change.task_id, change.from);
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(pos);
        if self.dragging.as_deref() == Some(id) {
            self.dragging = None;
        }
        self.clamp_selection();
        Some(task)
    }

    pub fn start_drag(&mut self, id: &str) -> bool {
        if self.task(id).is_none() {
            return false;
        }
        self.dragging = Some(id.to_string());
        true
    }

    pub fn dragging(&self) -> Option<&Task> {
        self.dragging.as_deref().and_then(|id| self.task(id))
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Ends the drag over a column. The drag is over either way.
    pub fn finish_drag(&mut self, target: Stage) -> Option<StageChange> {
        let id = self.dragging.take()?;
        self.drop_change(&id, target)
    }

    /// Ends the drag over the trash zone, handing back the task to delete.
    pub fn take_drag(&mut self) -> Option<TaskId> {
        self.dragging.take()
    }

    pub fn cancel_drag(&mut self) {
        self.dragging = None;
    }

    fn set_stage(&mut self, id: &str, stage: Stage) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.stage = stage;
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let count = self.tasks_in(self.selected_stage).len();
        self.selected_task = self.selected_task.min(count.saturating_sub(1));
    }
}
