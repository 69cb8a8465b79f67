use crate::task::{Stage, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub done: usize,
    pub progress: f64,
}

impl DashboardStats {
    /// Counts over tasks already filtered to the current user.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut stats = Self::default();
        for task in tasks {
            stats.total += 1;
            if task.stage == Stage::DONE {
                stats.done += 1;
            } else {
                stats.pending += 1;
            }
        }
        stats.progress = progress_percentage(stats.done, stats.total);
        stats
    }

    pub fn rounded_progress(&self) -> u16 {
        self.progress.round() as u16
    }
}

pub fn progress_percentage(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    done as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kanban_board::tests::task;

    #[test]
    fn empty_list_has_zero_progress() {
        let tasks: Vec<Task> = Vec::new();
        let stats = DashboardStats::from_tasks(&tasks);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.progress, 0.0);
        assert_eq!(stats.rounded_progress(), 0);
    }

    #[test]
    fn counts_done_against_pending() {
        let tasks = vec![
            task("a", 0, "me"),
            task("b", 2, "me"),
            task("c", 3, "me"),
        ];
        let stats = DashboardStats::from_tasks(&tasks);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.done, 1);
        assert!((stats.progress - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.rounded_progress(), 33);
    }

    #[test]
    fn progress_matches_ratio() {
        for total in 1..=8 {
            for done in 0..=total {
                assert_eq!(
                    progress_percentage(done, total),
                    done as f64 / total as f64 * 100.0
                );
            }
        }
    }
}
