use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::client::TaskService;
use crate::models::{PerformanceSummary, TaskStatus, UserTask};
use crate::notify::{Notifier, Surface};
use crate::session::Session;
use crate::stats::{self, TargetStatus};
use crate::views::{refresh, submit, Entry, Page, Redirect, ViewState};

/// Identifies the task instance a mark-done request completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDoneAction {
    pub task_id: String,
    pub planned_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCard {
    pub task: String,
    pub planned: String,
    pub assigned_to: String,
    pub status: TaskStatus,
    pub status_class: &'static str,
    pub card_class: String,
    /// Present only for pending tasks.
    pub mark_done: Option<MarkDoneAction>,
}

impl TaskCard {
    fn build(task: UserTask, card_classes: &HashMap<String, String>) -> Self {
        let mark_done = (task.status == TaskStatus::Pending).then(|| MarkDoneAction {
            task_id: task.task_id.clone(),
            planned_date: task.planned_date.clone(),
        });
        Self {
            planned: stats::format_planned_date(&task.planned_date),
            assigned_to: stats::short_name(&task.assigned_to).to_string(),
            status_class: stats::status_class(&task.status),
            card_class: stats::card_class(&task.assigned_to, card_classes).to_string(),
            task: task.task,
            status: task.status,
            mark_done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePanel {
    #[serde(flatten)]
    pub summary: PerformanceSummary,
    pub target: TargetStatus,
    pub message: &'static str,
    pub message_class: &'static str,
}

impl From<PerformanceSummary> for PerformancePanel {
    fn from(summary: PerformanceSummary) -> Self {
        let target = stats::target_status(&summary);
        Self {
            summary,
            target,
            message: target.label(),
            message_class: target.css_class(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceView {
    pub user_name: String,
    pub tasks: Vec<TaskCard>,
    pub performance: Option<PerformancePanel>,
}

/// Why no single mark-done action could be picked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionLookup {
    #[error("Task \"{task_id}\" has no pending instance{} to mark done.", on_date(.planned_date))]
    NotPending {
        task_id: String,
        planned_date: Option<String>,
    },
    #[error("Task \"{task_id}\" is pending on several dates ({}); pick one by planned date.", .planned_dates.join(", "))]
    Ambiguous {
        task_id: String,
        planned_dates: Vec<String>,
    },
}

fn on_date(planned_date: &Option<String>) -> String {
    match planned_date {
        Some(date) => format!(" planned for {date}"),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkDone {
    Cancelled,
    Completed,
    Failed,
}

pub struct PerformancePage<'a, S: TaskService, U: Surface> {
    service: &'a S,
    notifier: &'a Notifier<U>,
    session: &'a Session,
    card_classes: &'a HashMap<String, String>,
    state: ViewState,
    view: PerformanceView,
}

impl<'a, S: TaskService, U: Surface> PerformancePage<'a, S, U> {
    pub fn new(
        service: &'a S,
        notifier: &'a Notifier<U>,
        session: &'a Session,
        card_classes: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            service,
            notifier,
            session,
            card_classes,
            state: ViewState::Idle,
            view: PerformanceView::default(),
        }
    }

    pub fn view(&self) -> &PerformanceView {
        &self.view
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Loads the user's tasks, then their performance summary.
    pub async fn enter(&mut self) -> Entry {
        if !self.session.is_authenticated() {
            return Entry::Redirect(Redirect::immediate(Page::Portal));
        }

        self.view.user_name = self.session.greeting_name("User").to_string();
        let notifier = self.notifier;
        let _loader = notifier.acquire();
        self.load_tasks().await;
        self.load_performance().await;
        Entry::Ready
    }

    pub async fn load_tasks(&mut self) -> bool {
        let loaded = refresh(
            self.notifier,
            &mut self.state,
            "tasks",
            self.service.user_tasks(&self.session.email),
        )
        .await;
        match loaded {
            Some(tasks) => {
                self.view.tasks = tasks
                    .into_iter()
                    .map(|task| TaskCard::build(task, self.card_classes))
                    .collect();
                true
            }
            None => false,
        }
    }

    pub async fn load_performance(&mut self) -> bool {
        let loaded = refresh(
            self.notifier,
            &mut self.state,
            "performance",
            self.service.my_performance(&self.session.email),
        )
        .await;
        match loaded {
            Some(summary) => {
                self.view.performance = Some(PerformancePanel::from(summary));
                true
            }
            None => false,
        }
    }

    /// The mark-done action offered for one pending instance of `task_id`.
    ///
    /// Recurring assignments share a task id, so `planned_date` is needed
    /// whenever more than one instance is pending.
    pub fn action_for(
        &self,
        task_id: &str,
        planned_date: Option<&str>,
    ) -> Result<MarkDoneAction, ActionLookup> {
        let mut offered: Vec<&MarkDoneAction> = self
            .view
            .tasks
            .iter()
            .filter_map(|card| card.mark_done.as_ref())
            .filter(|action| action.task_id == task_id)
            .collect();
        if let Some(date) = planned_date {
            offered.retain(|action| stats::same_planned_date(&action.planned_date, date));
        }

        match offered.as_slice() {
            [action] => Ok((*action).clone()),
            [] => Err(ActionLookup::NotPending {
                task_id: task_id.to_string(),
                planned_date: planned_date.map(str::to_string),
            }),
            several => Err(ActionLookup::Ambiguous {
                task_id: task_id.to_string(),
                planned_dates: several
                    .iter()
                    .map(|action| action.planned_date.clone())
                    .collect(),
            }),
        }
    }

    /// Confirms, marks the task done, then reloads tasks and performance.
    pub async fn mark_done(&mut self, action: &MarkDoneAction) -> MarkDone {
        let confirmed = self.notifier.confirm(
            "Confirm Task Completion",
            &format!(
                "Are you sure you want to mark \"{}\" as done?",
                action.task_id
            ),
        );
        if !confirmed {
            tracing::info!(task_id = %action.task_id, "mark done cancelled");
            self.notifier.info("Task completion cancelled.");
            return MarkDone::Cancelled;
        }

        let notifier = self.notifier;
        let _loader = notifier.acquire();
        let done = submit(
            notifier,
            "marking the task done",
            "Task marked as done!",
            self.service
                .mark_task_done(&self.session.email, &action.task_id, &action.planned_date),
        )
        .await;
        if !done {
            return MarkDone::Failed;
        }

        self.load_tasks().await;
        self.load_performance().await;
        MarkDone::Completed
    }
}
