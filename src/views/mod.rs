//! Page controllers.
//!
//! Each page runs `Idle -> Loading -> {Rendered, Failed}` for every refresh.
//! A refresh replaces the section it owns only when every call in it
//! succeeded; on failure the old content stays and one error toast is shown.

pub mod admin;
pub mod performance;
pub mod portal;

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;
use crate::notify::{Notifier, Surface};

/// How long a redirect waits so the toast that caused it stays readable.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Rendered,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Portal,
    Admin,
    Performance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub to: Page,
    pub delay: Duration,
}

impl Redirect {
    pub fn immediate(to: Page) -> Self {
        Self {
            to,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(to: Page) -> Self {
        Self {
            to,
            delay: REDIRECT_DELAY,
        }
    }
}

/// Result of entering a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Ready,
    Redirect(Redirect),
}

/// Runs one read sequence under the loader and records the state edge.
///
/// `what` names the section in notifications ("employees", "tasks").
pub(crate) async fn refresh<U, T, F>(
    notifier: &Notifier<U>,
    state: &mut ViewState,
    what: &str,
    load: F,
) -> Option<T>
where
    U: Surface,
    F: Future<Output = Result<T, ClientError>>,
{
    *state = ViewState::Loading;
    let _loader = notifier.acquire();
    match load.await {
        Ok(value) => {
            *state = ViewState::Rendered;
            Some(value)
        }
        Err(err) => {
            tracing::warn!(section = what, error = %err, "refresh failed");
            notifier.error(&err.user_message(
                Some(&format!("Failed to load {what}")),
                &format!("An error occurred while loading {what}."),
            ));
            *state = ViewState::Failed;
            None
        }
    }
}

/// Runs one mutation under the loader. Success shows the service's message
/// (or `confirmation`); failure shows the remote message verbatim.
pub(crate) async fn submit<U, F>(
    notifier: &Notifier<U>,
    doing: &str,
    confirmation: &str,
    mutation: F,
) -> bool
where
    U: Surface,
    F: Future<Output = Result<Option<String>, ClientError>>,
{
    let _loader = notifier.acquire();
    match mutation.await {
        Ok(message) => {
            notifier.success(message.as_deref().unwrap_or(confirmation));
            true
        }
        Err(err) => {
            tracing::warn!(operation = doing, error = %err, "mutation failed");
            notifier.error(&err.user_message(None, &format!("An error occurred while {doing}.")));
            false
        }
    }
}

/// First blank required field, if any.
pub(crate) fn missing_field<'a>(fields: &[(&'a str, &str)]) -> Option<&'a str> {
    fields
        .iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::client::TaskService;
    use crate::error::ClientError;
    use crate::models::{
        AssignmentForm, Employee, EmployeeForm, FilteredStat, PerformanceSummary, Role,
        StatsFilter, StatsSummary, TaskDefinition, TaskForm, TaskStatus, UserTask,
    };

    /// In-memory service that records the order of actions it receives.
    ///
    /// Queued failures are consumed by the next call of the matching action.
    pub struct FakeService {
        pub calls: Mutex<Vec<String>>,
        pub failures: Mutex<VecDeque<(&'static str, ClientError)>>,
        pub role: Mutex<Role>,
        pub employees: Mutex<Vec<Employee>>,
        pub tasks: Mutex<Vec<TaskDefinition>>,
        pub summaries: Mutex<Vec<StatsSummary>>,
        pub filtered: Mutex<Vec<FilteredStat>>,
        pub user_tasks: Mutex<Vec<UserTask>>,
        pub performance: Mutex<PerformanceSummary>,
        pub last_filter: Mutex<Option<StatsFilter>>,
    }

    impl Default for FakeService {
        fn default() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failures: Mutex::new(VecDeque::new()),
                role: Mutex::new(Role::Admin),
                employees: Mutex::new(vec![
                    employee("Asha Rao", "asha@example.com", "Sales"),
                    employee("Ravi Iyer", "ravi@example.com", "accounts"),
                    employee("Meena Das", "meena@example.com", "sales"),
                ]),
                tasks: Mutex::new(vec![TaskDefinition {
                    task_id: "T-1".to_string(),
                    task_name: "Close books".to_string(),
                    description: "Month end close".to_string(),
                }]),
                summaries: Mutex::new(vec![
                    StatsSummary {
                        total: 5,
                        on_time: 3,
                        late: 1,
                        pending: 1,
                    },
                    StatsSummary {
                        total: 2,
                        on_time: 0,
                        late: 0,
                        pending: 2,
                    },
                ]),
                filtered: Mutex::new(Vec::new()),
                user_tasks: Mutex::new(vec![
                    user_task("T-1", "Close books", TaskStatus::Pending),
                    user_task("T-2", "File GST", TaskStatus::OnTime),
                ]),
                performance: Mutex::new(PerformanceSummary {
                    total: 2,
                    on_time: 1,
                    late: 0,
                    pending: 1,
                    target_percent: 80.0,
                    achieved: 50.0,
                }),
                last_filter: Mutex::new(None),
            }
        }
    }

    pub fn employee(name: &str, email: &str, department: &str) -> Employee {
        Employee {
            name: name.to_string(),
            email: email.to_string(),
            department: department.to_string(),
        }
    }

    pub fn user_task(task_id: &str, task: &str, status: TaskStatus) -> UserTask {
        UserTask {
            task: task.to_string(),
            planned_date: "2025-06-01".to_string(),
            assigned_to: "asha@example.com".to_string(),
            status,
            task_id: task_id.to_string(),
        }
    }

    impl FakeService {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn reset_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        pub fn fail_next(&self, action: &'static str, message: Option<&str>) {
            self.failures.lock().unwrap().push_back((
                action,
                ClientError::Application {
                    message: message.map(str::to_string),
                },
            ));
        }

        pub fn fail_next_with(&self, action: &'static str, err: ClientError) {
            self.failures.lock().unwrap().push_back((action, err));
        }

        fn record(&self, action: &'static str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(action.to_string());
            let mut failures = self.failures.lock().unwrap();
            match failures.iter().position(|(name, _)| *name == action) {
                Some(index) => Err(failures.remove(index).map(|(_, err)| err).unwrap()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl TaskService for FakeService {
        async fn user_role(&self, _email: &str) -> Result<Role, ClientError> {
            self.record("getUserRole")?;
            Ok(self.role.lock().unwrap().clone())
        }

        async fn employees(&self) -> Result<Vec<Employee>, ClientError> {
            self.record("getAllEmployees")?;
            Ok(self.employees.lock().unwrap().clone())
        }

        async fn add_employee(&self, form: &EmployeeForm) -> Result<Option<String>, ClientError> {
            self.record("addEmployee")?;
            self.employees
                .lock()
                .unwrap()
                .push(employee(&form.name, &form.email, &form.department));
            Ok(Some("Employee added".to_string()))
        }

        async fn tasks(&self) -> Result<Vec<TaskDefinition>, ClientError> {
            self.record("getAllTasks")?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn add_task(&self, form: &TaskForm) -> Result<Option<String>, ClientError> {
            self.record("addTask")?;
            let mut tasks = self.tasks.lock().unwrap();
            let task_id = format!("T-{}", tasks.len() + 1);
            tasks.push(TaskDefinition {
                task_id,
                task_name: form.name.clone(),
                description: form.description.clone(),
            });
            Ok(Some("Task added".to_string()))
        }

        async fn assign_task(&self, _form: &AssignmentForm) -> Result<Option<String>, ClientError> {
            self.record("assignTask")?;
            Ok(Some("Task assigned".to_string()))
        }

        async fn stats_all(&self) -> Result<Vec<StatsSummary>, ClientError> {
            self.record("getStatsAll")?;
            Ok(self.summaries.lock().unwrap().clone())
        }

        async fn filtered_stats(
            &self,
            filter: &StatsFilter,
        ) -> Result<Vec<FilteredStat>, ClientError> {
            self.record("getFilteredStats")?;
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            Ok(self.filtered.lock().unwrap().clone())
        }

        async fn user_tasks(&self, _email: &str) -> Result<Vec<UserTask>, ClientError> {
            self.record("getUserTasks")?;
            Ok(self.user_tasks.lock().unwrap().clone())
        }

        async fn my_performance(&self, _email: &str) -> Result<PerformanceSummary, ClientError> {
            self.record("getMyPerformance")?;
            Ok(self.performance.lock().unwrap().clone())
        }

        async fn mark_task_done(
            &self,
            _email: &str,
            task_id: &str,
            planned_date: &str,
        ) -> Result<Option<String>, ClientError> {
            self.record("markTaskDone")?;
            for task in self.user_tasks.lock().unwrap().iter_mut() {
                if task.task_id == task_id && task.planned_date == planned_date {
                    task.status = TaskStatus::OnTime;
                }
            }
            Ok(Some("Marked".to_string()))
        }
    }
}
