use serde::Serialize;

use crate::client::TaskService;
use crate::error::ClientError;
use crate::models::{
    AssignmentForm, Employee, EmployeeForm, FilteredStat, Role, StatsFilter, StatsSummary,
    TaskDefinition, TaskForm,
};
use crate::notify::{Notifier, Surface};
use crate::session::Session;
use crate::stats::{self, SelectOption};
use crate::views::{missing_field, refresh, submit, Entry, Page, Redirect, ViewState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRow {
    pub name: String,
    pub email: String,
    pub department: String,
}

impl From<Employee> for EmployeeRow {
    fn from(employee: Employee) -> Self {
        Self {
            name: employee.name,
            email: employee.email,
            department: employee.department,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub task_id: String,
    pub task_name: String,
    pub description: String,
}

impl From<TaskDefinition> for TaskRow {
    fn from(task: TaskDefinition) -> Self {
        Self {
            task_id: task.task_id,
            task_name: task.task_name,
            description: task.description,
        }
    }
}

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub user_name: String,
    pub employees: Vec<EmployeeRow>,
    pub tasks: Vec<TaskRow>,
    pub task_options: Vec<SelectOption>,
    pub employee_options: Vec<SelectOption>,
    pub global: Option<StatsSummary>,
    pub departments: Vec<SelectOption>,
    pub filtered: Vec<FilteredStat>,
    /// Filter the `filtered` rows were loaded with.
    pub filter: StatsFilter,
}

pub struct AdminDashboard<'a, S: TaskService, U: Surface> {
    service: &'a S,
    notifier: &'a Notifier<U>,
    session: &'a Session,
    state: ViewState,
    view: AdminView,
}

impl<'a, S: TaskService, U: Surface> AdminDashboard<'a, S, U> {
    pub fn new(service: &'a S, notifier: &'a Notifier<U>, session: &'a Session) -> Self {
        Self {
            service,
            notifier,
            session,
            state: ViewState::Idle,
            view: AdminView::default(),
        }
    }

    pub fn view(&self) -> &AdminView {
        &self.view
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Verifies the admin role, then loads every section in order.
    pub async fn enter(&mut self) -> Entry {
        if !self.session.is_authenticated() {
            return Entry::Redirect(Redirect::immediate(Page::Portal));
        }

        let notifier = self.notifier;
        let _loader = notifier.acquire();
        match self.service.user_role(&self.session.email).await {
            Ok(Role::Admin) => {}
            Ok(role) => {
                tracing::info!(email = %self.session.email, %role, "admin access denied");
                self.notifier
                    .error("Access Denied: You are not authorized to view this page.");
                return Entry::Redirect(Redirect::delayed(Page::Performance));
            }
            Err(err) if err.is_application() => {
                tracing::info!(email = %self.session.email, error = %err, "admin role rejected");
                self.notifier.error(&err.user_message(
                    None,
                    "Access Denied: You are not authorized to view this page.",
                ));
                return Entry::Redirect(Redirect::delayed(Page::Performance));
            }
            Err(err) => {
                tracing::warn!(error = %err, "admin role lookup failed");
                self.notifier
                    .error("An error occurred during authorization. Please try again.");
                return Entry::Redirect(Redirect::delayed(Page::Portal));
            }
        }

        self.view.user_name = self.session.greeting_name("Admin").to_string();
        self.load_employees().await;
        self.load_tasks().await;
        self.populate_dropdowns().await;
        self.load_global_performance().await;
        self.populate_department_filter().await;
        self.load_filtered_stats(StatsFilter::default()).await;
        Entry::Ready
    }

    pub async fn load_employees(&mut self) -> bool {
        let loaded = refresh(
            self.notifier,
            &mut self.state,
            "employees",
            self.service.employees(),
        )
        .await;
        match loaded {
            Some(employees) => {
                self.view.employees = employees.into_iter().map(EmployeeRow::from).collect();
                true
            }
            None => false,
        }
    }

    pub async fn load_tasks(&mut self) -> bool {
        let loaded = refresh(self.notifier, &mut self.state, "tasks", self.service.tasks()).await;
        match loaded {
            Some(tasks) => {
                self.view.tasks = tasks.into_iter().map(TaskRow::from).collect();
                true
            }
            None => false,
        }
    }

    /// Assignment dropdowns. Tasks are always fetched before employees.
    pub async fn populate_dropdowns(&mut self) -> bool {
        let service = self.service;
        let loaded = refresh(self.notifier, &mut self.state, "dropdowns", async move {
            let tasks = service.tasks().await?;
            let employees = service.employees().await?;
            Ok::<_, ClientError>((tasks, employees))
        })
        .await;

        let Some((tasks, employees)) = loaded else {
            return false;
        };
        self.view.task_options = tasks
            .into_iter()
            .map(|task| SelectOption {
                label: format!("{} - {}", task.task_id, task.task_name),
                value: task.task_id,
            })
            .collect();
        self.view.employee_options = employees
            .into_iter()
            .map(|employee| SelectOption {
                label: format!("{} ({})", employee.name, employee.email),
                value: employee.email,
            })
            .collect();
        true
    }

    pub async fn load_global_performance(&mut self) -> bool {
        let loaded = refresh(
            self.notifier,
            &mut self.state,
            "global performance stats",
            self.service.stats_all(),
        )
        .await;
        match loaded {
            Some(summaries) => {
                self.view.global = Some(stats::aggregate(&summaries));
                true
            }
            None => false,
        }
    }

    pub async fn populate_department_filter(&mut self) -> bool {
        let loaded = refresh(
            self.notifier,
            &mut self.state,
            "departments for filter",
            self.service.employees(),
        )
        .await;
        match loaded {
            Some(employees) => {
                self.view.departments = stats::department_options(&employees);
                true
            }
            None => false,
        }
    }

    pub async fn load_filtered_stats(&mut self, filter: StatsFilter) -> bool {
        let loaded = refresh(
            self.notifier,
            &mut self.state,
            "filtered stats",
            self.service.filtered_stats(&filter),
        )
        .await;
        match loaded {
            Some(rows) => {
                self.view.filtered = rows;
                self.view.filter = filter;
                true
            }
            None => false,
        }
    }

    pub async fn apply_filter(&mut self, filter: StatsFilter) -> bool {
        self.load_filtered_stats(filter).await
    }

    pub async fn clear_filter(&mut self) -> bool {
        self.load_filtered_stats(StatsFilter::default()).await
    }

    /// Adds an employee; on success resets `form` and reloads the employee
    /// list, the dropdowns and the department filter.
    pub async fn add_employee(&mut self, form: &mut EmployeeForm) -> bool {
        if self.reject_blank(&[
            ("Name", form.name.as_str()),
            ("Email", form.email.as_str()),
            ("Department", form.department.as_str()),
        ]) {
            return false;
        }

        let notifier = self.notifier;
        let _loader = notifier.acquire();
        let added = submit(
            self.notifier,
            "adding the employee",
            "Employee added.",
            self.service.add_employee(form),
        )
        .await;
        if !added {
            return false;
        }

        *form = EmployeeForm::default();
        self.load_employees().await;
        self.populate_dropdowns().await;
        self.populate_department_filter().await;
        true
    }

    /// Adds a task definition; on success resets `form` and reloads the task
    /// list and the dropdowns.
    pub async fn add_task(&mut self, form: &mut TaskForm) -> bool {
        if self.reject_blank(&[("Task name", form.name.as_str())]) {
            return false;
        }

        let notifier = self.notifier;
        let _loader = notifier.acquire();
        let added = submit(
            self.notifier,
            "adding the task",
            "Task added.",
            self.service.add_task(form),
        )
        .await;
        if !added {
            return false;
        }

        *form = TaskForm::default();
        self.load_tasks().await;
        self.populate_dropdowns().await;
        true
    }

    /// Assigns a task. Nothing is reloaded: assignments are not shown here.
    pub async fn assign_task(&mut self, form: &mut AssignmentForm) -> bool {
        if self.reject_blank(&[
            ("Task", form.task.as_str()),
            ("Assigned to", form.assigned_to.as_str()),
            ("Recurrence", form.recurrence.as_str()),
            ("Start date", form.start_date.as_str()),
        ]) {
            return false;
        }

        let assigned = submit(
            self.notifier,
            "assigning the task",
            "Task assigned.",
            self.service.assign_task(form),
        )
        .await;
        if assigned {
            *form = AssignmentForm::default();
        }
        assigned
    }

    fn reject_blank(&self, fields: &[(&str, &str)]) -> bool {
        match missing_field(fields) {
            Some(field) => {
                self.notifier.error(&format!("{field} is required."));
                true
            }
            None => false,
        }
    }
}
