use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

mod client;
mod config;
mod error;
mod models;
mod notify;
mod render;
mod session;
mod stats;
mod views;

use client::ApiClient;
use config::Config;
use models::{AssignmentForm, EmployeeForm, StatsFilter, TaskForm};
use notify::{ConsoleSurface, Notifier};
use session::{Session, SessionStore};
use views::admin::AdminDashboard;
use views::performance::PerformancePage;
use views::portal::Portal;
use views::{Entry, Page};

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "Task assignment and performance tracker client", long_about = None)]
struct Cli {
    /// Print view data as JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    /// Confirm prompts without asking
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an identity token and open the page for your role
    Login {
        #[arg(long)]
        credential: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the admin dashboard
    Admin,
    /// Add an employee (admin)
    AddEmployee {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        department: String,
    },
    /// Add a task definition (admin)
    AddTask {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Assign a task to an employee (admin)
    Assign {
        #[arg(long)]
        task: String,
        #[arg(long)]
        assigned_to: String,
        #[arg(long)]
        recurrence: String,
        #[arg(long)]
        start_date: NaiveDate,
    },
    /// Filter per-employee performance stats (admin)
    Stats {
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Also write the rows to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show your tasks and performance
    Performance,
    /// Mark one of your pending tasks as done
    MarkDone {
        #[arg(long)]
        task_id: String,
        /// Planned date of the instance; needed when several are pending
        #[arg(long)]
        planned_date: Option<String>,
    },
}

struct MarkDoneRequest {
    task_id: String,
    planned_date: Option<String>,
}

enum AdminAction {
    AddEmployee(EmployeeForm),
    AddTask(TaskForm),
    Assign(AssignmentForm),
    Filter {
        filter: StatsFilter,
        csv: Option<PathBuf>,
    },
}

struct App {
    client: ApiClient,
    notifier: Notifier<ConsoleSurface>,
    config: Config,
    json: bool,
}

impl App {
    fn emit<T: Serialize>(&self, view: &T, text: impl Fn(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(view)?);
        } else {
            print!("{}", text(view));
        }
        Ok(())
    }

    async fn navigate(
        &self,
        session: &Session,
        mut page: Page,
        mut admin_action: Option<AdminAction>,
        mut mark_done: Option<MarkDoneRequest>,
    ) -> anyhow::Result<()> {
        loop {
            let entry = match page {
                Page::Admin => self.admin(session, admin_action.take()).await?,
                Page::Performance => self.performance(session, mark_done.take()).await?,
                Page::Portal => {
                    eprintln!("Not signed in. Run `taskflow login --credential <token>`.");
                    return Ok(());
                }
            };

            match entry {
                Entry::Ready => return Ok(()),
                Entry::Redirect(redirect) => {
                    tokio::time::sleep(redirect.delay).await;
                    tracing::info!(from = ?page, to = ?redirect.to, "redirecting");
                    page = redirect.to;
                }
            }
        }
    }

    async fn admin(&self, session: &Session, action: Option<AdminAction>) -> anyhow::Result<Entry> {
        let mut page = AdminDashboard::new(&self.client, &self.notifier, session);
        if let Entry::Redirect(redirect) = page.enter().await {
            return Ok(Entry::Redirect(redirect));
        }

        let mut csv_out = None;
        match action {
            Some(AdminAction::AddEmployee(mut form)) => {
                page.add_employee(&mut form).await;
            }
            Some(AdminAction::AddTask(mut form)) => {
                page.add_task(&mut form).await;
            }
            Some(AdminAction::Assign(mut form)) => {
                page.assign_task(&mut form).await;
            }
            Some(AdminAction::Filter { filter, csv }) => {
                let loaded = if filter.is_empty() {
                    page.clear_filter().await
                } else {
                    page.apply_filter(filter).await
                };
                if loaded {
                    csv_out = csv;
                }
            }
            None => {}
        }

        tracing::debug!(state = ?page.state(), "admin dashboard rendered");
        if let Some(path) = csv_out {
            render::write_filtered_csv(&page.view().filtered, &path)?;
            eprintln!("Filtered stats written to {}.", path.display());
        }
        self.emit(page.view(), render::admin_text)?;
        Ok(Entry::Ready)
    }

    async fn performance(
        &self,
        session: &Session,
        mark_done: Option<MarkDoneRequest>,
    ) -> anyhow::Result<Entry> {
        let mut page =
            PerformancePage::new(&self.client, &self.notifier, session, &self.config.card_classes);
        if let Entry::Redirect(redirect) = page.enter().await {
            return Ok(Entry::Redirect(redirect));
        }

        if let Some(request) = mark_done {
            match page.action_for(&request.task_id, request.planned_date.as_deref()) {
                Ok(action) => {
                    page.mark_done(&action).await;
                }
                Err(err) => self.notifier.error(&err.to_string()),
            }
        }

        tracing::debug!(state = ?page.state(), "performance page rendered");
        self.emit(page.view(), render::performance_text)?;
        Ok(Entry::Ready)
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let store = SessionStore::new(&config.session_file);

    if let Commands::Logout = cli.command {
        if store.clear()? {
            println!("Signed out.");
        } else {
            println!("No session to clear.");
        }
        return Ok(());
    }

    let client = ApiClient::new(config.api_url()?, config.timeout)
        .context("failed to build HTTP client")?;
    let app = App {
        client,
        notifier: Notifier::new(ConsoleSurface::new(cli.yes)),
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::Login { credential } => {
            let mut session = Session::default();
            let signed_in = Portal::new(&app.client, &app.notifier)
                .sign_in(&credential, &mut session)
                .await;
            if session.is_authenticated() {
                store.save(&session)?;
            }
            if let Ok(page) = signed_in {
                app.navigate(&session, page, None, None).await?;
            }
        }
        Commands::Logout => {}
        Commands::Admin => {
            let session = store.load()?;
            app.navigate(&session, Page::Admin, None, None).await?;
        }
        Commands::AddEmployee {
            name,
            email,
            department,
        } => {
            let session = store.load()?;
            let form = EmployeeForm {
                name,
                email,
                department,
            };
            app.navigate(&session, Page::Admin, Some(AdminAction::AddEmployee(form)), None)
                .await?;
        }
        Commands::AddTask { name, description } => {
            let session = store.load()?;
            let form = TaskForm { name, description };
            app.navigate(&session, Page::Admin, Some(AdminAction::AddTask(form)), None)
                .await?;
        }
        Commands::Assign {
            task,
            assigned_to,
            recurrence,
            start_date,
        } => {
            let session = store.load()?;
            let form = AssignmentForm {
                task,
                assigned_to,
                recurrence,
                start_date: start_date.to_string(),
            };
            app.navigate(&session, Page::Admin, Some(AdminAction::Assign(form)), None)
                .await?;
        }
        Commands::Stats {
            department,
            level,
            from,
            to,
            csv,
        } => {
            let session = store.load()?;
            let filter = StatsFilter {
                department: department.map(|d| d.to_lowercase()),
                level,
                from: from.map(|d| d.to_string()),
                to: to.map(|d| d.to_string()),
            };
            let action = AdminAction::Filter { filter, csv };
            app.navigate(&session, Page::Admin, Some(action), None).await?;
        }
        Commands::Performance => {
            let session = store.load()?;
            app.navigate(&session, Page::Performance, None, None).await?;
        }
        Commands::MarkDone {
            task_id,
            planned_date,
        } => {
            let session = store.load()?;
            let request = MarkDoneRequest {
                task_id,
                planned_date,
            };
            app.navigate(&session, Page::Performance, None, Some(request))
                .await?;
        }
    }

    Ok(())
}
