//! Client for the action-dispatched task service.
//!
//! Every operation is a request against one endpoint URL. `action` selects the
//! server-side operation; GET calls carry it in the query string, POST calls
//! in a form-encoded body. Responses share one JSON envelope:
//! `{"status": "success" | "error", "message"?: ..., ...payload}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::models::{
    AssignmentForm, Employee, EmployeeForm, FilteredStat, PerformanceSummary, Role, StatsFilter,
    StatsSummary, TaskDefinition, TaskForm, UserTask,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Turns an error envelope into `ClientError::Application`.
    pub fn into_success(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Application {
                message: self.message,
            })
        }
    }

    /// Decodes one payload field. A missing or null field is malformed.
    pub fn field<T: DeserializeOwned>(
        &mut self,
        action: &str,
        field: &'static str,
    ) -> Result<T, ClientError> {
        match self.payload.remove(field) {
            Some(Value::Null) | None => Err(ClientError::MissingPayload {
                action: action.to_string(),
                field,
            }),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// Decodes the whole payload as one record.
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        Ok(serde_json::from_value(Value::Object(self.payload))?)
    }
}

/// The typed operations of the task service.
///
/// Implementations return `Err(ClientError::Application)` for error
/// envelopes; controllers never inspect `status` themselves.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn user_role(&self, email: &str) -> Result<Role, ClientError>;
    async fn employees(&self) -> Result<Vec<Employee>, ClientError>;
    async fn add_employee(&self, form: &EmployeeForm) -> Result<Option<String>, ClientError>;
    async fn tasks(&self) -> Result<Vec<TaskDefinition>, ClientError>;
    async fn add_task(&self, form: &TaskForm) -> Result<Option<String>, ClientError>;
    async fn assign_task(&self, form: &AssignmentForm) -> Result<Option<String>, ClientError>;
    async fn stats_all(&self) -> Result<Vec<StatsSummary>, ClientError>;
    async fn filtered_stats(&self, filter: &StatsFilter) -> Result<Vec<FilteredStat>, ClientError>;
    async fn user_tasks(&self, email: &str) -> Result<Vec<UserTask>, ClientError>;
    async fn my_performance(&self, email: &str) -> Result<PerformanceSummary, ClientError>;
    async fn mark_task_done(
        &self,
        email: &str,
        task_id: &str,
        planned_date: &str,
    ) -> Result<Option<String>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Sends one action and decodes the envelope without judging `status`.
    pub async fn call(
        &self,
        action: &str,
        params: &[(&str, String)],
        method: Method,
    ) -> Result<Envelope, ClientError> {
        let mut fields: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        fields.push(("action", action));
        fields.extend(params.iter().map(|(key, value)| (*key, value.as_str())));

        let request = match method {
            Method::Get => self.http.get(&self.endpoint).query(&fields),
            Method::Post => self.http.post(&self.endpoint).form(&fields),
        };

        tracing::debug!(action, ?method, "sending request");
        let response = request.send().await.map_err(|err| self.classify(err))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(action, status = status.as_u16(), "request failed");
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|err| self.classify(err))?;
        let envelope: Envelope = serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(action, error = %err, "response body is not a JSON envelope");
            ClientError::Decode(err)
        })?;
        tracing::debug!(action, status = %envelope.status, "received envelope");
        Ok(envelope)
    }

    async fn success(
        &self,
        action: &str,
        params: &[(&str, String)],
        method: Method,
    ) -> Result<Envelope, ClientError> {
        self.call(action, params, method).await?.into_success()
    }

    async fn mutate(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<Option<String>, ClientError> {
        Ok(self.success(action, params, Method::Post).await?.message)
    }

    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            tracing::warn!(timeout = ?self.timeout, "request timed out");
            ClientError::Timeout(self.timeout)
        } else {
            tracing::warn!(error = %err, "request failed");
            ClientError::Http(err)
        }
    }
}

#[async_trait]
impl TaskService for ApiClient {
    async fn user_role(&self, email: &str) -> Result<Role, ClientError> {
        let mut envelope = self
            .success("getUserRole", &[("email", email.to_string())], Method::Get)
            .await?;
        let role: String = envelope.field("getUserRole", "role")?;
        Ok(Role::from(role))
    }

    async fn employees(&self) -> Result<Vec<Employee>, ClientError> {
        let mut envelope = self.success("getAllEmployees", &[], Method::Get).await?;
        envelope.field("getAllEmployees", "employees")
    }

    async fn add_employee(&self, form: &EmployeeForm) -> Result<Option<String>, ClientError> {
        self.mutate(
            "addEmployee",
            &[
                ("name", form.name.clone()),
                ("email", form.email.clone()),
                ("department", form.department.clone()),
            ],
        )
        .await
    }

    async fn tasks(&self) -> Result<Vec<TaskDefinition>, ClientError> {
        let mut envelope = self.success("getAllTasks", &[], Method::Get).await?;
        envelope.field("getAllTasks", "tasks")
    }

    async fn add_task(&self, form: &TaskForm) -> Result<Option<String>, ClientError> {
        self.mutate(
            "addTask",
            &[
                ("name", form.name.clone()),
                ("description", form.description.clone()),
            ],
        )
        .await
    }

    async fn assign_task(&self, form: &AssignmentForm) -> Result<Option<String>, ClientError> {
        self.mutate(
            "assignTask",
            &[
                ("task", form.task.clone()),
                ("assignedTo", form.assigned_to.clone()),
                ("recurrence", form.recurrence.clone()),
                ("startDate", form.start_date.clone()),
            ],
        )
        .await
    }

    async fn stats_all(&self) -> Result<Vec<StatsSummary>, ClientError> {
        let mut envelope = self.success("getStatsAll", &[], Method::Get).await?;
        envelope.field("getStatsAll", "summary")
    }

    async fn filtered_stats(&self, filter: &StatsFilter) -> Result<Vec<FilteredStat>, ClientError> {
        let mut envelope = self
            .success("getFilteredStats", &filter.params(), Method::Get)
            .await?;
        envelope.field("getFilteredStats", "data")
    }

    async fn user_tasks(&self, email: &str) -> Result<Vec<UserTask>, ClientError> {
        let mut envelope = self
            .success("getUserTasks", &[("email", email.to_string())], Method::Get)
            .await?;
        envelope.field("getUserTasks", "tasks")
    }

    async fn my_performance(&self, email: &str) -> Result<PerformanceSummary, ClientError> {
        self.success("getMyPerformance", &[("email", email.to_string())], Method::Get)
            .await?
            .into_payload()
    }

    async fn mark_task_done(
        &self,
        email: &str,
        task_id: &str,
        planned_date: &str,
    ) -> Result<Option<String>, ClientError> {
        self.mutate(
            "markTaskDone",
            &[
                ("email", email.to_string()),
                ("taskID", task_id.to_string()),
                ("plannedDate", planned_date.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(format!("{}/exec", server.uri()), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn get_actions_travel_in_the_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getUserRole"))
            .and(query_param("email", "asha@example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "success", "role": "Admin" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let role = client.user_role("asha@example.com").await.unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[tokio::test]
    async fn post_actions_travel_in_a_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("action=markTaskDone"))
            .and(body_string_contains("taskID=T-4"))
            .and(body_string_contains("email=asha%40example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "success", "message": "Done" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let message = client
            .mark_task_done("asha@example.com", "T-4", "2025-06-01")
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("Done"));
    }

    #[tokio::test]
    async fn filtered_stats_only_sends_present_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getFilteredStats"))
            .and(query_param("department", "sales"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": [{
                    "name": "Asha", "email": "asha@example.com", "department": "Sales",
                    "total": 4, "onTime": 3, "late": 1, "pending": 0,
                    "percent": 75, "level": "Good"
                }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let filter = StatsFilter {
            department: Some("sales".to_string()),
            ..StatsFilter::default()
        };
        let rows = client.filtered_stats(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].on_time, 3);
        assert_eq!(rows[0].percent, 75.0);

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(!query.contains("level="));
    }

    #[tokio::test]
    async fn error_envelopes_become_application_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "status": "error", "message": "Task name already used" }),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .add_task(&TaskForm {
                name: "Close books".to_string(),
                description: "Month end".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_application());
        assert_eq!(err.remote_message(), Some("Task name already used"));
    }

    #[tokio::test]
    async fn non_json_bodies_are_transport_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Sign in</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.employees().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn success_without_payload_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.tasks().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingPayload { field: "tasks", .. }
        ));
    }

    #[tokio::test]
    async fn server_errors_are_reported_by_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.stats_all().await.unwrap_err();
        assert!(matches!(err, ClientError::Status(503)));
    }

    #[tokio::test]
    async fn slow_responses_hit_the_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "success", "summary": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            ApiClient::new(format!("{}/exec", server.uri()), Duration::from_millis(100)).unwrap();
        let err = client.stats_all().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
    }

    #[tokio::test]
    async fn performance_decodes_from_the_envelope_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getMyPerformance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "total": 10, "onTime": 7, "late": 2, "pending": 1,
                "targetPercent": 80, "achieved": 70
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let perf = client.my_performance("asha@example.com").await.unwrap();
        assert_eq!(perf.on_time, 7);
        assert_eq!(perf.target_percent, 80.0);
        assert_eq!(perf.achieved, 70.0);
    }
}
