use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use model::{
    ids::{AssignmentId, StudentId, TemplateId, TrainingId},
    template::{AssignedStudent, NewTemplate, TemplatePatch, TrainingTemplate},
    training::{AttendanceStatus, NewRealTraining, RealTraining, RealTrainingPatch, StudentTraining},
    training_type::TrainingType,
    user::Trainer,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::{
    backend::{ApiError, ScheduleBackend},
    cache::RealTrainingsQuery,
};

#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl RestBackend {
    pub fn new(base: Url, token: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(RestBackend {
            client,
            base: with_trailing_slash(base),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.base.join(path)?;
        debug!("{} {}", method, url);
        let request = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = check(request.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        check(request.send().await?).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path)?).await
    }

    async fn with_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(method, path)?.json(body)).await
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

/// Extracts `detail` from an error body; plain text bodies are taken as is.
fn error_detail(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        },
        Ok(_) => None,
        Err(_) => Some(body.trim().to_owned()),
    }
}

#[async_trait]
impl ScheduleBackend for RestBackend {
    async fn list_training_templates(&self) -> Result<Vec<TrainingTemplate>, ApiError> {
        self.get("training_templates/").await
    }

    async fn list_real_trainings(
        &self,
        query: &RealTrainingsQuery,
    ) -> Result<Vec<RealTraining>, ApiError> {
        let mut params = vec![
            ("start_date", query.start_date.to_string()),
            ("end_date", query.end_date.to_string()),
            ("with_students", query.with_students.to_string()),
        ];
        if let Some(trainer_id) = query.trainer_id {
            params.push(("trainer_id", trainer_id.to_string()));
        }
        let request = self.request(Method::GET, "real_trainings/")?.query(&params);
        self.send(request).await
    }

    async fn list_trainers(&self) -> Result<Vec<Trainer>, ApiError> {
        self.get("trainers/").await
    }

    async fn list_training_types(&self) -> Result<Vec<TrainingType>, ApiError> {
        self.get("training_types/").await
    }

    async fn update_student_attendance(
        &self,
        training_id: TrainingId,
        student_id: StudentId,
        status: AttendanceStatus,
    ) -> Result<StudentTraining, ApiError> {
        self.with_body(
            Method::PUT,
            &format!("real_trainings/{}/students/{}/attendance", training_id, student_id),
            &json!({ "status": status }),
        )
        .await
    }

    async fn create_training_template(
        &self,
        template: &NewTemplate,
    ) -> Result<TrainingTemplate, ApiError> {
        self.with_body(Method::POST, "training_templates/", template)
            .await
    }

    async fn create_real_training(
        &self,
        training: &NewRealTraining,
    ) -> Result<RealTraining, ApiError> {
        self.with_body(Method::POST, "real_trainings/", training).await
    }

    async fn update_template(
        &self,
        id: TemplateId,
        patch: &TemplatePatch,
    ) -> Result<TrainingTemplate, ApiError> {
        self.with_body(Method::PATCH, &format!("training_templates/{}", id), patch)
            .await
    }

    async fn update_real_training(
        &self,
        id: TrainingId,
        patch: &RealTrainingPatch,
    ) -> Result<RealTraining, ApiError> {
        self.with_body(Method::PATCH, &format!("real_trainings/{}", id), patch)
            .await
    }

    async fn delete_template(&self, id: TemplateId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("training_templates/{}", id))?;
        self.send_empty(request).await
    }

    async fn cancel_real_training(
        &self,
        id: TrainingId,
        reason: Option<&str>,
    ) -> Result<RealTraining, ApiError> {
        self.with_body(
            Method::POST,
            &format!("real_trainings/{}/cancel", id),
            &json!({ "reason": reason }),
        )
        .await
    }

    async fn assign_student_to_template(
        &self,
        template_id: TemplateId,
        student_id: StudentId,
        start_date: NaiveDate,
    ) -> Result<AssignedStudent, ApiError> {
        self.with_body(
            Method::POST,
            &format!("training_templates/{}/students/", template_id),
            &json!({ "student_id": student_id, "start_date": start_date }),
        )
        .await
    }

    async fn unassign_student_from_template(
        &self,
        template_id: TemplateId,
        assignment_id: AssignmentId,
    ) -> Result<(), ApiError> {
        let request = self.request(
            Method::DELETE,
            &format!("training_templates/{}/students/{}", template_id, assignment_id),
        )?;
        self.send_empty(request).await
    }
}
