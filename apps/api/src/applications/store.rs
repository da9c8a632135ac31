//! Caller-owned list of applications, whichever way it was fetched.

use serde::Serialize;

use crate::applications::{
    create_application, fetch_company_applications, fetch_job_applications,
    fetch_user_applications, update_application_status,
};
use crate::errors::AppError;
use crate::gateway::DataGateway;
use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::tracked::Tracked;

/// Held applications bucketed by status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusGroups {
    pub pending: Vec<ApplicationRow>,
    pub reviewed: Vec<ApplicationRow>,
    pub interview: Vec<ApplicationRow>,
    pub accepted: Vec<ApplicationRow>,
    pub rejected: Vec<ApplicationRow>,
}

impl StatusGroups {
    pub fn counts(&self) -> StatusCounts {
        StatusCounts {
            pending: self.pending.len(),
            reviewed: self.reviewed.len(),
            interview: self.interview.len(),
            accepted: self.accepted.len(),
            rejected: self.rejected.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub reviewed: usize,
    pub interview: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Default)]
pub struct ApplicationBoard {
    pub applications: Tracked<Vec<ApplicationRow>>,
}

impl ApplicationBoard {
    pub async fn fetch_for_user(
        &mut self,
        gateway: &dyn DataGateway,
        user_id: &str,
    ) -> Result<&[ApplicationRow], AppError> {
        self.applications.data = self
            .applications
            .track(fetch_user_applications(gateway, user_id))
            .await?;
        Ok(&self.applications.data)
    }

    pub async fn fetch_for_job(
        &mut self,
        gateway: &dyn DataGateway,
        job_id: &str,
    ) -> Result<&[ApplicationRow], AppError> {
        self.applications.data = self
            .applications
            .track(fetch_job_applications(gateway, job_id))
            .await?;
        Ok(&self.applications.data)
    }

    pub async fn fetch_for_company(
        &mut self,
        gateway: &dyn DataGateway,
        company_id: &str,
    ) -> Result<&[ApplicationRow], AppError> {
        self.applications.data = self
            .applications
            .track(fetch_company_applications(gateway, company_id))
            .await?;
        Ok(&self.applications.data)
    }

    /// Submits and prepends the new application to the held list.
    pub async fn submit(
        &mut self,
        gateway: &dyn DataGateway,
        application: &NewApplication,
    ) -> Result<ApplicationRow, AppError> {
        let created = self
            .applications
            .track(create_application(gateway, application))
            .await?;
        self.applications.data.insert(0, created.clone());
        Ok(created)
    }

    /// Updates the remote status, then the held copy with the same id.
    /// Embedded job and applicant survive the patch.
    pub async fn set_status(
        &mut self,
        gateway: &dyn DataGateway,
        application_id: &str,
        status: ApplicationStatus,
    ) -> Result<ApplicationRow, AppError> {
        let updated = self
            .applications
            .track(update_application_status(gateway, application_id, status))
            .await?;
        if let Some(held) = self
            .applications
            .data
            .iter_mut()
            .find(|app| app.id == updated.id)
        {
            held.status = updated.status;
            held.updated_at = updated.updated_at;
        }
        Ok(updated)
    }

    pub fn with_status(&self, status: ApplicationStatus) -> Vec<ApplicationRow> {
        self.applications
            .data
            .iter()
            .filter(|app| app.status == status)
            .cloned()
            .collect()
    }

    pub fn grouped(&self) -> StatusGroups {
        StatusGroups {
            pending: self.with_status(ApplicationStatus::Pending),
            reviewed: self.with_status(ApplicationStatus::Reviewed),
            interview: self.with_status(ApplicationStatus::Interview),
            accepted: self.with_status(ApplicationStatus::Accepted),
            rejected: self.with_status(ApplicationStatus::Rejected),
        }
    }

    pub fn clear(&mut self) {
        self.applications = Default::default();
    }

    pub fn clear_error(&mut self) {
        self.applications.clear_error();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::gateway::tables;
    use serde_json::json;

    fn seeded() -> MemoryGateway {
        let gateway = MemoryGateway::new();
        gateway.seed(
            tables::APPLICATIONS,
            vec![
                json!({"id": "a1", "user_id": "u1", "job_id": "j1", "status": "pending",
                       "applied_at": "2024-03-01T09:00:00Z"}),
                json!({"id": "a2", "user_id": "u1", "job_id": "j2", "status": "interview",
                       "applied_at": "2024-03-02T09:00:00Z"}),
                json!({"id": "a3", "user_id": "u1", "job_id": "j3", "status": "pending",
                       "applied_at": "2024-03-03T09:00:00Z"}),
            ],
        );
        gateway
    }

    #[tokio::test]
    async fn test_groups_follow_status_changes() {
        let gateway = seeded();
        let mut board = ApplicationBoard::default();
        board.fetch_for_user(&gateway, "u1").await.unwrap();

        let groups = board.grouped();
        assert_eq!(groups.pending.len(), 2);
        assert_eq!(groups.interview.len(), 1);
        assert!(groups.accepted.is_empty());

        board
            .set_status(&gateway, "a1", ApplicationStatus::Accepted)
            .await
            .unwrap();
        let groups = board.grouped();
        assert_eq!(groups.pending.len(), 1);
        assert_eq!(groups.accepted[0].id, "a1");
        assert!(groups.accepted[0].updated_at.is_some());
        assert_eq!(
            groups.counts(),
            StatusCounts {
                pending: 1,
                interview: 1,
                accepted: 1,
                ..StatusCounts::default()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_newest_first() {
        let gateway = seeded();
        let mut board = ApplicationBoard::default();
        let ids: Vec<String> = board
            .fetch_for_user(&gateway, "u1")
            .await
            .unwrap()
            .iter()
            .map(|app| app.id.clone())
            .collect();
        assert_eq!(ids, vec!["a3", "a2", "a1"]);
    }

    #[tokio::test]
    async fn test_submit_prepends_and_failure_is_recorded() {
        let gateway = MemoryGateway::new();
        let mut board = ApplicationBoard::default();
        let application = NewApplication {
            user_id: "u1".to_string(),
            job_id: "j1".to_string(),
            cover_letter: None,
            resume_url: None,
        };
        board.submit(&gateway, &application).await.unwrap();
        assert_eq!(board.applications.data.len(), 1);

        gateway.fail_on(tables::APPLICATIONS);
        assert!(board.submit(&gateway, &application).await.is_err());
        assert!(board.applications.last_error.is_some());
        assert_eq!(board.applications.data.len(), 1);

        board.clear_error();
        assert!(board.applications.last_error.is_none());
        board.clear();
        assert!(board.applications.data.is_empty());
    }
}
