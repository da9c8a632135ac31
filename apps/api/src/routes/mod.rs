pub mod health;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::guards::{self, require_auth, require_guest, require_recruiter};
use crate::jobs::handlers as jobs;
use crate::preferences;
use crate::profiles::handlers as profiles;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        .route("/api/v1/jobs/search", get(jobs::handle_search_jobs))
        .route("/api/v1/jobs/:id", get(jobs::handle_get_job))
        .route("/api/v1/categories", get(jobs::handle_list_categories))
        .route("/api/v1/categories/:id", get(jobs::handle_get_category))
        .route("/api/v1/auth/session", get(session::handle_get_session))
        .route(
            "/api/v1/auth/reset-password",
            post(session::handle_reset_password),
        )
        .route("/api/v1/auth/refresh", post(session::handle_refresh))
        .route(
            "/api/v1/navigation/check",
            post(guards::handle_navigation_check),
        )
        .route(
            "/api/v1/preferences/theme",
            get(preferences::handle_get_theme),
        )
        .route(
            "/api/v1/preferences/theme/toggle",
            post(preferences::handle_toggle_theme),
        );

    let guest = Router::new()
        .route("/api/v1/auth/signup", post(session::handle_sign_up))
        .route("/api/v1/auth/signin", post(session::handle_sign_in))
        .route_layer(from_fn_with_state(state.clone(), require_guest));

    let signed_in = Router::new()
        .route("/api/v1/auth/signout", post(session::handle_sign_out))
        .route(
            "/api/v1/profile",
            get(profiles::handle_get_profile).patch(profiles::handle_update_profile),
        )
        .route(
            "/api/v1/applications",
            post(applications::handle_apply),
        )
        .route(
            "/api/v1/applications/mine",
            get(applications::handle_my_applications),
        )
        .route(
            "/api/v1/applications/check",
            get(applications::handle_check_application),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let recruiter = Router::new()
        .route(
            "/api/v1/recruiter/jobs",
            get(jobs::handle_company_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/recruiter/jobs/:id",
            get(jobs::handle_get_managed_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route(
            "/api/v1/recruiter/jobs/:id/status",
            patch(jobs::handle_update_job_status),
        )
        .route(
            "/api/v1/recruiter/jobs/:id/applications",
            get(applications::handle_job_applications),
        )
        .route(
            "/api/v1/recruiter/applications",
            get(applications::handle_company_applications),
        )
        .route(
            "/api/v1/recruiter/applications/:id/status",
            patch(applications::handle_update_application_status),
        )
        .route_layer(from_fn_with_state(state.clone(), require_recruiter));

    Router::new()
        .merge(public)
        .merge(guest)
        .merge(signed_in)
        .merge(recruiter)
        .with_state(state)
}
