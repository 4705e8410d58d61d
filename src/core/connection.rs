use crate::domain::model::ConnectionParams;
use crate::domain::ports::Company;
use crate::utils::error::Result;

/// Opens the session unless it is already open.
///
/// Returns whether the remote system accepted the credentials. A single
/// rejected attempt is final; the reason is left in
/// [`Company::last_error_description`].
pub async fn connect<C: Company>(company: &mut C, params: &ConnectionParams) -> Result<bool> {
    if company.is_connected() {
        tracing::debug!("Already connected to {}, skipping login", params.server);
        return Ok(true);
    }

    tracing::info!(
        "Logging in to {} ({}) as {} on company {}",
        params.server,
        params.server_kind,
        params.api_user,
        params.company_db
    );

    let status = company.connect(params).await?;
    if status != 0 {
        tracing::warn!(
            "Login rejected with status {}: {}",
            status,
            company.last_error_description()
        );
    }
    Ok(status == 0)
}

/// Closes the session if it is open. Failures are logged, never returned,
/// so the release step cannot mask the run's own outcome.
pub async fn disconnect<C: Company>(company: &mut C) {
    if !company.is_connected() {
        return;
    }

    if let Err(e) = company.disconnect().await {
        tracing::warn!("Logout failed, session released locally: {}", e);
    }
}
