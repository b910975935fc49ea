//! VI/JSON HTTP session.
//!
//! Every managed object is addressed as
//! `https://{host}:{port}/sdk/vim25/{release}/{Type}/{id}/{property|method}`;
//! properties are read with GET and methods are invoked with POST. The
//! session token travels in the `vmware-api-session-id` header.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::wire::{FaultBody, LoginRequest, MoRef, ServiceContent};
use crate::config::VsphereConfig;
use crate::error::VmhwError;

const SESSION_HEADER: &str = "vmware-api-session-id";

/// Property reads and method calls on managed objects.
#[allow(async_fn_in_trait)] // trait is internal-only
pub trait ManagedObjects {
    /// Read one property of a managed object.
    async fn get<T: DeserializeOwned>(
        &self,
        object: &MoRef,
        property: &str,
    ) -> Result<T, VmhwError>;

    /// Invoke a method with a JSON body.
    async fn invoke<B: Serialize, T: DeserializeOwned>(
        &self,
        object: &MoRef,
        method: &str,
        body: &B,
    ) -> Result<T, VmhwError>;
}

pub struct VimSession {
    client: Client,
    base_url: String,
    host: String,
    session_id: Option<String>,
}

impl VimSession {
    /// Build the HTTP client. No request is made until the first call.
    pub fn new(config: &VsphereConfig) -> Result<Self, VmhwError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VmhwError::Connection {
                host: config.host.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url(config),
            host: config.host.clone(),
            session_id: None,
        })
    }

    pub async fn service_content(&self) -> Result<ServiceContent, VmhwError> {
        let service = MoRef {
            kind: "ServiceInstance".into(),
            value: "ServiceInstance".into(),
        };
        self.get(&service, "content").await
    }

    pub async fn login(
        &mut self,
        session_manager: &MoRef,
        user: &str,
        password: &str,
    ) -> Result<(), VmhwError> {
        let url = self.url(session_manager, "Login");
        let body = LoginRequest {
            user_name: user,
            password,
        };
        let resp = self.send(self.client.post(&url).json(&body)).await?;

        let session_id = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| VmhwError::Parse {
                context: "SessionManager.Login".into(),
                message: format!("response carried no {SESSION_HEADER} header"),
            })?;

        tracing::debug!(host = %self.host, user, "logged in");
        self.session_id = Some(session_id);
        Ok(())
    }

    /// End the session. Failures are logged and otherwise ignored.
    pub async fn logout(&mut self, session_manager: &MoRef) {
        if self.session_id.is_none() {
            return;
        }
        if let Err(e) = self.post_empty(session_manager, "Logout").await {
            tracing::debug!(error = %e, "logout failed");
        }
        self.session_id = None;
    }

    /// Invoke a method that takes no arguments and returns nothing.
    pub async fn post_empty(&self, object: &MoRef, method: &str) -> Result<(), VmhwError> {
        let url = self.url(object, method);
        self.send(self.authed(self.client.post(&url))).await?;
        Ok(())
    }

    fn url(&self, object: &MoRef, member: &str) -> String {
        format!("{}/{}/{}/{member}", self.base_url, object.kind, object.value)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session_id.as_deref() {
            Some(sid) => req.header(SESSION_HEADER, sid),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, VmhwError> {
        let resp = req.send().await.map_err(|e| VmhwError::Connection {
            host: self.host.clone(),
            message: e.to_string(),
        })?;
        check_status(resp).await
    }
}

impl ManagedObjects for VimSession {
    async fn get<T: DeserializeOwned>(
        &self,
        object: &MoRef,
        property: &str,
    ) -> Result<T, VmhwError> {
        let url = self.url(object, property);
        let resp = self.send(self.authed(self.client.get(&url))).await?;
        parse_response(resp, &format!("{}.{property}", object.kind)).await
    }

    async fn invoke<B: Serialize, T: DeserializeOwned>(
        &self,
        object: &MoRef,
        method: &str,
        body: &B,
    ) -> Result<T, VmhwError> {
        let url = self.url(object, method);
        let resp = self
            .send(self.authed(self.client.post(&url).json(body)))
            .await?;
        parse_response(resp, &format!("{}.{method}", object.kind)).await
    }
}

fn base_url(config: &VsphereConfig) -> String {
    format!(
        "https://{}:{}/sdk/vim25/{}",
        config.host, config.port, config.api_release
    )
}

async fn check_status(resp: Response) -> Result<Response, VmhwError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> VmhwError {
    let fault = FaultBody::parse(body);
    let detail = match &fault {
        Some(f) => f.detail(),
        None => truncate(body).to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED => VmhwError::Authentication { message: detail },
        _ if fault.as_ref().is_some_and(FaultBody::is_login_failure) => {
            VmhwError::Authentication { message: detail }
        }
        StatusCode::FORBIDDEN => VmhwError::Api {
            status: status.as_u16(),
            message: format!("access denied: {detail}"),
        },
        StatusCode::NOT_FOUND => VmhwError::Api {
            status: status.as_u16(),
            message: format!("resource not found: {detail}"),
        },
        _ => VmhwError::Api {
            status: status.as_u16(),
            message: detail,
        },
    }
}

async fn parse_response<T: DeserializeOwned>(
    resp: Response,
    context: &str,
) -> Result<T, VmhwError> {
    let parse_err = |message: String| VmhwError::Parse {
        context: context.to_string(),
        message,
    };

    let text = resp
        .text()
        .await
        .map_err(|e| parse_err(format!("failed to read body: {e}")))?;

    // void methods and unset properties come back with an empty body
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };

    serde_json::from_str(text)
        .map_err(|e| parse_err(format!("{e} (body: {})", truncate(text))))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
