use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::Serialize;

use crate::capability::{QueueAdmin, QueueSpec};
use crate::config::SempConfig;

use super::endpoint::{self, QueueConfig, QueueCreate, QueueSwitch, SempResponse, SubscriptionCreate};
use super::error::SempError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the SEMP v2 management API of one message VPN.
#[derive(Debug, Clone)]
pub struct SempClient {
    http: Client,
    base: Url,
    username: String,
    password: String,
    vpn_name: String,
}

impl SempClient {
    pub fn new(config: &SempConfig, vpn_name: impl Into<String>) -> Result<Self, SempError> {
        let base = Url::parse(&config.hostname)
            .map_err(|e| SempError::InvalidUrl(format!("{}: {}", config.hostname, e)))?;
        if base.cannot_be_a_base() {
            return Err(SempError::InvalidUrl(config.hostname.clone()));
        }
        let http = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            vpn_name: vpn_name.into(),
        })
    }

    pub fn vpn_name(&self) -> &str {
        &self.vpn_name
    }

    /// Broker and API details from `/SEMP/v2/monitor/about`.
    pub fn about(&self) -> Result<serde_json::Value, SempError> {
        let response = self.get(&endpoint::about())?;
        response
            .data
            .ok_or_else(|| SempError::Decode("about response has no data".into()))
    }

    /// Turn ingress and egress back on for a queue stopped with
    /// [`QueueAdmin::shutdown_queue`].
    pub fn enable_queue(&self, name: &str) -> Result<(), SempError> {
        self.switch_queue(name, true)
    }

    pub fn get(&self, path: &[String]) -> Result<SempResponse, SempError> {
        self.execute(self.request(Method::GET, path)?)
    }

    pub fn post<T: Serialize>(&self, path: &[String], body: &T) -> Result<SempResponse, SempError> {
        self.execute(self.request(Method::POST, path)?.json(body))
    }

    pub fn patch<T: Serialize>(&self, path: &[String], body: &T) -> Result<SempResponse, SempError> {
        self.execute(self.request(Method::PATCH, path)?.json(body))
    }

    pub fn delete(&self, path: &[String]) -> Result<SempResponse, SempError> {
        self.execute(self.request(Method::DELETE, path)?)
    }

    fn url(&self, path: &[String]) -> Result<Url, SempError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SempError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(path);
        Ok(url)
    }

    fn request(&self, method: Method, path: &[String]) -> Result<RequestBuilder, SempError> {
        let url = self.url(path)?;
        tracing::debug!(method = %method, url = %url, "SEMP request");
        Ok(self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/json"))
    }

    fn execute(&self, request: RequestBuilder) -> Result<SempResponse, SempError> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        let parsed = serde_json::from_str::<SempResponse>(&body).ok();

        if status.is_success() {
            return parsed.ok_or(SempError::Decode(body));
        }

        let error = parsed.and_then(|r| r.meta.error);
        let description = error
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or(body);
        let error_status = error.and_then(|e| e.status);
        tracing::debug!(status = status.as_u16(), error_status = ?error_status, "SEMP request failed");
        Err(SempError::Api {
            status: status.as_u16(),
            description,
            error_status,
        })
    }

    fn switch_queue(&self, name: &str, enabled: bool) -> Result<(), SempError> {
        let body = QueueSwitch {
            ingress_enabled: enabled,
            egress_enabled: enabled,
        };
        self.patch(&endpoint::queue(&self.vpn_name, name), &body)?;
        Ok(())
    }
}

impl QueueAdmin for SempClient {
    type Error = SempError;

    /// POST the queue, then PATCH its full configuration. An existing queue
    /// is deleted and created again when `delete_if_exists` is set.
    fn create_queue(&self, spec: &QueueSpec) -> Result<(), SempError> {
        let queues = endpoint::queues(&self.vpn_name);
        let create = QueueCreate::from(spec);

        match self.post(&queues, &create) {
            Ok(_) => {}
            Err(err) if err.is_already_exists() && spec.delete_if_exists => {
                tracing::info!(queue = %spec.name, "queue exists, replacing it");
                self.delete_queue(&spec.name)?;
                self.post(&queues, &create)?;
            }
            Err(err) => return Err(err),
        }

        self.patch(
            &endpoint::queue(&self.vpn_name, &spec.name),
            &QueueConfig::new(spec, &self.vpn_name),
        )?;
        tracing::info!(queue = %spec.name, vpn = %self.vpn_name, access = spec.access_type.as_str(), "queue provisioned");
        Ok(())
    }

    fn delete_queue(&self, name: &str) -> Result<(), SempError> {
        self.delete(&endpoint::queue(&self.vpn_name, name))?;
        tracing::info!(queue = %name, vpn = %self.vpn_name, "queue deleted");
        Ok(())
    }

    fn add_subscription(&self, queue: &str, topic: &str) -> Result<(), SempError> {
        let body = SubscriptionCreate {
            subscription_topic: topic.to_string(),
        };
        match self.post(&endpoint::subscriptions(&self.vpn_name, queue), &body) {
            Ok(_) => Ok(()),
            Err(err) if err.is_already_exists() => {
                tracing::debug!(queue = %queue, topic = %topic, "subscription already present");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn remove_subscription(&self, queue: &str, topic: &str) -> Result<(), SempError> {
        self.delete(&endpoint::subscription(&self.vpn_name, queue, topic))?;
        Ok(())
    }

    fn shutdown_queue(&self, name: &str) -> Result<(), SempError> {
        self.switch_queue(name, false)?;
        tracing::info!(queue = %name, vpn = %self.vpn_name, "queue shut down");
        Ok(())
    }
}
