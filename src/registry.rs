//! Optional process-wide default instance.
//!
//! New code should construct a [`ConfigClient`] at application composition
//! time and pass it down explicitly (e.g. as `Arc<ConfigClient>`). This
//! module exists for legacy call sites that expect a globally initialized
//! client: call [`initialize`] once at startup, then use the free functions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::ConfigClient;
use crate::config::ClientConfig;
use crate::context::EvaluationContext;
use crate::flags::FlagValue;
use crate::resolution::Resolution;
use crate::{Error, Result};

static DEFAULT_INSTANCE: RwLock<Option<Arc<ConfigClient>>> = RwLock::new(None);

/// Construct a client from `config` and install it as the process-wide
/// default, replacing any previously installed instance.
pub fn initialize(config: ClientConfig) -> Result<Arc<ConfigClient>> {
    let client = Arc::new(ConfigClient::new(config)?);

    let mut instance = DEFAULT_INSTANCE
        .write()
        .expect("thread holding registry lock should not panic");
    *instance = Some(Arc::clone(&client));

    Ok(client)
}

/// The installed default instance.
///
/// Fails with [`Error::Uninitialized`] if [`initialize`] was never called.
pub fn instance() -> Result<Arc<ConfigClient>> {
    let instance = DEFAULT_INSTANCE
        .read()
        .expect("thread holding registry lock should not panic");
    instance.clone().ok_or(Error::Uninitialized)
}

/// [`ConfigClient::evaluate_flag`] on the default instance.
pub async fn evaluate_flag(
    key: &str,
    context: &EvaluationContext,
) -> Result<Resolution<Option<FlagValue>>> {
    Ok(instance()?.evaluate_flag(key, context).await)
}

/// [`ConfigClient::evaluate_flags`] on the default instance.
pub async fn evaluate_flags(
    keys: &[&str],
    context: &EvaluationContext,
) -> Result<Resolution<HashMap<String, FlagValue>>> {
    Ok(instance()?.evaluate_flags(keys, context).await)
}

/// [`ConfigClient::get_user_flags`] on the default instance.
pub async fn get_user_flags(
    context: &EvaluationContext,
) -> Result<Resolution<HashMap<String, FlagValue>>> {
    Ok(instance()?.get_user_flags(context).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::ClientConfig;
    use crate::context::EvaluationContext;
    use crate::flags::FlagValue;
    use crate::Error;

    // The registry is process-wide state, so the uninitialized and
    // initialized cases are exercised in order within a single test.
    #[tokio::test]
    async fn uninitialized_then_initialized() {
        let context = EvaluationContext::new();

        assert!(matches!(super::instance(), Err(Error::Uninitialized)));
        assert!(matches!(
            super::evaluate_flag("k", &context).await,
            Err(Error::Uninitialized)
        ));

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flags/k/evaluate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": true})))
            .mount(&server)
            .await;

        super::initialize(ClientConfig::new(server.uri())).unwrap();

        let resolution = super::evaluate_flag("k", &context).await.unwrap();
        assert_eq!(resolution.into_value(), Some(FlagValue::Boolean(true)));

        // Re-initialization replaces the instance.
        let replacement = super::initialize(ClientConfig::new(server.uri())).unwrap();
        assert!(Arc::ptr_eq(&replacement, &super::instance().unwrap()));
    }
}
