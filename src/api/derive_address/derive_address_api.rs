use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use super::ParsedDeriveAddressRequest;
use super::RequestValidator;
use super::UntrustedRequest;
use crate::api::completion::RequestCompletion;
use crate::api::completion::RequestResult;
use crate::api::error::KeyguardError;
use crate::state::key_store::KeyStore;
use crate::util_types::key_path::KeyPath;

/// Does the actual work for a validated derive-address request, e.g. asks for
/// the password, derives the addresses and reports them.
///
/// The processor receives the capability to complete the request and must
/// use it once.
#[async_trait]
pub trait DeriveAddressProcessor: Send + 'static {
    type Output: Send + 'static;

    async fn run(
        self,
        request: ParsedDeriveAddressRequest,
        completion: RequestCompletion<Self::Output>,
    );
}

/// Resolves with the derivation path of every requested address.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDerivationPaths;

#[async_trait]
impl DeriveAddressProcessor for ListDerivationPaths {
    type Output = Vec<KeyPath>;

    async fn run(
        self,
        request: ParsedDeriveAddressRequest,
        completion: RequestCompletion<Self::Output>,
    ) {
        completion.resolve(request.paths_to_derive());
    }
}

/// Entry point for derive-address requests.
#[derive(Debug, Clone)]
pub struct DeriveAddressApi {
    validator: RequestValidator,
}

impl DeriveAddressApi {
    pub fn new(key_store: Arc<dyn KeyStore>) -> Self {
        Self {
            validator: RequestValidator::new(key_store),
        }
    }

    /// Validate `request`, then let `processor` complete it.
    ///
    /// `cancel` is the user's cancel affordance. Once it fires the request
    /// ends with [`KeyguardError::Cancel`] and whatever the processor
    /// delivers afterwards is dropped. Nothing is written on the way, so no
    /// rollback is needed.
    pub async fn on_request<P: DeriveAddressProcessor>(
        &self,
        request: &UntrustedRequest,
        processor: P,
        cancel: CancellationToken,
    ) -> RequestResult<P::Output> {
        let parsed = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("derive-address request canceled during validation");
                return Err(KeyguardError::Cancel);
            }
            validation = self.validator.validate(request) => validation.inspect_err(|e| {
                warn!("rejecting derive-address request: {e}");
            })?,
        };
        info!(
            "deriving {} addresses for {}",
            parsed.indices_to_derive.len(),
            parsed.app_name
        );

        let (completion, pending) = RequestCompletion::new();
        tokio::spawn(processor.run(parsed, completion));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("derive-address request canceled");
                Err(KeyguardError::Cancel)
            }
            result = pending => result.unwrap_or_else(|_| {
                Err(KeyguardError::Unexpected(
                    "request processor ended without completing the request".to_string(),
                ))
            }),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use macro_rules_attr::apply;
    use serde_json::json;
    use tokio::sync::oneshot;
    use tracing_test::traced_test;

    use super::*;
    use crate::api::error::InvalidRequest;
    use crate::tests::shared::key_store_with_keys;
    use crate::tests::shared_tokio_runtime;

    fn request() -> UntrustedRequest {
        json!({
            "appName": "Test",
            "keyId": "k1",
            "baseKeyPath": "m/44'/242'/0'",
            "indicesToDerive": [0, 1],
        })
    }

    /// Holds on to its completion until the request is abandoned.
    #[derive(Debug)]
    struct WaitsForever {
        started: oneshot::Sender<()>,
    }

    #[async_trait]
    impl DeriveAddressProcessor for WaitsForever {
        type Output = ();

        async fn run(self, _request: ParsedDeriveAddressRequest, completion: RequestCompletion<()>) {
            let _ = self.started.send(());
            while completion.is_awaited() {
                tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
            }
            completion.resolve(());
        }
    }

    #[derive(Debug)]
    struct DropsCompletion;

    #[async_trait]
    impl DeriveAddressProcessor for DropsCompletion {
        type Output = ();

        async fn run(self, _request: ParsedDeriveAddressRequest, completion: RequestCompletion<()>) {
            drop(completion);
        }
    }

    #[derive(Debug)]
    struct UserCancels;

    #[async_trait]
    impl DeriveAddressProcessor for UserCancels {
        type Output = ();

        async fn run(self, _request: ParsedDeriveAddressRequest, completion: RequestCompletion<()>) {
            completion.reject(KeyguardError::Cancel);
        }
    }

    async fn api() -> DeriveAddressApi {
        DeriveAddressApi::new(key_store_with_keys().await)
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn valid_request_resolves_with_paths() {
        let paths = api()
            .await
            .on_request(&request(), ListDerivationPaths, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            vec!["m/44'/242'/0'/0'", "m/44'/242'/0'/1'"],
            paths.iter().map(KeyPath::as_str).collect::<Vec<_>>()
        );
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn invalid_request_is_rejected() {
        let mut invalid = request();
        invalid["keyId"] = json!("legacy");
        let err = api()
            .await
            .on_request(&invalid, ListDerivationPaths, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            KeyguardError::InvalidRequest(InvalidRequest::SingleAccountWallet),
            err
        );
        assert!(logs_contain("rejecting derive-address request"));
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn cancel_before_validation_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = api()
            .await
            .on_request(&request(), ListDerivationPaths, cancel)
            .await
            .unwrap_err();
        assert_eq!(KeyguardError::Cancel, err);
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn cancel_while_processing_suppresses_result() {
        let (started_tx, started_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            started_rx.await.unwrap();
            canceller.cancel();
        });

        let err = api()
            .await
            .on_request(&request(), WaitsForever { started: started_tx }, cancel)
            .await
            .unwrap_err();
        assert_eq!(KeyguardError::Cancel, err);
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn processor_may_reject_with_cancel() {
        let err = api()
            .await
            .on_request(&request(), UserCancels, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(KeyguardError::Cancel, err);
    }

    #[traced_test]
    #[apply(shared_tokio_runtime)]
    async fn dropped_completion_is_unexpected() {
        let err = api()
            .await
            .on_request(&request(), DropsCompletion, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!("Unexpected", err.name());
    }
}
