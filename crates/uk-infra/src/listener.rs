use std::time::Duration;

use async_trait::async_trait;
use listener_api::ListenerClient;

use crate::BoxError;
use crate::retry::{RetryError, RetryPolicy, retry};

/// Port the instance listener serves its MAC → IP table on.
pub const LISTENER_PORT: u16 = 3000;

/// The listener may not have seen a fresh VM's DHCP lease yet, so lookups
/// are retried on a fixed schedule before giving up.
pub const LISTENER_RETRY: RetryPolicy = RetryPolicy::new(5, Duration::from_millis(2000));

/// Answers "which IP does this MAC currently have".
///
/// Implementations must be safe to call repeatedly for the same MAC.
#[async_trait]
pub trait IpResolver: Send + Sync + 'static {
    async fn instance_ip(&self, listener_ip: &str, port: u16, mac: &str) -> Result<String, BoxError>;
}

#[async_trait]
impl IpResolver for ListenerClient {
    async fn instance_ip(&self, listener_ip: &str, port: u16, mac: &str) -> Result<String, BoxError> {
        ListenerClient::instance_ip(self, listener_ip, port, mac)
            .await
            .map_err(BoxError::from)
    }
}

/// Resolve `mac` through the listener at `listener_ip`, retrying per `policy`.
pub async fn resolve_instance_ip(
    resolver: &dyn IpResolver,
    listener_ip: &str,
    port: u16,
    mac: &str,
    policy: RetryPolicy,
) -> Result<String, RetryError<BoxError>> {
    retry(policy, || {
        tracing::debug!(mac, listener_ip, "getting instance ip");
        resolver.instance_ip(listener_ip, port, mac)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails a fixed number of times, then answers from a static table.
    struct ScriptedListener {
        failures: Mutex<u32>,
        calls: Mutex<Vec<(String, u16, String)>>,
    }

    #[async_trait]
    impl IpResolver for ScriptedListener {
        async fn instance_ip(&self, listener_ip: &str, port: u16, mac: &str) -> Result<String, BoxError> {
            self.calls
                .lock()
                .unwrap()
                .push((listener_ip.to_string(), port, mac.to_string()));

            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err("listener has not seen this mac yet".into());
            }
            Ok("10.0.0.5".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_listener_answers() {
        let listener = ScriptedListener {
            failures: Mutex::new(2),
            calls: Mutex::new(Vec::new()),
        };

        let ip = resolve_instance_ip(&listener, "10.0.0.2", LISTENER_PORT, "00:11:22:33:44:55", LISTENER_RETRY)
            .await
            .unwrap();

        assert_eq!(ip, "10.0.0.5");
        let calls = listener.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls
            .iter()
            .all(|c| *c == ("10.0.0.2".to_string(), 3000, "00:11:22:33:44:55".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_five_attempts() {
        let listener = ScriptedListener {
            failures: Mutex::new(u32::MAX),
            calls: Mutex::new(Vec::new()),
        };

        let err = resolve_instance_ip(&listener, "10.0.0.2", LISTENER_PORT, "00:11:22:33:44:55", LISTENER_RETRY)
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 5);
        assert_eq!(err.last.to_string(), "listener has not seen this mac yet");
        assert_eq!(listener.calls.lock().unwrap().len(), 5);
    }
}
