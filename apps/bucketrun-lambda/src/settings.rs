//! Process-level settings read from the environment.
//!
//! The storage settings (`zone`, `bucket`, `contentType`, `path`) are
//! resolved separately by [`bucketrun_core::StorageConfig`]; everything here
//! is optional and falls back to a default.

use std::path::PathBuf;

use bucketrun_storage::ConnectOptions;
use bucketrun_workflow::{DEFAULT_PAYLOAD_PATH, WorkflowSettings};

/// Default tracing filter when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Recipients for e-mailed notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTarget {
    /// Verified sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line override.
    pub subject: Option<String>,
}

/// Settings for one invocation.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Tracing filter directive.
    pub log_level: String,
    /// S3 endpoint overrides.
    pub connect: ConnectOptions,
    /// Workflow knobs.
    pub workflow: WorkflowSettings,
    /// E-mail target; `None` logs the notification instead.
    pub notify: Option<NotifyTarget>,
}

impl AppSettings {
    /// Read settings from the process environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `LOG_LEVEL` | `info` |
    /// | `S3_ENDPOINT_URL` | regional AWS endpoint |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `RECLAIM_EXISTING` | `true` |
    /// | `TEARDOWN` | `false` |
    /// | `PAYLOAD_PATH` | `services/test.txt` |
    /// | `NOTIFY_FROM`, `NOTIFY_TO` | unset (log only) |
    /// | `NOTIFY_SUBJECT` | notifier default |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let flag = |name: &str, default: bool| value(name).map_or(default, |v| parse_bool(&v));

        let connect = ConnectOptions {
            endpoint_url: value("S3_ENDPOINT_URL"),
            force_path_style: flag("S3_FORCE_PATH_STYLE", false),
            credentials: None,
        };

        let workflow = WorkflowSettings::builder()
            .reclaim_existing(flag("RECLAIM_EXISTING", true))
            .teardown(flag("TEARDOWN", false))
            .payload_path(
                value("PAYLOAD_PATH").map_or_else(|| PathBuf::from(DEFAULT_PAYLOAD_PATH), PathBuf::from),
            )
            .build();

        let notify = match (value("NOTIFY_FROM"), value("NOTIFY_TO")) {
            (Some(from), Some(to)) => {
                let to: Vec<String> = to
                    .split(',')
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
                    .map(str::to_owned)
                    .collect();
                (!to.is_empty()).then(|| NotifyTarget {
                    from,
                    to,
                    subject: value("NOTIFY_SUBJECT"),
                })
            }
            _ => None,
        };

        Self {
            log_level: value("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
            connect,
            workflow,
            notify,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
