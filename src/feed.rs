//! Live project list built from client documents.
//!
//! Every snapshot from the store is validated, mapped into view models and
//! published wholesale; observers always see the most recent list.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::watch;

use crate::models::{ClientRecord, Document, ProjectViewModel, RecordDefaults};
use crate::progress::DurationRules;
use crate::store::Subscription;

/// What a failed subscription does to the published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionErrorPolicy {
    /// Publish `Failed` and keep it.
    #[default]
    Surface,
    /// Log the error and leave the current state alone.
    KeepLoading,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Loading,
    Ready(Vec<ProjectViewModel>),
    Failed(String),
}

/// Map a full snapshot into view models, in snapshot order.
///
/// Missing fields are defaulted and logged. A record whose duration is
/// refused by `rules` is left out. Deadlines are counted in calendar days of `tz`.
pub fn assemble<Tz: TimeZone>(
    snapshot: &[Document],
    now: DateTime<Utc>,
    rules: DurationRules,
    tz: &Tz,
) -> Vec<ProjectViewModel> {
    let defaults = RecordDefaults {
        construction_days: rules.default_days,
        now,
    };

    snapshot
        .iter()
        .filter_map(|doc| {
            let (record, defaulted) = ClientRecord::from_document(doc, &defaults);
            for field in defaulted {
                tracing::warn!(document = %doc.id, field = field.key(), "Missing or invalid field, using default");
            }
            match ProjectViewModel::from_record(record, &now, rules, tz) {
                Ok(project) => Some(project),
                Err(err) => {
                    tracing::warn!(document = %doc.id, error = %err, "Skipping project");
                    None
                }
            }
        })
        .collect()
}

/// Projects whose client name contains `query`, ignoring case. Order is kept.
pub fn filter_by_name<'a, I>(projects: I, query: &str) -> Vec<&'a ProjectViewModel>
where
    I: IntoIterator<Item = &'a ProjectViewModel>,
{
    let needle = query.to_lowercase();
    projects
        .into_iter()
        .filter(|project| needle.is_empty() || project.client_name.to_lowercase().contains(&needle))
        .collect()
}

/// Owns a subscription and republishes it as [`FeedState`].
pub struct ProjectFeed {
    subscription: Subscription,
    rules: DurationRules,
    error_policy: SubscriptionErrorPolicy,
    state: watch::Sender<FeedState>,
}

impl ProjectFeed {
    pub fn new(
        subscription: Subscription,
        rules: DurationRules,
        error_policy: SubscriptionErrorPolicy,
    ) -> (Self, watch::Receiver<FeedState>) {
        let (state, receiver) = watch::channel(FeedState::Loading);
        let feed = Self {
            subscription,
            rules,
            error_policy,
            state,
        };
        (feed, receiver)
    }

    /// Apply snapshots until the subscription ends or every observer is gone.
    /// The subscription is released when this returns.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.state.closed() => {
                    tracing::debug!("All feed observers dropped");
                    break;
                }
                item = self.subscription.next() => match item {
                    Some(Ok(snapshot)) => {
                        let projects = assemble(&snapshot, Utc::now(), self.rules, &Local);
                        tracing::debug!(documents = snapshot.len(), projects = projects.len(), "Projects rebuilt");
                        self.state.send_replace(FeedState::Ready(projects));
                    }
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "Project subscription failed");
                        if self.error_policy == SubscriptionErrorPolicy::Surface {
                            self.state.send_replace(FeedState::Failed(err.to_string()));
                        }
                    }
                    None => {
                        tracing::debug!("Project subscription ended");
                        break;
                    }
                },
            }
        }
    }
}
