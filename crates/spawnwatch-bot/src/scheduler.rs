//! Periodic board refresh, one task per group.
//!
//! A task sleeps until the group's auto-refresh interval has passed since the
//! last refresh, takes the group lock, checks again that the interval really
//! elapsed (a command may have refreshed in the meantime), refreshes and goes
//! back to sleep. It ends on its own once the interval is set to 0; changing
//! the interval replaces the task through [`GroupSession::set_refresh_task`].
//!
//! [`GroupSession::set_refresh_task`]: crate::session::GroupSession::set_refresh_task

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::render;
use crate::services::Services;
use crate::session::SharedSession;
use crate::types::BotResult;

/// Refreshes closer than this to the due time still count as due.
const DUE_TOLERANCE_MINUTES: f64 = 0.001;

/// Minutes to sleep before the next refresh is due. The last attempt counts
/// like a refresh, so a group whose refresh did nothing (no channel) waits a
/// full interval instead of retrying at once.
fn minutes_until_due(refresh_time: f64, last_attempt: Option<f64>, interval: u32, now: f64) -> f64 {
    let since = last_attempt.map_or(refresh_time, |attempt| attempt.max(refresh_time));
    (since + f64::from(interval) - now).max(0.0)
}

fn is_due(refresh_time: f64, interval: u32, now: f64) -> bool {
    now - refresh_time >= f64::from(interval) - DUE_TOLERANCE_MINUTES
}

/// Start the periodic refresh task of a group.
pub fn spawn_refresh_loop(services: Services, session: SharedSession) -> JoinHandle<()> {
    tokio::spawn(async move { refresh_loop(services, session).await })
}

async fn refresh_loop(services: Services, session: SharedSession) {
    let mut last_attempt: Option<f64> = None;
    let group_id = session.lock().await.id();
    tracing::info!("Started auto-refresh of group {group_id}");

    loop {
        let wait = {
            let group = session.lock().await;
            let interval = group.config.auto_refresh;
            if interval == 0 {
                break;
            }
            minutes_until_due(group.refresh_time, last_attempt, interval, services.now())
        };
        let wait = Duration::try_from_secs_f64(wait * 60.0).unwrap_or(Duration::from_secs(60));
        tokio::time::sleep(wait).await;

        let mut group = session.lock().await;
        let interval = group.config.auto_refresh;
        if interval == 0 {
            break;
        }
        let now = services.now();
        if !is_due(group.refresh_time, interval, now) {
            tracing::debug!("Group {group_id} was refreshed recently, skipping auto-refresh");
            continue;
        }
        last_attempt = Some(now);
        if group.config.channel.is_none() {
            tracing::debug!("Group {group_id} has no board channel, skipping auto-refresh");
            continue;
        }

        tracing::debug!("Auto-refreshing group {group_id}");
        if let Err(e) = render::refresh(&mut group, services.gateway.as_ref()).await {
            tracing::warn!("Auto-refresh of group {group_id} failed: {e}");
        }
        if let Err(e) = services.registry.persist(&group) {
            tracing::error!("Failed to save group {group_id}: {e}");
        }
    }

    tracing::info!("Auto-refresh of group {group_id} stopped");
}

/// Restart the refresh tasks of every loaded group with auto-refresh on.
pub async fn restore(services: &Services) -> BotResult<usize> {
    let mut restored = 0;
    for (_, shared) in services.registry.all()? {
        let mut group = shared.lock().await;
        if group.config.auto_refresh > 0 && !group.has_refresh_task() {
            let task = spawn_refresh_loop(services.clone(), shared.clone());
            group.set_refresh_task(Some(task));
            restored += 1;
        }
    }
    tracing::info!("Restored {restored} auto-refresh task(s)");
    Ok(restored)
}
