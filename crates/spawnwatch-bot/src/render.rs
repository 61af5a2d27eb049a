//! Board refresh: fire alerts, repaint the board messages, clear everything
//! else out of the board channel, then post the alerts.

use std::collections::HashSet;

use chrono::Duration;

use spawnwatch::format::session_minutes;
use spawnwatch::paginator::{paginate, split_fields, PageLimits, FIELDS_PER_MESSAGE, FIELD_CAPACITY};
use spawnwatch::AlertFiring;

use crate::gateway::{
    MessagingGateway, BULK_DELETE_GRACE_SECS, BULK_DELETE_LIMIT, BULK_DELETE_MAX_AGE_SECS,
};
use crate::session::GroupSession;
use crate::types::{BotResult, Content};

/// Title of the first field of an alert message.
pub const ALERTS_TITLE: &str = "Alerts";

/// Refresh a group's board. Does nothing until a board channel is set.
pub async fn refresh(session: &mut GroupSession, gateway: &dyn MessagingGateway) -> BotResult<()> {
    let Some(channel) = session.channel(gateway).await else {
        return Ok(());
    };
    let now = session_minutes(gateway.current_timestamp());
    session.refresh_time = now;

    let firings = session.tracker.fire_alerts(now);
    let rows = session.tracker.board_rows(now, session.config.expire);
    let pages = paginate(rows, PageLimits::default());

    session.config.messages.truncate(pages.len());
    while session.config.messages.len() < pages.len() {
        let handle = gateway.send_message(channel.id, Content::placeholder()).await?;
        session.config.messages.push(handle.id);
    }
    let handles = session.board_messages();
    for (slot, (page, handle)) in pages.iter().zip(handles).enumerate() {
        if let Err(e) = gateway.edit_message(&handle, Content::page(page)).await {
            tracing::warn!("Board message {} is gone ({e}), posting a new one", handle.id);
            let replacement = gateway.send_message(channel.id, Content::page(page)).await?;
            session.config.messages[slot] = replacement.id;
        }
    }
    tracing::debug!(
        "Refreshed group {}: {} page(s), {} alert(s)",
        session.id(),
        pages.len(),
        firings.len()
    );

    let keep: HashSet<u64> = session.config.messages.iter().copied().collect();
    purge_channel(gateway, channel.id, &keep).await?;

    if !firings.is_empty() {
        let role = session.alert_role(gateway).await;
        for fields in split_fields(
            &alerts_text(&firings),
            ALERTS_TITLE,
            FIELD_CAPACITY,
            FIELDS_PER_MESSAGE,
        ) {
            gateway.send_message(channel.id, Content::rich(fields)).await?;
        }
        if let Some(role) = role {
            gateway.send_message(channel.id, Content::text(role.mention)).await?;
        }
    }
    Ok(())
}

/// One line per firing: `label: rule`.
pub fn alerts_text(firings: &[AlertFiring]) -> String {
    firings
        .iter()
        .map(|firing| format!("{}: {}", firing.label, firing.rule))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Delete every message of `channel` not in `keep`. Recent messages go in
/// bulk batches; older ones one at a time.
async fn purge_channel(
    gateway: &dyn MessagingGateway,
    channel: u64,
    keep: &HashSet<u64>,
) -> BotResult<()> {
    let cutoff = gateway.current_timestamp()
        - Duration::seconds(BULK_DELETE_MAX_AGE_SECS - BULK_DELETE_GRACE_SECS);
    let mut batch = Vec::with_capacity(BULK_DELETE_LIMIT);
    let mut deleted = 0;
    for info in gateway.channel_history(channel).await? {
        if keep.contains(&info.handle.id) {
            continue;
        }
        deleted += 1;
        if info.created_at > cutoff {
            batch.push(info.handle);
            if batch.len() == BULK_DELETE_LIMIT {
                gateway.bulk_delete_messages(channel, &batch).await?;
                batch.clear();
            }
        } else {
            gateway.delete_message(&info.handle).await?;
        }
    }
    if !batch.is_empty() {
        gateway.bulk_delete_messages(channel, &batch).await?;
    }
    if deleted > 0 {
        tracing::debug!("Purged {deleted} message(s) from channel {channel}");
    }
    Ok(())
}
