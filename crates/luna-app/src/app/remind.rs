use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;

use luna_reminders::{
    InMemoryNotificationCenter, NotificationCenter, ReminderRequest, ReminderScheduler,
    ScheduledNotification,
};
use luna_settings::Clock;
use luna_types::parse_server_timestamp;

/// Parse a reminder target: RFC 3339, or a server-style timestamp in local time
pub fn parse_target(at: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(at.trim()) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = parse_server_timestamp(at)
        .ok_or_else(|| anyhow!("Unrecognized time `{}` (try 2026-10-17 19:00)", at))?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("`{}` does not exist in the local timezone", at))
}

/// Run `requests` through a scheduler backed by an in-memory notification
/// center and return what ended up pending, earliest first.
pub async fn plan_reminders(
    requests: &[ReminderRequest],
    clock: Arc<dyn Clock>,
) -> Result<Vec<ScheduledNotification>> {
    let center = Arc::new(InMemoryNotificationCenter::new());
    let scheduler = ReminderScheduler::new(center.clone(), clock);
    for request in requests {
        scheduler.schedule(request).await?;
    }
    let mut pending = center.scheduled().await?;
    pending.sort_by_key(|n| n.trigger);
    Ok(pending)
}

/// One line per planned notification
pub fn format_plan(plan: &[ScheduledNotification]) -> String {
    if plan.is_empty() {
        return "Nothing to schedule; every reminder time has already passed.".to_string();
    }
    plan.iter()
        .map(|n| {
            let when = n
                .trigger
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "now".to_string());
            format!("{}  {}  ({})", when, n.content.title, n.content.body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use luna_settings::FixedClock;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_rfc3339_target() {
        let target = parse_target("2026-10-17T19:00:00+09:00").unwrap();
        assert_eq!(target, Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_local_target() {
        let target = parse_target("2026-10-17 19:00").unwrap();
        let expected = Local
            .with_ymd_and_hms(2026, 10, 17, 19, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(target, expected);
    }

    #[test]
    fn test_parse_garbage_target() {
        assert!(parse_target("tomorrow-ish").is_err());
    }

    #[tokio::test]
    async fn test_plan_is_sorted_across_requests() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(now));
        let requests = vec![
            ReminderRequest::new(1, "Late", now + Duration::hours(3), vec![0]),
            ReminderRequest::new(2, "Soon", now + Duration::hours(1), vec![30, 0]),
        ];

        let plan = plan_reminders(&requests, clock).await.unwrap();
        let ids: Vec<_> = plan.iter().filter_map(|n| n.content.entity_id()).collect();
        assert_eq!(ids, vec![2, 2, 1]);
        assert!(format_plan(&plan).lines().count() == 3);
    }

    #[test]
    fn test_empty_plan_message() {
        assert!(format_plan(&[]).contains("already passed"));
    }
}
