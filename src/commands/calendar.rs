use crate::commands::{check, failure, navigate, Out, Session};
use crate::model::{Event, EventType, Stats};
use crate::Result;
use anyhow::anyhow;

/// Shows a month of the calendar.
///
/// # Arguments
/// - `session` - The proxy connection and settings.
/// - `year` - The year to show. Defaults to the current one.
/// - `month` - The month to show. Defaults to the current one.
///
/// # Returns
/// The events of the month, in day order, with the rendered calendar as the view.
///
/// # Errors
/// - Returns an error if the month lies outside the navigable range.
/// - Returns an error if the month cannot be fetched.
pub async fn calendar(
    session: &Session,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Out<Vec<Event>>> {
    let mut page = session.page();
    page.load_theme().await;
    navigate(&mut page, year, month)?;
    page.refresh().await;
    check(&page)?;

    let events: Vec<Event> = page.events_by_day().values().flatten().cloned().collect();
    let message = format!(
        "Found {} events in {}",
        events.len(),
        page.header().title()
    );
    let view = page.render();
    Ok(Out::new(message, events).with_view(view))
}

/// Shows the income and expense totals of a month.
///
/// # Arguments
/// - `session` - The proxy connection and settings.
/// - `year` - The year to show. Defaults to the current one.
/// - `month` - The month to show. Defaults to the current one.
/// - `expand` - The type whose per-category sums are listed.
///
/// # Errors
/// - Returns an error if the month lies outside the navigable range.
/// - Returns an error if the totals cannot be fetched.
pub async fn stats(
    session: &Session,
    year: Option<i32>,
    month: Option<u32>,
    expand: Option<EventType>,
) -> Result<Out<Vec<Stats>>> {
    let mut page = session.page();
    page.load_theme().await;
    navigate(&mut page, year, month)?;
    page.open_stats();
    let mut stat = page
        .stat_view()
        .ok_or_else(|| anyhow!("The statistics could not be opened"))?;
    if let Err(e) = stat.load().await {
        page.report(&e);
        return Err(failure(&page));
    }
    if let Some(kind) = expand {
        stat.toggle(kind);
    }

    let message = format!("Statistics for {}", page.header().title());
    let view = page.modal().render(&stat.render());
    Ok(Out::new(message, stat.data().to_vec()).with_view(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ProxyClient;
    use crate::test::{event, TestEnv};
    use crate::ui::{MemorySettings, Theme};
    use crate::ClientConfig;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::time::Duration;

    fn events() -> Vec<Event> {
        vec![
            event("a", "2024-03-05", EventType::Expense, "food", "1200"),
            event("b", "2024-03-05", EventType::Income, "salary", "3000"),
            event("c", "2024-03-20", EventType::Expense, "transport", "15.5"),
            event("d", "2024-04-01", EventType::Expense, "food", "7"),
        ]
    }

    fn session(env: &TestEnv) -> Session {
        Session::new(
            Arc::new(env.client()),
            Arc::new(MemorySettings::new(Theme::Dark)),
            env.client_config(),
            NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_calendar_current_month() {
        let env = TestEnv::start(events(), 3).await;
        let out = calendar(&session(&env), None, None).await.unwrap();
        assert_eq!(out.message(), "Found 3 events in March 2024");
        let ids: Vec<&str> = out.structure().unwrap().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        let view = out.view().unwrap();
        assert!(view.starts_with("[dark]"));
        assert!(view.contains("5*2"));
    }

    #[tokio::test]
    async fn test_calendar_other_month() {
        let env = TestEnv::start(events(), 3).await;
        let out = calendar(&session(&env), None, Some(4)).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 1);
        assert!(out.view().unwrap().contains("April 2024"));
    }

    #[tokio::test]
    async fn test_calendar_outside_range() {
        let env = TestEnv::start(events(), 3).await;
        let err = calendar(&session(&env), Some(2026), Some(1)).await.unwrap_err();
        assert!(err.to_string().contains("outside the range"));
    }

    #[tokio::test]
    async fn test_calendar_proxy_down() {
        let base = url::Url::parse("http://127.0.0.1:1/").unwrap();
        let config = ClientConfig::new(base.clone(), Duration::from_secs(5), 12, 3);
        let session = Session::new(
            Arc::new(ProxyClient::new(base).unwrap()),
            Arc::new(MemorySettings::new(Theme::Light)),
            config,
            NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
        );
        assert!(calendar(&session, None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_stats() {
        let env = TestEnv::start(events(), 3).await;
        let out = stats(&session(&env), None, None, Some(EventType::Expense))
            .await
            .unwrap();
        assert_eq!(out.message(), "Statistics for March 2024");
        assert_eq!(out.structure().unwrap().len(), 2);
        let view = out.view().unwrap();
        assert!(view.starts_with("[info] STATISTICS"));
        assert!(view.contains("1,215.5"));
        assert!(view.contains("transport"));
        assert!(!view.contains("salary"));
    }

    #[tokio::test]
    async fn test_stats_empty_month() {
        let env = TestEnv::start(events(), 3).await;
        let out = stats(&session(&env), Some(2024), Some(2), None).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
        assert!(out.view().unwrap().ends_with("No data available"));
    }
}
