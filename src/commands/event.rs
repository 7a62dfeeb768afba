use crate::args::EventFields;
use crate::client::Submitted;
use crate::commands::{check, failure, navigate, Out, Session};
use crate::ui::{Form, Page};
use crate::Result;
use anyhow::{anyhow, bail};
use chrono::{Datelike, NaiveDate};

/// Adds an event through the same form the calendar opens for a day.
///
/// # Arguments
/// - `session` - The proxy connection and settings.
/// - `date` - The day of the event.
/// - `amount` - The amount, with or without thousands separators.
/// - `fields` - Type, category and description. Unset fields keep the form defaults.
///
/// # Errors
/// - Returns an error if `date` lies outside the navigable range or its day is full.
/// - Returns an error if any request fails or the form is incomplete.
pub async fn add(
    session: &Session,
    date: NaiveDate,
    amount: &str,
    fields: &EventFields,
) -> Result<Out<()>> {
    let mut page = session.page();
    navigate(&mut page, Some(date.year()), Some(date.month()))?;
    page.refresh().await;
    check(&page)?;
    if !page.open_create(date.day()) {
        let held = page.grid().events_on(date.day()).len();
        bail!("No more events can be added on {date}, it already holds {held}");
    }
    let form = load_form(&mut page).await?;
    fill_and_submit(&mut page, form, Some(amount), None, fields).await
}

/// Changes a stored event. Unset arguments keep their stored values.
///
/// # Arguments
/// - `session` - The proxy connection and settings.
/// - `id` - The event to change.
/// - `date` - A new day for the event.
/// - `amount` - A new amount.
/// - `fields` - A new type, category or description.
///
/// # Errors
/// - Returns an error if the event does not exist.
/// - Returns an error if any request fails or the form is incomplete.
pub async fn edit(
    session: &Session,
    id: &str,
    date: Option<NaiveDate>,
    amount: Option<&str>,
    fields: &EventFields,
) -> Result<Out<()>> {
    let mut page = session.page();
    // the form replaces this date with the stored one
    if !page.open_edit(id, 1) {
        bail!("Unable to open event {id}");
    }
    let form = load_form(&mut page).await?;
    fill_and_submit(&mut page, form, amount, date, fields).await
}

async fn load_form(page: &mut Page) -> Result<Form> {
    let mut form = page
        .form_view()
        .ok_or_else(|| anyhow!("The event form could not be opened"))?;
    if let Err(e) = form.load().await {
        page.report(&e);
        return Err(failure(page));
    }
    Ok(form)
}

async fn fill_and_submit(
    page: &mut Page,
    mut form: Form,
    amount: Option<&str>,
    date: Option<NaiveDate>,
    fields: &EventFields,
) -> Result<Out<()>> {
    if let Some(kind) = fields.kind() {
        if let Err(e) = form.select_type(kind).await {
            page.report(&e);
            return Err(failure(page));
        }
    }
    if let Some(category) = fields.category() {
        if !form.categories().iter().any(|o| o.value == category) {
            let known: Vec<&str> = form.categories().iter().map(|o| o.value.as_str()).collect();
            bail!(
                "Unknown category '{category}', expected one of: {}",
                known.join(", ")
            );
        }
        form.select_category(category);
    }
    if let Some(amount) = amount {
        form.input_amount(amount);
    }
    if let Some(description) = fields.description() {
        form.input_description(description);
    }
    if let Some(date) = date {
        form.input_date(date);
    }

    let draft = form.submit();
    match page.submit(draft.clone()).await {
        Some(Submitted::Saved) => {
            let verb = if draft.id.is_empty() { "Added" } else { "Updated" };
            Ok(Out::new_message(format!(
                "{verb} {} {} in {} on {}",
                draft.kind.map(|k| k.to_string()).unwrap_or_default(),
                draft.amount,
                draft.category,
                draft.date
            )))
        }
        Some(Submitted::EventLimit(_)) => {
            let text = page.message().map(|(_, text)| text.to_string());
            Ok(Out::new_message(text.unwrap_or_default()))
        }
        None => Err(failure(page)),
    }
}
