use crate::args::ThemeAction;
use crate::commands::Out;
use crate::ui::{FileSettings, Settings, Theme};
use crate::Result;
use std::path::Path;

/// Shows the persisted theme or changes it.
///
/// # Arguments
/// - `home` - The directory holding `settings.json`.
/// - `action` - The change to make. `None` only shows the theme.
///
/// # Errors
/// - Returns an error if the settings file cannot be read or written.
pub async fn theme(home: &Path, action: Option<ThemeAction>) -> Result<Out<Theme>> {
    let settings = FileSettings::new(home);
    let current = settings.theme().await?;
    let theme = match action {
        None => return Ok(Out::new(format!("The theme is {current}"), current)),
        Some(ThemeAction::Light) => Theme::Light,
        Some(ThemeAction::Dark) => Theme::Dark,
        Some(ThemeAction::Toggle) => current.toggled(),
    };
    settings.set_theme(theme).await?;
    Ok(Out::new(format!("The theme is now {theme}"), theme))
}
