use crate::calendar::{month_name, MonthRange};
use crate::ui::Theme;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

/// The bar above the grid: clock, theme, the displayed month and its navigation.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    displayed: NaiveDate,
    today: NaiveDate,
    range: MonthRange,
    theme: Theme,
}

impl Header {
    pub fn new(displayed: NaiveDate, today: NaiveDate, range: MonthRange, theme: Theme) -> Self {
        Self {
            displayed,
            today,
            range,
            theme,
        }
    }

    /// `Month YYYY`.
    pub fn title(&self) -> String {
        format!(
            "{} {}",
            month_name(self.displayed.month()),
            self.displayed.year()
        )
    }

    pub fn prev_enabled(&self) -> bool {
        self.range.allows_prev(self.displayed, self.today)
    }

    pub fn next_enabled(&self) -> bool {
        self.range.allows_next(self.displayed, self.today)
    }

    pub fn render(&self) -> String {
        self.render_at(Local::now().naive_local())
    }

    /// Renders with the clock showing `now`.
    pub fn render_at(&self, now: NaiveDateTime) -> String {
        let arrow = |enabled: bool, symbol: &'static str| if enabled { symbol } else { " " };
        format!(
            "[{}] {}    {} {} {}",
            self.theme,
            now.format("%Y-%m-%d %H:%M:%S"),
            arrow(self.prev_enabled(), "<"),
            self.title(),
            arrow(self.next_enabled(), ">"),
        )
    }
}
