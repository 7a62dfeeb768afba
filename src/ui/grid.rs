use crate::calendar::{weeks_of_month, EventsByDay, NO_DAY, WEEKDAYS};
use crate::model::{format_amount, Event};
use crate::ui::ModalRequest;
use chrono::NaiveDate;
use std::fmt::Write;

pub const CREATE_TITLE: &str = "add new";
pub const EDIT_TITLE: &str = "update";

/// The month grid: one row per week, Sunday first, with the events of each day.
#[derive(Debug)]
pub struct Grid<'a> {
    year: i32,
    month: u32,
    weeks: Vec<[u32; 7]>,
    events: &'a EventsByDay,
    event_limit: usize,
}

impl<'a> Grid<'a> {
    pub fn new(year: i32, month: u32, events: &'a EventsByDay, event_limit: usize) -> Self {
        Self {
            year,
            month,
            weeks: weeks_of_month(year, month),
            events,
            event_limit,
        }
    }

    pub fn weeks(&self) -> &[[u32; 7]] {
        &self.weeks
    }

    /// The date of a cell. Padding cells have none.
    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        if day == NO_DAY {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn events_on(&self, day: u32) -> &[Event] {
        self.events.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether a new event may be added on `day`.
    pub fn can_create(&self, day: u32) -> bool {
        self.date_of(day).is_some() && self.events_on(day).len() < self.event_limit
    }

    /// The form request for a new event on `day`, unless the day is full or not a day.
    pub fn create(&self, day: u32) -> Option<ModalRequest> {
        if !self.can_create(day) {
            return None;
        }
        Some(ModalRequest::Form {
            title: CREATE_TITLE.to_string(),
            date: self.date_of(day)?,
            event_id: None,
        })
    }

    /// The form request for editing event `id`, shown on `day`.
    pub fn edit(&self, id: &str, day: u32) -> Option<ModalRequest> {
        Some(ModalRequest::Form {
            title: EDIT_TITLE.to_string(),
            date: self.date_of(day)?,
            event_id: Some(id.to_string()),
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for name in WEEKDAYS {
            let _ = write!(out, "{name:>6}");
        }
        out.push('\n');
        for week in &self.weeks {
            for &day in week {
                let cell = match (day, self.events_on(day).len()) {
                    (NO_DAY, _) => String::new(),
                    (day, 0) => day.to_string(),
                    (day, count) => format!("{day}*{count}"),
                };
                let _ = write!(out, "{cell:>6}");
            }
            out.push('\n');
        }
        for (day, events) in self.events.iter() {
            for event in events {
                let _ = write!(
                    out,
                    "\n{day:>2}  {}{:>12}  {:<12} {}",
                    event.kind.sign(),
                    format_amount(&event.amount),
                    event.category,
                    event.id
                );
                if !event.description.is_empty() {
                    let _ = write!(out, "  {}", event.description);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::group_by_day;
    use crate::model::EventType;
    use crate::test::event;
    use chrono::Utc;

    fn march() -> EventsByDay {
        group_by_day(
            vec![
                event("a", "2024-03-05", EventType::Expense, "food", "1200"),
                event("b", "2024-03-05", EventType::Income, "salary", "3000"),
                event("c", "2024-03-20", EventType::Expense, "transport", "15.5"),
            ],
            2024,
            3,
            &Utc,
        )
    }

    #[test]
    fn test_cells() {
        let events = march();
        let grid = Grid::new(2024, 3, &events, 2);
        // March 2024 starts on a Friday
        assert_eq!(grid.weeks()[0], [0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(grid.date_of(NO_DAY), None);
        assert_eq!(grid.date_of(31), NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(grid.events_on(5).len(), 2);
        assert!(grid.events_on(6).is_empty());
    }

    #[test]
    fn test_event_limit_blocks_creation() {
        let events = march();
        let grid = Grid::new(2024, 3, &events, 2);
        assert!(!grid.can_create(5));
        assert!(grid.create(5).is_none());
        assert!(grid.can_create(20));
        assert!(!grid.can_create(NO_DAY));
        assert_eq!(
            grid.create(20),
            Some(ModalRequest::Form {
                title: "add new".into(),
                date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
                event_id: None,
            })
        );
    }

    #[test]
    fn test_edit_is_allowed_on_full_day() {
        let events = march();
        let grid = Grid::new(2024, 3, &events, 2);
        let request = grid.edit("a", 5).unwrap();
        assert!(matches!(
            request,
            ModalRequest::Form { event_id: Some(ref id), .. } if id == "a"
        ));
        assert!(grid.edit("a", NO_DAY).is_none());
    }

    #[test]
    fn test_render() {
        let events = march();
        let rendered = Grid::new(2024, 3, &events, 5).render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "   Sun   Mon   Tue   Wed   Thu   Fri   Sat");
        assert_eq!(lines[1], "                                   1     2");
        assert!(lines[2].contains("5*2"));
        assert!(rendered.contains("+       3,000  salary"));
        assert!(rendered.contains("-       1,200  food"));
        // income is listed first within a day
        let income = rendered.find("salary").unwrap();
        let expense = rendered.find("food").unwrap();
        assert!(income < expense);
    }
}
