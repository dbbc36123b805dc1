use commute_shared::dates::shift_date;
use dioxus::prelude::*;

/// The day `days` away from `current`.
///
/// With no current day (the sample view), stepping lands on the latest
/// day that has data.
pub fn step_day(current: Option<&str>, days: i64, known: &[String]) -> Option<String> {
    match current {
        Some(date) => shift_date(date, days),
        None => known.last().cloned(),
    }
}

#[component]
pub fn DateNav(
    date: Option<String>,
    known_dates: Vec<String>,
    on_navigate: EventHandler<String>,
) -> Element {
    let prev = step_day(date.as_deref(), -1, &known_dates);
    let next = step_day(date.as_deref(), 1, &known_dates);
    let current = date.clone().unwrap_or_default();
    let title = date.clone().unwrap_or_else(|| "Sample routes".to_string());
    let no_prev = prev.is_none();
    let no_next = next.is_none();
    let no_date = date.is_none();

    rsx! {
        div { class: "panel date-nav",
            h3 { "{title}" }
            div { class: "date-nav-row",
                button {
                    disabled: no_prev,
                    title: "Previous day (\u{2190})",
                    onclick: move |_| {
                        if let Some(d) = prev.clone() {
                            on_navigate.call(d);
                        }
                    },
                    "\u{2190}"
                }
                select {
                    class: "date-select",
                    value: "{current}",
                    onchange: move |evt: Event<FormData>| {
                        let v = evt.value();
                        if !v.is_empty() {
                            on_navigate.call(v);
                        }
                    },
                    option { value: "", disabled: true, selected: no_date, "-- Pick a day --" }
                    for d in known_dates.iter() {
                        option {
                            key: "{d}",
                            value: "{d}",
                            selected: date.as_deref() == Some(d.as_str()),
                            "{d}"
                        }
                    }
                }
                button {
                    disabled: no_next,
                    title: "Next day (\u{2192})",
                    onclick: move |_| {
                        if let Some(d) = next.clone() {
                            on_navigate.call(d);
                        }
                    },
                    "\u{2192}"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["2014-05-10".to_string(), "2014-05-12".to_string()]
    }

    #[test]
    fn test_step_from_a_day() {
        assert_eq!(step_day(Some("2014-05-12"), 1, &known()).as_deref(), Some("2014-05-13"));
        assert_eq!(step_day(Some("2014-05-01"), -1, &known()).as_deref(), Some("2014-04-30"));
    }

    #[test]
    fn test_step_from_sample_goes_to_latest() {
        assert_eq!(step_day(None, -1, &known()).as_deref(), Some("2014-05-12"));
        assert_eq!(step_day(None, 1, &[]), None);
    }

    #[test]
    fn test_step_from_invalid_day() {
        assert_eq!(step_day(Some("garbage"), 1, &known()), None);
    }
}
