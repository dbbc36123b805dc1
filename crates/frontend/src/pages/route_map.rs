use commute_shared::models::Collection;
use commute_shared::projection::ViewportTransform;
use dioxus::logger::tracing::{info, warn};
use dioxus::prelude::*;

use crate::api;
use crate::components::date_nav::{step_day, DateNav};
use crate::components::help_overlay::HelpOverlay;
use crate::components::map_view::MapView;
use crate::components::route_list::RouteList;
use crate::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    PreviousDay,
    NextDay,
    Refresh,
    ZoomIn,
    ZoomOut,
    ToggleHelp,
    CloseHelp,
}

pub fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::ArrowLeft => Some(KeyAction::PreviousDay),
        Key::ArrowRight => Some(KeyAction::NextDay),
        Key::Escape => Some(KeyAction::CloseHelp),
        Key::Character(c) => match c.as_str() {
            "r" | "R" => Some(KeyAction::Refresh),
            "+" | "=" => Some(KeyAction::ZoomIn),
            "-" | "_" => Some(KeyAction::ZoomOut),
            "?" => Some(KeyAction::ToggleHelp),
            _ => None,
        },
        _ => None,
    }
}

#[component]
pub fn RouteMap(date: ReadSignal<Option<String>>) -> Element {
    // UI state signals
    let mut refresh = use_signal(|| 0u64);
    let mut show_help = use_signal(|| false);
    let mut viewport = use_signal(ViewportTransform::default);
    let mut collections = use_signal(Vec::<Collection>::new);

    // Reading date and refresh here subscribes the resource to both; a
    // change drops the in-flight request so stale days never land.
    let routes = use_resource(move || {
        let day = date.read().clone();
        let _ = *refresh.read();
        async move {
            match day {
                Some(d) => api::fetch_transports(&d).await,
                None => api::fetch_sample().await,
            }
        }
    });

    let dates = use_resource(move || {
        let _ = *refresh.read();
        api::fetch_dates()
    });

    use_effect(move || match &*routes.read() {
        Some(Ok(data)) => {
            info!(routes = data.len(), "Loaded routes");
            collections.set(data.clone());
        }
        Some(Err(e)) => {
            warn!(error = %e, "Failed to load routes");
            collections.set(Vec::new());
        }
        None => {}
    });

    let known_dates: Vec<String> = dates
        .read()
        .as_ref()
        .and_then(|r| r.as_ref().ok())
        .cloned()
        .unwrap_or_default();
    let current_date = date.read().clone();

    let (loading, error, empty) = match &*routes.read() {
        None => (true, None, false),
        Some(Err(e)) => (false, Some(e.clone()), false),
        Some(Ok(data)) => (false, None, data.is_empty()),
    };

    let onkeydown = {
        let known = known_dates.clone();
        move |evt: Event<KeyboardData>| {
            let Some(action) = key_action(&evt.key()) else {
                return;
            };
            evt.prevent_default();
            let current = date.read().clone();
            match action {
                KeyAction::PreviousDay | KeyAction::NextDay => {
                    let days = if action == KeyAction::NextDay { 1 } else { -1 };
                    if let Some(d) = step_day(current.as_deref(), days, &known) {
                        navigator().push(Route::Day { date: d });
                    }
                }
                KeyAction::Refresh => {
                    let n = *refresh.peek();
                    refresh.set(n + 1);
                }
                KeyAction::ZoomIn => {
                    let vt = *viewport.peek();
                    viewport.set(vt.zoomed_by(1.0));
                }
                KeyAction::ZoomOut => {
                    let vt = *viewport.peek();
                    viewport.set(vt.zoomed_by(-1.0));
                }
                KeyAction::ToggleHelp => {
                    let v = *show_help.read();
                    show_help.set(!v);
                }
                KeyAction::CloseHelp => show_help.set(false),
            }
        }
    };

    rsx! {
        div {
            class: "app-layout",
            tabindex: "0",
            onkeydown: onkeydown,
            onmounted: move |evt: Event<MountedData>| async move {
                let _ = evt.set_focus(true).await;
            },

            div { class: "sidebar",
                h1 { "Commute Routes" }

                DateNav {
                    date: current_date.clone(),
                    known_dates: known_dates.clone(),
                    on_navigate: move |d: String| {
                        navigator().push(Route::Day { date: d });
                    },
                }

                if let Some(msg) = error {
                    div { class: "error-banner", "{msg}" }
                }
                if loading {
                    div { class: "loading", "Loading routes\u{2026}" }
                }
                if empty {
                    div { class: "empty-state",
                        if let Some(d) = current_date.as_deref() {
                            "No transport recorded on {d}."
                        } else {
                            "No sample routes available."
                        }
                    }
                }

                RouteList { collections }

                div { class: "sidebar-footer",
                    button {
                        onclick: move |_| {
                            let n = *refresh.peek();
                            refresh.set(n + 1);
                        },
                        "Reload"
                    }
                    button {
                        class: "help-button",
                        onclick: move |_| show_help.set(true),
                        "?"
                    }
                }
            }

            div { class: "map-area",
                MapView { collections, viewport }
            }

            HelpOverlay { show: show_help }
        }
    }
}
