use dioxus::prelude::*;

#[component]
pub fn HelpOverlay(show: Signal<bool>) -> Element {
    if !*show.read() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "help-overlay-backdrop",
            onclick: move |_| show.set(false),

            div {
                class: "help-overlay",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h2 { "Help" }

                // --- Keyboard shortcuts ---

                div { class: "shortcut-section",
                    h3 { "Days" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "\u{2190}" } }
                        span { "Previous day" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "\u{2192}" } }
                        span { "Next day" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "R" } }
                        span { "Reload the current day" }
                    }
                }

                div { class: "shortcut-section",
                    h3 { "Map" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "+" } " / " kbd { "=" } }
                        span { "Zoom in" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "-" } }
                        span { "Zoom out" }
                    }
                }

                div { class: "shortcut-section",
                    h3 { "Help" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "?" } }
                        span { "Toggle this help" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "Esc" } }
                        span { "Close help" }
                    }
                }

                div { class: "help-divider" }

                h2 { class: "help-section-title", "Reading the Map" }

                div { class: "help-info-section",
                    h3 { "Routes" }
                    p { "Each transport of the day is drawn as a line through its recorded track points, colored by kind: subway, bus, car, airplane or other transport. The small circles are the individual fixes." }
                }

                div { class: "help-info-section",
                    h3 { "Markers" }
                    p { "A marker travels along every route and starts over when it reaches the end, so direction of travel is visible at a glance." }
                }

                div { class: "help-info-section",
                    h3 { "Map Interactions" }
                    p { "Scroll to zoom around the cursor, drag to pan, double-click to zoom in. Routes stay attached to the map while it moves." }
                }

                button {
                    class: "close-help",
                    onclick: move |_| show.set(false),
                    "Close"
                }
            }
        }
    }
}
