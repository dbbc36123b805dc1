mod api;
mod components;
mod coords;
mod pages;

use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
    #[route("/day/:date")]
    Day { date: String },
}

#[component]
fn Home() -> Element {
    rsx! {
        pages::route_map::RouteMap { date: None::<String> }
    }
}

#[component]
fn Day(date: String) -> Element {
    rsx! {
        pages::route_map::RouteMap { date: Some(date) }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
