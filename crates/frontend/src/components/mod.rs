pub mod date_nav;
pub mod help_overlay;
pub mod map_view;
pub mod route_list;
