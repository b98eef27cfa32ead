use weather_now_core::{
    WidgetState,
    view::{self, SUGGESTIONS_LOADING_TEXT},
    weather_panel,
};

/// Whole widget: query line, dropdown, unit and the weather panel.
pub fn widget(state: &WidgetState) -> String {
    let mut out = String::new();

    out.push_str(&format!("Search: {}\n", state.query()));
    if state.is_loading_suggestions() {
        out.push_str(&format!("  {SUGGESTIONS_LOADING_TEXT}\n"));
    }
    out.push_str(&suggestions(state));
    out.push_str(&format!("Unit: °{}\n\n", state.unit().symbol()));
    out.push_str(&weather_panel(state).to_string());
    out.push('\n');

    out
}

/// Numbered dropdown, one suggestion per line; empty when there are none.
pub fn suggestions(state: &WidgetState) -> String {
    view::suggestion_labels(state)
        .iter()
        .enumerate()
        .map(|(i, label)| format!("  {}. {label}\n", i + 1))
        .collect()
}
