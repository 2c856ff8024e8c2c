//! # Rendering
//!
//! Turns API results into terminal text. Every `render_*` function returns a `String`
//! so it can be tested without a terminal; the `print_*` wrappers write to stdout.
//!
//! Layout (indentation, column widths, truncation) is computed here with
//! `unicode-width`; colors come from [`THEME`].

use super::styles::THEME;
use godown::commands::locations::DeletePlan;
use godown::commands::{CmdMessage, MessageLevel};
use godown::config::{GodownConfig, GodownPaths};
use godown::model::{Item, ItemStatus, Location, User};
use godown::store::records::RecordStore;
use godown::view::{DashboardView, DetailPane, LocationNode};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 100;
const INDENT: &str = "    ";
const NAME_WIDTH: usize = 28;
const OPEN_MARKER: &str = "▾";
const CLOSED_MARKER: &str = "▸";
const ITEM_MARKER: &str = "•";
const BREADCRUMB_SEPARATOR: &str = " › ";

pub fn print_messages(messages: &[CmdMessage]) {
    print!("{}", render_messages(messages));
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let style = match message.level {
            MessageLevel::Info => &THEME.info,
            MessageLevel::Success => &THEME.success,
            MessageLevel::Warning => &THEME.warning,
            MessageLevel::Error => &THEME.error,
        };
        out.push_str(&format!("{}\n", style.apply_to(&message.content)));
    }
    out
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    if view.loading {
        out.push_str(&format!("{}\n", THEME.muted.apply_to("Loading…")));
    }
    if !view.filter.is_empty() {
        let active: Vec<String> = view
            .filter
            .query_pairs()
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        out.push_str(&format!(
            "{}\n",
            THEME.muted.apply_to(format!("Filters: {}", active.join(", ")))
        ));
    }

    if view.tree.is_empty() {
        out.push_str("No locations yet. Create a godown first.\n");
        return out;
    }
    for node in &view.tree {
        render_node(&mut out, node, 0, view.add_item_target.as_ref());
    }
    out
}

fn render_node(out: &mut String, node: &LocationNode, depth: usize, add_target: Option<&Location>) {
    let indent = INDENT.repeat(depth);
    let marker = if node.expanded { OPEN_MARKER } else { CLOSED_MARKER };
    let name_style = if node.selected {
        &THEME.selected
    } else if node.location.is_godown {
        &THEME.godown
    } else {
        &THEME.sub_location
    };
    let available = LINE_WIDTH.saturating_sub(indent.width() + 2 + 40);
    out.push_str(&format!(
        "{}{} {}  {}\n",
        indent,
        marker,
        name_style.apply_to(truncate_to_width(&node.location.name, available)),
        THEME.muted.apply_to(format!("[{}]", node.location.id))
    ));

    if !node.expanded {
        return;
    }
    for child in &node.children {
        render_node(out, child, depth + 1, add_target);
    }

    let item_indent = INDENT.repeat(depth + 1);
    for leaf in &node.items {
        let name = pad_to_width(&truncate_to_width(&leaf.item.name, NAME_WIDTH), NAME_WIDTH);
        let name = if leaf.selected {
            THEME.selected.apply_to(name).to_string()
        } else {
            THEME.item.apply_to(name).to_string()
        };
        out.push_str(&format!(
            "{}{} {} {:>6}  {}  {}\n",
            item_indent,
            ITEM_MARKER,
            name,
            format!("×{}", leaf.item.quantity),
            status_label(leaf.item.status),
            THEME.muted.apply_to(format!("[{}]", leaf.item.id))
        ));
    }

    if node.can_add_item {
        let label = if add_target.is_some_and(|t| t.id == node.location.id) {
            "+ Add item (form open)"
        } else {
            "+ Add item"
        };
        out.push_str(&format!("{}{}\n", item_indent, THEME.affordance.apply_to(label)));
    }
}

pub fn render_detail(detail: &DetailPane) -> String {
    match detail {
        DetailPane::Empty => format!(
            "{}\n",
            THEME
                .muted
                .apply_to("Select a location or item to see details.")
        ),
        DetailPane::Location {
            location,
            path,
            sub_locations,
            items,
        } => {
            let mut out = breadcrumb(path);
            out.push_str(&format!("{}\n", THEME.heading.apply_to(&location.name)));
            out.push_str(&field(
                "Type",
                if location.is_godown {
                    "Godown"
                } else {
                    "Sub-location"
                },
            ));
            out.push_str(&field("Id", &location.id));
            out.push('\n');
            if location.is_godown {
                if sub_locations.is_empty() {
                    out.push_str("No sub-locations in this godown.\n");
                } else {
                    out.push_str("Sub-locations:\n");
                    for sub in sub_locations {
                        out.push_str(&format!(
                            "  {} {}  {}\n",
                            CLOSED_MARKER,
                            THEME.sub_location.apply_to(&sub.name),
                            THEME.muted.apply_to(format!("[{}]", sub.id))
                        ));
                    }
                }
            } else if items.is_empty() {
                out.push_str("No items in this sub-location.\n");
            } else {
                out.push_str("Items:\n");
                for item in items {
                    out.push_str(&format!(
                        "  {} {}  ×{}  {}  {}\n",
                        ITEM_MARKER,
                        item.name,
                        item.quantity,
                        status_label(item.status),
                        THEME.muted.apply_to(format!("[{}]", item.id))
                    ));
                }
            }
            out
        }
        DetailPane::Item {
            item,
            location,
            path,
        } => {
            let mut out = breadcrumb(path);
            out.push_str(&render_item_detail(item, location.as_ref()));
            out
        }
    }
}

pub fn render_item_detail(item: &Item, location: Option<&Location>) -> String {
    let mut out = format!("{}\n", THEME.heading.apply_to(&item.name));
    out.push_str(&field("Quantity", &item.quantity.to_string()));
    out.push_str(&field("Category", &item.category));
    out.push_str(&field("Brand", &item.brand));
    out.push_str(&field("Price", &format!("{:.2}", item.price)));
    out.push_str(&field("Status", &status_label(item.status)));
    let location_text = match location {
        Some(l) => format!("{} [{}]", l.name, l.id),
        None => item.sub_godown_id.clone(),
    };
    out.push_str(&field("Location", &location_text));
    if let Some(url) = &item.image_url {
        out.push_str(&field("Image", url));
    }
    if let Some(attributes) = item.attributes.as_ref().filter(|a| !a.is_empty()) {
        out.push_str(&format!("{}\n", THEME.label.apply_to("Attributes:")));
        for (key, value) in attributes {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push_str(&format!("  {}: {}\n", key, text));
        }
    }
    out.push_str(&field("Id", &item.id));
    out
}

/// Flat item listing with the owning location's name.
pub fn render_item_table(items: &[Item], store: &RecordStore) -> String {
    if items.is_empty() {
        return "No items found.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let location = store
            .location(&item.sub_godown_id)
            .map(|l| l.name.as_str())
            .unwrap_or(item.sub_godown_id.as_str());
        out.push_str(&format!(
            "{} {:>6}  {}  {}  {}  {}  {}\n",
            pad_to_width(&truncate_to_width(&item.name, NAME_WIDTH), NAME_WIDTH),
            format!("×{}", item.quantity),
            pad_to_width(&truncate_to_width(&item.category, 14), 14),
            pad_to_width(&truncate_to_width(&item.brand, 14), 14),
            status_label(item.status),
            THEME.label.apply_to(truncate_to_width(location, 20)),
            THEME.muted.apply_to(format!("[{}]", item.id))
        ));
    }
    out
}

pub fn render_delete_plan(plan: &DeletePlan) -> String {
    let mut out = format!(
        "'{}' contains {}:\n",
        plan.location.name,
        plan.summary()
    );
    for location in &plan.locations {
        out.push_str(&format!("  {} {}\n", CLOSED_MARKER, location.name));
    }
    for item in &plan.items {
        out.push_str(&format!("  {} {}\n", ITEM_MARKER, item.name));
    }
    out
}

pub fn render_user(user: &User) -> String {
    let mut out = format!("{}\n", THEME.heading.apply_to(&user.username));
    out.push_str(&field("Email", &user.email));
    if !user.id.is_empty() {
        out.push_str(&field("Id", &user.id));
    }
    out
}

pub fn render_config(config: &GodownConfig, paths: &GodownPaths) -> String {
    let mut out = String::new();
    out.push_str(&format!("api_url = {}\n", config.api_url));
    out.push_str(&format!("timeout_secs = {}\n", config.timeout_secs));
    out.push_str(&format!("debounce_ms = {}\n", config.debounce_ms));
    out.push_str(&format!(
        "{}\n",
        THEME.muted.apply_to(format!(
            "config dir: {}",
            paths.config_dir.display()
        ))
    ));
    out.push_str(&format!(
        "{}\n",
        THEME
            .muted
            .apply_to(format!("token file: {}", paths.token_file().display()))
    ));
    out
}

fn breadcrumb(path: &[Location]) -> String {
    if path.len() < 2 {
        return String::new();
    }
    let names: Vec<&str> = path.iter().map(|l| l.name.as_str()).collect();
    format!(
        "{}\n",
        THEME.muted.apply_to(names.join(BREADCRUMB_SEPARATOR))
    )
}

fn field(label: &str, value: &str) -> String {
    format!(
        "{} {}\n",
        THEME.label.apply_to(format!("{:<10}", format!("{}:", label))),
        value
    )
}

fn status_label(status: ItemStatus) -> String {
    match status {
        ItemStatus::InStock => THEME.in_stock.apply_to("in stock").to_string(),
        ItemStatus::OutOfStock => THEME.out_of_stock.apply_to("out of stock").to_string(),
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn pad_to_width(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(padding))
}
