//! Terminal styles for the godown CLI.
//!
//! Code asks for styles by what the text *is* (a godown name, a muted id, a warning),
//! never by color. The colors themselves live only here, built once through
//! `once_cell::sync::Lazy`.
//!
//! `console` drops the escape codes on its own when stdout is not a terminal or
//! `NO_COLOR` is set, so rendering code never checks for that itself.

use console::Style;
use once_cell::sync::Lazy;

pub struct Theme {
    pub godown: Style,
    pub sub_location: Style,
    pub item: Style,
    pub selected: Style,
    pub muted: Style,
    pub faint: Style,
    pub heading: Style,
    pub label: Style,
    pub in_stock: Style,
    pub out_of_stock: Style,
    pub affordance: Style,
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
}

pub static THEME: Lazy<Theme> = Lazy::new(|| Theme {
    godown: Style::new().bold(),
    sub_location: Style::new().cyan(),
    item: Style::new(),
    selected: Style::new().black().on_yellow(),
    muted: Style::new().color256(246).italic(),
    faint: Style::new().dim(),
    heading: Style::new().bold().underlined(),
    label: Style::new().color256(246),
    in_stock: Style::new().green(),
    out_of_stock: Style::new().red(),
    affordance: Style::new().blue(),
    info: Style::new().dim(),
    success: Style::new().green(),
    warning: Style::new().yellow(),
    error: Style::new().red().bold(),
});
