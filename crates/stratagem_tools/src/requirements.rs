//! Requirement listings for every gated definition.

use std::fmt::Write as _;

use stratagem_core::catalog::Catalog;
use stratagem_core::dependency::requirements_string;

/// Render the requirements of every unit type and upgrade that has any.
///
/// Each entry starts with the definition's ident in brackets, followed by
/// its `Requirements:` block.
#[must_use]
pub fn render_requirements(catalog: &Catalog) -> String {
    let mut out = String::new();
    let unit_types = catalog
        .unit_types()
        .map(|t| (t.ident.as_str(), requirements_string(t, catalog)));
    let upgrades = catalog
        .upgrades()
        .map(|u| (u.ident.as_str(), requirements_string(u, catalog)));

    for (ident, text) in unit_types.chain(upgrades) {
        if text.is_empty() {
            continue;
        }
        let _ = writeln!(out, "[{ident}]");
        out.push_str(&text);
    }
    out
}
