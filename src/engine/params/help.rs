/// Human-readable option listing, in the layout `ffmpeg -h encoder=...` uses.
use std::fmt::Write;

use super::types::ParamDescriptor;
use super::{CLASS_NAME, Schema};

impl Schema {
    /// Every advertised option followed by its named constants.
    pub fn render_help(&self) -> String {
        let mut out = format!("{} AVOptions ({}):\n", CLASS_NAME, self.sdk());
        for selector in self.selectors() {
            out.push_str(&self.render_option(selector));
        }
        out
    }

    /// One selector line plus one line per visible constant.
    pub fn render_option(&self, selector: &ParamDescriptor) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "  -{:<18} <{}>  {} (from {} to {}) (default {})",
            selector.name,
            selector.kind,
            selector.description,
            self.display_value(selector, selector.min),
            self.display_value(selector, selector.max),
            self.display_value(selector, selector.default_value),
        );

        if let Some(group) = selector.group {
            for constant in self.constants(group) {
                let line = format!(
                    "     {:<17} {:<6} {}",
                    constant.name, constant.default_value, constant.description
                );
                let _ = writeln!(out, "{}", line.trim_end());
            }
        }
        out
    }
}
