/// HTML fragments for injected buttons
use crate::config::MARKER_ATTRIBUTE;

pub const OPEN_LABEL: &str = "Open with GitKraken";
pub const COMPARE_LABEL: &str = "Open Comparison with GitKraken";

const GITKRAKEN_PATH: &str = "M0 16C0 7.177 7.177 0 16 0s16 7.177 16 16-7.177 16-16 16S0 24.823 0 16Zm28.226-4.714a.607.607 0 0 0-.269-.317l-.004-.001c-.123-.07-.268-.095-.409-.07a.613.613 0 0 0-.5.6c.002.073.014.144.04.214.502 1.337.757 2.741.756 4.17a11.835 11.835 0 0 1-10.188 11.729v-5.396c.284-.058.566-.134.84-.226v4.67l.111-.027a11.128 11.128 0 0 0 6.042-3.864 10.939 10.939 0 0 0 2.406-6.884 11.052 11.052 0 0 0-5.703-9.685.618.618 0 0 0-.476-.046.61.61 0 0 0-.113 1.113 9.846 9.846 0 0 1-1.031 17.733v-3.954a1.666 1.666 0 0 0 1.104-1.387 1.67 1.67 0 0 0-.768-1.606c.237-2.17.927-2.598 1.433-2.913.302-.186.561-.348.561-.817v-.668c0-.692-.687-2.307-2.224-4.353-2.127-2.834-3.34-3.13-3.659-3.153-.12-.012-.223-.007-.337 0h-.012c-.321.023-1.534.32-3.664 3.153-1.539 2.046-2.227 3.661-2.227 4.353v.666c0 .47.26.63.56.817.506.313 1.197.742 1.433 2.912a1.664 1.664 0 0 0-.779 1.423c0 .692.456 1.33 1.117 1.572v3.955a9.837 9.837 0 0 1-4.364-3.51 9.784 9.784 0 0 1-1.752-5.604c0-3.578 1.95-6.88 5.088-8.62a.609.609 0 0 0-.294-1.14h-.001a.593.593 0 0 0-.29.076 11.057 11.057 0 0 0-5.71 9.684c0 2.53.833 4.91 2.407 6.885a11.131 11.131 0 0 0 6.041 3.864l.111.027v-4.669c.275.092.557.168.84.226v5.395A11.834 11.834 0 0 1 4.154 15.884c0-1.43.255-2.833.76-4.17a.612.612 0 0 0-.017-.464.597.597 0 0 0-.34-.316.611.611 0 0 0-.655.155.61.61 0 0 0-.125.202 13.133 13.133 0 0 0-.744 6.067A13.135 13.135 0 0 0 5.128 23.1a13.134 13.134 0 0 0 4.477 4.162 13.14 13.14 0 0 0 5.88 1.672l.093.003v-6.565a17.775 17.775 0 0 0 .479.012c.08-.002.233-.006.362-.012v6.565l.093-.003a13.156 13.156 0 0 0 5.878-1.676 13.152 13.152 0 0 0 4.477-4.163 13.145 13.145 0 0 0 2.097-5.741 13.146 13.146 0 0 0-.738-6.068ZM13.664 20.01a.977.977 0 0 0-.436-1.442.978.978 0 0 0-1.329.71.978.978 0 0 0 .583 1.09.974.974 0 0 0 1.183-.357h-.002Zm6.343-.994a.971.971 0 0 0-1.14-.475.978.978 0 0 0-.69 1.025.975.975 0 0 0 .968.881.974.974 0 0 0 .861-1.431h.001Z";

/// GitKraken logo as inline SVG
#[derive(Debug, Clone, Copy)]
pub struct Icon<'a> {
    pub size: u32,
    pub fill: &'a str,
    pub class: Option<&'a str>,
    pub style: &'a str,
}

impl<'a> Icon<'a> {
    pub fn new(size: u32) -> Icon<'a> {
        Icon {
            size,
            fill: "currentColor",
            class: None,
            style: "",
        }
    }

    pub fn fill(mut self, fill: &'a str) -> Icon<'a> {
        self.fill = fill;
        self
    }

    pub fn class(mut self, class: &'a str) -> Icon<'a> {
        self.class = Some(class);
        self
    }

    pub fn style(mut self, style: &'a str) -> Icon<'a> {
        self.style = style;
        self
    }

    pub fn html(&self) -> String {
        let class = self
            .class
            .map(|c| format!(r#" class="{}""#, escape_attribute(c)))
            .unwrap_or_default();
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" aria-hidden="true" width="{size}" height="{size}" fill="{fill}" viewBox="0 0 32 32"{class} style="pointer-events:none; {style}"><path d="{path}" /></svg>"#,
            size = self.size,
            fill = self.fill,
            class = class,
            style = self.style,
            path = GITKRAKEN_PATH,
        )
    }
}

/// Marked `<a>` opening a deep link in a new tab
#[derive(Debug, Clone)]
pub struct LinkButton<'a> {
    href: &'a str,
    class: &'a str,
    label: &'a str,
    style: Option<&'a str>,
    menu_item: bool,
    icon: String,
    text: Option<&'a str>,
}

impl<'a> LinkButton<'a> {
    pub fn new(href: &'a str, class: &'a str, icon: Icon<'_>) -> LinkButton<'a> {
        LinkButton {
            href,
            class,
            label: OPEN_LABEL,
            style: None,
            menu_item: false,
            icon: icon.html(),
            text: None,
        }
    }

    /// Title and aria-label
    pub fn label(mut self, label: &'a str) -> LinkButton<'a> {
        self.label = label;
        self
    }

    pub fn style(mut self, style: &'a str) -> LinkButton<'a> {
        self.style = Some(style);
        self
    }

    pub fn menu_item(mut self) -> LinkButton<'a> {
        self.menu_item = true;
        self
    }

    /// Visible text after the icon
    pub fn text(mut self, text: &'a str) -> LinkButton<'a> {
        self.text = Some(text);
        self
    }

    pub fn html(&self) -> String {
        let style = self
            .style
            .map(|s| format!(r#" style="{}""#, s))
            .unwrap_or_default();
        let role = if self.menu_item { r#" role="menuitem""# } else { "" };
        format!(
            r#"<a {marker} class="{class}"{style} href="{href}" target="_blank" title="{label}"{role} aria-label="{label}">{icon}{text}</a>"#,
            marker = MARKER_ATTRIBUTE,
            class = self.class,
            style = style,
            href = escape_attribute(self.href),
            label = self.label,
            role = role,
            icon = self.icon,
            text = self.text.unwrap_or_default(),
        )
    }
}

/// Marked `<li>` for dropdown menus, wrapping an unmarked link
pub fn menu_list_item(
    li_attributes: &str,
    link_style: Option<&str>,
    href: &str,
    label: &str,
) -> String {
    let style = link_style
        .map(|s| format!(r#" style="{}""#, s))
        .unwrap_or_default();
    format!(
        r#"<li {marker} {li}><a class="d-flex flex-items-center color-fg-default text-bold no-underline"{style} href="{href}" target="_blank" title="{label}" aria-label="{label}">{icon}{label}</a></li>"#,
        marker = MARKER_ATTRIBUTE,
        li = li_attributes,
        style = style,
        href = escape_attribute(href),
        label = label,
        icon = Icon::new(16).class("mr-2").html(),
    )
}

/// Escape a value for a double-quoted attribute
pub fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
