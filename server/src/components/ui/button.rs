use maud::{html, Markup, Render};

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonVariant {
    Primary,
    Secondary,
}

pub struct Button {
    pub text: String,
    pub href: Option<String>,
    pub variant: ButtonVariant,
    pub full_width: bool,
    pub icon: Option<String>,
    pub button_type: Option<String>,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            text: String::new(),
            href: None,
            variant: ButtonVariant::Primary,
            full_width: false,
            icon: None,
            button_type: None,
        }
    }
}

impl Button {
    pub fn primary(text: &str) -> Self {
        Self {
            text: text.to_string(),
            variant: ButtonVariant::Primary,
            ..Default::default()
        }
    }

    pub fn secondary(text: &str) -> Self {
        Self {
            text: text.to_string(),
            variant: ButtonVariant::Secondary,
            ..Default::default()
        }
    }

    pub fn href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn full_width(mut self, full_width: bool) -> Self {
        self.full_width = full_width;
        self
    }

    pub fn icon(mut self, icon: impl AsRef<str>) -> Self {
        self.icon = Some(icon.as_ref().to_string());
        self
    }

    pub fn button_type(mut self, button_type: &str) -> Self {
        self.button_type = Some(button_type.to_string());
        self
    }

    fn get_variant_classes(&self) -> &'static str {
        match self.variant {
            ButtonVariant::Primary => "bg-indigo-600 hover:bg-indigo-700 active:bg-indigo-800 text-white focus:ring-2 focus:ring-indigo-500 focus:ring-offset-2",
            ButtonVariant::Secondary => "bg-white hover:bg-gray-50 active:bg-gray-100 text-indigo-600 border border-indigo-300 hover:border-indigo-400 focus:ring-2 focus:ring-indigo-500 focus:ring-offset-2",
        }
    }
}

impl Render for Button {
    fn render(&self) -> Markup {
        let width_class = if self.full_width { "w-full" } else { "" };
        let classes = format!(
            "{} {} py-2.5 px-4 font-medium rounded-lg shadow-sm hover:shadow transition-all duration-200 flex items-center justify-center cursor-pointer",
            self.get_variant_classes(),
            width_class
        );

        let inner = html! {
            @if let Some(icon) = &self.icon {
                span class="mr-2" { i class=(icon) {} }
            }
            (self.text)
        };

        match &self.href {
            Some(href) => html! {
                a href=(href) class=(classes) { (inner) }
            },
            None => html! {
                button type=(self.button_type.as_deref().unwrap_or("button")) class=(classes) { (inner) }
            },
        }
    }
}
