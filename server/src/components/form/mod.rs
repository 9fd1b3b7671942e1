use maud::{html, Markup, Render};

/// A file picker restricted to the formats the upload handler accepts
pub struct FileInput {
    pub name: String,
    pub label: Option<String>,
    pub accept: Option<String>,
    pub required: bool,
}

impl FileInput {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            accept: None,
            required: false,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl Render for FileInput {
    fn render(&self) -> Markup {
        html! {
            div class="mb-4" {
                @if let Some(label) = &self.label {
                    label for=(self.name) class="block text-sm font-medium text-gray-700 mb-1" { (label) }
                }
                input
                    type="file"
                    name=(self.name)
                    id=(self.name)
                    accept=[self.accept.as_deref()]
                    class="block w-full text-sm text-gray-900 file:mr-4 file:py-2 file:px-4 file:rounded-lg file:border-0 file:bg-indigo-50 file:text-indigo-700 hover:file:bg-indigo-100"
                    required[self.required];
            }
        }
    }
}

pub struct Form {
    pub action: String,
    pub method: String,
    pub enctype: Option<String>,
    pub content: Box<dyn Render>,
}

impl Form {
    pub fn new(action: &str, method: &str, content: impl Render + 'static) -> Self {
        Self {
            action: action.to_string(),
            method: method.to_string(),
            enctype: None,
            content: Box::new(content),
        }
    }

    /// Send the form as `multipart/form-data`
    pub fn multipart(mut self) -> Self {
        self.enctype = Some("multipart/form-data".to_string());
        self
    }
}

impl Render for Form {
    fn render(&self) -> Markup {
        html! {
            form action=(self.action) method=(self.method) enctype=[self.enctype.as_deref()] class="space-y-4" {
                (self.content.render())
            }
        }
    }
}
