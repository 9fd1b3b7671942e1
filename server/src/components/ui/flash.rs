use maud::{html, Markup, Render};

/// Notices queued by the previous request
pub struct FlashList {
    pub messages: Vec<String>,
}

impl FlashList {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

impl Render for FlashList {
    fn render(&self) -> Markup {
        html! {
            @if !self.messages.is_empty() {
                ul class="mb-6 space-y-2" role="status" {
                    @for message in &self.messages {
                        li class="px-4 py-3 rounded-md bg-amber-50 border border-amber-200 text-amber-900 text-sm" {
                            (message)
                        }
                    }
                }
            }
        }
    }
}
