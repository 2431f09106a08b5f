//! Assertions over the server-rendered page

/// One `<li class="todo-item ...">` block of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedItem {
    pub classes: Vec<String>,
    pub html: String,
}

impl RenderedItem {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_button(&self, label: &str) -> bool {
        self.html.contains(&format!(">{}</button>", label))
    }

    pub fn is_placeholder(&self) -> bool {
        self.has_class("empty")
    }
}

/// Extract every to-do list entry, placeholder included.
pub fn todo_items(page: &str) -> Vec<RenderedItem> {
    const OPEN: &str = "<li class=\"todo-item";

    let mut items = Vec::new();
    let mut rest = page;
    while let Some(start) = rest.find(OPEN) {
        let block = &rest[start..];
        let end = block.find("</li>").map(|i| i + "</li>".len()).unwrap_or(block.len());
        let html = &block[..end];

        let class_start = "<li class=\"".len();
        let classes = html[class_start..]
            .split('"')
            .next()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        items.push(RenderedItem {
            classes,
            html: html.to_string(),
        });
        rest = &block[end..];
    }
    items
}

/// Real items, without the "No tasks yet" placeholder.
pub fn real_items(page: &str) -> Vec<RenderedItem> {
    todo_items(page)
        .into_iter()
        .filter(|item| !item.is_placeholder())
        .collect()
}

/// The first item whose text contains `task`.
pub fn find_item(page: &str, task: &str) -> Option<RenderedItem> {
    real_items(page)
        .into_iter()
        .find(|item| item.html.contains(&format!("<span class=\"task\">{}</span>", task)))
}

/// The item id from its `data-id` attribute.
pub fn item_id(item: &RenderedItem) -> Option<u64> {
    let marker = "data-id=\"";
    let start = item.html.find(marker)? + marker.len();
    item.html[start..].split('"').next()?.parse().ok()
}

pub fn assert_empty_list(page: &str) -> Result<(), String> {
    let items = todo_items(page);
    match items.as_slice() {
        [only] if only.is_placeholder() && only.html.contains("No tasks yet") => Ok(()),
        _ => Err(format!("Expected only the 'No tasks yet' placeholder, got {:#?}", items)),
    }
}

/// Text of the element with the given `id`, e.g. `unassigned-count`.
pub fn element_text(page: &str, id: &str) -> Option<String> {
    let marker = format!("id=\"{}\">", id);
    let start = page.find(&marker)? + marker.len();
    let end = page[start..].find('<')? + start;
    Some(page[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<ul class="todo-list">
<li class="todo-item in_progress" data-id="7" data-assignee="">
<span class="task">Buy milk</span>
<form method="post" action="/toggle/7"><button type="submit" class="toggle-btn">Complete</button></form>
</li>
</ul><span id="unassigned-count">1</span>"#;

    #[test]
    fn test_item_parsing() {
        let item = find_item(PAGE, "Buy milk").unwrap();
        assert!(item.has_class("in_progress"));
        assert!(item.has_button("Complete"));
        assert!(!item.has_button("Start"));
        assert_eq!(item_id(&item), Some(7));
        assert_eq!(element_text(PAGE, "unassigned-count").as_deref(), Some("1"));
    }

    #[test]
    fn test_placeholder_detection() {
        let page = r#"<li class="todo-item empty">No tasks yet</li>"#;
        assert!(assert_empty_list(page).is_ok());
        assert!(real_items(page).is_empty());
        assert!(assert_empty_list(PAGE).is_err());
    }
}
