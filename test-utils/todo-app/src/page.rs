//! Server-rendered HTML page.

use crate::store::Todo;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the index page, optionally with a form error.
pub fn render_index(todos: &[Todo], error: Option<&str>) -> String {
    let mut html = String::with_capacity(2048);

    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>To-Do List</title>\n</head>\n<body>\n<h1>To-Do List</h1>\n",
    );

    if let Some(error) = error {
        let _ = writeln!(html, "<p class=\"error\">{}</p>", escape_html(error));
    }

    html.push_str(
        "<form method=\"post\" action=\"/\" class=\"add-form\">\n\
         <input type=\"text\" name=\"task\" placeholder=\"What needs to be done?\">\n\
         <button type=\"submit\">Add</button>\n</form>\n",
    );

    render_assignee_filter(&mut html, todos);

    html.push_str("<ul class=\"todo-list\">\n");
    if todos.is_empty() {
        html.push_str("<li class=\"todo-item empty\">No tasks yet</li>\n");
    }
    for todo in todos {
        render_item(&mut html, todo);
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    html
}

fn render_assignee_filter(html: &mut String, todos: &[Todo]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut unassigned = 0;
    for todo in todos {
        match todo.assignee.as_deref() {
            Some(assignee) => *counts.entry(assignee).or_default() += 1,
            None => unassigned += 1,
        }
    }

    html.push_str("<fieldset class=\"assignee-filter\">\n<legend>Assignee</legend>\n");
    let _ = writeln!(
        html,
        "<label><input type=\"checkbox\" name=\"assignee\" value=\"unassigned\" checked> \
         Unassigned (<span id=\"unassigned-count\">{}</span>)</label>",
        unassigned
    );
    for (assignee, count) in counts {
        let name = escape_html(assignee);
        let _ = writeln!(
            html,
            "<label><input type=\"checkbox\" name=\"assignee\" value=\"{name}\" checked> \
             {name} (<span id=\"{name}-count\">{count}</span>)</label>"
        );
    }
    html.push_str("</fieldset>\n");
}

fn render_item(html: &mut String, todo: &Todo) {
    let task = escape_html(&todo.task);
    let assignee = todo.assignee.as_deref().map(escape_html).unwrap_or_default();
    let notes = todo.notes.as_deref().map(escape_html).unwrap_or_default();

    let _ = writeln!(
        html,
        "<li class=\"todo-item {status}\" data-id=\"{id}\" data-assignee=\"{assignee}\">",
        status = todo.status,
        id = todo.id,
    );
    let _ = writeln!(html, "<span class=\"task\">{}</span>", task);
    if !assignee.is_empty() {
        let _ = writeln!(html, "<span class=\"assignee\">{}</span>", assignee);
    }
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/toggle/{id}\"><button type=\"submit\" class=\"toggle-btn\">{label}</button></form>",
        id = todo.id,
        label = todo.status.action_label(),
    );
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/delete/{}\"><button type=\"submit\" class=\"delete-btn\">Delete</button></form>",
        todo.id
    );
    let _ = writeln!(
        html,
        "<details class=\"edit\"><summary>Edit</summary>\
         <form method=\"post\" action=\"/update_todo/{id}\">\
         <input type=\"text\" name=\"assignee\" value=\"{assignee}\">\
         <textarea name=\"notes\">{notes}</textarea>\
         <button type=\"submit\">Update Details</button></form></details>",
        id = todo.id,
    );
    html.push_str("</li>\n");
}
