use maud::{html, Markup, DOCTYPE};

/// Takes 'content' and wraps the standard header, body and footer around it.
pub fn page(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
            }
            body {
                h1 { (title) }
                (content)
            }
        }
    }
}
