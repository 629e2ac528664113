use pulldown_cmark::{html, Event, Options, Parser};

/// Renders a post body to HTML.
///
/// Tables, footnotes and strikethrough are enabled, and a single newline
/// becomes `<br />` the way hand-written posts expect.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES;

    let events = Parser::new_ext(source, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}
